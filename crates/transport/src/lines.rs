//! Newline framing over the helper's byte streams.
//!
//! Lines are framed on raw bytes. A line that is not valid UTF-8 does not end
//! the stream: it is yielded as [`TransportError::InvalidUtf8`] carrying a
//! lossy rendering, and reading continues with the next line.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::{SinkExt, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, FramedRead, FramedWrite};

use crate::error::TransportError;

fn newline_codec() -> AnyDelimiterCodec {
    AnyDelimiterCodec::new(b"\n".to_vec(), b"\n".to_vec())
}

fn codec_error(err: AnyDelimiterCodecError) -> TransportError {
    match err {
        AnyDelimiterCodecError::Io(e) => TransportError::Io(e),
        AnyDelimiterCodecError::MaxChunkLengthExceeded => TransportError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "line length limit exceeded",
        )),
    }
}

/// Decodes one framed line, dropping a trailing `\r`.
fn decode_line(raw: &[u8]) -> Result<String, TransportError> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    match std::str::from_utf8(raw) {
        Ok(line) => Ok(line.to_owned()),
        Err(_) => Err(TransportError::InvalidUtf8 {
            line: String::from_utf8_lossy(raw).into_owned(),
        }),
    }
}

/// Writes newline-terminated lines to the helper's input.
///
/// Takes `&mut self`, so a single owner serialises all writes and lines never
/// interleave.
pub struct LineSink<W> {
    inner: FramedWrite<W, AnyDelimiterCodec>,
}

impl<W: AsyncWrite + Unpin> LineSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: FramedWrite::new(writer, newline_codec()),
        }
    }

    /// Writes `text` followed by exactly one `\n`.
    ///
    /// Trailing whitespace is trimmed first; a line that is empty after
    /// trimming is not written.
    pub async fn write_line(&mut self, text: &str) -> Result<(), TransportError> {
        let line = text.trim_end();
        if line.is_empty() {
            return Ok(());
        }
        self.inner.send(line).await.map_err(codec_error)
    }
}

/// Lazy sequence of lines read from one of the helper's output streams.
///
/// Partial lines are buffered until their newline arrives. The stream ends
/// when the helper closes its side; it cannot be restarted.
pub struct LineStream<R> {
    inner: FramedRead<R, AnyDelimiterCodec>,
}

impl<R: AsyncRead + Unpin> LineStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: FramedRead::new(reader, newline_codec()),
        }
    }

    /// Next complete line, or `None` once the stream is closed.
    ///
    /// [`TransportError::InvalidUtf8`] is recoverable: the next call reads the
    /// following line. Any other error ends the stream.
    pub async fn next_line(&mut self) -> Result<Option<String>, TransportError> {
        self.next().await.transpose()
    }
}

impl<R: AsyncRead + Unpin> Stream for LineStream<R> {
    type Item = Result<String, TransportError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx).map(|item| {
            item.map(|chunk| chunk.map_err(codec_error).and_then(|raw| decode_line(&raw)))
        })
    }
}
