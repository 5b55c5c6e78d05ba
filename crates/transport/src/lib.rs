//! Child-process transport for the native tray helper.
//!
//! The helper is spawned with three piped streams. Input is written one line
//! at a time through a [`LineSink`]; output and error are read back as lazy
//! [`LineStream`]s that buffer partial lines across reads and end when the
//! helper closes the stream.
//!
//! The child itself is owned by a reaper task. Callers interact with it
//! through a [`ProcessControl`]: request a graceful termination and wait for
//! the [`ExitInfo`].

pub mod error;
pub mod lines;
pub mod process;

pub use error::TransportError;
pub use lines::{LineSink, LineStream};
pub use process::{
    BoxedReader, BoxedWriter, ExitInfo, ProcessControl, ProcessIo, ProcessMonitor, spawn,
};
