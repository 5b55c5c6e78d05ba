//! Shortening wire lines for logs.

const ICON_KEY: &str = "\"icon\":";
const ICON_PLACEHOLDER: &str = "<ICON>";
const LOG_LIMIT: usize = 500;

/// Replaces icon payloads with a placeholder and caps the length, keeping
/// the head and tail of long lines.
pub(crate) fn redact(line: &str) -> String {
    let mut out = String::with_capacity(line.len().min(LOG_LIMIT + 3));
    let mut rest = line;
    while let Some(pos) = rest.find(ICON_KEY) {
        let (head, tail) = rest.split_at(pos + ICON_KEY.len());
        out.push_str(head);
        let Some(value) = tail.strip_prefix('"') else {
            rest = tail;
            continue;
        };
        out.push('"');
        out.push_str(ICON_PLACEHOLDER);
        match value.find('"') {
            Some(end) => {
                out.push('"');
                rest = &value[end + 1..];
            }
            None => rest = "",
        }
    }
    out.push_str(rest);
    truncate_middle(out)
}

fn truncate_middle(line: String) -> String {
    let count = line.chars().count();
    if count <= LOG_LIMIT {
        return line;
    }
    let half = LOG_LIMIT / 2;
    let head: String = line.chars().take(half).collect();
    let tail: String = line.chars().skip(count - half).collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hides_icon_payloads() {
        let line = r#"{"icon":"aGVsbG8=","title":"T","items":[{"title":"A","icon":"d29ybGQ="}]}"#;
        assert_eq!(
            redact(line),
            r#"{"icon":"<ICON>","title":"T","items":[{"title":"A","icon":"<ICON>"}]}"#
        );
    }

    #[test]
    fn leaves_plain_lines_alone() {
        assert_eq!(redact(r#"{"type":"ready"}"#), r#"{"type":"ready"}"#);
        assert_eq!(redact("Quit"), "Quit");
    }

    #[test]
    fn shortens_long_lines() {
        let line = format!("{}{}", "a".repeat(400), "b".repeat(400));
        let out = redact(&line);
        assert_eq!(out.len(), LOG_LIMIT + 3);
        assert!(out.starts_with("aaa"));
        assert!(out.ends_with("bbb"));
        assert!(out.contains("..."));
    }
}
