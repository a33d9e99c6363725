//! # ViaQ record model
//!
//! A host-side model of the normalization the emitted configuration
//! performs on the node: CRI-O line parsing and partial-line reassembly,
//! severity derivation, and the JSON-parse filter semantics. The dialect
//! templates embody the same rules in fluentd/VRL form; this model makes
//! them testable without running a collector.

use serde_json::Value;

/// Stream a container line was written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrioStream {
    Stdout,
    Stderr,
}

/// Continuation marker of a CRI-O line: `P` lines continue, `F` terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrioMarker {
    Full,
    Partial,
}

/// One parsed CRI-O log line: `<rfc3339nano> <stdout|stderr> <F|P> <text>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrioLine {
    pub timestamp: String,
    pub stream: CrioStream,
    pub marker: CrioMarker,
    pub text: String,
}

impl CrioLine {
    pub fn parse(line: &str) -> Option<CrioLine> {
        let mut parts = line.splitn(4, ' ');
        let timestamp = parts.next()?;
        let stream = match parts.next()? {
            "stdout" => CrioStream::Stdout,
            "stderr" => CrioStream::Stderr,
            _ => return None,
        };
        let marker = match parts.next()? {
            "F" => CrioMarker::Full,
            "P" => CrioMarker::Partial,
            _ => return None,
        };
        let text = parts.next().unwrap_or("");
        if timestamp.is_empty() {
            return None;
        }
        Some(CrioLine {
            timestamp: timestamp.to_string(),
            stream,
            marker,
            text: text.to_string(),
        })
    }
}

/// One reassembled record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledRecord {
    /// Timestamp of the line that completed the record.
    pub timestamp: String,
    pub stream: CrioStream,
    pub message: String,
    /// Set when a partial run was flushed without a terminating `F` line.
    pub incomplete: bool,
}

/// Reassembles a stream of CRI-O lines: a run of `P` lines terminated by an
/// `F` line concatenates into one record carrying the final line's
/// timestamp; newlines between fragments are dropped. A trailing `P` run is
/// emitted as-is, flagged incomplete. Streams are never merged: stdout and
/// stderr reassemble independently.
pub fn reassemble(lines: &[CrioLine]) -> Vec<AssembledRecord> {
    let mut records = Vec::new();
    let mut pending: [Vec<&CrioLine>; 2] = [Vec::new(), Vec::new()];
    let slot = |stream: CrioStream| match stream {
        CrioStream::Stdout => 0usize,
        CrioStream::Stderr => 1usize,
    };

    for line in lines {
        let buf = &mut pending[slot(line.stream)];
        match line.marker {
            CrioMarker::Partial => buf.push(line),
            CrioMarker::Full => {
                let mut message = String::new();
                for partial in buf.iter() {
                    message.push_str(&partial.text);
                }
                message.push_str(&line.text);
                buf.clear();
                records.push(AssembledRecord {
                    timestamp: line.timestamp.clone(),
                    stream: line.stream,
                    message,
                    incomplete: false,
                });
            }
        }
    }
    for stream in [CrioStream::Stdout, CrioStream::Stderr] {
        let buf = &mut pending[slot(stream)];
        if let Some(last) = buf.last() {
            let mut message = String::new();
            for partial in buf.iter() {
                message.push_str(&partial.text);
            }
            records.push(AssembledRecord {
                timestamp: last.timestamp.clone(),
                stream,
                message,
                incomplete: true,
            });
            buf.clear();
        }
    }
    records
}

/// Replaces invalid byte sequences with U+FFFD; valid multi-byte UTF-8
/// passes through untouched and no record is ever dropped.
pub fn sanitize_utf8(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Log category a record belongs to, for level defaulting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    Application,
    Infrastructure,
    Audit,
}

const LEVEL_WORDS: &[&str] = &[
    "emerg", "alert", "crit", "critical", "err", "error", "warning", "warn", "notice", "info",
    "debug", "trace", "fatal", "unknown",
];

fn journald_priority_level(priority: u8) -> Option<&'static str> {
    Some(match priority {
        0 => "emerg",
        1 => "alert",
        2 => "crit",
        3 => "err",
        4 => "warning",
        5 => "notice",
        6 => "info",
        7 => "debug",
        _ => return None,
    })
}

fn explicit_level_token(message: &str) -> Option<&'static str> {
    let lower = message.to_ascii_lowercase();
    let idx = lower.find("level=")?;
    let word: String = lower[idx + "level=".len()..]
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    LEVEL_WORDS.iter().find(|w| **w == word).copied()
}

fn klog_prefix_level(message: &str) -> Option<&'static str> {
    let mut chars = message.chars();
    let first = chars.next()?;
    let digits: String = chars.by_ref().take(4).collect();
    let followed_by_space = chars.next().is_some_and(char::is_whitespace);
    if digits.len() == 4 && digits.chars().all(|c| c.is_ascii_digit()) && followed_by_space {
        // The klog prefix is `<letter><MMDD> ` followed by the clock.
        match first {
            'I' => return Some("info"),
            'W' => return Some("warn"),
            'E' => return Some("error"),
            'F' => return Some("critical"),
            'D' => return Some("debug"),
            _ => {}
        }
    }
    None
}

fn trace_prefix(message: &str) -> bool {
    let mut chars = message.chars();
    if chars.next() != Some('T') {
        return false;
    }
    let digits: String = chars.by_ref().take_while(|c| c.is_ascii_digit()).collect();
    !digits.is_empty() && message[1 + digits.len()..].starts_with(' ')
}

fn keyword_level(message: &str) -> Option<&'static str> {
    let window: String = message.chars().take(256).collect();
    let lower = window.to_ascii_lowercase();
    let has_word = |word: &str| {
        lower.match_indices(word).any(|(i, _)| {
            let before_ok = i == 0
                || !lower.as_bytes()[i - 1].is_ascii_alphanumeric();
            let after = i + word.len();
            let after_ok = after >= lower.len()
                || !lower.as_bytes()[after].is_ascii_alphanumeric();
            before_ok && after_ok
        })
    };
    if has_word("fatal") {
        return Some("fatal");
    }
    if has_word("error") {
        return Some("error");
    }
    let has_upper_warn = window.match_indices("WARN").any(|(i, _)| {
        let before_ok = i == 0 || !window.as_bytes()[i - 1].is_ascii_alphanumeric();
        let after = i + "WARN".len();
        // WARNING still counts; WARNed does not.
        let after_ok = after >= window.len()
            || !window.as_bytes()[after].is_ascii_lowercase();
        before_ok && after_ok
    });
    if has_word("warn") || has_word("warning") || has_upper_warn {
        return Some("warn");
    }
    if has_word("info") {
        return Some("info");
    }
    if has_word("debug") {
        return Some("debug");
    }
    if has_word("trace") {
        return Some("trace");
    }
    None
}

/// Derives the normalized severity of a record, first match wins:
/// explicit `level=` token, journald PRIORITY, klog prefix, trace prefix,
/// bounded keywords, then the per-category default.
pub fn derive_level(
    message: &str,
    journald_priority: Option<u8>,
    category: LogCategory,
) -> &'static str {
    if let Some(level) = explicit_level_token(message) {
        return level;
    }
    if let Some(level) = journald_priority.and_then(journald_priority_level) {
        return level;
    }
    if let Some(level) = klog_prefix_level(message) {
        return level;
    }
    if trace_prefix(message) {
        return "trace";
    }
    if let Some(level) = keyword_level(message) {
        return level;
    }
    match category {
        LogCategory::Application => "unknown",
        LogCategory::Audit => "default",
        LogCategory::Infrastructure => "info",
    }
}

/// The JSON-parse filter: a message parsing as a JSON object moves to
/// `structured` and the message is cleared; anything else passes through
/// unchanged. Invalid JSON never fails the pipeline.
pub fn apply_json_parse(message: &str) -> (Option<Value>, String) {
    match serde_json::from_str::<Value>(message) {
        Ok(Value::Object(map)) => (Some(Value::Object(map)), String::new()),
        _ => (None, message.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(ts: &str, marker: &str, text: &str) -> CrioLine {
        CrioLine::parse(&format!("{ts} stdout {marker} {text}")).expect("parses")
    }

    #[test]
    fn four_partial_lines_concatenate() {
        let ts = "2021-03-31T12:59:28.573159188+00:00";
        let lines = vec![
            line(ts, "P", "May "),
            line(ts, "P", "the force "),
            line(ts, "P", "be with "),
            line(ts, "F", "you"),
        ];
        let records = reassemble(&lines);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "May the force be with you");
        assert!(!records[0].incomplete);
    }

    #[test]
    fn full_only_streams_reassemble_to_identity() {
        let lines: Vec<CrioLine> = (0..5)
            .map(|i| line("2021-03-31T12:59:28.573159188+00:00", "F", &format!("line {i}")))
            .collect();
        let records = reassemble(&lines);
        assert_eq!(records.len(), 5);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.message, format!("line {i}"));
        }
    }

    #[test]
    fn full_line_flushes_pending_partials_first() {
        let lines = vec![
            line("t1", "P", "begin "),
            line("t2", "F", "end"),
            line("t3", "F", "next"),
        ];
        let records = reassemble(&lines);
        assert_eq!(records[0].message, "begin end");
        assert_eq!(records[0].timestamp, "t2");
        assert_eq!(records[1].message, "next");
    }

    #[test]
    fn dangling_partials_flush_with_incomplete_flag() {
        let lines = vec![line("t1", "P", "never "), line("t2", "P", "finished")];
        let records = reassemble(&lines);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "never finished");
        assert!(records[0].incomplete);
    }

    #[test]
    fn streams_do_not_merge() {
        let lines = vec![
            CrioLine::parse("t1 stdout P out-").unwrap(),
            CrioLine::parse("t2 stderr P err-").unwrap(),
            CrioLine::parse("t3 stdout F done").unwrap(),
            CrioLine::parse("t4 stderr F done").unwrap(),
        ];
        let records = reassemble(&lines);
        assert_eq!(records[0].message, "out-done");
        assert_eq!(records[0].stream, CrioStream::Stdout);
        assert_eq!(records[1].message, "err-done");
        assert_eq!(records[1].stream, CrioStream::Stderr);
    }

    #[test]
    fn level_derivation_precedence() {
        // explicit token beats everything
        assert_eq!(
            derive_level("E0401 level=debug something", Some(3), LogCategory::Application),
            "debug"
        );
        // journald priority next
        assert_eq!(derive_level("plain text", Some(3), LogCategory::Infrastructure), "err");
        // klog prefix
        assert_eq!(
            derive_level("W0401 12:34:56.789 watch closed", None, LogCategory::Application),
            "warn"
        );
        assert_eq!(
            derive_level("F0401 12:34:56.789 fatal issue", None, LogCategory::Application),
            "critical"
        );
        // trace prefix
        assert_eq!(derive_level("T1234 tracing", None, LogCategory::Application), "trace");
        // keywords, highest severity first
        assert_eq!(
            derive_level("an error and a warning", None, LogCategory::Application),
            "error"
        );
        assert_eq!(
            derive_level("Warning: disk is nearly full", None, LogCategory::Application),
            "warn"
        );
        assert_eq!(derive_level("SEVERE WARNING issued", None, LogCategory::Application), "warn");
        // defaults per category
        assert_eq!(derive_level("nothing here", None, LogCategory::Application), "unknown");
        assert_eq!(derive_level("nothing here", None, LogCategory::Audit), "default");
        assert_eq!(derive_level("nothing here", None, LogCategory::Infrastructure), "info");
    }

    #[test]
    fn keyword_window_is_bounded_to_256_chars() {
        let mut message = "x".repeat(300);
        message.push_str(" error");
        assert_eq!(derive_level(&message, None, LogCategory::Application), "unknown");
    }

    #[test]
    fn json_objects_move_to_structured() {
        let (structured, message) = apply_json_parse(r#"{"a":"Alpha","b":true,"c":12345}"#);
        let structured = structured.expect("object");
        assert_eq!(structured["a"], "Alpha");
        assert_eq!(structured["b"], true);
        assert_eq!(structured["c"], 12345);
        assert!(message.is_empty());
    }

    #[test]
    fn invalid_json_passes_through() {
        let (structured, message) = apply_json_parse("not json at all {");
        assert!(structured.is_none());
        assert_eq!(message, "not json at all {");
        // JSON scalars are not objects either
        let (structured, message) = apply_json_parse("42");
        assert!(structured.is_none());
        assert_eq!(message, "42");
    }

    #[test]
    fn utf8_sanitization_preserves_valid_multibyte() {
        let valid = "汉字 héllo ✓";
        assert_eq!(sanitize_utf8(valid.as_bytes()), valid);
        let invalid = [0x66u8, 0x6f, 0xff, 0x6f];
        assert_eq!(sanitize_utf8(&invalid), "fo\u{fffd}o");
    }
}
