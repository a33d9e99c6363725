//! # Field paths
//!
//! Dot-delimited paths into a log record, as used by the prune and drop
//! filters and by tenant/index key options. Segments are bare words
//! (`[a-zA-Z0-9_]`), quoted strings for anything else, or `[n]` array
//! indices: `.kubernetes.labels."foo-bar/baz"`, `.items[0].name`.

use std::fmt;

/// One step of a field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize),
}

/// A parsed field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    pub segments: Vec<Segment>,
}

/// Parse failure with the offending position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid field path at byte {at}: {reason}")]
pub struct PathError {
    pub at: usize,
    pub reason: &'static str,
}

impl FieldPath {
    /// Parses a path expression. The leading `.` is required to match the
    /// document surface of the drop/prune filters.
    pub fn parse(expr: &str) -> Result<FieldPath, PathError> {
        let b = expr.as_bytes();
        let mut i = 0usize;
        let mut segments = Vec::new();
        if b.first() != Some(&b'.') {
            return Err(PathError { at: 0, reason: "path must start with '.'" });
        }
        while i < b.len() {
            match b[i] {
                b'.' => {
                    i += 1;
                    if i >= b.len() {
                        return Err(PathError { at: i, reason: "trailing '.'" });
                    }
                    match b[i] {
                        b'"' => {
                            let start = i + 1;
                            let mut j = start;
                            while j < b.len() && b[j] != b'"' {
                                j += 1;
                            }
                            if j >= b.len() {
                                return Err(PathError { at: j, reason: "unterminated quote" });
                            }
                            if j == start {
                                return Err(PathError { at: j, reason: "empty quoted segment" });
                            }
                            segments.push(Segment::Field(expr[start..j].to_string()));
                            i = j + 1;
                        }
                        _ => {
                            let start = i;
                            while i < b.len()
                                && (b[i].is_ascii_alphanumeric() || b[i] == b'_')
                            {
                                i += 1;
                            }
                            if i == start {
                                return Err(PathError { at: i, reason: "empty segment" });
                            }
                            segments.push(Segment::Field(expr[start..i].to_string()));
                        }
                    }
                }
                b'[' => {
                    let start = i + 1;
                    let mut j = start;
                    while j < b.len() && b[j] != b']' {
                        j += 1;
                    }
                    if j >= b.len() {
                        return Err(PathError { at: j, reason: "unterminated index" });
                    }
                    let idx: usize = expr[start..j]
                        .parse()
                        .map_err(|_| PathError { at: start, reason: "index is not a number" })?;
                    segments.push(Segment::Index(idx));
                    i = j + 1;
                }
                _ => return Err(PathError { at: i, reason: "expected '.' or '['" }),
            }
        }
        if segments.is_empty() {
            return Err(PathError { at: 0, reason: "empty path" });
        }
        Ok(FieldPath { segments })
    }

    /// Renders the path in VRL syntax, quoting segments that need it.
    pub fn to_vrl(&self) -> String {
        let mut out = String::new();
        for seg in &self.segments {
            match seg {
                Segment::Field(f) => {
                    if f.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                        out.push('.');
                        out.push_str(f);
                    } else {
                        out.push_str(&format!(".\"{f}\""));
                    }
                }
                Segment::Index(i) => out.push_str(&format!("[{i}]")),
            }
        }
        out
    }

    /// Renders the path as arguments to ruby `Hash#dig`, e.g.
    /// `"kubernetes","labels","foo-bar/baz"`. Indices become integers.
    pub fn to_ruby_dig(&self) -> String {
        let parts: Vec<String> = self
            .segments
            .iter()
            .map(|seg| match seg {
                Segment::Field(f) => format!("\"{f}\""),
                Segment::Index(i) => i.to_string(),
            })
            .collect();
        parts.join(",")
    }

    /// Field names only, for paths that never index arrays.
    pub fn field_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Field(f) => Some(f.as_str()),
                Segment::Index(_) => None,
            })
            .collect()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_vrl())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_dotted_path() {
        let p = FieldPath::parse(".kubernetes.namespace_name").unwrap();
        assert_eq!(p.to_vrl(), ".kubernetes.namespace_name");
        assert_eq!(p.to_ruby_dig(), "\"kubernetes\",\"namespace_name\"");
    }

    #[test]
    fn parses_quoted_segment() {
        let p = FieldPath::parse(r#".kubernetes.labels."foo-bar/baz""#).unwrap();
        assert_eq!(p.to_vrl(), r#".kubernetes.labels."foo-bar/baz""#);
        assert_eq!(p.to_ruby_dig(), "\"kubernetes\",\"labels\",\"foo-bar/baz\"");
    }

    #[test]
    fn parses_array_index() {
        let p = FieldPath::parse(".items[2].name").unwrap();
        assert_eq!(
            p.segments,
            vec![
                Segment::Field("items".to_string()),
                Segment::Index(2),
                Segment::Field("name".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_malformed_paths() {
        assert!(FieldPath::parse("kubernetes").is_err());
        assert!(FieldPath::parse(".").is_err());
        assert!(FieldPath::parse(".a..b").is_err());
        assert!(FieldPath::parse(r#".a."unterminated"#).is_err());
        assert!(FieldPath::parse(".a[x]").is_err());
    }
}
