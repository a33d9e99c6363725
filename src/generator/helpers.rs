//! # Generator helpers
//!
//! Naming helpers shared by both dialects, plus the indent-aware writer the
//! renderers build configuration text with. Both dialects are emitted
//! through this one string builder; there is no template engine.

/// Routing label for an output or pipeline name: uppercased, with every
/// non-alphanumeric character folded to `_`, e.g. `my-cloudwatch` ->
/// `MY_CLOUDWATCH`. The fluentd dialect prefixes `@` at the use site.
pub fn label_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Component id for the vector dialect and for fluentd store ids:
/// lowercased, non-alphanumerics folded to `_`.
pub fn component_id(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// `["a","b"]` rendering of a vector `inputs` list.
pub fn make_inputs(inputs: &[String]) -> String {
    let quoted: Vec<String> = inputs.iter().map(|i| format!("\"{i}\"")).collect();
    format!("[{}]", quoted.join(","))
}

/// Comma-space joined list, as fluentd route matchers expect.
pub fn comma_separated(items: &[String]) -> String {
    items.join(", ")
}

/// Indent-aware text writer.
///
/// Tracks a current indentation level and writes one line at a time.
/// `lines` re-indents a multi-line block under the current level, keeping
/// the block's internal relative indentation intact.
#[derive(Debug, Default)]
pub struct ConfWriter {
    buf: String,
    indent: usize,
}

impl ConfWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn outdent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// Writes one line at the current indentation. Empty input writes a
    /// blank line with no trailing spaces.
    pub fn line(&mut self, s: &str) {
        if s.is_empty() {
            self.buf.push('\n');
            return;
        }
        for _ in 0..self.indent {
            self.buf.push_str("  ");
        }
        self.buf.push_str(s);
        self.buf.push('\n');
    }

    /// Writes a multi-line block, each line indented to the current level.
    pub fn lines(&mut self, block: &str) {
        for l in block.lines() {
            self.line(l);
        }
    }

    /// Blank separator line.
    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

/// Line-trimmed equality used by the golden tests: blank lines dropped,
/// per-line leading/trailing whitespace removed.
pub fn trim_lines(s: &str) -> Vec<String> {
    s.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_names_uppercase_and_fold() {
        assert_eq!(label_name("my-cloudwatch"), "MY_CLOUDWATCH");
        assert_eq!(label_name("apps.es-1"), "APPS_ES_1");
    }

    #[test]
    fn component_ids_lowercase_and_fold() {
        assert_eq!(component_id("Kafka-Receiver"), "kafka_receiver");
    }

    #[test]
    fn writer_indents_blocks() {
        let mut w = ConfWriter::new();
        w.line("<match **>");
        w.indent();
        w.lines("@type relabel\n@label @X");
        w.outdent();
        w.line("</match>");
        assert_eq!(
            w.into_string(),
            "<match **>\n  @type relabel\n  @label @X\n</match>\n"
        );
    }

    #[test]
    fn make_inputs_renders_toml_array() {
        assert_eq!(
            make_inputs(&["a".to_string(), "b".to_string()]),
            "[\"a\",\"b\"]"
        );
    }
}
