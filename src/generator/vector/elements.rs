//! Small writers for the recurring vector table shapes.

use crate::generator::composer::OutputIR;
use crate::generator::helpers::{make_inputs, ConfWriter};

/// Writes one remap transform.
pub fn remap(w: &mut ConfWriter, desc: Option<&str>, id: &str, inputs: &[String], vrl: &str) {
    if let Some(desc) = desc {
        w.line(&format!("# {desc}"));
    }
    w.line(&format!("[transforms.{id}]"));
    w.line("type = \"remap\"");
    w.line(&format!("inputs = {}", make_inputs(inputs)));
    w.line("source = '''");
    w.lines(vrl.trim_end());
    w.line("'''");
    w.blank();
}

/// Writes a remap transform that drops events aborting the program.
pub fn remap_drop_on_abort(w: &mut ConfWriter, desc: Option<&str>, id: &str, inputs: &[String], vrl: &str) {
    if let Some(desc) = desc {
        w.line(&format!("# {desc}"));
    }
    w.line(&format!("[transforms.{id}]"));
    w.line("type = \"remap\"");
    w.line(&format!("inputs = {}", make_inputs(inputs)));
    w.line("drop_on_abort = true");
    w.line("source = '''");
    w.lines(vrl.trim_end());
    w.line("'''");
    w.blank();
}

/// Writes a filter transform keeping records that satisfy the condition.
/// The condition is framed as a TOML multi-line literal so embedded VRL
/// regex literals survive verbatim.
pub fn filter(w: &mut ConfWriter, desc: Option<&str>, id: &str, inputs: &[String], condition: &str) {
    if let Some(desc) = desc {
        w.line(&format!("# {desc}"));
    }
    w.line(&format!("[transforms.{id}]"));
    w.line("type = \"filter\"");
    w.line(&format!("inputs = {}", make_inputs(inputs)));
    w.line(&format!("condition = '''{condition}'''"));
    w.blank();
}

/// Writes the `[sinks.<id>.tls]` table when the output carries TLS
/// parameters.
pub fn tls_block(w: &mut ConfWriter, id: &str, out: &OutputIR) {
    let tls = &out.security.tls;
    if tls.is_empty() {
        return;
    }
    w.line(&format!("[sinks.{id}.tls]"));
    if let Some(version) = &tls.min_version {
        w.line(&format!("min_tls_version = \"{version}\""));
    }
    if let Some(ciphers) = &tls.ciphers {
        w.line(&format!("ciphersuites = \"{ciphers}\""));
    }
    if tls.insecure_skip_verify {
        w.line("verify_certificate = false");
        w.line("verify_hostname = false");
    }
    if let (Some(key), Some(cert)) = (&tls.key_path, &tls.cert_path) {
        w.line(&format!("key_file = \"{key}\""));
        w.line(&format!("crt_file = \"{cert}\""));
    }
    if let Some(ca) = &tls.ca_path {
        w.line(&format!("ca_file = \"{ca}\""));
    }
    if let Some(passphrase) = &tls.passphrase {
        w.line(&format!("key_pass = \"{passphrase}\""));
    }
    w.blank();
}

/// Writes `[sinks.<id>.buffer]` honoring the delivery tuning: at-least-once
/// blocks on a disk buffer, at-most-once sheds the newest records.
pub fn buffer_block(w: &mut ConfWriter, id: &str, out: &OutputIR) {
    use crate::crd::DeliveryMode;
    let Some(delivery) = out.tuning.as_ref().and_then(|t| t.delivery) else {
        return;
    };
    w.line(&format!("[sinks.{id}.buffer]"));
    match delivery {
        DeliveryMode::AtLeastOnce => {
            w.line("type = \"disk\"");
            w.line("max_size = 268435488");
            w.line("when_full = \"block\"");
        }
        DeliveryMode::AtMostOnce => {
            w.line("when_full = \"drop_newest\"");
        }
    }
    w.blank();
}

/// Writes `[sinks.<id>.request]` for the retry tuning window.
pub fn request_block(w: &mut ConfWriter, id: &str, out: &OutputIR) {
    let tuning = out.tuning.as_ref();
    let min = tuning.and_then(|t| t.min_retry_duration.as_deref());
    let max = tuning.and_then(|t| t.max_retry_duration.as_deref());
    if min.is_none() && max.is_none() {
        return;
    }
    w.line(&format!("[sinks.{id}.request]"));
    if let Some(min) = min {
        w.line(&format!(
            "retry_initial_backoff_secs = {}",
            duration_secs(min)
        ));
    }
    if let Some(max) = max {
        w.line(&format!("retry_max_duration_secs = {}", duration_secs(max)));
    }
    w.blank();
}

/// Writes `[sinks.<id>.batch]` when a max-write size is tuned.
pub fn batch_block(w: &mut ConfWriter, id: &str, out: &OutputIR) {
    let Some(max_write) = out.tuning.as_ref().and_then(|t| t.max_write.as_deref()) else {
        return;
    };
    w.line(&format!("[sinks.{id}.batch]"));
    w.line(&format!("max_bytes = {}", byte_size(max_write)));
    w.blank();
}

/// `10s`/`5m`-style durations to whole seconds; bare numbers pass through.
pub fn duration_secs(value: &str) -> u64 {
    let value = value.trim();
    if let Some(stripped) = value.strip_suffix('s') {
        return stripped.parse().unwrap_or(0);
    }
    if let Some(stripped) = value.strip_suffix('m') {
        return stripped.parse::<u64>().map(|m| m * 60).unwrap_or(0);
    }
    if let Some(stripped) = value.strip_suffix('h') {
        return stripped.parse::<u64>().map(|h| h * 3600).unwrap_or(0);
    }
    value.parse().unwrap_or(0)
}

/// `8m`/`256k`-style sizes to bytes; bare numbers pass through.
pub fn byte_size(value: &str) -> u64 {
    let value = value.trim();
    let (digits, multiplier) = match value.chars().last() {
        Some('k' | 'K') => (&value[..value.len() - 1], 1024),
        Some('m' | 'M') => (&value[..value.len() - 1], 1024 * 1024),
        Some('g' | 'G') => (&value[..value.len() - 1], 1024 * 1024 * 1024),
        _ => (value, 1),
    };
    digits.parse::<u64>().map(|n| n * multiplier).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_and_sizes_parse() {
        assert_eq!(duration_secs("30s"), 30);
        assert_eq!(duration_secs("5m"), 300);
        assert_eq!(duration_secs("2h"), 7200);
        assert_eq!(byte_size("8m"), 8 * 1024 * 1024);
        assert_eq!(byte_size("256k"), 256 * 1024);
        assert_eq!(byte_size("42"), 42);
    }
}
