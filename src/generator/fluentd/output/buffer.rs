//! fluentd `<buffer>` blocks, with the delivery/retry tuning mapped onto
//! the native buffering directives.

use crate::crd::{DeliveryMode, OutputType, TuningSpec};
use crate::generator::composer::OutputIR;
use crate::generator::helpers::ConfWriter;

const DEFAULT_RETRY_WAIT: &str = "1s";
const DEFAULT_RETRY_MAX_INTERVAL: &str = "60s";
const DEFAULT_RETRY_TIMEOUT: &str = "60m";

/// Renders the buffer block for one store. `chunk_keys` become the buffer
/// chunk keys (syslog key expressions, kafka topic).
pub fn write_buffer(w: &mut ConfWriter, chunk_keys: &[String], store_id: &str, out: &OutputIR) {
    let tuning = out.tuning.as_ref();
    if chunk_keys.is_empty() {
        w.line("<buffer>");
    } else {
        w.line(&format!("<buffer {}>", chunk_keys.join(",")));
    }
    w.indent();
    match tuning.and_then(|t| t.delivery) {
        Some(DeliveryMode::AtMostOnce) => {
            w.line("@type memory");
        }
        _ => {
            w.line("@type file");
            w.line(&format!("path '/var/lib/fluentd/{store_id}'"));
        }
    }
    w.line("flush_mode interval");
    let flush_interval = match out.spec.output_type {
        OutputType::FluentdForward => "5s",
        _ => "1s",
    };
    w.line(&format!("flush_interval {flush_interval}"));
    w.line("flush_thread_count 2");
    w.line("retry_type exponential_backoff");
    w.line(&format!("retry_wait {}", min_retry(tuning)));
    w.line(&format!("retry_max_interval {}", max_retry(tuning)));
    w.line(&format!("retry_timeout {DEFAULT_RETRY_TIMEOUT}"));
    w.line("queued_chunks_limit_size \"#{ENV['BUFFER_QUEUE_LIMIT'] || '32'}\"");
    w.line("total_limit_size \"#{ENV['TOTAL_LIMIT_SIZE_PER_BUFFER'] || '8589934592'}\"");
    match tuning.and_then(|t| t.max_write.as_deref()) {
        Some(max_write) => w.line(&format!("chunk_limit_size {max_write}")),
        None => w.line("chunk_limit_size \"#{ENV['BUFFER_SIZE_LIMIT'] || '8m'}\""),
    }
    let overflow = match tuning.and_then(|t| t.delivery) {
        Some(DeliveryMode::AtMostOnce) => "drop_oldest_chunk",
        _ => "block",
    };
    w.line(&format!("overflow_action {overflow}"));
    w.line("disable_chunk_backup true");
    w.outdent();
    w.line("</buffer>");
}

fn min_retry(tuning: Option<&TuningSpec>) -> String {
    tuning
        .and_then(|t| t.min_retry_duration.clone())
        .unwrap_or_else(|| DEFAULT_RETRY_WAIT.to_string())
}

fn max_retry(tuning: Option<&TuningSpec>) -> String {
    tuning
        .and_then(|t| t.max_retry_duration.clone())
        .unwrap_or_else(|| DEFAULT_RETRY_MAX_INTERVAL.to_string())
}
