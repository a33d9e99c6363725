//! # fluentd output encoders
//!
//! One encoder per output kind. Each renders the `<label @NAME>` block for
//! its output: kind-specific preparation filters followed by one or more
//! `<match>` store elements.

mod azure_monitor;
mod buffer;
mod cloudwatch;
mod elasticsearch;
mod fluentd_forward;
mod gcl;
mod http;
mod kafka;
mod loki;
mod splunk;
mod syslog;

pub use buffer::write_buffer;

use crate::crd::OutputType;
use crate::generator::composer::OutputIR;
use crate::generator::helpers::ConfWriter;

/// Renders one output's label block.
pub fn render(w: &mut ConfWriter, out: &OutputIR) {
    w.line(&format!("<label @{}>", out.label));
    w.indent();
    match out.spec.output_type {
        OutputType::Cloudwatch => cloudwatch::render(w, out),
        OutputType::Elasticsearch => elasticsearch::render(w, out),
        OutputType::FluentdForward => fluentd_forward::render(w, out),
        OutputType::Kafka => kafka::render(w, out),
        OutputType::Loki => loki::render(w, out),
        OutputType::Syslog => syslog::render(w, out),
        OutputType::Splunk => splunk::render(w, out),
        OutputType::Http => http::render(w, out),
        OutputType::GoogleCloudLogging => gcl::render(w, out),
        OutputType::AzureMonitor => azure_monitor::render(w, out),
    }
    w.outdent();
    w.line("</label>");
    w.blank();
}

/// Label keys with `.` or `/` break downstream field addressing; this
/// filter folds them to `_` in labels, namespace_labels and flat_labels.
pub(super) fn dedot_filter(w: &mut ConfWriter) {
    w.line("#dedot namespace_labels and rebuild message field if present");
    w.lines(
        r#"<filter **>
  @type record_modifier
  <record>
  _dummy_ ${if m=record.dig("kubernetes","namespace_labels");record["kubernetes"]["namespace_labels"]={}.tap{|n|m.each{|k,v|n[k.gsub(/[.\/]/,'_')]=v}};end}
  _dummy2_ ${if m=record.dig("kubernetes","labels");record["kubernetes"]["labels"]={}.tap{|n|m.each{|k,v|n[k.gsub(/[.\/]/,'_')]=v}};end}
  _dummy3_ ${if m=record.dig("kubernetes","flat_labels");record["kubernetes"]["flat_labels"]=[].tap{|n|m.each_with_index{|s, i|n[i] = s.gsub(/[.\/]/,'_')}};end}
  </record>
  remove_keys _dummy_, _dummy2_, _dummy3_
</filter>"#,
    );
}

/// Ruby expression reading a mounted secret file, stripped of whitespace.
pub(super) fn read_secret_stripped(path: &str) -> String {
    format!("\"#{{open('{path}','r') do |f|f.read.strip end}}\"")
}

/// Ruby expression reading a mounted secret file, empty when absent.
pub(super) fn read_secret_or_empty(path: &str) -> String {
    format!("\"#{{File.exists?('{path}') ? open('{path}','r') do |f|f.read end : ''}}\"")
}

/// Ruby expression reading a mounted secret file, nil on failure.
pub(super) fn read_secret_rescue(path: &str) -> String {
    format!("\"#{{File.read('{path}') rescue nil}}\"")
}
