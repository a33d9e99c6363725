//! Google Cloud Logging sink.

use crate::constants;
use crate::generator::composer::OutputIR;
use crate::generator::helpers::{component_id, make_inputs, ConfWriter};
use crate::generator::vector::elements::{batch_block, buffer_block, request_block, tls_block};

pub(super) fn render(w: &mut ConfWriter, out: &OutputIR, inputs: &[String]) {
    let id = component_id(&out.spec.name);
    let dedot_id = super::dedot(w, out, inputs);
    let gcl = out.spec.google_cloud_logging.clone().unwrap_or_default();
    let secret_name = out.spec.secret.as_ref().map(|s| s.name.as_str()).unwrap_or_default();

    w.line(&format!("[sinks.{id}]"));
    w.line("type = \"gcp_stackdriver_logs\"");
    w.line(&format!("inputs = {}", make_inputs(&[dedot_id])));
    if let Some(billing) = gcl.billing_account_id.as_deref() {
        w.line(&format!("billing_account_id = \"{billing}\""));
    } else if let Some(org) = gcl.organization_id.as_deref() {
        w.line(&format!("organization_id = \"{org}\""));
    } else if let Some(folder) = gcl.folder_id.as_deref() {
        w.line(&format!("folder_id = \"{folder}\""));
    } else if let Some(project) = gcl.project_id.as_deref() {
        w.line(&format!("project_id = \"{project}\""));
    }
    w.line(&format!(
        "credentials_path = \"{}\"",
        constants::secret_path(secret_name, constants::GOOGLE_APPLICATION_CREDENTIALS_KEY)
    ));
    w.line(&format!(
        "log_id = \"{}\"",
        gcl.log_id.as_deref().unwrap_or_default()
    ));
    w.line("severity_key = \"level\"");
    w.blank();
    w.line(&format!("[sinks.{id}.resource]"));
    w.line("type = \"k8s_node\"");
    w.line("node_name = \"{{hostname}}\"");
    w.blank();
    buffer_block(w, &id, out);
    request_block(w, &id, out);
    batch_block(w, &id, out);
    tls_block(w, &id, out);
}
