//! Azure Monitor Log Analytics store, signing requests with the workspace
//! shared key from the `shared_key` secret.

use crate::constants;
use crate::generator::composer::OutputIR;
use crate::generator::helpers::{component_id, ConfWriter};

use super::{dedot_filter, read_secret_stripped, write_buffer};

pub(super) fn render(w: &mut ConfWriter, out: &OutputIR) {
    dedot_filter(w);
    w.blank();

    let azure = out.spec.azure_monitor.clone().unwrap_or_default();
    let secret_name = out.spec.secret.as_ref().map(|s| s.name.as_str()).unwrap_or_default();
    let store_id = component_id(&out.spec.name);

    w.line("<match **>");
    w.indent();
    w.line("@type azure-loganalytics");
    w.line(&format!("@id {store_id}"));
    w.line(&format!(
        "customer_id {}",
        azure.customer_id.as_deref().unwrap_or_default()
    ));
    w.line(&format!(
        "shared_key {}",
        read_secret_stripped(&constants::secret_path(secret_name, constants::SHARED_KEY))
    ));
    w.line(&format!(
        "log_type {}",
        azure.log_type.as_deref().unwrap_or_default()
    ));
    if let Some(resource_id) = azure.azure_resource_id.as_deref() {
        w.line(&format!("azure_resource_id {resource_id}"));
    }
    if let Some(host) = azure.host.as_deref() {
        w.line(&format!("endpoint {host}"));
    }
    write_buffer(w, &[], &store_id, out);
    w.outdent();
    w.line("</match>");
}
