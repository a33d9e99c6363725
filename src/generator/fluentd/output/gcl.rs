//! Google Cloud Logging store. The service-account JSON is mounted from
//! the `google-application-credentials.json` secret key; exactly one parent
//! resource id selects where log entries land.

use crate::constants;
use crate::generator::composer::OutputIR;
use crate::generator::helpers::{component_id, ConfWriter};

use super::{dedot_filter, write_buffer};

pub(super) fn render(w: &mut ConfWriter, out: &OutputIR) {
    dedot_filter(w);
    w.blank();

    let gcl = out.spec.google_cloud_logging.clone().unwrap_or_default();
    let secret_name = out.spec.secret.as_ref().map(|s| s.name.as_str()).unwrap_or_default();
    let store_id = component_id(&out.spec.name);

    w.line("<match **>");
    w.indent();
    w.line("@type google_cloud");
    w.line(&format!("@id {store_id}"));
    w.line("use_metadata_service false");
    w.line(&format!(
        "credentials_json_path '{}'",
        constants::secret_path(secret_name, constants::GOOGLE_APPLICATION_CREDENTIALS_KEY)
    ));
    if let Some(project) = gcl.project_id.as_deref() {
        w.line(&format!("project_id {project}"));
    } else if let Some(billing) = gcl.billing_account_id.as_deref() {
        w.line(&format!("billing_account_id {billing}"));
    } else if let Some(org) = gcl.organization_id.as_deref() {
        w.line(&format!("organization_id {org}"));
    } else if let Some(folder) = gcl.folder_id.as_deref() {
        w.line(&format!("folder_id {folder}"));
    }
    if let Some(log_id) = gcl.log_id.as_deref() {
        w.line(&format!("log_name {log_id}"));
    }
    w.line("detect_json true");
    w.line("<format>");
    w.indent();
    w.line("@type json");
    w.outdent();
    w.line("</format>");
    write_buffer(w, &[], &store_id, out);
    w.outdent();
    w.line("</match>");
}
