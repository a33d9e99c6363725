//! vector source tables and the raw-to-normalized transform chain.

use crate::crd::{HttpReceiverFormat, ReceiverSpec, ReceiverType};
use crate::generator::composer::{SourceTypes, Topology};
use crate::generator::helpers::ConfWriter;
use crate::generator::vector::elements::remap;
use crate::generator::vector::normalize as vrl;

pub fn sources(w: &mut ConfWriter, topology: &Topology) {
    let types = &topology.source_types;
    if types.containers() {
        w.lines(
            r#"# Logs from containers (including openshift containers)
[sources.raw_container_logs]
type = "kubernetes_logs"
auto_partial_merge = true
include_paths_glob_patterns = ["/var/log/pods/*/*/*.log"]
exclude_paths_glob_patterns = ["/var/log/pods/openshift-logging_collector-*/*/*.log", "/var/log/pods/openshift-logging_elasticsearch-*/*/*.log", "/var/log/pods/openshift-logging_kibana-*/*/*.log", "/var/log/pods/*/*/*.gz", "/var/log/pods/*/*/*.tmp"]
pod_annotation_fields.pod_labels = "kubernetes.labels"
pod_annotation_fields.pod_namespace = "kubernetes.namespace_name"
pod_annotation_fields.pod_annotations = "kubernetes.annotations"
pod_annotation_fields.pod_uid = "kubernetes.pod_id"
pod_annotation_fields.pod_node_name = "hostname""#,
        );
        w.blank();
    }
    if types.infrastructure {
        w.lines(
            r#"# Logs from linux journal
[sources.raw_journal_logs]
type = "journald"
journal_directory = "/var/log/journal""#,
        );
        w.blank();
    }
    if types.audit {
        w.lines(
            r#"# Logs from host audit
[sources.raw_host_audit_logs]
type = "file"
ignore_older_secs = 600
include = ["/var/log/audit/audit.log"]
host_key = "hostname"
glob_minimum_cooldown_ms = 15000

# Logs from kubernetes audit
[sources.raw_k8s_audit_logs]
type = "file"
ignore_older_secs = 600
include = ["/var/log/kube-apiserver/audit.log"]
host_key = "hostname"
glob_minimum_cooldown_ms = 15000

# Logs from openshift audit
[sources.raw_openshift_audit_logs]
type = "file"
ignore_older_secs = 600
include = ["/var/log/oauth-apiserver/audit.log","/var/log/openshift-apiserver/audit.log"]
host_key = "hostname"
glob_minimum_cooldown_ms = 15000

# Logs from ovn audit
[sources.raw_ovn_audit_logs]
type = "file"
ignore_older_secs = 600
include = ["/var/log/ovn/acl-audit-log.log"]
host_key = "hostname"
glob_minimum_cooldown_ms = 15000"#,
        );
        w.blank();
    }
    receivers(w, topology);
    w.lines(
        r#"[sources.internal_metrics]
type = "internal_metrics""#,
    );
    w.blank();
}

fn receivers(w: &mut ConfWriter, topology: &Topology) {
    for (name, receiver) in &topology.receivers {
        match receiver.receiver_type {
            ReceiverType::Http => http_receiver(w, name, receiver),
            ReceiverType::Syslog => syslog_receiver(w, name, receiver),
        }
    }
}

fn http_receiver(w: &mut ConfWriter, name: &str, receiver: &ReceiverSpec) {
    let id = crate::generator::helpers::component_id(name);
    w.line(&format!("[sources.{id}]"));
    w.line("type = \"http_server\"");
    w.line(&format!("address = \"[::]:{}\"", receiver.port()));
    w.line("decoding.codec = \"json\"");
    w.blank();
    w.line(&format!("[sources.{id}.tls]"));
    w.line("enabled = true");
    w.line(&format!("key_file = \"/etc/collector/{name}/tls.key\""));
    w.line(&format!("crt_file = \"/etc/collector/{name}/tls.crt\""));
    w.blank();
    // Audit webhooks batch events in an `items` array; unroll them so each
    // event is one record.
    let format_is_audit = receiver
        .http
        .as_ref()
        .map(|h| h.format == HttpReceiverFormat::KubeAPIAudit)
        .unwrap_or(false);
    w.line(&format!("[transforms.{id}_split]"));
    w.line("type = \"remap\"");
    w.line(&format!("inputs = [\"{id}\"]"));
    w.line("source = '''");
    w.line("  if exists(.items) && is_array(.items) {. = unnest!(.items)} else {.}");
    w.line("'''");
    w.blank();
    w.line(&format!("[transforms.{id}_items]"));
    w.line("type = \"remap\"");
    w.line(&format!("inputs = [\"{id}_split\"]"));
    w.line("source = '''");
    w.line("  if exists(.items) {. = .items} else {.}");
    w.line("'''");
    w.blank();
    if format_is_audit {
        remap(
            w,
            None,
            &format!("{id}_normalized"),
            &[format!("{id}_items")],
            &vrl::join_vrl(&[
                vrl::CLUSTER_ID,
                ".log_type = \"audit\"",
                vrl::FIX_HOSTNAME,
                vrl::FIX_TIMESTAMP_FIELD,
            ]),
        );
    } else {
        remap(
            w,
            None,
            &format!("{id}_normalized"),
            &[format!("{id}_items")],
            &vrl::join_vrl(&[vrl::CLUSTER_ID, vrl::FIX_TIMESTAMP_FIELD]),
        );
    }
}

fn syslog_receiver(w: &mut ConfWriter, name: &str, receiver: &ReceiverSpec) {
    let id = crate::generator::helpers::component_id(name);
    w.line(&format!("[sources.{id}]"));
    w.line("type = \"syslog\"");
    w.line(&format!("address = \"[::]:{}\"", receiver.port()));
    w.line("mode = \"tcp\"");
    w.blank();
    remap(
        w,
        None,
        &format!("{id}_normalized"),
        &[id.clone()],
        &vrl::join_vrl(&[vrl::CLUSTER_ID, ".log_type = \"infrastructure\"", vrl::FIX_TIMESTAMP_FIELD]),
    );
}

/// Normalizes raw sources to the ViaQ shape.
pub fn normalize(w: &mut ConfWriter, types: &SourceTypes) {
    if types.containers() {
        remap(
            w,
            None,
            "container_logs",
            &["raw_container_logs".to_string()],
            &vrl::join_vrl(&[
                vrl::CLUSTER_ID,
                vrl::FIX_LOG_LEVEL,
                vrl::HANDLE_EVENTROUTER_LOG,
                vrl::REMOVE_SOURCE_TYPE,
                vrl::REMOVE_STREAM,
                vrl::REMOVE_POD_IPS,
                vrl::REMOVE_NODE_LABELS,
                vrl::REMOVE_TIMESTAMP_END,
                vrl::FIX_TIMESTAMP_FIELD,
            ]),
        );
    }
    if types.infrastructure {
        w.lines(
            r#"# Filter out PRIORITY 7 (debug) journal logs
[transforms.drop_journal_logs]
type = "filter"
inputs = ["raw_journal_logs"]
condition = ".PRIORITY != \"7\" && .PRIORITY != 7""#,
        );
        w.blank();
        remap(
            w,
            None,
            "journal_logs",
            &["drop_journal_logs".to_string()],
            &journal_vrl(),
        );
    }
    if types.audit {
        remap(
            w,
            None,
            "host_audit_logs",
            &["raw_host_audit_logs".to_string()],
            &vrl::join_vrl(&[
                vrl::CLUSTER_ID,
                vrl::ADD_HOST_AUDIT_TAG,
                vrl::PARSE_HOST_AUDIT_LOGS,
                vrl::ADD_DEFAULT_LOG_LEVEL,
            ]),
        );
        remap(
            w,
            None,
            "k8s_audit_logs",
            &["raw_k8s_audit_logs".to_string()],
            &vrl::join_vrl(&[
                vrl::CLUSTER_ID,
                vrl::ADD_K8S_AUDIT_TAG,
                vrl::PARSE_AND_FLATTEN,
                vrl::FIX_K8S_AUDIT_LEVEL,
            ]),
        );
        remap(
            w,
            None,
            "openshift_audit_logs",
            &["raw_openshift_audit_logs".to_string()],
            &vrl::join_vrl(&[
                vrl::CLUSTER_ID,
                vrl::ADD_OPENSHIFT_AUDIT_TAG,
                vrl::PARSE_AND_FLATTEN,
                vrl::FIX_OPENSHIFT_AUDIT_LEVEL,
            ]),
        );
        remap(
            w,
            None,
            "ovn_audit_logs",
            &["raw_ovn_audit_logs".to_string()],
            &vrl::join_vrl(&[vrl::CLUSTER_ID, vrl::ADD_OVN_AUDIT_TAG, vrl::FIX_LOG_LEVEL]),
        );
    }
}

/// Journal records: normalize systemd metadata under `.systemd.{t,u}`,
/// keep the collector self-description consistent with container logs.
fn journal_vrl() -> String {
    vrl::join_vrl(&[
        vrl::CLUSTER_ID,
        r#".tag = ".journal.system"

del(.source_type)
del(._CPU_USAGE_NSEC)
del(.__REALTIME_TIMESTAMP)
del(.__MONOTONIC_TIMESTAMP)
del(.PRIORITY)
del(.JOB_RESULT)
del(.JOB_TYPE)
del(.TIMESTAMP_BOOTTIME)
del(.TIMESTAMP_MONOTONIC)

if .PRIORITY == "8" || .PRIORITY == 8 {
  .level = "trace"
} else {
  priority = to_int!(.PRIORITY)
  .level, err = to_syslog_level(priority)
  if err != null {
    log("Unable to determine level from PRIORITY: " + err, level: "error")
    log(., level: "error")
    .level = "unknown"
  } else {
    del(.PRIORITY)
  }
}

.hostname = del(.host)

# systemd's kernel-specific metadata.
# .systemd.k = {}
if exists(.KERNEL_DEVICE) { .systemd.k.KERNEL_DEVICE = del(.KERNEL_DEVICE) }
if exists(.KERNEL_SUBSYSTEM) { .systemd.k.KERNEL_SUBSYSTEM = del(.KERNEL_SUBSYSTEM) }
if exists(.UDEV_DEVLINK) { .systemd.k.UDEV_DEVLINK = del(.UDEV_DEVLINK) }
if exists(.UDEV_DEVNODE) { .systemd.k.UDEV_DEVNODE = del(.UDEV_DEVNODE) }
if exists(.UDEV_SYSNAME) { .systemd.k.UDEV_SYSNAME = del(.UDEV_SYSNAME) }

# trusted journal fields, fields that are implicitly added by the journal and cannot be altered by client code.
.systemd.t = {}
if exists(._AUDIT_LOGINUID) { .systemd.t.AUDIT_LOGINUID = del(._AUDIT_LOGINUID) }
if exists(._BOOT_ID) { .systemd.t.BOOT_ID = del(._BOOT_ID) }
if exists(._AUDIT_SESSION) { .systemd.t.AUDIT_SESSION = del(._AUDIT_SESSION) }
if exists(._CAP_EFFECTIVE) { .systemd.t.CAP_EFFECTIVE = del(._CAP_EFFECTIVE) }
if exists(._CMDLINE) { .systemd.t.CMDLINE = del(._CMDLINE) }
if exists(._COMM) { .systemd.t.COMM = del(._COMM) }
if exists(._EXE) { .systemd.t.EXE = del(._EXE) }
if exists(._GID) { .systemd.t.GID = del(._GID) }
if exists(._HOSTNAME) { .systemd.t.HOSTNAME = .hostname }
if exists(._MACHINE_ID) { .systemd.t.MACHINE_ID = del(._MACHINE_ID) }
if exists(._PID) { .systemd.t.PID = del(._PID) }
if exists(._SELINUX_CONTEXT) { .systemd.t.SELINUX_CONTEXT = del(._SELINUX_CONTEXT) }
if exists(._SOURCE_REALTIME_TIMESTAMP) { .systemd.t.SOURCE_REALTIME_TIMESTAMP = del(._SOURCE_REALTIME_TIMESTAMP) }
if exists(._SYSTEMD_CGROUP) { .systemd.t.SYSTEMD_CGROUP = del(._SYSTEMD_CGROUP) }
if exists(._SYSTEMD_INVOCATION_ID) {.systemd.t.SYSTEMD_INVOCATION_ID = .SYSTEMD_INVOCATION_ID}
if exists(._SYSTEMD_SLICE) { .systemd.t.SYSTEMD_SLICE = del(._SYSTEMD_SLICE) }
if exists(._SYSTEMD_UNIT) { .systemd.t.SYSTEMD_UNIT = del(._SYSTEMD_UNIT) }
if exists(._SYSTEMD_USER_UNIT) { .systemd.t.SYSTEMD_USER_UNIT = del(._SYSTEMD_USER_UNIT) }
if exists(._TRANSPORT) { .systemd.t.TRANSPORT = del(._TRANSPORT) }
if exists(._UID) { .systemd.t.UID = del(._UID) }

# fields that are directly passed from clients and stored in the journal.
.systemd.u = {}
if exists(.CODE_FILE) { .systemd.u.CODE_FILE = del(.CODE_FILE) }
if exists(.CODE_FUNC) { .systemd.u.CODE_FUNCTION = del(.CODE_FUNC) }
if exists(.CODE_LINE) { .systemd.u.CODE_LINE = del(.CODE_LINE) }
if exists(.ERRNO) { .systemd.u.ERRNO = del(.ERRNO) }
if exists(.MESSAGE_ID) { .systemd.u.MESSAGE_ID = del(.MESSAGE_ID) }
if exists(.SYSLOG_FACILITY) { .systemd.u.SYSLOG_FACILITY = del(.SYSLOG_FACILITY) }
if exists(.SYSLOG_IDENTIFIER) { .systemd.u.SYSLOG_IDENTIFIER = del(.SYSLOG_IDENTIFIER) }
if exists(.SYSLOG_PID) { .systemd.u.SYSLOG_PID = del(.SYSLOG_PID) }
if exists(.RESULT) { .systemd.u.RESULT = del(.RESULT) }
if exists(.UNIT) { .systemd.u.UNIT = del(.UNIT) }"#,
        vrl::FIX_TIMESTAMP_FIELD,
    ])
}
