//! VRL programs normalizing raw sources into the ViaQ record shape.

/// Cluster identity stamped on every record.
pub const CLUSTER_ID: &str = r#".openshift.cluster_id = "${OPENSHIFT_CLUSTER_ID:-}""#;

/// Severity derivation for records that did not carry an explicit level.
/// Structured patterns first (klog prefixes, level= tokens), then bare
/// keywords, in decreasing severity order.
pub const FIX_LOG_LEVEL: &str = r#"if !exists(.level) {
  .level = "default"

  # Match on well known structured patterns
  # Order: emergency, alert, critical, error, warn, notice, info, debug

  if match!(.message, r'^EM[0-9]+|level=emergency|Value:emergency|"level":"emergency"') {
    .level = "emergency"
  } else if match!(.message, r'^A[0-9]+|level=alert|Value:alert|"level":"alert"') {
    .level = "alert"
  } else if match!(.message, r'^C[0-9]+|level=critical|Value:critical|"level":"critical"') {
    .level = "critical"
  } else if match!(.message, r'^E[0-9]+|level=error|Value:error|"level":"error"') {
    .level = "error"
  } else if match!(.message, r'^W[0-9]+|level=warn|Value:warn|"level":"warn"') {
    .level = "warn"
  } else if match!(.message, r'^N[0-9]+|level=notice|Value:notice|"level":"notice"') {
    .level = "notice"
  } else if match!(.message, r'^I[0-9]+|level=info|Value:info|"level":"info"') {
    .level = "info"
  } else if match!(.message, r'^D[0-9]+|level=debug|Value:debug|"level":"debug"') {
    .level = "debug"
  }

  # Match on unstructured keywords in same order

  if .level == "default" {
    if match!(.message, r'Emergency|EMERGENCY|<emergency>') {
      .level = "emergency"
    } else if match!(.message, r'Alert|ALERT|<alert>') {
      .level = "alert"
    } else if match!(.message, r'Critical|CRITICAL|<critical>') {
      .level = "critical"
    } else if match!(.message, r'Error|ERROR|<error>') {
      .level = "error"
    } else if match!(.message, r'Warning|WARN|<warn>') {
      .level = "warn"
    } else if match!(.message, r'Notice|NOTICE|<notice>') {
      .level = "notice"
    } else if match!(.message, r'(?i)\b(?:info)\b|<info>') {
      .level = "info"
    } else if match!(.message, r'Debug|DEBUG|<debug>') {
      .level = "debug"
    }
  }
}"#;

/// Records from `eventrouter-*` pods carry a serialized core event; promote
/// it to `kubernetes.event` and surface its message and timestamp.
pub const HANDLE_EVENTROUTER_LOG: &str = r#"pod_name = string!(.kubernetes.pod_name)
if starts_with(pod_name, "eventrouter-") {
  parsed, err = parse_json(.message)
  if err != null {
    log("Unable to process EventRouter log: " + err, level: "info")
  } else {
    ., err = merge(.,parsed)
    if err == null && exists(.event) && is_object(.event) {
        if exists(.verb) {
          .event.verb = .verb
          del(.verb)
        }
        .kubernetes.event = del(.event)
        .message = del(.kubernetes.event.message)
        set!(., ["@timestamp"], .kubernetes.event.metadata.creationTimestamp)
        del(.kubernetes.event.metadata.creationTimestamp)
        . = compact(., nullish: true)
    } else {
      log("Unable to merge EventRouter log message into record: " + err, level: "info")
    }
  }
}"#;

pub const REMOVE_SOURCE_TYPE: &str = "del(.source_type)";
pub const REMOVE_STREAM: &str = "del(.stream)";
pub const REMOVE_POD_IPS: &str = "del(.kubernetes.pod_ips)";
pub const REMOVE_NODE_LABELS: &str = "del(.kubernetes.node_labels)";
pub const REMOVE_TIMESTAMP_END: &str = "del(.timestamp_end)";

/// Rename the source timestamp to the ViaQ field.
pub const FIX_TIMESTAMP_FIELD: &str =
    "ts = del(.timestamp); if !exists(.\"@timestamp\") {.\"@timestamp\" = ts}";

pub const FIX_HOSTNAME: &str = r#".hostname = get_env_var("VECTOR_SELF_NODE_NAME") ?? """#;

/// linux auditd envelope: `type=<T> msg=audit(<secs.millis>:<serial>): ...`
pub const PARSE_HOST_AUDIT_LOGS: &str = r#"match1 = parse_regex(.message, r'type=(?P<type>[^ ]+)') ?? {}
envelop = {}
envelop |= {"type": match1.type}

match2, err = parse_regex(.message, r'msg=audit\((?P<ts_record>[^ ]+)\):')
if err == null {
  sp = split(match2.ts_record,":")
  if length(sp) == 2 {
      ts = parse_timestamp(sp[0],"%s.%3f") ?? ""
      envelop |= {"record_id": sp[1]}
      . |= {"audit.linux" : envelop}
      . |= {"@timestamp" : format_timestamp(ts,"%+") ?? ""}
  }
} else {
  log("could not parse host audit msg. err=" + err, rate_limit_secs: 0)
}"#;

/// Structured audit events arrive as one JSON document per line.
pub const PARSE_AND_FLATTEN: &str = ". = merge(., parse_json!(string!(.message))) ?? .\ndel(.message)";

pub const FIX_K8S_AUDIT_LEVEL: &str = ".k8s_audit_level = .level";
pub const FIX_OPENSHIFT_AUDIT_LEVEL: &str = ".openshift_audit_level = .level";
pub const ADD_DEFAULT_LOG_LEVEL: &str = r#".level = "default""#;

pub const ADD_HOST_AUDIT_TAG: &str = r#".tag = ".linux-audit.log""#;
pub const ADD_K8S_AUDIT_TAG: &str = r#".tag = ".k8s-audit.log""#;
pub const ADD_OPENSHIFT_AUDIT_TAG: &str = r#".tag = ".openshift-audit.log""#;
pub const ADD_OVN_AUDIT_TAG: &str = r#".tag = ".ovn-audit.log""#;

/// Folds `.` and `/` in kubernetes label keys to `_` before sinks that
/// address fields by label key.
pub const DEDOT_LABELS: &str = r#".openshift.sequence = to_unix_timestamp(now(), unit: "nanoseconds")
if exists(.kubernetes.namespace_labels) {
    for_each(object!(.kubernetes.namespace_labels)) -> |key,value| {
      newkey = replace(key, r'[\./]', "_")
      .kubernetes.namespace_labels = set!(.kubernetes.namespace_labels,[newkey],value)
      if newkey != key {
        .kubernetes.namespace_labels = remove!(.kubernetes.namespace_labels,[key],true)
      }
    }
}
if exists(.kubernetes.labels) {
    for_each(object!(.kubernetes.labels)) -> |key,value| {
      newkey = replace(key, r'[\./]', "_")
      .kubernetes.labels = set!(.kubernetes.labels,[newkey],value)
      if newkey != key {
        .kubernetes.labels = remove!(.kubernetes.labels,[key],true)
      }
    }
}"#;

/// OTEL record shape for http sinks in schema-preview mode.
pub const OTEL_TRANSFORM: &str = r#"# Tech preview, OTEL for application logs only
if .log_type == "application" {
  # Convert @timestamp to nano and delete @timestamp
  .timeUnixNano = to_unix_timestamp!(to_timestamp(del(."@timestamp")), unit:"nanoseconds")
  .severityText = del(.level)
  # Convert syslog severity keyword to number, default to 9 (unknown)
  .severityNumber = to_syslog_severity(.severityText) ?? 9
  # resources
  .resources.logs.file.path = del(.file)
  .resources.host.name = del(.hostname)
  .resources.container.name = del(.kubernetes.container_name)
  .resources.container.id = del(.kubernetes.container_id)
  # split image name and tag into separate fields
  container_image_slice = split!(.kubernetes.container_image, ":", limit: 2)
  if null != container_image_slice[0] { .resources.container.image.name = container_image_slice[0] }
  if null != container_image_slice[1] { .resources.container.image.tag = container_image_slice[1] }
  del(.kubernetes.container_image)
  # kubernetes
  .resources.k8s.pod.name = del(.kubernetes.pod_name)
  .resources.k8s.pod.uid = del(.kubernetes.pod_id)
  .resources.k8s.pod.ip = del(.kubernetes.pod_ip)
  .resources.k8s.pod.owner = .kubernetes.pod_owner
  .resources.k8s.pod.annotations = del(.kubernetes.annotations)
  .resources.k8s.pod.labels = del(.kubernetes.labels)
  .resources.k8s.namespace.id = del(.kubernetes.namespace_id)
  .resources.k8s.namespace.name = .kubernetes.namespace_labels."kubernetes.io/metadata.name"
  .resources.k8s.namespace.labels = del(.kubernetes.namespace_labels)
  .resources.attributes.log_type = del(.log_type)
}"#;

/// Joins VRL fragments with blank separation, trimming stray indentation.
pub fn join_vrl(fragments: &[&str]) -> String {
    fragments
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
