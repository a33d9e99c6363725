//! Shared builders for the generator tests.
#![allow(dead_code)]

use std::collections::BTreeMap;

use log_forwarder_operator::crd::*;
use log_forwarder_operator::generator::secrets::{SecretData, SecretMap};

pub fn output(name: &str, output_type: OutputType, url: Option<&str>) -> OutputSpec {
    OutputSpec {
        name: name.to_string(),
        output_type,
        url: url.map(String::from),
        elasticsearch: None,
        fluentd_forward: None,
        loki: None,
        kafka: None,
        syslog: None,
        cloudwatch: None,
        splunk: None,
        http: None,
        google_cloud_logging: None,
        azure_monitor: None,
        tls: None,
        secret: None,
        tuning: None,
    }
}

pub fn pipeline(name: &str, input_refs: &[&str], output_refs: &[&str]) -> PipelineSpec {
    PipelineSpec {
        name: name.to_string(),
        input_refs: input_refs.iter().map(ToString::to_string).collect(),
        filter_refs: vec![],
        output_refs: output_refs.iter().map(ToString::to_string).collect(),
        labels: None,
        parse: None,
        detect_multiline_errors: false,
    }
}

pub fn spec(outputs: Vec<OutputSpec>, pipelines: Vec<PipelineSpec>) -> ClusterLogForwarderSpec {
    ClusterLogForwarderSpec {
        inputs: vec![],
        outputs,
        filters: vec![],
        pipelines,
        service_account_name: None,
    }
}

pub fn secrets(name: &str, keys: &[(&str, &str)]) -> SecretMap {
    let mut data = SecretData::new();
    for (k, v) in keys {
        data.insert((*k).to_string(), v.as_bytes().to_vec());
    }
    let mut map = SecretMap::new();
    map.insert(name.to_string(), data);
    map
}

pub fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}
