//! Prints the ClusterLogForwarder CRD as YAML, for inclusion in manifests.

use kube::CustomResourceExt;

use log_forwarder_operator::crd::ClusterLogForwarder;

fn main() {
    match serde_yaml::to_string(&ClusterLogForwarder::crd()) {
        Ok(yaml) => print!("{yaml}"),
        Err(e) => {
            eprintln!("failed to render CRD: {e}");
            std::process::exit(1);
        }
    }
}
