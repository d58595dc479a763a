//! Kubelet flag derivation
//!
//! Turns the contract's raw kubelet flags into the final command-line flag
//! set. Two steps run in order:
//!
//! 1. `validate_and_set_linux_kubelet_flags` strips retired flags and applies
//!    the Kubernetes-version feature-gate rules.
//! 2. `kubelet_config_flags` picks the authoritative source (operator custom
//!    map or computed flags) and drops flags that must not reach the command line.

pub mod feature_gates;

pub use feature_gates::{
    parse_feature_gates, remove_feature_gate, render_feature_gates, set_feature_gate,
    FeatureGates, FEATURE_GATES_FLAG,
};

use crate::contract::constants::DEFAULT_CONTAINER_RUNTIME;
use crate::contract::Contract;
use crate::logging::codes;
use crate::utils::SemanticVersion;
use crate::{log_success, log_warning};
use std::collections::BTreeMap;

/// Flag name to value, ordered by name
pub type KubeletFlagSet = BTreeMap<String, String>;

/// Flags never passed on the kubelet command line
pub const OMITTED_KUBELET_CONFIG_FLAGS: &[&str] = &["--node-status-report-frequency"];

/// Flags removed regardless of runtime
pub const RETIRED_KUBELET_FLAGS: &[&str] = &["--dynamic-config-dir", "--non-masquerade-cidr"];

/// Flags only meaningful with the dockershim runtime
pub const DOCKERSHIM_FLAGS: &[&str] = &[
    "--cni-bin-dir",
    "--cni-cache-dir",
    "--cni-conf-dir",
    "--docker-endpoint",
    "--image-pull-progress-deadline",
    "--network-plugin",
    "--network-plugin-mtu",
];

/// Flags expressed through the kubelet config file when it is enabled
pub const TRANSLATED_KUBELET_CONFIG_FLAGS: &[&str] = &[
    "--address",
    "--anonymous-auth",
    "--client-ca-file",
    "--authentication-token-webhook",
    "--authorization-mode",
    "--pod-manifest-path",
    "--cluster-dns",
    "--cgroups-per-qos",
    "--tls-cert-file",
    "--tls-private-key-file",
    "--tls-cipher-suites",
    "--cluster-domain",
    "--max-pods",
    "--eviction-hard",
    "--node-status-update-frequency",
    "--image-gc-high-threshold",
    "--image-gc-low-threshold",
    "--event-qps",
    "--pod-max-pids",
    "--enforce-node-allocatable",
    "--streaming-connection-idle-timeout",
    "--rotate-certificates",
    "--read-only-port",
    "--feature-gates",
    "--protect-kernel-defaults",
    "--resolv-conf",
    "--system-reserved",
    "--kube-reserved",
];

/// Cluster-wide inputs
#[derive(Debug, Clone, Default)]
pub struct ClusterContext {
    pub kubernetes_version: String,
    /// Operator override; `None` when absent or empty
    pub custom_kubelet_config: Option<KubeletFlagSet>,
}

impl ClusterContext {
    pub fn from_contract(contract: &Contract) -> Self {
        let custom = &contract.kubelet().custom_kubelet_config;
        Self {
            kubernetes_version: contract.kubernetes_version.clone(),
            custom_kubelet_config: (!custom.is_empty()).then(|| custom.clone()),
        }
    }
}

/// Agent-pool inputs
#[derive(Debug, Clone, Default)]
pub struct AgentPoolContext {
    pub container_runtime: String,
    pub kubelet_config_file_enabled: bool,
}

impl AgentPoolContext {
    pub fn from_contract(contract: &Contract) -> Self {
        let runtime = if contract.container_runtime.is_empty() {
            DEFAULT_CONTAINER_RUNTIME.to_string()
        } else {
            contract.container_runtime.clone()
        };

        Self {
            container_runtime: runtime,
            kubelet_config_file_enabled: contract.kubelet().enable_kubelet_config_file,
        }
    }

    fn uses_containerd(&self) -> bool {
        self.container_runtime == DEFAULT_CONTAINER_RUNTIME
    }
}

/// Final kubelet flag set for the given contexts
pub fn compute_kubelet_flags(
    raw_flags: &KubeletFlagSet,
    cluster: &ClusterContext,
    agent_pool: &AgentPoolContext,
) -> KubeletFlagSet {
    let mut flags = raw_flags.clone();
    validate_and_set_linux_kubelet_flags(&mut flags, cluster, agent_pool);
    let result = kubelet_config_flags(&flags, cluster, agent_pool);

    log_success!(
        codes::success::KUBELET_FLAGS_COMPUTED,
        "Kubelet flags computed",
        "count" => result.len(),
        "custom_config" => cluster.custom_kubelet_config.is_some()
    );

    result
}

/// Convenience wrapper reading everything from a contract
pub fn kubelet_flags_for_contract(contract: &Contract) -> KubeletFlagSet {
    compute_kubelet_flags(
        &contract.kubelet().kubelet_flags,
        &ClusterContext::from_contract(contract),
        &AgentPoolContext::from_contract(contract),
    )
}

/// Remove retired flags and apply version-gated feature-gate edits
pub fn validate_and_set_linux_kubelet_flags(
    flags: &mut KubeletFlagSet,
    cluster: &ClusterContext,
    agent_pool: &AgentPoolContext,
) {
    for flag in RETIRED_KUBELET_FLAGS {
        flags.remove(*flag);
    }

    if agent_pool.uses_containerd() {
        for flag in DOCKERSHIM_FLAGS {
            flags.remove(*flag);
        }
    }

    let version = match SemanticVersion::parse(&cluster.kubernetes_version) {
        Some(version) => version,
        None => {
            log_warning!(
                codes::warning::KUBERNETES_VERSION_UNPARSABLE,
                "Kubernetes version is not a semantic version, version-gated rules skipped",
                "kubernetes_version" => cluster.kubernetes_version.as_str()
            );
            SemanticVersion::default()
        }
    };

    let mut gates = flags
        .get(FEATURE_GATES_FLAG)
        .map(|value| parse_feature_gates(value))
        .unwrap_or_default();
    feature_gates::apply_version_rules(&mut gates, &version);

    if gates.is_empty() {
        flags.remove(FEATURE_GATES_FLAG);
    } else {
        flags.insert(FEATURE_GATES_FLAG.to_string(), render_feature_gates(&gates));
    }
}

/// Choose the flag source and drop flags that must stay off the command line
pub fn kubelet_config_flags(
    flags: &KubeletFlagSet,
    cluster: &ClusterContext,
    agent_pool: &AgentPoolContext,
) -> KubeletFlagSet {
    if let Some(custom) = cluster
        .custom_kubelet_config
        .as_ref()
        .filter(|custom| !custom.is_empty())
    {
        let mut result = custom.clone();
        for (key, value) in flags {
            result.entry(key.clone()).or_insert_with(|| value.clone());
        }
        result.retain(|key, _| !is_omitted(key));
        return result;
    }

    flags
        .iter()
        .filter(|(key, _)| {
            let translated = agent_pool.kubelet_config_file_enabled
                && TRANSLATED_KUBELET_CONFIG_FLAGS.contains(&key.as_str());
            !translated && !is_omitted(key)
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn is_omitted(flag: &str) -> bool {
    OMITTED_KUBELET_CONFIG_FLAGS.contains(&flag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(pairs: &[(&str, &str)]) -> KubeletFlagSet {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn cluster(version: &str) -> ClusterContext {
        ClusterContext {
            kubernetes_version: version.to_string(),
            custom_kubelet_config: None,
        }
    }

    fn containerd_pool() -> AgentPoolContext {
        AgentPoolContext {
            container_runtime: "containerd".to_string(),
            kubelet_config_file_enabled: false,
        }
    }

    #[test]
    fn test_feature_gates_at_1_24_2() {
        let raw = flags(&[("--feature-gates", "DynamicKubeletConfig=true,a=b")]);
        let result = compute_kubelet_flags(&raw, &cluster("1.24.2"), &containerd_pool());

        assert_eq!(result.get("--feature-gates").map(String::as_str), Some("a=b"));
    }

    #[test]
    fn test_feature_gates_after_accelerator_window() {
        let raw = flags(&[("--feature-gates", "DynamicKubeletConfig=true,a=b")]);
        let result = compute_kubelet_flags(&raw, &cluster("1.29.0"), &containerd_pool());
        assert_eq!(result.get("--feature-gates").map(String::as_str), Some("a=b"));
    }

    #[test]
    fn test_empty_gate_map_removes_flag() {
        let raw = flags(&[("--feature-gates", "DynamicKubeletConfig=true")]);
        let result = compute_kubelet_flags(&raw, &cluster("1.28.0"), &containerd_pool());
        assert!(!result.contains_key("--feature-gates"));
    }

    #[test]
    fn test_unparsable_version_is_lowest() {
        let raw = flags(&[("--feature-gates", "DynamicKubeletConfig=true")]);
        let result = compute_kubelet_flags(&raw, &cluster("not-a-version"), &containerd_pool());
        assert_eq!(
            result.get("--feature-gates").map(String::as_str),
            Some("DynamicKubeletConfig=true")
        );
    }

    #[test]
    fn test_retired_and_dockershim_flags_removed() {
        let raw = flags(&[
            ("--dynamic-config-dir", "/var/lib/kubelet"),
            ("--non-masquerade-cidr", "10.0.0.0/8"),
            ("--network-plugin", "kubenet"),
            ("--cni-bin-dir", "/opt/cni/bin"),
            ("--max-pods", "30"),
        ]);

        let result = compute_kubelet_flags(&raw, &cluster("1.29.0"), &containerd_pool());
        assert_eq!(result, flags(&[("--max-pods", "30")]));

        let docker_pool = AgentPoolContext {
            container_runtime: "docker".to_string(),
            kubelet_config_file_enabled: false,
        };
        let result = compute_kubelet_flags(&raw, &cluster("1.29.0"), &docker_pool);
        assert!(result.contains_key("--network-plugin"));
        assert!(!result.contains_key("--dynamic-config-dir"));
    }

    #[test]
    fn test_config_file_suppresses_translated_flags() {
        let raw = flags(&[
            ("--max-pods", "30"),
            ("--node-labels", "a=b"),
            ("--node-status-report-frequency", "5m"),
        ]);
        let pool = AgentPoolContext {
            container_runtime: "containerd".to_string(),
            kubelet_config_file_enabled: true,
        };

        let result = compute_kubelet_flags(&raw, &cluster("1.29.0"), &pool);
        assert_eq!(result, flags(&[("--node-labels", "a=b")]));
    }

    #[test]
    fn test_custom_config_is_authoritative() {
        let raw = flags(&[("--max-pods", "30"), ("--v", "2")]);
        let context = ClusterContext {
            kubernetes_version: "1.29.0".to_string(),
            custom_kubelet_config: Some(flags(&[
                ("--max-pods", "110"),
                ("--node-status-report-frequency", "5m"),
            ])),
        };
        let pool = AgentPoolContext {
            container_runtime: "containerd".to_string(),
            kubelet_config_file_enabled: true,
        };

        let result = compute_kubelet_flags(&raw, &context, &pool);
        assert_eq!(result, flags(&[("--max-pods", "110"), ("--v", "2")]));
    }

    #[test]
    fn test_contexts_from_contract() {
        let mut contract = Contract::default();
        let agent_pool = AgentPoolContext::from_contract(&contract);
        assert_eq!(agent_pool.container_runtime, "containerd");
        assert!(ClusterContext::from_contract(&contract)
            .custom_kubelet_config
            .is_none());

        contract.container_runtime = "docker".to_string();
        assert!(!AgentPoolContext::from_contract(&contract).uses_containerd());
    }
}
