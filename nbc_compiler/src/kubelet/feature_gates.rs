//! Feature-gate string handling
//!
//! A gate string is `key=value` pairs joined by `,`. Parsing keeps only
//! well-formed pairs. Rendering always sorts keys, so any edit yields a
//! deterministic string.

use crate::utils::SemanticVersion;
use std::collections::BTreeMap;

pub const FEATURE_GATES_FLAG: &str = "--feature-gates";
pub const DYNAMIC_KUBELET_CONFIG: &str = "DynamicKubeletConfig";
pub const DISABLE_ACCELERATOR_USAGE_METRICS: &str = "DisableAcceleratorUsageMetrics";

const V1_11_0: SemanticVersion = SemanticVersion::new(1, 11, 0);
const V1_20_0: SemanticVersion = SemanticVersion::new(1, 20, 0);
const V1_24_0: SemanticVersion = SemanticVersion::new(1, 24, 0);

/// Ordered gate map; values are kept exactly as written
pub type FeatureGates = BTreeMap<String, String>;

pub fn parse_feature_gates(input: &str) -> FeatureGates {
    input
        .split(',')
        .filter_map(|pair| {
            let parts: Vec<&str> = pair.split('=').collect();
            match parts.as_slice() {
                [key, value] => Some((key.trim().to_string(), value.trim().to_string())),
                _ => None,
            }
        })
        .collect()
}

pub fn render_feature_gates(gates: &FeatureGates) -> String {
    gates
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(",")
}

/// Drop one gate and re-render
pub fn remove_feature_gate(input: &str, key: &str) -> String {
    let mut gates = parse_feature_gates(input);
    gates.remove(key);
    render_feature_gates(&gates)
}

/// Set one gate and re-render
pub fn set_feature_gate(input: &str, key: &str, value: bool) -> String {
    let mut gates = parse_feature_gates(input);
    gates.insert(key.to_string(), value.to_string());
    render_feature_gates(&gates)
}

/// Kubernetes-version-dependent gate edits
pub fn apply_version_rules(gates: &mut FeatureGates, version: &SemanticVersion) {
    if version.at_least(&V1_24_0) {
        gates.remove(DYNAMIC_KUBELET_CONFIG);
    } else if version.at_least(&V1_11_0) {
        gates.insert(DYNAMIC_KUBELET_CONFIG.to_string(), false.to_string());
    }

    // Keeps GPU accelerator metrics on the kubelet cAdvisor endpoint for
    // Container Insights. Stops at 1.24.0 together with DynamicKubeletConfig,
    // so a 1.24 kubelet gets only the gates it was given.
    if version.in_range(&V1_20_0, &V1_24_0) {
        gates.insert(
            DISABLE_ACCELERATOR_USAGE_METRICS.to_string(),
            false.to_string(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_drops_malformed_pairs() {
        let gates = parse_feature_gates("a=true, b = false ,c,d=e=f,,=x");
        assert_eq!(gates.len(), 3);
        assert_eq!(gates.get("a").map(String::as_str), Some("true"));
        assert_eq!(gates.get("b").map(String::as_str), Some("false"));
        assert_eq!(gates.get("").map(String::as_str), Some("x"));
    }

    #[test]
    fn test_remove_keeps_values_verbatim() {
        assert_eq!(
            remove_feature_gate("DynamicKubeletConfig=true,a=b", DYNAMIC_KUBELET_CONFIG),
            "a=b"
        );
    }

    #[test]
    fn test_render_sorts_keys() {
        assert_eq!(
            set_feature_gate("zeta=true,alpha=false", "Mid", true),
            "Mid=true,alpha=false,zeta=true"
        );
    }

    #[test]
    fn test_version_rules() {
        let mut gates = parse_feature_gates("DynamicKubeletConfig=true");
        apply_version_rules(&mut gates, &SemanticVersion::new(1, 19, 3));
        assert_eq!(render_feature_gates(&gates), "DynamicKubeletConfig=false");

        let mut gates = parse_feature_gates("DynamicKubeletConfig=true");
        apply_version_rules(&mut gates, &SemanticVersion::new(1, 22, 0));
        assert_eq!(
            render_feature_gates(&gates),
            "DisableAcceleratorUsageMetrics=false,DynamicKubeletConfig=false"
        );

        let mut gates = parse_feature_gates("DynamicKubeletConfig=true,x=y");
        apply_version_rules(&mut gates, &SemanticVersion::new(1, 23, 17));
        assert_eq!(
            render_feature_gates(&gates),
            "DisableAcceleratorUsageMetrics=false,DynamicKubeletConfig=false,x=y"
        );

        let mut gates = parse_feature_gates("DynamicKubeletConfig=true,x=y");
        apply_version_rules(&mut gates, &SemanticVersion::new(1, 24, 0));
        assert_eq!(render_feature_gates(&gates), "x=y");

        let mut gates = parse_feature_gates("DynamicKubeletConfig=true,x=y");
        apply_version_rules(&mut gates, &SemanticVersion::new(1, 29, 0));
        assert_eq!(render_feature_gates(&gates), "x=y");

        let mut gates = parse_feature_gates("DynamicKubeletConfig=true");
        apply_version_rules(&mut gates, &SemanticVersion::new(1, 10, 0));
        assert_eq!(render_feature_gates(&gates), "DynamicKubeletConfig=true");
    }
}
