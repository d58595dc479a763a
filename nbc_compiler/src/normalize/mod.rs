//! Contract normalization
//!
//! `ContractBuilder` holds a contract in which every sub-configuration is
//! present and the version defaults to the one this compiler expects. Incoming contracts are merged through an independent JSON copy,
//! so the builder never shares data with the caller's instance.
//!
//! Merge rules follow protobuf zero-value semantics: null, `false`, `0`, empty
//! strings and empty lists in the source leave the destination untouched.
//! Objects, including flag and label maps, merge key by key.

use crate::contract::constants::EXPECTED_VERSION;
use crate::contract::{
    ApiServerConfig, AuthConfig, ClusterConfig, ClusterNetworkConfig, ContainerdConfig, Contract,
    CustomCloudConfig, CustomLinuxOsConfig, CustomSearchDomainConfig, GpuConfig, HttpProxyConfig,
    KubeBinaryConfig, KubeletConfig, LoadBalancerConfig, NetworkConfig, RuncConfig, SysctlConfig,
    TeleportConfig, TlsBootstrappingConfig, UlimitConfig,
};
use crate::logging::codes;
use crate::{log_debug, log_warning};
use serde_json::Value;

/// One-shot builder; create one per compilation
#[derive(Debug, Clone)]
pub struct ContractBuilder {
    contract: Contract,
}

impl ContractBuilder {
    pub fn new() -> Self {
        let mut contract = Contract {
            version: EXPECTED_VERSION.to_string(),
            ..Default::default()
        };
        ensure_configs_present(&mut contract);
        Self { contract }
    }

    /// Merge `config` into the held contract.
    ///
    /// `None` keeps the current state. A copy failure is logged and the held
    /// contract keeps its current values with defaults filled in.
    pub fn apply_configuration(&mut self, config: Option<&Contract>) -> &mut Self {
        let Some(config) = config else {
            return self;
        };

        match merged_copy(&self.contract, config) {
            Ok(merged) => self.contract = merged,
            Err(error) => {
                // serde_json messages can quote field values; log the class only
                log_warning!(
                    codes::warning::DEEP_COPY_FALLBACK,
                    "Contract deep copy failed, filling defaults on held contract",
                    "category" => format!("{:?}", error.classify()),
                    "line" => error.line()
                );
            }
        }

        ensure_configs_present(&mut self.contract);
        log_debug!("Contract normalized", "version" => self.contract.version.as_str());
        self
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    pub fn into_contract(self) -> Contract {
        self.contract
    }
}

impl Default for ContractBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a standalone contract
pub fn normalize(contract: Contract) -> Contract {
    let mut builder = ContractBuilder::new();
    builder.apply_configuration(Some(&contract));
    builder.into_contract()
}

/// Fill every missing sub-configuration and required child with defaults
pub fn ensure_configs_present(contract: &mut Contract) {
    contract.auth.get_or_insert_with(AuthConfig::default);
    contract.api_server.get_or_insert_with(ApiServerConfig::default);
    contract.network.get_or_insert_with(NetworkConfig::default);
    contract.gpu.get_or_insert_with(GpuConfig::default);
    contract.kubelet.get_or_insert_with(KubeletConfig::default);
    contract.containerd.get_or_insert_with(ContainerdConfig::default);
    contract.runc.get_or_insert_with(RuncConfig::default);
    contract
        .tls_bootstrapping
        .get_or_insert_with(TlsBootstrappingConfig::default);
    contract.teleport.get_or_insert_with(TeleportConfig::default);
    contract.http_proxy.get_or_insert_with(HttpProxyConfig::default);
    contract.custom_cloud.get_or_insert_with(CustomCloudConfig::default);
    contract
        .custom_search_domain
        .get_or_insert_with(CustomSearchDomainConfig::default);
    contract.kube_binary.get_or_insert_with(KubeBinaryConfig::default);

    let cluster = contract.cluster.get_or_insert_with(ClusterConfig::default);
    cluster
        .cluster_network
        .get_or_insert_with(ClusterNetworkConfig::default);
    cluster
        .load_balancer
        .get_or_insert_with(LoadBalancerConfig::default);

    let linux_os = contract
        .custom_linux_os
        .get_or_insert_with(CustomLinuxOsConfig::default);
    linux_os.sysctl.get_or_insert_with(SysctlConfig::default);
    linux_os.ulimit.get_or_insert_with(UlimitConfig::default);
}

fn merged_copy(destination: &Contract, source: &Contract) -> Result<Contract, serde_json::Error> {
    let mut merged = serde_json::to_value(destination)?;
    let incoming = serde_json::to_value(source)?;
    merge_value(&mut merged, incoming);
    serde_json::from_value(merged)
}

fn merge_value(destination: &mut Value, source: Value) {
    match (destination, source) {
        (Value::Object(dest), Value::Object(src)) => {
            for (key, value) in src {
                match dest.get_mut(&key) {
                    Some(slot) => merge_value(slot, value),
                    None if !is_zero(&value) => {
                        dest.insert(key, value);
                    }
                    None => {}
                }
            }
        }
        (slot, value) => {
            if !is_zero(&value) {
                *slot = value;
            }
        }
    }
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
