//! Contract data model
//!
//! Every struct deserializes with `#[serde(default)]` so a partial document
//! decodes cleanly. Sub-configurations stay `Option` until normalization.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Enum encoded as a lowercase string on the wire. Unknown strings decode to
/// the first (unspecified) variant instead of failing the whole contract.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $default:ident => $default_str:literal,
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            #[default]
            $default,
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    Self::$default => $default_str,
                    $(Self::$variant => $text),+
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                match value.trim().to_ascii_lowercase().as_str() {
                    $($text => Self::$variant,)+
                    _ => Self::$default,
                }
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum! {
    /// How the kubelet obtains its client credentials
    BootstrappingMethod {
        Unspecified => "",
        UseArcMsiToMakeCsr => "use_arc_msi_to_make_csr",
        UseArcMsiDirectly => "use_arc_msi_directly",
        UseAzureMsiDirectly => "use_azure_msi_directly",
        UseAzureMsiToMakeCsr => "use_azure_msi_to_make_csr",
        UseTlsBootstrapToken => "use_tls_bootstrap_token",
        UseSecureTlsBootstrapping => "use_secure_tls_bootstrapping",
    }
}

string_enum! {
    VmType {
        Unspecified => "",
        Standard => "standard",
        Vmss => "vmss",
    }
}

string_enum! {
    NetworkPlugin {
        Unspecified => "",
        Azure => "azure",
        Kubenet => "kubenet",
    }
}

string_enum! {
    NetworkPolicy {
        Unspecified => "",
        Azure => "azure",
        Calico => "calico",
    }
}

string_enum! {
    LoadBalancerSku {
        Unspecified => "",
        Basic => "basic",
        Standard => "standard",
    }
}

string_enum! {
    KubeletDisk {
        Unspecified => "",
        OsDisk => "os_disk",
        TempDisk => "temp_disk",
    }
}

/// Operating system of the node being provisioned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeOs {
    #[default]
    Linux,
    Windows,
}

impl NodeOs {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "linux" => Some(NodeOs::Linux),
            "windows" => Some(NodeOs::Windows),
            _ => None,
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, NodeOs::Windows)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeOs::Linux => "linux",
            NodeOs::Windows => "windows",
        }
    }
}

impl std::fmt::Display for NodeOs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ROOT AGGREGATE
// ============================================================================

/// Node provisioning contract produced by the control plane
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Contract {
    pub version: String,
    pub kubernetes_version: String,
    pub vm_size: String,
    pub linux_admin_username: String,
    pub is_vhd: Option<bool>,
    pub enable_ssh: Option<bool>,
    pub custom_ca_certs: Vec<String>,
    /// Empty means containerd
    pub container_runtime: String,
    pub ipv6_dual_stack_enabled: bool,
    pub outbound_command: String,
    pub enable_unattended_upgrade: bool,
    pub enable_hosts_config_agent: bool,
    pub azure_private_registry_server: String,
    pub message_of_the_day: String,
    pub needs_cgroupv2: bool,
    pub kube_proxy_url: String,
    pub kubernetes_ca_cert: String,
    pub is_kata: bool,
    pub enable_artifact_streaming: bool,
    pub private_egress_proxy_address: String,
    pub bootstrap_profile_container_registry_server: String,

    pub auth: Option<AuthConfig>,
    pub cluster: Option<ClusterConfig>,
    pub api_server: Option<ApiServerConfig>,
    pub network: Option<NetworkConfig>,
    pub gpu: Option<GpuConfig>,
    pub kubelet: Option<KubeletConfig>,
    pub containerd: Option<ContainerdConfig>,
    pub runc: Option<RuncConfig>,
    pub tls_bootstrapping: Option<TlsBootstrappingConfig>,
    pub teleport: Option<TeleportConfig>,
    pub custom_linux_os: Option<CustomLinuxOsConfig>,
    pub http_proxy: Option<HttpProxyConfig>,
    pub custom_cloud: Option<CustomCloudConfig>,
    pub custom_search_domain: Option<CustomSearchDomainConfig>,
    pub kube_binary: Option<KubeBinaryConfig>,
}

impl Contract {
    // Read-side accessors. They hand out a shared default when a section is
    // missing so callers never branch on presence.

    pub fn auth(&self) -> &AuthConfig {
        self.auth.as_ref().unwrap_or(&defaults::AUTH)
    }

    pub fn cluster(&self) -> &ClusterConfig {
        self.cluster.as_ref().unwrap_or(&defaults::CLUSTER)
    }

    pub fn api_server(&self) -> &ApiServerConfig {
        self.api_server.as_ref().unwrap_or(&defaults::API_SERVER)
    }

    pub fn network(&self) -> &NetworkConfig {
        self.network.as_ref().unwrap_or(&defaults::NETWORK)
    }

    pub fn gpu(&self) -> &GpuConfig {
        self.gpu.as_ref().unwrap_or(&defaults::GPU)
    }

    pub fn kubelet(&self) -> &KubeletConfig {
        self.kubelet.as_ref().unwrap_or(&defaults::KUBELET)
    }

    pub fn containerd(&self) -> &ContainerdConfig {
        self.containerd.as_ref().unwrap_or(&defaults::CONTAINERD)
    }

    pub fn runc(&self) -> &RuncConfig {
        self.runc.as_ref().unwrap_or(&defaults::RUNC)
    }

    pub fn tls_bootstrapping(&self) -> &TlsBootstrappingConfig {
        self.tls_bootstrapping
            .as_ref()
            .unwrap_or(&defaults::TLS_BOOTSTRAPPING)
    }

    pub fn teleport(&self) -> &TeleportConfig {
        self.teleport.as_ref().unwrap_or(&defaults::TELEPORT)
    }

    pub fn custom_linux_os(&self) -> &CustomLinuxOsConfig {
        self.custom_linux_os
            .as_ref()
            .unwrap_or(&defaults::CUSTOM_LINUX_OS)
    }

    pub fn http_proxy(&self) -> &HttpProxyConfig {
        self.http_proxy.as_ref().unwrap_or(&defaults::HTTP_PROXY)
    }

    pub fn custom_cloud(&self) -> &CustomCloudConfig {
        self.custom_cloud.as_ref().unwrap_or(&defaults::CUSTOM_CLOUD)
    }

    pub fn custom_search_domain(&self) -> &CustomSearchDomainConfig {
        self.custom_search_domain
            .as_ref()
            .unwrap_or(&defaults::CUSTOM_SEARCH_DOMAIN)
    }

    pub fn kube_binary(&self) -> &KubeBinaryConfig {
        self.kube_binary.as_ref().unwrap_or(&defaults::KUBE_BINARY)
    }
}

// ============================================================================
// SUB-CONFIGURATIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub subscription_id: String,
    pub tenant_id: String,
    pub service_principal_id: String,
    pub service_principal_secret: String,
    pub assigned_identity_id: String,
    pub use_managed_identity_extension: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub resource_group: String,
    pub location: String,
    pub vm_type: VmType,
    pub primary_availability_set: String,
    pub primary_scale_set: String,
    pub use_instance_metadata: bool,
    pub cluster_network: Option<ClusterNetworkConfig>,
    pub load_balancer: Option<LoadBalancerConfig>,
}

impl ClusterConfig {
    pub fn cluster_network(&self) -> &ClusterNetworkConfig {
        self.cluster_network
            .as_ref()
            .unwrap_or(&defaults::CLUSTER_NETWORK)
    }

    pub fn load_balancer(&self) -> &LoadBalancerConfig {
        self.load_balancer
            .as_ref()
            .unwrap_or(&defaults::LOAD_BALANCER)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterNetworkConfig {
    pub vnet_name: String,
    pub vnet_resource_group: String,
    pub subnet: String,
    pub security_group_name: String,
    pub route_table: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadBalancerConfig {
    pub load_balancer_sku: LoadBalancerSku,
    pub exclude_master_from_standard_load_balancer: Option<bool>,
    pub max_load_balancer_rule_count: Option<i32>,
    pub disable_outbound_snat: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiServerConfig {
    pub api_server_name: String,
    pub api_server_public_key: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub network_plugin: NetworkPlugin,
    pub network_policy: NetworkPolicy,
    pub vnet_cni_plugins_url: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuConfig {
    pub enable_nvidia: Option<bool>,
    pub config_gpu_driver: bool,
    pub gpu_device_plugin: bool,
    pub gpu_instance_profile: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KubeletConfig {
    pub kubelet_flags: BTreeMap<String, String>,
    pub kubelet_node_labels: BTreeMap<String, String>,
    /// Operator override; authoritative when non-empty
    pub custom_kubelet_config: BTreeMap<String, String>,
    pub enable_kubelet_config_file: bool,
    pub kubelet_config_file_content: String,
    pub kubelet_client_key: String,
    pub kubelet_client_cert_content: String,
    pub kubelet_disk_type: KubeletDisk,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerdConfig {
    pub containerd_download_url_base: String,
    pub containerd_version: String,
    pub containerd_package_url: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuncConfig {
    pub runc_version: String,
    pub runc_package_url: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsBootstrappingConfig {
    pub enable_secure_tls_bootstrapping: Option<bool>,
    pub tls_bootstrapping_token: String,
    pub custom_secure_tls_bootstrapping_app_id: String,
    pub bootstrapping_method: BootstrappingMethod,
    pub bootstrapping_managed_identity_id: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TeleportConfig {
    pub status: bool,
    pub teleportd_plugin_download_url: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomLinuxOsConfig {
    pub sysctl: Option<SysctlConfig>,
    pub ulimit: Option<UlimitConfig>,
    pub enable_swap_config: bool,
    pub swap_file_size: i32,
    pub transparent_hugepage_support: String,
    pub transparent_defrag: String,
}

impl CustomLinuxOsConfig {
    pub fn sysctl(&self) -> &SysctlConfig {
        self.sysctl.as_ref().unwrap_or(&defaults::SYSCTL)
    }

    pub fn ulimit(&self) -> &UlimitConfig {
        self.ulimit.as_ref().unwrap_or(&defaults::ULIMIT)
    }
}

/// Kernel tunables; `None` means "use the node default"
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SysctlConfig {
    pub net_core_somaxconn: Option<i32>,
    pub net_core_netdev_max_backlog: Option<i32>,
    pub net_core_rmem_default: Option<i32>,
    pub net_core_rmem_max: Option<i32>,
    pub net_core_wmem_default: Option<i32>,
    pub net_core_wmem_max: Option<i32>,
    pub net_core_optmem_max: Option<i32>,
    pub net_ipv4_tcp_max_syn_backlog: Option<i32>,
    pub net_ipv4_tcp_max_tw_buckets: Option<i32>,
    pub net_ipv4_tcp_fin_timeout: Option<i32>,
    pub net_ipv4_tcp_keepalive_time: Option<i32>,
    pub net_ipv4_tcp_keepalive_probes: Option<i32>,
    pub net_ipv4_tcp_keepalive_intvl: Option<i32>,
    pub net_ipv4_tcp_tw_reuse: Option<bool>,
    /// "start end"
    pub net_ipv4_ip_local_port_range: String,
    pub net_ipv4_neigh_default_gc_thresh1: Option<i32>,
    pub net_ipv4_neigh_default_gc_thresh2: Option<i32>,
    pub net_ipv4_neigh_default_gc_thresh3: Option<i32>,
    pub net_netfilter_nf_conntrack_max: Option<i32>,
    pub net_netfilter_nf_conntrack_buckets: Option<i32>,
    pub fs_inotify_max_user_watches: Option<i32>,
    pub fs_file_max: Option<i32>,
    pub fs_aio_max_nr: Option<i32>,
    pub fs_nr_open: Option<i32>,
    pub kernel_threads_max: Option<i32>,
    pub vm_max_map_count: Option<i32>,
    pub vm_swappiness: Option<i32>,
    pub vm_vfs_cache_pressure: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UlimitConfig {
    pub no_file: Option<String>,
    pub max_locked_memory: Option<String>,
}

impl UlimitConfig {
    pub fn is_set(&self) -> bool {
        self.no_file.is_some() || self.max_locked_memory.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpProxyConfig {
    pub http_proxy: String,
    pub https_proxy: String,
    pub no_proxy_entries: Vec<String>,
    pub proxy_trusted_ca: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomCloudConfig {
    pub custom_cloud_env_name: String,
    pub container_registry_dns_suffix: String,
    pub custom_env_json_content: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomSearchDomainConfig {
    pub domain_name: String,
    pub realm_user: String,
    pub realm_password: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KubeBinaryConfig {
    pub kube_binary_url: String,
    pub custom_kube_binary_url: String,
    pub private_kube_binary_url: String,
    pub linux_credential_provider_url: String,
}

mod defaults {
    use super::*;

    pub static AUTH: AuthConfig = AuthConfig {
        subscription_id: String::new(),
        tenant_id: String::new(),
        service_principal_id: String::new(),
        service_principal_secret: String::new(),
        assigned_identity_id: String::new(),
        use_managed_identity_extension: false,
    };

    pub static CLUSTER: ClusterConfig = ClusterConfig {
        resource_group: String::new(),
        location: String::new(),
        vm_type: VmType::Unspecified,
        primary_availability_set: String::new(),
        primary_scale_set: String::new(),
        use_instance_metadata: false,
        cluster_network: None,
        load_balancer: None,
    };

    pub static CLUSTER_NETWORK: ClusterNetworkConfig = ClusterNetworkConfig {
        vnet_name: String::new(),
        vnet_resource_group: String::new(),
        subnet: String::new(),
        security_group_name: String::new(),
        route_table: String::new(),
    };

    pub static LOAD_BALANCER: LoadBalancerConfig = LoadBalancerConfig {
        load_balancer_sku: LoadBalancerSku::Unspecified,
        exclude_master_from_standard_load_balancer: None,
        max_load_balancer_rule_count: None,
        disable_outbound_snat: false,
    };

    pub static API_SERVER: ApiServerConfig = ApiServerConfig {
        api_server_name: String::new(),
        api_server_public_key: String::new(),
    };

    pub static NETWORK: NetworkConfig = NetworkConfig {
        network_plugin: NetworkPlugin::Unspecified,
        network_policy: NetworkPolicy::Unspecified,
        vnet_cni_plugins_url: String::new(),
    };

    pub static GPU: GpuConfig = GpuConfig {
        enable_nvidia: None,
        config_gpu_driver: false,
        gpu_device_plugin: false,
        gpu_instance_profile: String::new(),
    };

    pub static KUBELET: KubeletConfig = KubeletConfig {
        kubelet_flags: BTreeMap::new(),
        kubelet_node_labels: BTreeMap::new(),
        custom_kubelet_config: BTreeMap::new(),
        enable_kubelet_config_file: false,
        kubelet_config_file_content: String::new(),
        kubelet_client_key: String::new(),
        kubelet_client_cert_content: String::new(),
        kubelet_disk_type: KubeletDisk::Unspecified,
    };

    pub static CONTAINERD: ContainerdConfig = ContainerdConfig {
        containerd_download_url_base: String::new(),
        containerd_version: String::new(),
        containerd_package_url: String::new(),
    };

    pub static RUNC: RuncConfig = RuncConfig {
        runc_version: String::new(),
        runc_package_url: String::new(),
    };

    pub static TLS_BOOTSTRAPPING: TlsBootstrappingConfig = TlsBootstrappingConfig {
        enable_secure_tls_bootstrapping: None,
        tls_bootstrapping_token: String::new(),
        custom_secure_tls_bootstrapping_app_id: String::new(),
        bootstrapping_method: BootstrappingMethod::Unspecified,
        bootstrapping_managed_identity_id: String::new(),
    };

    pub static TELEPORT: TeleportConfig = TeleportConfig {
        status: false,
        teleportd_plugin_download_url: String::new(),
    };

    pub static CUSTOM_LINUX_OS: CustomLinuxOsConfig = CustomLinuxOsConfig {
        sysctl: None,
        ulimit: None,
        enable_swap_config: false,
        swap_file_size: 0,
        transparent_hugepage_support: String::new(),
        transparent_defrag: String::new(),
    };

    pub static SYSCTL: SysctlConfig = SysctlConfig {
        net_core_somaxconn: None,
        net_core_netdev_max_backlog: None,
        net_core_rmem_default: None,
        net_core_rmem_max: None,
        net_core_wmem_default: None,
        net_core_wmem_max: None,
        net_core_optmem_max: None,
        net_ipv4_tcp_max_syn_backlog: None,
        net_ipv4_tcp_max_tw_buckets: None,
        net_ipv4_tcp_fin_timeout: None,
        net_ipv4_tcp_keepalive_time: None,
        net_ipv4_tcp_keepalive_probes: None,
        net_ipv4_tcp_keepalive_intvl: None,
        net_ipv4_tcp_tw_reuse: None,
        net_ipv4_ip_local_port_range: String::new(),
        net_ipv4_neigh_default_gc_thresh1: None,
        net_ipv4_neigh_default_gc_thresh2: None,
        net_ipv4_neigh_default_gc_thresh3: None,
        net_netfilter_nf_conntrack_max: None,
        net_netfilter_nf_conntrack_buckets: None,
        fs_inotify_max_user_watches: None,
        fs_file_max: None,
        fs_aio_max_nr: None,
        fs_nr_open: None,
        kernel_threads_max: None,
        vm_max_map_count: None,
        vm_swappiness: None,
        vm_vfs_cache_pressure: None,
    };

    pub static ULIMIT: UlimitConfig = UlimitConfig {
        no_file: None,
        max_locked_memory: None,
    };

    pub static HTTP_PROXY: HttpProxyConfig = HttpProxyConfig {
        http_proxy: String::new(),
        https_proxy: String::new(),
        no_proxy_entries: Vec::new(),
        proxy_trusted_ca: String::new(),
    };

    pub static CUSTOM_CLOUD: CustomCloudConfig = CustomCloudConfig {
        custom_cloud_env_name: String::new(),
        container_registry_dns_suffix: String::new(),
        custom_env_json_content: String::new(),
    };

    pub static CUSTOM_SEARCH_DOMAIN: CustomSearchDomainConfig = CustomSearchDomainConfig {
        domain_name: String::new(),
        realm_user: String::new(),
        realm_password: String::new(),
    };

    pub static KUBE_BINARY: KubeBinaryConfig = KubeBinaryConfig {
        kube_binary_url: String::new(),
        custom_kube_binary_url: String::new(),
        private_kube_binary_url: String::new(),
        linux_credential_provider_url: String::new(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_decodes() {
        let json = r#"{
            "version": "1.0.0",
            "cluster": { "location": "eastus", "vm_type": "vmss" },
            "tls_bootstrapping": { "bootstrapping_method": "use_azure_msi_directly" }
        }"#;

        let contract: Contract = serde_json::from_str(json).unwrap();
        assert_eq!(contract.version, "1.0.0");
        assert_eq!(contract.cluster().location, "eastus");
        assert_eq!(contract.cluster().vm_type, VmType::Vmss);
        assert_eq!(
            contract.tls_bootstrapping().bootstrapping_method,
            BootstrappingMethod::UseAzureMsiDirectly
        );
        assert!(contract.auth.is_none());
        assert_eq!(contract.auth().subscription_id, "");
    }

    #[test]
    fn test_unknown_enum_value_falls_back_to_unspecified() {
        let json = r#"{ "network": { "network_plugin": "flannel", "network_policy": "Calico" } }"#;
        let contract: Contract = serde_json::from_str(json).unwrap();

        assert_eq!(contract.network().network_plugin, NetworkPlugin::Unspecified);
        assert_eq!(contract.network().network_policy, NetworkPolicy::Calico);
    }

    #[test]
    fn test_enum_serializes_as_string() {
        let value = serde_json::to_value(BootstrappingMethod::UseArcMsiToMakeCsr).unwrap();
        assert_eq!(value, serde_json::json!("use_arc_msi_to_make_csr"));
    }

    #[test]
    fn test_node_os_parse() {
        assert_eq!(NodeOs::parse("Windows"), Some(NodeOs::Windows));
        assert_eq!(NodeOs::parse(" linux "), Some(NodeOs::Linux));
        assert_eq!(NodeOs::parse("darwin"), None);
        assert!(NodeOs::Windows.is_windows());
    }
}
