//! Domain constants shared across the compiler

/// Version accepted by this build
pub use crate::config::compile_time::contract::{EXPECTED_VERSION, LEGACY_VERSION};

pub const DEFAULT_AAD_APP_ID: &str = "6dae42f8-4368-4678-94ff-3960e28e3630";
pub const DEFAULT_LINUX_ADMIN_USER: &str = "azureuser";
pub const DEFAULT_CONTAINER_RUNTIME: &str = "containerd";
pub const DEFAULT_MAX_LOAD_BALANCER_RULE_COUNT: i32 = 250;

pub mod cloud {
    pub const AKS_CUSTOM_CLOUD_NAME: &str = "akscustom";
    pub const AZURE_STACK_CLOUD: &str = "AzureStackCloud";
    pub const AZURE_PUBLIC_CLOUD: &str = "AzurePublicCloud";
    pub const AZURE_CHINA_CLOUD: &str = "AzureChinaCloud";
    pub const AZURE_GERMAN_CLOUD: &str = "AzureGermanCloud";
    pub const AZURE_US_GOVERNMENT_CLOUD: &str = "AzureUSGovernmentCloud";
}

pub mod vm_size {
    pub const STANDARD_DC2S: &str = "Standard_DC2s";
    pub const STANDARD_DC4S: &str = "Standard_DC4s";
}

/// Provisioning script locations on the node image
pub mod cse_paths {
    pub const PROVISION_OUTPUT: &str = "/var/log/azure/cluster-provision.log";
    pub const PROVISION_START: &str = "/opt/azure/containers/provision_start.sh";
    pub const HELPERS: &str = "/opt/azure/containers/provision_source.sh";
    pub const DISTRO_HELPERS: &str = "/opt/azure/containers/provision_source_distro.sh";
    pub const INSTALL: &str = "/opt/azure/containers/provision_installs.sh";
    pub const DISTRO_INSTALL: &str = "/opt/azure/containers/provision_installs_distro.sh";
    pub const CONFIG: &str = "/opt/azure/containers/provision_configs.sh";
    pub const CUSTOM_SEARCH_DOMAIN: &str = "/opt/azure/containers/setup-custom-search-domains.sh";
    pub const DHCPV6_SERVICE: &str = "/etc/systemd/system/dhcpv6.service";
    pub const DHCPV6_CONFIG: &str = "/opt/azure/containers/enable-dhcpv6.sh";
}

/// Sysctl values written even when the contract leaves them unset
pub mod sysctl_defaults {
    pub const NET_IPV4_TCP_RETRIES2: i32 = 8;
    pub const NET_CORE_MESSAGE_BURST: i32 = 80;
    pub const NET_CORE_MESSAGE_COST: i32 = 40;
    pub const NET_CORE_SOMAXCONN: i32 = 16384;
    pub const NET_IPV4_TCP_MAX_SYN_BACKLOG: i32 = 16384;
    pub const NET_IPV4_NEIGH_DEFAULT_GC_THRESH1: i32 = 4096;
    pub const NET_IPV4_NEIGH_DEFAULT_GC_THRESH2: i32 = 8192;
    pub const NET_IPV4_NEIGH_DEFAULT_GC_THRESH3: i32 = 16384;
    /// Reserved for the node's IMDS proxy when the local port range reaches it
    pub const IP_LOCAL_RESERVED_PORTS: i32 = 65330;
}
