//! Node provisioning contract: data model and domain constants

pub mod cloud;
pub mod constants;
pub mod types;

pub use cloud::location_cloud;

pub use types::{
    ApiServerConfig, AuthConfig, BootstrappingMethod, ClusterConfig, ClusterNetworkConfig,
    ContainerdConfig, Contract, CustomCloudConfig, CustomLinuxOsConfig, CustomSearchDomainConfig,
    GpuConfig, HttpProxyConfig, KubeBinaryConfig, KubeletConfig, KubeletDisk, LoadBalancerConfig,
    LoadBalancerSku, NetworkConfig, NetworkPlugin, NetworkPolicy, NodeOs, RuncConfig,
    SysctlConfig, TeleportConfig, TlsBootstrappingConfig, UlimitConfig, VmType,
};
