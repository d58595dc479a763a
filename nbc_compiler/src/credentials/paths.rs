//! On-node locations of credential artifacts, by operating system

use crate::contract::NodeOs;

pub const TLS_BOOTSTRAP_CLIENT: &str = "/opt/azure/tlsbootstrap/tls-bootstrap-client";
pub const CLIENT_CERTIFICATE: &str = "/etc/kubernetes/certs/client.crt";
pub const CLIENT_KEY: &str = "/etc/kubernetes/certs/client.key";
pub const WINDOWS_KUBELOGIN: &str = "c:\\k\\kubelogin.exe";

/// kubeconfig files are world-readable
pub const KUBECONFIG_MODE: u32 = 0o644;
/// token helpers are world-executable
pub const HELPER_MODE: u32 = 0o755;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialPaths {
    pub os: NodeOs,
    pub ca_cert: &'static str,
    pub bootstrap_kubeconfig: &'static str,
    pub static_kubeconfig: &'static str,
    pub arc_token_helper: &'static str,
    pub azure_token_helper: &'static str,
}

const LINUX: CredentialPaths = CredentialPaths {
    os: NodeOs::Linux,
    ca_cert: "/etc/kubernetes/certs/ca.crt",
    bootstrap_kubeconfig: "/var/lib/kubelet/bootstrap-kubeconfig",
    static_kubeconfig: "/var/lib/kubelet/kubeconfig",
    arc_token_helper: "/opt/azure/bootstrap/arc-token.sh",
    azure_token_helper: "/opt/azure/bootstrap/azure-token.sh",
};

const WINDOWS: CredentialPaths = CredentialPaths {
    os: NodeOs::Windows,
    ca_cert: "c:\\k\\ca.crt",
    bootstrap_kubeconfig: "c:\\k\\bootstrap-config",
    static_kubeconfig: "c:\\k\\config",
    arc_token_helper: "c:\\k\\arc-token.ps1",
    azure_token_helper: "c:\\k\\azure-token.ps1",
};

impl CredentialPaths {
    pub fn for_os(os: NodeOs) -> Self {
        match os {
            NodeOs::Linux => LINUX,
            NodeOs::Windows => WINDOWS,
        }
    }
}
