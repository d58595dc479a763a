//! Kubelet credential strategy selection
//!
//! The contract's `BootstrappingMethod` picks a strategy; the strategy picks
//! which kubeconfig (bootstrap or static) the kubelet starts with and which
//! token helper, if any, its exec plugin calls. The result is a `FileMap` of
//! on-node paths.

pub mod error;
pub mod files;
pub mod helpers;
pub mod kubeconfig;
pub mod paths;

pub use error::CredentialError;
pub use files::{File, FileMap};
pub use paths::CredentialPaths;

use crate::contract::constants::DEFAULT_AAD_APP_ID;
use crate::contract::{BootstrappingMethod, Contract, NodeOs};
use crate::log_success;
use crate::logging::codes;
use kubeconfig::{ExecConfig, Kubeconfig, UserEntry};
use paths::{HELPER_MODE, KUBECONFIG_MODE};

/// How the kubelet authenticates on first start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStrategy {
    /// Bootstrap kubeconfig, exec via the Arc helper, kubelet requests a CSR
    CsrViaArc,
    /// Static kubeconfig, exec via the Arc helper
    DirectArc,
    /// Static kubeconfig, exec via the Azure helper
    DirectAzure,
    /// Bootstrap kubeconfig, exec via the Azure helper
    CsrViaAzure,
    StaticToken,
    SecureTlsBootstrap,
    /// No method chosen; decided by the TLS bootstrapping settings
    Default,
}

impl CredentialStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CsrViaArc => "csr_via_arc",
            Self::DirectArc => "direct_arc",
            Self::DirectAzure => "direct_azure",
            Self::CsrViaAzure => "csr_via_azure",
            Self::StaticToken => "static_token",
            Self::SecureTlsBootstrap => "secure_tls_bootstrap",
            Self::Default => "default",
        }
    }

    fn token_helper(&self) -> Option<TokenHelper> {
        match self {
            Self::CsrViaArc | Self::DirectArc => Some(TokenHelper::Arc),
            Self::DirectAzure | Self::CsrViaAzure => Some(TokenHelper::Azure),
            Self::StaticToken | Self::SecureTlsBootstrap | Self::Default => None,
        }
    }
}

impl std::fmt::Display for CredentialStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenHelper {
    Arc,
    Azure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KubeconfigKind {
    Bootstrap,
    Static,
}

/// Inputs the credential builders read from the contract
struct CredentialSettings<'a> {
    os: NodeOs,
    paths: CredentialPaths,
    api_server_name: &'a str,
    app_id: &'a str,
    bootstrap_token: &'a str,
    secure_tls_bootstrapping: bool,
    managed_identity_client_id: &'a str,
    /// `--environment` for kubelogin
    target_cloud: &'static str,
}

impl<'a> CredentialSettings<'a> {
    fn new(contract: &'a Contract, os: NodeOs) -> Self {
        let tls = contract.tls_bootstrapping();
        let app_id = match tls.custom_secure_tls_bootstrapping_app_id.as_str() {
            "" => DEFAULT_AAD_APP_ID,
            custom => custom,
        };

        Self {
            os,
            paths: CredentialPaths::for_os(os),
            api_server_name: &contract.api_server().api_server_name,
            app_id,
            bootstrap_token: &tls.tls_bootstrapping_token,
            secure_tls_bootstrapping: tls.enable_secure_tls_bootstrapping.unwrap_or(false),
            managed_identity_client_id: &tls.bootstrapping_managed_identity_id,
            target_cloud: contract.target_cloud(),
        }
    }
}

pub fn select_strategy(contract: &Contract) -> CredentialStrategy {
    match contract.tls_bootstrapping().bootstrapping_method {
        BootstrappingMethod::UseArcMsiToMakeCsr => CredentialStrategy::CsrViaArc,
        BootstrappingMethod::UseArcMsiDirectly => CredentialStrategy::DirectArc,
        BootstrappingMethod::UseAzureMsiDirectly => CredentialStrategy::DirectAzure,
        BootstrappingMethod::UseAzureMsiToMakeCsr => CredentialStrategy::CsrViaAzure,
        BootstrappingMethod::UseTlsBootstrapToken => CredentialStrategy::StaticToken,
        BootstrappingMethod::UseSecureTlsBootstrapping => CredentialStrategy::SecureTlsBootstrap,
        BootstrappingMethod::Unspecified => CredentialStrategy::Default,
    }
}

/// Kubeconfig and helper files for the contract's bootstrapping method
pub fn select_credential_files(contract: &Contract, os: NodeOs) -> Result<FileMap, CredentialError> {
    let strategy = select_strategy(contract);
    let settings = CredentialSettings::new(contract, os);
    let mut files = FileMap::new();

    match kubeconfig_kind(strategy, &settings) {
        KubeconfigKind::Bootstrap => {
            let content = bootstrap_kubeconfig(strategy, &settings)?.render()?;
            files.insert(
                settings.paths.bootstrap_kubeconfig,
                File::new(content, KUBECONFIG_MODE),
            );
        }
        KubeconfigKind::Static => {
            let content = static_kubeconfig(strategy, &settings)?.render()?;
            files.insert(
                settings.paths.static_kubeconfig,
                File::new(content, KUBECONFIG_MODE),
            );
        }
    }

    if let Some(helper) = strategy.token_helper() {
        let (path, content) = match helper {
            TokenHelper::Arc => (settings.paths.arc_token_helper, arc_helper(&settings)),
            TokenHelper::Azure => (settings.paths.azure_token_helper, azure_helper(&settings)),
        };
        files.insert(path, File::new(content, HELPER_MODE));
    }

    log_success!(
        codes::success::CREDENTIALS_SELECTED,
        "Kubelet credential files selected",
        "strategy" => strategy,
        "os" => os,
        "files" => files.paths().join(",")
    );

    Ok(files)
}

fn kubeconfig_kind(strategy: CredentialStrategy, settings: &CredentialSettings<'_>) -> KubeconfigKind {
    match strategy {
        CredentialStrategy::CsrViaArc
        | CredentialStrategy::CsrViaAzure
        | CredentialStrategy::StaticToken
        | CredentialStrategy::SecureTlsBootstrap => KubeconfigKind::Bootstrap,
        CredentialStrategy::DirectArc | CredentialStrategy::DirectAzure => KubeconfigKind::Static,
        CredentialStrategy::Default => {
            if settings.secure_tls_bootstrapping || !settings.bootstrap_token.is_empty() {
                KubeconfigKind::Bootstrap
            } else {
                KubeconfigKind::Static
            }
        }
    }
}

fn bootstrap_kubeconfig(
    strategy: CredentialStrategy,
    settings: &CredentialSettings<'_>,
) -> Result<Kubeconfig, CredentialError> {
    let user = match strategy {
        CredentialStrategy::CsrViaArc => UserEntry::exec(arc_exec(settings)),
        CredentialStrategy::CsrViaAzure => {
            let exec = if settings.os.is_windows() {
                ExecConfig::new(
                    "pwsh",
                    vec!["-C".to_string(), settings.paths.azure_token_helper.to_string()],
                )
            } else {
                ExecConfig::new(settings.paths.azure_token_helper, Vec::new())
            };
            UserEntry::exec(exec)
        }
        CredentialStrategy::SecureTlsBootstrap => UserEntry::exec(secure_bootstrap_exec(settings)),
        CredentialStrategy::StaticToken | CredentialStrategy::Default => {
            if settings.secure_tls_bootstrapping {
                UserEntry::exec(secure_bootstrap_exec(settings))
            } else {
                UserEntry::token(settings.bootstrap_token)
            }
        }
        CredentialStrategy::DirectArc | CredentialStrategy::DirectAzure => {
            return Err(CredentialError::unhandled(strategy.as_str(), "bootstrap"));
        }
    };

    Ok(Kubeconfig::single(
        settings.paths.ca_cert,
        settings.api_server_name,
        kubeconfig::BOOTSTRAP_USER,
        user,
        kubeconfig::BOOTSTRAP_CONTEXT,
    ))
}

fn static_kubeconfig(
    strategy: CredentialStrategy,
    settings: &CredentialSettings<'_>,
) -> Result<Kubeconfig, CredentialError> {
    let (user_name, user) = match strategy {
        CredentialStrategy::DirectArc => (kubeconfig::EXEC_USER, UserEntry::exec(arc_exec(settings))),
        CredentialStrategy::DirectAzure => {
            let exec = if settings.os.is_windows() {
                ExecConfig::new(
                    "powershell",
                    vec![settings.paths.azure_token_helper.to_string()],
                )
            } else {
                ExecConfig::new(settings.paths.azure_token_helper, Vec::new())
            };
            (kubeconfig::EXEC_USER, UserEntry::exec(exec))
        }
        CredentialStrategy::Default => (
            kubeconfig::CLIENT_CERT_USER,
            UserEntry::client_certificate(paths::CLIENT_CERTIFICATE, paths::CLIENT_KEY),
        ),
        CredentialStrategy::CsrViaArc
        | CredentialStrategy::CsrViaAzure
        | CredentialStrategy::StaticToken
        | CredentialStrategy::SecureTlsBootstrap => {
            return Err(CredentialError::unhandled(strategy.as_str(), "static"));
        }
    };

    Ok(Kubeconfig::single(
        settings.paths.ca_cert,
        settings.api_server_name,
        user_name,
        user,
        kubeconfig::STATIC_CONTEXT,
    ))
}

fn arc_exec(settings: &CredentialSettings<'_>) -> ExecConfig {
    if settings.os.is_windows() {
        ExecConfig::new(
            "powershell",
            vec![settings.paths.arc_token_helper.to_string()],
        )
    } else {
        ExecConfig::new(settings.paths.arc_token_helper, Vec::new())
    }
}

fn secure_bootstrap_exec(settings: &CredentialSettings<'_>) -> ExecConfig {
    ExecConfig::new(
        paths::TLS_BOOTSTRAP_CLIENT,
        vec![
            "bootstrap".to_string(),
            "--next-proto=aks-tls-bootstrap".to_string(),
            format!("--aad-resource={}", settings.app_id),
        ],
    )
    .with_cluster_info()
}

fn arc_helper(settings: &CredentialSettings<'_>) -> String {
    match settings.os {
        NodeOs::Linux => helpers::arc_token_sh(settings.app_id),
        NodeOs::Windows => helpers::arc_token_ps1(settings.app_id),
    }
}

fn azure_helper(settings: &CredentialSettings<'_>) -> String {
    match settings.os {
        NodeOs::Linux => helpers::azure_token_sh(settings.app_id),
        NodeOs::Windows => {
            helpers::azure_token_ps1(
                settings.app_id,
                settings.managed_identity_client_id,
                settings.target_cloud,
            )
        }
    }
}
