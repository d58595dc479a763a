mod error;

pub use error::{DecodeError, PipelineError, PipelineResult};

use crate::config::runtime::CompilerPreferences;
use crate::contract::{Contract, NodeOs};
use crate::credentials::{select_credential_files, FileMap};
use crate::logging::codes;
use crate::normalize::normalize;
use crate::script::{BootstrapScript, CseVariables, ScriptCompiler};
use crate::validation::{validate_contract, VersionCompatibility};
use crate::{log_info, log_success};

/// Per-compilation switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Run required-field validation before compiling
    pub validate_required_fields: bool,
    pub node_os: NodeOs,
}

impl CompileOptions {
    pub fn from_preferences(preferences: &CompilerPreferences) -> Self {
        Self {
            validate_required_fields: preferences.validate_required_fields,
            node_os: preferences.default_node_os,
        }
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self::from_preferences(&CompilerPreferences::default())
    }
}

/// Everything a node needs to provision itself
///
/// `Debug` is safe to print: the script is redacted, file contents are
/// reduced to lengths and variables to names.
#[derive(Debug, Clone)]
pub struct ProvisionArtifacts {
    pub script: BootstrapScript,
    pub files: FileMap,
    /// Child process environment for the script
    pub env: CseVariables,
}

pub fn decode_contract(bytes: &[u8]) -> Result<Contract, DecodeError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Decode, normalize and compile a contract document
pub fn compile_contract(
    bytes: &[u8],
    options: &CompileOptions,
) -> PipelineResult<ProvisionArtifacts> {
    let contract = decode_contract(bytes)?;
    compile(contract, options)
}

/// Normalize and compile an already-decoded contract
pub fn compile(contract: Contract, options: &CompileOptions) -> PipelineResult<ProvisionArtifacts> {
    log_info!("Starting contract compilation",
        "node_os" => options.node_os,
        "validate_required_fields" => options.validate_required_fields
    );

    let contract = normalize(contract);
    log_success!(
        codes::success::CONTRACT_NORMALIZED,
        "Contract normalized",
        "version" => contract.version.as_str()
    );

    if options.validate_required_fields {
        validate_contract(&contract)?;
    }

    let env = CseVariables::from_contract(&contract);
    let script = ScriptCompiler::new().compile_with(&contract, &env)?;
    let files = select_credential_files(&contract, options.node_os)?;

    log_success!(
        codes::success::OPERATION_COMPLETED_SUCCESSFULLY,
        "Contract compilation completed",
        "files" => files.len(),
        "variables" => env.len()
    );

    Ok(ProvisionArtifacts { script, files, env })
}

/// Decode, normalize and run full validation without compiling
pub fn validate_document(bytes: &[u8]) -> PipelineResult<VersionCompatibility> {
    let contract = normalize(decode_contract(bytes)?);
    Ok(validate_contract(&contract)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::ScriptError;
    use crate::validation::{ValidationError, VersionError};
    use assert_matches::assert_matches;

    const COMPLETE: &str = r#"{
        "version": "v0",
        "kubernetes_version": "1.29.2",
        "auth": { "subscription_id": "sub", "tenant_id": "tenant" },
        "cluster": {
            "resource_group": "rg",
            "location": "westeurope",
            "cluster_network": { "vnet_name": "vnet", "route_table": "rt" }
        },
        "api_server": { "api_server_name": "cluster.hcp.westeurope.azmk8s.io" },
        "tls_bootstrapping": { "tls_bootstrapping_token": "abcdef.0123456789abcdef" },
        "kubelet": { "kubelet_flags": { "--feature-gates": "DynamicKubeletConfig=true,a=b" } }
    }"#;

    fn validating() -> CompileOptions {
        CompileOptions {
            validate_required_fields: true,
            node_os: NodeOs::Linux,
        }
    }

    #[test]
    fn test_compile_complete_contract() {
        let artifacts = compile_contract(COMPLETE.as_bytes(), &validating()).unwrap();

        assert_eq!(artifacts.files.paths(), vec!["/var/lib/kubelet/bootstrap-kubeconfig"]);
        assert_eq!(artifacts.env.get("KUBELET_FLAGS"), Some("--feature-gates=a=b"));
        assert_eq!(artifacts.env.get("LOCATION"), Some("westeurope"));
        assert!(artifacts.script.reveal().contains("KUBERNETES_VERSION=\"1.29.2\""));
    }

    #[test]
    fn test_debug_output_carries_no_secrets() {
        let artifacts = compile_contract(COMPLETE.as_bytes(), &validating()).unwrap();
        let rendered = format!("{:?}", artifacts);
        assert!(!rendered.contains("0123456789abcdef"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_required_fields_only_when_requested() {
        let document = br#"{ "version": "v0" }"#;

        assert_matches!(
            compile_contract(document, &validating()),
            Err(PipelineError::Validation(ValidationError::RequiredField {
                field: "AuthConfig.SubscriptionId"
            }))
        );

        let relaxed = CompileOptions {
            validate_required_fields: false,
            node_os: NodeOs::Linux,
        };
        assert!(compile_contract(document, &relaxed).is_ok());
    }

    #[test]
    fn test_empty_document_compiles_at_expected_version() {
        let relaxed = CompileOptions {
            validate_required_fields: false,
            node_os: NodeOs::Linux,
        };
        let artifacts = compile_contract(b"{}", &relaxed).unwrap();

        assert_eq!(artifacts.env.get("IS_KATA"), Some("false"));
        assert_eq!(artifacts.env.get("CUSTOM_CA_TRUST_COUNT"), Some("0"));
        assert!(artifacts.script.reveal().contains(" ENABLE_UNATTENDED_UPGRADES=false "));
    }

    #[test]
    fn test_incompatible_version_fails_in_script_stage() {
        let relaxed = CompileOptions {
            validate_required_fields: false,
            node_os: NodeOs::Windows,
        };
        let error = compile_contract(br#"{ "version": "2.0.0" }"#, &relaxed).unwrap_err();

        assert_matches!(
            error,
            PipelineError::Script(ScriptError::Version(VersionError::MajorMismatch { .. }))
        );
        assert_eq!(error.error_code(), codes::script::VERSION_REJECTED);
    }

    #[test]
    fn test_malformed_document_hides_values() {
        let error = compile_contract(br#"{ "version": 12345678 }"#, &validating()).unwrap_err();

        assert_matches!(error, PipelineError::Decode(DecodeError { category: "data", .. }));
        assert!(!error.to_string().contains("12345678"));
        assert_eq!(error.error_code(), codes::contract::DECODE_FAILED);
    }

    #[test]
    fn test_validate_document() {
        assert_eq!(
            validate_document(COMPLETE.as_bytes()).unwrap(),
            VersionCompatibility::Legacy
        );
        assert_matches!(
            validate_document(b"not json"),
            Err(PipelineError::Decode(DecodeError { category: "syntax", .. }))
        );
    }
}
