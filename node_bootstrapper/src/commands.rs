//! Subcommand implementations

use crate::cli::CompileArgs;
use crate::error::ProvisionError;
use crate::exec::ScriptRunner;
use crate::input::read_contract;
use crate::writer::{self, COMPILED_SCRIPT_MODE, SCRIPT_MODE};
use nbc_compiler::config::runtime::ProvisionPreferences;
use nbc_compiler::logging::codes;
use nbc_compiler::{
    compile_contract, log_info, log_success, validate_document, CompileOptions,
    ProvisionArtifacts, VersionCompatibility,
};
use std::path::{Path, PathBuf};

impl CompileArgs {
    /// Flags override the `NBC_*` preferences
    pub fn options(&self) -> CompileOptions {
        let mut options = CompileOptions::default();
        if let Some(os) = self.os {
            options.node_os = os;
        }
        options.validate_required_fields |= self.validate;
        options
    }
}

/// Inputs to a provisioning run
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    pub provision_config: PathBuf,
    pub options: CompileOptions,
    pub dry_run: bool,
    /// `None` skips persisting the script
    pub script_path: Option<PathBuf>,
    /// Credential paths are re-rooted here; `/` on a live node
    pub root: PathBuf,
}

impl ProvisionRequest {
    pub fn from_args(args: &CompileArgs, dry_run: bool) -> Self {
        let preferences = ProvisionPreferences::default();
        let script_path = Some(preferences.script_path)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        Self {
            provision_config: args.provision_config.clone(),
            options: args.options(),
            dry_run: dry_run || preferences.dry_run,
            script_path,
            root: PathBuf::from("/"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub files_written: usize,
    pub script_path: Option<PathBuf>,
    pub executed: bool,
}

fn load(path: &Path, options: &CompileOptions) -> Result<ProvisionArtifacts, ProvisionError> {
    let bytes = read_contract(path)?;
    Ok(compile_contract(&bytes, options)?)
}

pub fn provision(
    request: &ProvisionRequest,
    runner: &ScriptRunner,
) -> Result<ProvisionReport, ProvisionError> {
    log_info!("Provisioning node",
        "config" => request.provision_config.display(),
        "dry_run" => request.dry_run
    );

    let artifacts = load(&request.provision_config, &request.options)?;

    let files_written = writer::write_files(&request.root, &artifacts.files)?;
    log_success!(
        codes::success::ARTIFACTS_WRITTEN,
        "Credential files written",
        "count" => files_written
    );

    if let Some(path) = &request.script_path {
        writer::write_script(path, &artifacts.script, SCRIPT_MODE)?;
        log_info!("Bootstrap script persisted", "path" => path.display());
    }

    if request.dry_run {
        log_info!("Dry run, bootstrap script not started");
    } else {
        runner.run(&artifacts.script, &artifacts.env)?;
        log_success!(
            codes::success::PROVISION_COMPLETED,
            "Bootstrap script completed"
        );
    }

    Ok(ProvisionReport {
        files_written,
        script_path: request.script_path.clone(),
        executed: !request.dry_run,
    })
}

/// Compile to `output`; the script never goes to stdout
pub fn compile_to_file(
    config: &Path,
    options: &CompileOptions,
    output: &Path,
) -> Result<(), ProvisionError> {
    let artifacts = load(config, options)?;
    writer::write_script(output, &artifacts.script, COMPILED_SCRIPT_MODE)?;

    log_success!(
        codes::success::ARTIFACTS_WRITTEN,
        "Bootstrap script written",
        "path" => output.display(),
        "bytes" => artifacts.script.len()
    );
    Ok(())
}

pub fn validate(config: &Path) -> Result<VersionCompatibility, ProvisionError> {
    let bytes = read_contract(config)?;
    Ok(validate_document(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use nbc_compiler::{NodeOs, PipelineError};
    use std::fs;

    const CONTRACT: &str = r#"{
        "version": "v0",
        "kubernetes_version": "1.29.2",
        "auth": { "subscription_id": "sub" },
        "cluster": {
            "resource_group": "rg",
            "location": "eastus",
            "cluster_network": { "vnet_name": "vnet", "route_table": "rt" }
        },
        "api_server": { "api_server_name": "cluster.hcp.eastus.azmk8s.io" },
        "tls_bootstrapping": { "tls_bootstrapping_token": "abcdef.0123456789abcdef" }
    }"#;

    fn contract_file(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("nbc.json");
        fs::write(&path, body).unwrap();
        path
    }

    fn request(dir: &Path, config: PathBuf) -> ProvisionRequest {
        ProvisionRequest {
            provision_config: config,
            options: CompileOptions {
                validate_required_fields: true,
                node_os: NodeOs::Linux,
            },
            dry_run: true,
            script_path: Some(dir.join("opt/azure/containers/cse_cmd.sh")),
            root: dir.join("root"),
        }
    }

    #[test]
    fn test_dry_run_writes_artifacts_only() {
        let dir = tempfile::tempdir().unwrap();
        let config = contract_file(dir.path(), CONTRACT);
        let request = request(dir.path(), config);

        let report = provision(&request, &ScriptRunner::new()).unwrap();
        assert_eq!(report.files_written, 1);
        assert!(!report.executed);

        let kubeconfig =
            fs::read_to_string(dir.path().join("root/var/lib/kubelet/bootstrap-kubeconfig")).unwrap();
        assert!(kubeconfig.contains("abcdef.0123456789abcdef"));

        let script = fs::read_to_string(dir.path().join("opt/azure/containers/cse_cmd.sh")).unwrap();
        assert!(script.contains("LOCATION=\"eastus\""));
        assert!(!script.contains('\n'));
    }

    #[cfg(unix)]
    #[test]
    fn test_compile_writes_private_script() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let config = contract_file(dir.path(), CONTRACT);
        let output = dir.path().join("out/cse_cmd.sh");

        compile_to_file(&config, &CompileOptions::default(), &output).unwrap();

        let mode = fs::metadata(&output).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, COMPILED_SCRIPT_MODE);
        assert!(fs::read_to_string(&output)
            .unwrap()
            .contains("TLS_BOOTSTRAP_TOKEN=\"abcdef.0123456789abcdef\""));
    }

    #[test]
    fn test_validation_failure_stops_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let config = contract_file(dir.path(), r#"{ "version": "v0" }"#);
        let request = request(dir.path(), config);

        let error = provision(&request, &ScriptRunner::new()).unwrap_err();
        assert_matches!(error, ProvisionError::Pipeline(PipelineError::Validation(_)));
        assert_eq!(error.exit_code(), 1);
        assert!(!dir.path().join("root").exists());
    }

    #[test]
    fn test_validate_command() {
        let dir = tempfile::tempdir().unwrap();
        let config = contract_file(dir.path(), CONTRACT);
        assert_eq!(validate(&config).unwrap(), VersionCompatibility::Legacy);

        let config = contract_file(dir.path(), r#"{ "version": "2.0.0" }"#);
        assert_matches!(validate(&config), Err(ProvisionError::Pipeline(_)));
    }

    #[test]
    fn test_flags_override_preferences() {
        let args = CompileArgs {
            provision_config: PathBuf::from("nbc.json"),
            os: Some(NodeOs::Windows),
            validate: true,
        };
        let options = args.options();
        assert_eq!(options.node_os, NodeOs::Windows);
        assert!(options.validate_required_fields);
    }
}
