//! Bootstrap script compilation
//!
//! Version gate first, then variable resolution, then template expansion into
//! a single line. The output is secret-bearing and only leaves this module
//! wrapped in `BootstrapScript`.
//!
//! File-content variables (`CONTAINERD_ULIMITS`, `KUBE_CA_CRT`,
//! `KUBELET_CLIENT_CONTENT`, `KUBELET_CLIENT_CERT_CONTENT`) are not assigned
//! by the template; the script reads them from its environment.

pub mod sensitive;
pub mod template;
pub mod variables;

pub use sensitive::BootstrapScript;
pub use template::TemplateError;
pub use variables::CseVariables;

use crate::contract::Contract;
use crate::log_success;
use crate::logging::codes;
use crate::validation::{check_version, VersionError};
use thiserror::Error;
use zeroize::Zeroize;

/// Embedded provisioning trigger
pub const CSE_CMD_TEMPLATE: &str = include_str!("../../templates/cse_cmd.sh.tpl");

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("contract version rejected: {0}")]
    Version(#[from] VersionError),

    #[error("bootstrap template expansion failed: {0}")]
    Template(#[from] TemplateError),
}

impl ScriptError {
    pub fn error_code(&self) -> codes::Code {
        match self {
            Self::Version(_) => codes::script::VERSION_REJECTED,
            Self::Template(_) => codes::script::TEMPLATE_EXPANSION_FAILED,
        }
    }
}

/// Compiles a contract into the one-line provisioning command
#[derive(Debug, Clone, Copy)]
pub struct ScriptCompiler {
    template: &'static str,
}

impl Default for ScriptCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptCompiler {
    pub fn new() -> Self {
        Self {
            template: CSE_CMD_TEMPLATE,
        }
    }

    /// Compiler over a different template; tags follow `template::expand`
    pub fn with_template(template: &'static str) -> Self {
        Self { template }
    }

    pub fn compile(&self, contract: &Contract) -> Result<BootstrapScript, ScriptError> {
        let variables = CseVariables::from_contract(contract);
        self.compile_with(contract, &variables)
    }

    /// Compile against variables already resolved for this contract
    pub fn compile_with(
        &self,
        contract: &Contract,
        variables: &CseVariables,
    ) -> Result<BootstrapScript, ScriptError> {
        check_version(&contract.version)?;

        // Values never carry raw newlines out of `expand`, so only template
        // line breaks are folded. The trailing one would become a trailing space.
        let mut expanded = template::expand(self.template, variables)?;
        let script = BootstrapScript::new(expanded.trim_end().replace('\n', " "));
        expanded.zeroize();

        log_success!(
            codes::success::SCRIPT_COMPILED,
            "Bootstrap script compiled",
            "bytes" => script.len(),
            "variables" => variables.len()
        );

        Ok(script)
    }
}
