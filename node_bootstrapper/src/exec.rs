//! Bootstrap script execution

use crate::error::ProvisionError;
use nbc_compiler::{log_info, BootstrapScript, CseVariables};
use std::path::PathBuf;
use std::process::{Command, Stdio};

pub const DEFAULT_SHELL: &str = "/bin/bash";

/// Runs the one-line script through a shell with the CSE variables in its
/// environment
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    shell: PathBuf,
    working_dir: PathBuf,
}

impl Default for ScriptRunner {
    fn default() -> Self {
        Self {
            shell: PathBuf::from(DEFAULT_SHELL),
            working_dir: PathBuf::from("/"),
        }
    }
}

impl ScriptRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn run(&self, script: &BootstrapScript, env: &CseVariables) -> Result<(), ProvisionError> {
        self.run_command(script.reveal(), env)
    }

    fn run_command(&self, command: &str, env: &CseVariables) -> Result<(), ProvisionError> {
        log_info!("Starting bootstrap script",
            "shell" => self.shell.display(),
            "working_dir" => self.working_dir.display(),
            "variables" => env.len()
        );

        let status = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .current_dir(&self.working_dir)
            .envs(env.iter())
            .stdin(Stdio::null())
            .status()
            .map_err(|source| ProvisionError::Start { source })?;

        if status.success() {
            Ok(())
        } else {
            Err(ProvisionError::Exit {
                code: status.code(),
            })
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use nbc_compiler::normalize::normalize;
    use nbc_compiler::Contract;

    #[test]
    fn test_success() {
        let runner = ScriptRunner::new();
        assert!(runner.run_command("true", &CseVariables::default()).is_ok());
    }

    #[test]
    fn test_exit_status_is_kept() {
        let runner = ScriptRunner::new();
        assert_matches!(
            runner.run_command("exit 7", &CseVariables::default()),
            Err(ProvisionError::Exit { code: Some(7) })
        );
    }

    #[test]
    fn test_signal_has_no_code() {
        let runner = ScriptRunner::new();
        assert_matches!(
            runner.run_command("kill -9 $$", &CseVariables::default()),
            Err(ProvisionError::Exit { code: None })
        );
    }

    #[test]
    fn test_environment_and_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let env = CseVariables::from_contract(&normalize(Contract::default()));
        let runner = ScriptRunner::new().with_working_dir(dir.path());

        let result = runner.run_command(
            r#"test "$IS_KATA" = false && test "$TARGET_ENVIRONMENT" = AzurePublicCloud && touch marker"#,
            &env,
        );
        assert!(result.is_ok());
        assert!(dir.path().join("marker").exists());
    }

    #[test]
    fn test_missing_shell() {
        let runner = ScriptRunner {
            shell: PathBuf::from("/nonexistent/shell"),
            working_dir: PathBuf::from("/"),
        };
        assert_matches!(
            runner.run_command("true", &CseVariables::default()),
            Err(ProvisionError::Start { .. })
        );
    }
}
