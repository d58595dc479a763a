//! # Node Bootstrapper CLI

use nbc_compiler::config::runtime::LoggingPreferences;
use nbc_compiler::logging::codes;
use nbc_compiler::{log_error, log_info};
use node_bootstrapper::bridge;
use node_bootstrapper::cli::{Cli, Command};
use node_bootstrapper::commands::{self, ProvisionRequest};
use node_bootstrapper::exec::ScriptRunner;
use node_bootstrapper::ProvisionError;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = bridge::install(LoggingPreferences::default()) {
        eprintln!("[{}] {}", codes::system::INITIALIZATION_FAILURE, e);
    }

    let cli = Cli::parse_args();
    if let Err(error) = run(cli) {
        log_error!(error.error_code(), "Node bootstrapper failed", "error" => &error);
        eprintln!("Error: {}", error);
        std::process::exit(error.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), ProvisionError> {
    match cli.command {
        Command::Provision { compile, dry_run } => {
            let request = ProvisionRequest::from_args(&compile, dry_run);
            let report = commands::provision(&request, &ScriptRunner::new())?;
            log_info!("Provisioning finished",
                "files" => report.files_written,
                "executed" => report.executed
            );
        }
        Command::Compile { compile, output } => {
            commands::compile_to_file(&compile.provision_config, &compile.options(), &output)?;
            println!("[OK] Bootstrap script written to: {}", output.display());
        }
        Command::Validate { provision_config } => {
            let compatibility = commands::validate(&provision_config)?;
            println!("[OK] {} ({:?})", provision_config.display(), compatibility);
        }
    }
    Ok(())
}
