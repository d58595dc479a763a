//! CLI argument definitions using clap
//!
//! Commands:
//! - node-bootstrapper provision --provision-config <path>
//! - node-bootstrapper compile --provision-config <path> --output <path>
//! - node-bootstrapper validate --provision-config <path>

use clap::{Args, Parser, Subcommand};
use nbc_compiler::NodeOs;
use std::path::PathBuf;

/// Compiles the node bootstrap contract and provisions this node
#[derive(Parser, Debug)]
#[command(name = "node-bootstrapper")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write credentials and run the compiled bootstrap script
    Provision {
        #[command(flatten)]
        compile: CompileArgs,

        /// Write artifacts but do not run the script
        #[arg(long)]
        dry_run: bool,
    },

    /// Write the compiled script to a file without running it
    Compile {
        #[command(flatten)]
        compile: CompileArgs,

        /// Destination of the script; written with mode 0700
        #[arg(long, default_value = "./cse_cmd.sh")]
        output: PathBuf,
    },

    /// Normalize and fully validate a contract
    Validate {
        /// Path to the contract document
        #[arg(long)]
        provision_config: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct CompileArgs {
    /// Path to the contract document
    #[arg(long)]
    pub provision_config: PathBuf,

    /// Operating system of this node; defaults to NBC_DEFAULT_NODE_OS or linux
    #[arg(long, value_parser = parse_node_os)]
    pub os: Option<NodeOs>,

    /// Check required fields before compiling
    #[arg(long)]
    pub validate: bool,
}

fn parse_node_os(value: &str) -> Result<NodeOs, String> {
    NodeOs::parse(value).ok_or_else(|| format!("unknown node OS '{}', expected linux or windows", value))
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_provision_args() {
        let cli = Cli::try_parse_from([
            "node-bootstrapper",
            "provision",
            "--provision-config",
            "/opt/azure/containers/nbc.json",
            "--os",
            "Windows",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Command::Provision { compile, dry_run } => {
                assert_eq!(compile.provision_config, PathBuf::from("/opt/azure/containers/nbc.json"));
                assert_eq!(compile.os, Some(NodeOs::Windows));
                assert!(!compile.validate);
                assert!(dry_run);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_unknown_os_rejected() {
        let result = Cli::try_parse_from([
            "node-bootstrapper",
            "compile",
            "--provision-config",
            "c.json",
            "--os",
            "plan9",
        ]);
        assert!(result.is_err());
    }
}
