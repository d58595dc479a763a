// build.rs - TOML-driven compile-time constant generation
use std::env;
use std::fs;
use std::path::Path;

#[derive(serde::Deserialize)]
struct CompileTimeConfig {
    contract: ContractLimits,
    input: InputLimits,
    logging: LoggingLimits,
}

#[derive(serde::Deserialize)]
struct ContractLimits {
    expected_version: String,
    legacy_version: String,
    max_custom_ca_certs: usize,
}

#[derive(serde::Deserialize)]
struct InputLimits {
    max_contract_bytes: u64,
}

#[derive(serde::Deserialize)]
struct LoggingLimits {
    log_buffer_size: usize,
    max_log_message_length: usize,
    security_min_log_level: u8,
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=NBC_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=NBC_CONFIG_DIR");

    let profile = env::var("NBC_BUILD_PROFILE").unwrap_or_else(|_| "development".to_string());
    let config_dir = env::var("NBC_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    // Profiles live at the workspace root, one level above this crate
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo");
    let workspace_root = Path::new(&manifest_dir)
        .parent()
        .expect("Could not find workspace root (parent directory)");

    let config_path = workspace_root
        .join(&config_dir)
        .join(format!("{}.toml", profile));

    println!("cargo:rerun-if-changed={}", config_path.display());

    if !config_path.exists() {
        panic!(
            "Configuration file not found: {}\nLooking for: {}/{}/{}.toml",
            config_path.display(),
            workspace_root.display(),
            config_dir,
            profile
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", config_path.display(), e));

    let config: CompileTimeConfig = toml::from_str(&config_content)
        .unwrap_or_else(|e| panic!("Invalid TOML in {}: {}", config_path.display(), e));

    validate_security_constraints(&config, &profile);
    generate_constants(&config, &profile);
}

fn validate_security_constraints(config: &CompileTimeConfig, profile: &str) {
    const ABSOLUTE_MAX_CONTRACT_BYTES: u64 = 64 * 1024 * 1024;

    if config.input.max_contract_bytes == 0
        || config.input.max_contract_bytes > ABSOLUTE_MAX_CONTRACT_BYTES
    {
        panic!("SECURITY: max_contract_bytes must be between 1 and {ABSOLUTE_MAX_CONTRACT_BYTES}");
    }

    if config.logging.security_min_log_level > 2 {
        panic!("SECURITY: security_min_log_level too high (max: 2)");
    }

    let core = config
        .contract
        .expected_version
        .trim_start_matches('v')
        .split('.')
        .collect::<Vec<_>>();
    if core.len() != 3 || core.iter().any(|part| part.parse::<u64>().is_err()) {
        panic!(
            "contract.expected_version must be MAJOR.MINOR.PATCH, got {:?}",
            config.contract.expected_version
        );
    }

    if config.contract.legacy_version.is_empty() {
        panic!("contract.legacy_version must not be empty");
    }

    if profile == "production" && config.input.max_contract_bytes > 4 * 1024 * 1024 {
        panic!("PRODUCTION: max_contract_bytes too high for production");
    }
}

fn generate_constants(config: &CompileTimeConfig, profile: &str) {
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let output_path = Path::new(&out_dir).join("constants.rs");

    let constants_code = format!(
        r#"
// Generated compile-time constants from TOML configuration
// Profile: {}
// DO NOT EDIT - Generated by build.rs

pub mod compile_time {{
    pub mod contract {{
        pub const EXPECTED_VERSION: &str = {:?};
        pub const LEGACY_VERSION: &str = {:?};
        pub const MAX_CUSTOM_CA_CERTS: usize = {};
    }}

    pub mod input {{
        pub const MAX_CONTRACT_BYTES: u64 = {};
    }}

    pub mod logging {{
        pub const LOG_BUFFER_SIZE: usize = {};
        pub const MAX_LOG_MESSAGE_LENGTH: usize = {};
        pub const SECURITY_MIN_LOG_LEVEL: u8 = {};
    }}
}}
"#,
        profile,
        config.contract.expected_version,
        config.contract.legacy_version,
        config.contract.max_custom_ca_certs,
        config.input.max_contract_bytes,
        config.logging.log_buffer_size,
        config.logging.max_log_message_length,
        config.logging.security_min_log_level,
    );

    fs::write(output_path, constants_code).expect("failed to write generated constants");
}
