//! Consolidated error codes and classification system
//!
//! Single source of truth for every code the compiler and bootstrapper emit,
//! together with the metadata used to classify them.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for error, warning and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        requires_halt: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            recoverable,
            requires_halt,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
}

/// Contract decoding and normalization
pub mod contract {
    use super::Code;

    pub const DECODE_FAILED: Code = Code::new("E010");
}

/// Compatibility validation
pub mod validation {
    use super::Code;

    pub const VERSION_UNPARSABLE: Code = Code::new("E020");
    pub const MAJOR_VERSION_MISMATCH: Code = Code::new("E021");
    pub const REQUIRED_FIELD_MISSING: Code = Code::new("E022");
}

/// Credential strategy selection
pub mod credentials {
    use super::Code;

    pub const UNHANDLED_STRATEGY: Code = Code::new("E040");
}

/// Script compilation
pub mod script {
    use super::Code;

    pub const VERSION_REJECTED: Code = Code::new("E050");
    pub const TEMPLATE_EXPANSION_FAILED: Code = Code::new("E051");
}

/// Provisioning I/O and execution (bootstrapper side)
pub mod provision {
    use super::Code;

    pub const CONTRACT_READ_FAILED: Code = Code::new("E060");
    pub const CONTRACT_TOO_LARGE: Code = Code::new("E061");
    pub const INVALID_ENCODING: Code = Code::new("E062");
    pub const FILE_WRITE_FAILED: Code = Code::new("E063");
    pub const SCRIPT_START_FAILED: Code = Code::new("E064");
    pub const SCRIPT_EXIT_NONZERO: Code = Code::new("E065");
}

/// Warning codes
pub mod warning {
    use super::Code;

    pub const GENERIC: Code = Code::new("W000");
    pub const MINOR_VERSION_DRIFT: Code = Code::new("W001");
    pub const DEEP_COPY_FALLBACK: Code = Code::new("W002");
    pub const KUBERNETES_VERSION_UNPARSABLE: Code = Code::new("W003");
}

// ============================================================================
// SUCCESS CODE CONSTANTS
// ============================================================================

/// Success codes
pub mod success {
    use super::Code;

    pub const OPERATION_COMPLETED_SUCCESSFULLY: Code = Code::new("I001");
    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I004");

    pub const CONTRACT_NORMALIZED: Code = Code::new("I010");
    pub const VALIDATION_PASSED: Code = Code::new("I020");
    pub const KUBELET_FLAGS_COMPUTED: Code = Code::new("I030");
    pub const CREDENTIALS_SELECTED: Code = Code::new("I040");
    pub const SCRIPT_COMPILED: Code = Code::new("I050");
    pub const ARTIFACTS_WRITTEN: Code = Code::new("I060");
    pub const PROVISION_COMPLETED: Code = Code::new("I061");
}

// ============================================================================
// ERROR METADATA REGISTRY
// ============================================================================

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

fn register(registry: &mut HashMap<&'static str, ErrorMetadata>, metadata: ErrorMetadata) {
    registry.insert(metadata.code, metadata);
}

fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        let mut registry = HashMap::new();

        // System
        register(
            &mut registry,
            ErrorMetadata::new(
                "ERR001",
                "System",
                Severity::Critical,
                false,
                true,
                "Critical internal error",
                "File a bug report with the bootstrapper version",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "ERR002",
                "System",
                Severity::Critical,
                false,
                true,
                "Logging or configuration initialization failure",
                "Check NBC_* environment variables",
            ),
        );

        // Contract
        register(
            &mut registry,
            ErrorMetadata::new(
                "E010",
                "Contract",
                Severity::High,
                false,
                true,
                "Contract document could not be decoded",
                "Verify the control plane produced well-formed JSON for this schema",
            ),
        );

        // Validation
        register(
            &mut registry,
            ErrorMetadata::new(
                "E020",
                "Validation",
                Severity::High,
                false,
                true,
                "Contract version is not a semantic version",
                "Regenerate the contract with a supported producer",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "E021",
                "Validation",
                Severity::High,
                false,
                true,
                "Contract major version does not match the bootstrapper",
                "Use a node image whose bootstrapper supports this contract major version",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "E022",
                "Validation",
                Severity::High,
                false,
                true,
                "Required contract field is empty",
                "Populate the named field in the contract",
            ),
        );

        // Credentials
        register(
            &mut registry,
            ErrorMetadata::new(
                "E040",
                "Credentials",
                Severity::Critical,
                false,
                true,
                "Bootstrapping method has no credential strategy",
                "Add a transition for the new bootstrapping method",
            ),
        );

        // Script
        register(
            &mut registry,
            ErrorMetadata::new(
                "E050",
                "Script",
                Severity::High,
                false,
                true,
                "Contract version rejected before compilation",
                "Use a contract version supported by this bootstrapper",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "E051",
                "Script",
                Severity::Critical,
                false,
                true,
                "Bootstrap template failed to expand",
                "The embedded template and variable set are out of sync; file a bug report",
            ),
        );

        // Provisioning
        register(
            &mut registry,
            ErrorMetadata::new(
                "E060",
                "Provision",
                Severity::High,
                false,
                true,
                "Provision config could not be read",
                "Check the --provision-config path and permissions",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "E061",
                "Provision",
                Severity::High,
                false,
                true,
                "Provision config exceeds the maximum size",
                "Check that the path points at a contract document",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "E062",
                "Provision",
                Severity::High,
                false,
                true,
                "Provision config is not valid UTF-8",
                "Re-encode the contract as UTF-8 JSON",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "E063",
                "Provision",
                Severity::High,
                false,
                true,
                "Credential or script file could not be written",
                "Check filesystem permissions on the node",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "E064",
                "Provision",
                Severity::Critical,
                false,
                true,
                "Bootstrap script could not be started",
                "Verify /bin/bash exists on the node image",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "E065",
                "Provision",
                Severity::High,
                false,
                true,
                "Bootstrap script exited with a non-zero status",
                "Inspect /var/log/azure/cluster-provision.log on the node",
            ),
        );

        // Warnings
        register(
            &mut registry,
            ErrorMetadata::new(
                "W001",
                "Validation",
                Severity::Low,
                true,
                false,
                "Contract minor version differs from the bootstrapper",
                "Upgrade the node image to pick up newer contract fields",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "W002",
                "Contract",
                Severity::Medium,
                true,
                false,
                "Deep copy failed; defaults applied to held contract",
                "Inspect the contract input",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "W003",
                "Kubelet",
                Severity::Low,
                true,
                false,
                "Kubernetes version is not parsable; treated as 0.0.0",
                "Set kubernetes_version to MAJOR.MINOR.PATCH",
            ),
        );

        // Success
        for (code, description) in [
            ("I001", "Operation completed successfully"),
            ("I004", "Logging system initialized"),
            ("I010", "Contract normalized"),
            ("I020", "Contract validation passed"),
            ("I030", "Kubelet flags computed"),
            ("I040", "Credential strategy selected"),
            ("I050", "Bootstrap script compiled"),
            ("I060", "Provisioning artifacts written"),
            ("I061", "Provisioning completed"),
        ] {
            register(
                &mut registry,
                ErrorMetadata::new(
                    code,
                    "Success",
                    Severity::Low,
                    true,
                    false,
                    description,
                    "None",
                ),
            );
        }

        registry
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

pub fn get_severity(code: &str) -> Severity {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

pub fn is_recoverable(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

pub fn requires_halt(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.requires_halt)
        .unwrap_or(false)
}

/// Get human-readable description for a code
pub fn get_description(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

pub fn get_action(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recommended_action)
        .unwrap_or("No specific action available")
}

pub fn get_category(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}
