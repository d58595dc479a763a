#[macro_use]
pub mod logging;
pub mod config;
pub mod contract;
pub mod credentials;
pub mod kubelet;
pub mod normalize;
pub mod pipeline;
pub mod script;
pub mod utils;
pub mod validation;

// Re-export key types for library consumers
pub use contract::{Contract, NodeOs};
pub use credentials::{CredentialStrategy, File, FileMap};
pub use pipeline::{
    compile, compile_contract, validate_document, CompileOptions, PipelineError, PipelineResult,
    ProvisionArtifacts,
};
pub use script::{BootstrapScript, CseVariables, ScriptCompiler};
pub use validation::VersionCompatibility;
