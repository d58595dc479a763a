use crate::logging::codes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    /// A kubeconfig builder was handed a strategy it does not serve
    #[error("credential strategy {strategy} has no {kubeconfig} kubeconfig form")]
    UnhandledStrategy {
        strategy: &'static str,
        kubeconfig: &'static str,
    },

    #[error("failed to render kubeconfig: {source}")]
    Render {
        #[source]
        source: serde_yaml::Error,
    },
}

impl CredentialError {
    pub fn unhandled(strategy: &'static str, kubeconfig: &'static str) -> Self {
        Self::UnhandledStrategy {
            strategy,
            kubeconfig,
        }
    }

    pub fn error_code(&self) -> codes::Code {
        match self {
            Self::UnhandledStrategy { .. } => codes::credentials::UNHANDLED_STRATEGY,
            Self::Render { .. } => codes::system::INTERNAL_ERROR,
        }
    }
}

impl From<serde_yaml::Error> for CredentialError {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Render { source }
    }
}
