//! Kubeconfig documents rendered through serde_yaml

use serde::Serialize;

pub const EXEC_API_VERSION: &str = "client.authentication.k8s.io/v1";

pub const CLUSTER_NAME: &str = "localcluster";
pub const BOOTSTRAP_USER: &str = "kubelet-bootstrap";
pub const BOOTSTRAP_CONTEXT: &str = "bootstrap-context";
pub const STATIC_CONTEXT: &str = "localclustercontext";
pub const EXEC_USER: &str = "default-auth";
pub const CLIENT_CERT_USER: &str = "client";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kubeconfig {
    #[serde(rename = "apiVersion")]
    pub api_version: &'static str,
    pub kind: &'static str,
    pub clusters: Vec<NamedCluster>,
    pub users: Vec<NamedUser>,
    pub contexts: Vec<NamedContext>,
    #[serde(rename = "current-context")]
    pub current_context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: ClusterEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterEntry {
    #[serde(rename = "certificate-authority")]
    pub certificate_authority: String,
    pub server: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedUser {
    pub name: String,
    pub user: UserEntry,
}

/// Exactly one credential form is populated per user
#[derive(Clone, PartialEq, Default, Serialize)]
pub struct UserEntry {
    #[serde(rename = "client-certificate", skip_serializing_if = "Option::is_none")]
    pub client_certificate: Option<String>,
    #[serde(rename = "client-key", skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exec: Option<ExecConfig>,
}

impl std::fmt::Debug for UserEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserEntry")
            .field("client_certificate", &self.client_certificate)
            .field("client_key", &self.client_key)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("exec", &self.exec)
            .finish()
    }
}

impl UserEntry {
    pub fn client_certificate(cert: &str, key: &str) -> Self {
        Self {
            client_certificate: Some(cert.to_string()),
            client_key: Some(key.to_string()),
            ..Default::default()
        }
    }

    pub fn token(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            ..Default::default()
        }
    }

    pub fn exec(exec: ExecConfig) -> Self {
        Self {
            exec: Some(exec),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecConfig {
    #[serde(rename = "apiVersion")]
    pub api_version: &'static str,
    pub command: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(rename = "provideClusterInfo")]
    pub provide_cluster_info: bool,
    /// Required by the v1 exec API; kubelet never has a terminal
    #[serde(rename = "interactiveMode")]
    pub interactive_mode: &'static str,
}

impl ExecConfig {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            api_version: EXEC_API_VERSION,
            command: command.into(),
            args,
            provide_cluster_info: false,
            interactive_mode: "Never",
        }
    }

    pub fn with_cluster_info(mut self) -> Self {
        self.provide_cluster_info = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedContext {
    pub name: String,
    pub context: ContextEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextEntry {
    pub cluster: String,
    pub user: String,
}

impl Kubeconfig {
    /// Single cluster, single user, single context
    pub fn single(
        ca_cert: &str,
        api_server_name: &str,
        user_name: &str,
        user: UserEntry,
        context_name: &str,
    ) -> Self {
        Self {
            api_version: "v1",
            kind: "Config",
            clusters: vec![NamedCluster {
                name: CLUSTER_NAME.to_string(),
                cluster: ClusterEntry {
                    certificate_authority: ca_cert.to_string(),
                    server: format!("https://{}:443", api_server_name),
                },
            }],
            users: vec![NamedUser {
                name: user_name.to_string(),
                user,
            }],
            contexts: vec![NamedContext {
                name: context_name.to_string(),
                context: ContextEntry {
                    cluster: CLUSTER_NAME.to_string(),
                    user: user_name.to_string(),
                },
            }],
            current_context: context_name.to_string(),
        }
    }

    pub fn render(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_uses_kubeconfig_field_names() {
        let config = Kubeconfig::single(
            "/etc/kubernetes/certs/ca.crt",
            "api.example.com",
            CLIENT_CERT_USER,
            UserEntry::client_certificate("/c.crt", "/c.key"),
            STATIC_CONTEXT,
        );
        let yaml = config.render().unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(value["apiVersion"].as_str(), Some("v1"));
        assert_eq!(value["current-context"].as_str(), Some("localclustercontext"));
        assert_eq!(
            value["clusters"][0]["cluster"]["server"].as_str(),
            Some("https://api.example.com:443")
        );
        assert_eq!(
            value["users"][0]["user"]["client-certificate"].as_str(),
            Some("/c.crt")
        );
        assert!(value["users"][0]["user"].get("token").is_none());
        assert_eq!(value["contexts"][0]["context"]["user"].as_str(), Some("client"));
    }

    #[test]
    fn test_exec_user_renders_interactive_mode() {
        let exec = ExecConfig::new("/opt/helper.sh", Vec::new());
        let config = Kubeconfig::single("ca", "api", EXEC_USER, UserEntry::exec(exec), STATIC_CONTEXT);
        let value: serde_yaml::Value = serde_yaml::from_str(&config.render().unwrap()).unwrap();

        let exec = &value["users"][0]["user"]["exec"];
        assert_eq!(exec["apiVersion"].as_str(), Some(EXEC_API_VERSION));
        assert_eq!(exec["interactiveMode"].as_str(), Some("Never"));
        assert_eq!(exec["provideClusterInfo"].as_bool(), Some(false));
        assert!(exec.get("args").is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let user = UserEntry::token("abcdef.0123456789abcdef");
        assert!(!format!("{:?}", user).contains("0123456789abcdef"));
    }
}
