//! Azure cloud resolution
//!
//! `TARGET_ENVIRONMENT` names the environment the node provisions against;
//! `TARGET_CLOUD` is the name Azure SDK clients such as kubelogin accept,
//! with custom clouds read from an environment file as `AzureStackCloud`.

use super::constants::cloud;
use super::Contract;

impl Contract {
    pub fn is_aks_custom_cloud(&self) -> bool {
        self.custom_cloud()
            .custom_cloud_env_name
            .eq_ignore_ascii_case(cloud::AKS_CUSTOM_CLOUD_NAME)
    }

    pub fn target_environment(&self) -> &'static str {
        if self.is_aks_custom_cloud() {
            cloud::AKS_CUSTOM_CLOUD_NAME
        } else {
            location_cloud(&self.cluster().location)
        }
    }

    pub fn target_cloud(&self) -> &'static str {
        if self.is_aks_custom_cloud() {
            cloud::AZURE_STACK_CLOUD
        } else {
            location_cloud(&self.cluster().location)
        }
    }
}

/// Sovereign cloud for a region, or public
pub fn location_cloud(location: &str) -> &'static str {
    let location: String = location
        .split_whitespace()
        .collect::<String>()
        .to_lowercase();

    if location.starts_with("china") {
        cloud::AZURE_CHINA_CLOUD
    } else if location == "germanynortheast" || location == "germanycentral" {
        cloud::AZURE_GERMAN_CLOUD
    } else if location.starts_with("usgov") || location.starts_with("usdod") {
        cloud::AZURE_US_GOVERNMENT_CLOUD
    } else {
        cloud::AZURE_PUBLIC_CLOUD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{ClusterConfig, CustomCloudConfig};

    fn located(location: &str) -> Contract {
        Contract {
            cluster: Some(ClusterConfig {
                location: location.into(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_sovereign_cloud_by_location() {
        assert_eq!(location_cloud("China East 2"), "AzureChinaCloud");
        assert_eq!(location_cloud("germanycentral"), "AzureGermanCloud");
        assert_eq!(location_cloud("germanywestcentral"), "AzurePublicCloud");
        assert_eq!(location_cloud("USGov Virginia"), "AzureUSGovernmentCloud");
        assert_eq!(location_cloud("usdodeast"), "AzureUSGovernmentCloud");
        assert_eq!(location_cloud("eastus"), "AzurePublicCloud");
    }

    #[test]
    fn test_custom_cloud_overrides_location() {
        let mut contract = located("usgovvirginia");
        assert_eq!(contract.target_environment(), "AzureUSGovernmentCloud");
        assert_eq!(contract.target_cloud(), "AzureUSGovernmentCloud");

        contract.custom_cloud = Some(CustomCloudConfig {
            custom_cloud_env_name: "AKSCustom".into(),
            ..Default::default()
        });
        assert!(contract.is_aks_custom_cloud());
        assert_eq!(contract.target_environment(), "akscustom");
        assert_eq!(contract.target_cloud(), "AzureStackCloud");
    }
}
