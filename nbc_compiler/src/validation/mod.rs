//! Contract compatibility validation
//!
//! Two checks: the version gate and the required-field list. The version gate
//! also runs inside the script compiler; the required-field list only runs
//! when a caller asks for it.

pub mod error;

pub use error::{ValidationError, ValidationResult, VersionError};

use crate::config::compile_time::contract::MAX_CUSTOM_CA_CERTS;
use crate::contract::constants::{EXPECTED_VERSION, LEGACY_VERSION};
use crate::contract::Contract;
use crate::logging::codes;
use crate::utils::SemanticVersion;
use crate::{log_success, log_warning};

/// Outcome of a version check that did not reject the contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionCompatibility {
    /// Same major and minor as this build
    Compatible,
    /// Same major, different minor; accepted with a warning
    MinorDrift {
        expected: SemanticVersion,
        actual: SemanticVersion,
    },
    /// The pre-semver label of the current major version
    Legacy,
}

type FieldAccessor = fn(&Contract) -> &str;

fn subscription_id(c: &Contract) -> &str {
    &c.auth().subscription_id
}

fn resource_group(c: &Contract) -> &str {
    &c.cluster().resource_group
}

fn location(c: &Contract) -> &str {
    &c.cluster().location
}

fn vnet_name(c: &Contract) -> &str {
    &c.cluster().cluster_network().vnet_name
}

fn route_table(c: &Contract) -> &str {
    &c.cluster().cluster_network().route_table
}

fn api_server_name(c: &Contract) -> &str {
    &c.api_server().api_server_name
}

/// Checked in order; the first empty field is reported
const REQUIRED_FIELDS: [(&str, FieldAccessor); 6] = [
    ("AuthConfig.SubscriptionId", subscription_id),
    ("ClusterConfig.ResourceGroup", resource_group),
    ("ClusterConfig.Location", location),
    ("ClusterConfig.ClusterNetworkConfig.VnetName", vnet_name),
    ("ClusterConfig.ClusterNetworkConfig.RouteTable", route_table),
    ("ApiServerConfig.ApiServerName", api_server_name),
];

/// Check a contract version against the version compiled into this build
pub fn check_version(version: &str) -> Result<VersionCompatibility, VersionError> {
    check_version_against(version, EXPECTED_VERSION)
}

/// Check a contract version against an explicit expected version
pub fn check_version_against(
    version: &str,
    expected: &str,
) -> Result<VersionCompatibility, VersionError> {
    let version = version.trim();
    if version.is_empty() {
        return Err(VersionError::Missing);
    }

    let expected_version =
        SemanticVersion::parse(expected).ok_or_else(|| VersionError::unparsable_expected(expected))?;

    if version == LEGACY_VERSION {
        return Ok(VersionCompatibility::Legacy);
    }

    let actual = SemanticVersion::parse(version).ok_or_else(|| VersionError::unparsable(version))?;

    if actual.major != expected_version.major {
        return Err(VersionError::major_mismatch(
            expected_version.major,
            actual.major,
        ));
    }

    if actual.minor != expected_version.minor {
        log_warning!(
            codes::warning::MINOR_VERSION_DRIFT,
            "Contract minor version differs from this build; upgrade the node bootstrapper to pick up new fields",
            "expected" => expected_version,
            "actual" => actual
        );
        return Ok(VersionCompatibility::MinorDrift {
            expected: expected_version,
            actual,
        });
    }

    Ok(VersionCompatibility::Compatible)
}

/// Return the first required field that is empty
pub fn check_required_fields(contract: &Contract) -> ValidationResult<()> {
    for (field, accessor) in REQUIRED_FIELDS {
        if accessor(contract).trim().is_empty() {
            return Err(ValidationError::required_field(field));
        }
    }
    Ok(())
}

/// Full validation: version gate, required fields, then limits
pub fn validate_contract(contract: &Contract) -> ValidationResult<VersionCompatibility> {
    let compatibility = check_version(&contract.version)?;
    check_required_fields(contract)?;

    let ca_count = contract.custom_ca_certs.len();
    if ca_count > MAX_CUSTOM_CA_CERTS {
        return Err(ValidationError::too_many_custom_ca_certs(
            ca_count,
            MAX_CUSTOM_CA_CERTS,
        ));
    }

    log_success!(
        codes::success::VALIDATION_PASSED,
        "Contract validation passed",
        "version" => contract.version.as_str()
    );

    Ok(compatibility)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{ApiServerConfig, AuthConfig, ClusterConfig, ClusterNetworkConfig};
    use crate::logging::test_memory_logger;
    use assert_matches::assert_matches;

    fn complete_contract() -> Contract {
        Contract {
            version: EXPECTED_VERSION.to_string(),
            auth: Some(AuthConfig {
                subscription_id: "sub-id".into(),
                ..Default::default()
            }),
            cluster: Some(ClusterConfig {
                resource_group: "rg".into(),
                location: "eastus".into(),
                cluster_network: Some(ClusterNetworkConfig {
                    vnet_name: "vnet".into(),
                    route_table: "rt".into(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            api_server: Some(ApiServerConfig {
                api_server_name: "cluster.hcp.eastus.azmk8s.io".into(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_legacy_version_is_accepted() {
        assert_eq!(check_version("v0"), Ok(VersionCompatibility::Legacy));
    }

    #[test]
    fn test_major_mismatch_is_rejected() {
        assert_matches!(
            check_version_against("2.0.0", "1.0.0"),
            Err(VersionError::MajorMismatch {
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn test_minor_drift_warns() {
        let memory = test_memory_logger();

        let result = check_version_against("1.1.0", "1.0.0");
        assert_matches!(result, Ok(VersionCompatibility::MinorDrift { .. }));

        let drift_events = memory.get_events_with_code(codes::warning::MINOR_VERSION_DRIFT);
        assert!(drift_events
            .iter()
            .any(|e| e.context.get("actual").map(String::as_str) == Some("1.1.0")));
    }

    #[test]
    fn test_missing_and_garbage_versions() {
        assert_eq!(check_version(""), Err(VersionError::Missing));
        assert_matches!(
            check_version("latest"),
            Err(VersionError::Unparsable { .. })
        );
        assert_matches!(
            check_version_against("1.0.0", "nope"),
            Err(VersionError::UnparsableExpected { .. })
        );
    }

    #[test]
    fn test_missing_subscription_id_is_reported() {
        let mut contract = complete_contract();
        contract.auth = None;

        let error = validate_contract(&contract).unwrap_err();
        assert_eq!(
            error,
            ValidationError::RequiredField {
                field: "AuthConfig.SubscriptionId"
            }
        );
    }

    #[test]
    fn test_first_missing_field_wins() {
        let mut contract = complete_contract();
        contract.cluster.as_mut().unwrap().location.clear();
        contract.api_server = None;

        assert_matches!(
            check_required_fields(&contract),
            Err(ValidationError::RequiredField {
                field: "ClusterConfig.Location"
            })
        );
    }

    #[test]
    fn test_complete_contract_passes() {
        assert_eq!(
            validate_contract(&complete_contract()),
            Ok(VersionCompatibility::Compatible)
        );
    }

    #[test]
    fn test_custom_ca_limit() {
        let mut contract = complete_contract();
        contract.custom_ca_certs = vec!["cert".to_string(); MAX_CUSTOM_CA_CERTS + 1];

        assert_matches!(
            validate_contract(&contract),
            Err(ValidationError::TooManyCustomCaCerts { .. })
        );
    }
}
