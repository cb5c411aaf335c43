//! Balance configuration loaded from TOML.
//!
//! ```toml
//! [features]
//! litter_pool = true
//! nitrogen_cycle = true
//!
//! [stoichiometry]
//! wood_cn = 330.0
//! leaf_cn = 30.0
//! fine_root_cn = 50.0
//!
//! [policy]
//! fail_on_carbon_violation = true
//! fail_on_nitrogen_violation = false
//! abort_on_failure = false
//! ```
//!
//! Every table and key is optional and falls back to its default.

use crate::errors::CNBalResult;
use crate::parameters::{FeatureFlags, Stoichiometry};
use crate::reporter::BalancePolicy;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    pub features: FeatureFlags,
    pub stoichiometry: Stoichiometry,
    pub policy: BalancePolicy,
}

impl BalanceConfig {
    /// Parse and validate a configuration string.
    pub fn from_toml_str(content: &str) -> CNBalResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> CNBalResult<Self> {
        let path = path.as_ref();
        info!("Loading balance configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> CNBalResult<()> {
        self.stoichiometry.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CNBalError;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = BalanceConfig::from_toml_str("").unwrap();
        assert_eq!(config, BalanceConfig::default());
        assert!(config.policy.fail_on_carbon_violation);
        assert!(!config.policy.fail_on_nitrogen_violation);
        assert!(!config.policy.abort_on_failure);
    }

    #[test]
    fn test_parse_full_config() {
        let config = BalanceConfig::from_toml_str(
            r#"
            [features]
            litter_pool = true
            nitrogen_cycle = true

            [stoichiometry]
            wood_cn = 250.0
            leaf_cn = 25.0

            [policy]
            abort_on_failure = true
            "#,
        )
        .unwrap();

        assert!(config.features.litter_pool);
        assert!(config.features.nitrogen_cycle);
        assert_eq!(config.stoichiometry.wood_cn, 250.0);
        assert_eq!(config.stoichiometry.leaf_cn, 25.0);
        assert_eq!(config.stoichiometry.fine_root_cn, 50.0);
        assert!(config.policy.abort_on_failure);
        assert!(config.policy.fail_on_carbon_violation);
    }

    #[test]
    fn test_invalid_ratio_rejected() {
        let result = BalanceConfig::from_toml_str("[stoichiometry]\nfine_root_cn = -1.0\n");
        assert!(matches!(
            result,
            Err(CNBalError::InvalidParameter { ref name, .. }) if name == "fine_root_cn"
        ));
    }

    #[test]
    fn test_malformed_toml() {
        let result = BalanceConfig::from_toml_str("[features\nlitter_pool = true");
        assert!(matches!(result, Err(CNBalError::Config(_))));
    }

    #[test]
    fn test_serialisation_round_trip() {
        let config = BalanceConfig {
            features: FeatureFlags::new(true, false),
            ..Default::default()
        };
        let serialised = toml::to_string(&config).unwrap();
        let deserialised = BalanceConfig::from_toml_str(&serialised).unwrap();
        assert_eq!(config, deserialised);
    }
}
