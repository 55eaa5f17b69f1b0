//! Run configuration: the recognized tag set and the default cost table, read from TOML.
//!
//! Grounded on the CLI-level configuration pattern used by the teacher's `tsalign` binary
//! (`serde` + `toml`), rather than `lib_tsalign`'s internal custom plain-text cost table format.

use std::{collections::HashMap, path::Path};

use serde::Deserialize;

use crate::error::{Error, Result};

fn default_miss_cost() -> f64 {
    1.0
}

fn default_same_tag_different_text_cost() -> f64 {
    1.0
}

fn default_different_tag_cost() -> f64 {
    1.5
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubstitutionCostEntry {
    pub from: String,
    pub to: String,
    pub cost: f64,
}

/// The `descr` TOML file: the closed tag set and the default table-driven cost model's
/// parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct CostConfig {
    pub tags: Vec<String>,

    #[serde(default)]
    pub miss_cost: HashMap<String, f64>,

    #[serde(default)]
    pub substitution_cost: Vec<SubstitutionCostEntry>,

    #[serde(default = "default_miss_cost")]
    pub default_miss_cost: f64,

    #[serde(default = "default_same_tag_different_text_cost")]
    pub default_same_tag_different_text_cost: f64,

    #[serde(default = "default_different_tag_cost")]
    pub default_different_tag_cost: f64,

    #[serde(default)]
    pub attr_mismatch_cost: f64,
}

impl CostConfig {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input).map_err(|error| Error::Config(error.to_string()))?;

        for entry in &config.substitution_cost {
            if !config.tags.contains(&entry.from) {
                return Err(Error::UndeclaredTag(entry.from.clone()));
            }
            if !config.tags.contains(&entry.to) {
                return Err(Error::UndeclaredTag(entry.to.clone()));
            }
        }
        for tag in config.miss_cost.keys() {
            if !config.tags.contains(tag) {
                return Err(Error::UndeclaredTag(tag.clone()));
            }
        }

        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let input = std::fs::read_to_string(path)?;
        Self::from_toml_str(&input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let config = CostConfig::from_toml_str(
            r#"
            tags = ["N", "L"]

            [miss_cost]
            N = 1.0
            L = 1.0

            [[substitution_cost]]
            from = "N"
            to = "L"
            cost = 1.5
            "#,
        )
        .unwrap();

        assert_eq!(config.tags, vec!["N".to_string(), "L".to_string()]);
        assert_eq!(config.substitution_cost.len(), 1);
        assert_eq!(config.default_different_tag_cost, 1.5);
    }

    #[test]
    fn rejects_undeclared_tag_in_substitution_table() {
        let result = CostConfig::from_toml_str(
            r#"
            tags = ["N"]

            [[substitution_cost]]
            from = "N"
            to = "L"
            cost = 1.5
            "#,
        );
        assert!(matches!(result, Err(Error::UndeclaredTag(tag)) if tag == "L"));
    }
}
