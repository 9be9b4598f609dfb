use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use profilematch_common::{ConfigError, Platform};

use crate::policy::{PolicyTable, Weights};

/// Per-platform scoring overrides loaded from TOML. Every field is optional; whatever is
/// left out keeps its built-in value. URL grammar is not configurable.
///
/// ```toml
/// [facebook]
/// threshold = 0.9
///
/// [instagram.weights]
/// text = 0.30
/// identity = 0.40
/// rank = 0.20
/// occurrence = 0.10
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct PolicyFile {
    pub platforms: BTreeMap<Platform, PolicyOverride>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyOverride {
    pub threshold: Option<f64>,
    pub saturation: Option<u32>,
    pub boost_two: Option<f64>,
    pub boost_three: Option<f64>,
    pub weights: Option<WeightsOverride>,
}

/// All four weights at once, since they must sum to 1.0 together.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightsOverride {
    pub text: f64,
    pub identity: f64,
    pub rank: f64,
    pub occurrence: f64,
}

/// Parse a policy file from TOML text.
pub fn parse_policy_file(content: &str, origin: &Path) -> Result<PolicyFile, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::PolicyFile {
        path: origin.display().to_string(),
        message: e.to_string(),
    })
}

/// Load and parse a TOML policy file.
pub fn load_policy_file(path: &Path) -> Result<PolicyFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::PolicyFile {
        path: path.display().to_string(),
        message: format!("Failed to read policy file: {e}"),
    })?;
    parse_policy_file(&content, path)
}

impl PolicyTable {
    /// Built-in table with `file`'s overrides applied, validated as a whole.
    pub fn with_overrides(file: &PolicyFile) -> Result<Self, ConfigError> {
        let mut table = Self::default();
        for (platform, over) in &file.platforms {
            apply(&mut table, *platform, over);
            info!(platform = %platform, "Applied policy override");
        }
        table.validate()?;
        Ok(table)
    }
}

fn apply(table: &mut PolicyTable, platform: Platform, over: &PolicyOverride) {
    let scoring = table.scoring_mut(platform);
    if let Some(threshold) = over.threshold {
        scoring.threshold = threshold;
    }
    if let Some(saturation) = over.saturation {
        scoring.saturation = saturation;
    }
    if let Some(boost) = over.boost_two {
        scoring.boost_two = boost;
    }
    if let Some(boost) = over.boost_three {
        scoring.boost_three = boost;
    }
    if let Some(w) = over.weights {
        scoring.weights = Weights::new(w.text, w.identity, w.rank, w.occurrence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Result<PolicyFile, ConfigError> {
        parse_policy_file(toml, Path::new("policy.toml"))
    }

    #[test]
    fn empty_file_is_builtin_table() {
        let file = parse("").unwrap();
        let table = PolicyTable::with_overrides(&file).unwrap();
        assert_eq!(
            table.get(Platform::Facebook).scoring,
            PolicyTable::default().get(Platform::Facebook).scoring
        );
    }

    #[test]
    fn overrides_apply_per_platform() {
        let file = parse(
            r#"
            [facebook]
            threshold = 0.9
            boost_two = 0.1

            [instagram.weights]
            text = 0.30
            identity = 0.40
            rank = 0.20
            occurrence = 0.10
            "#,
        )
        .unwrap();
        let table = PolicyTable::with_overrides(&file).unwrap();

        let fb = &table.get(Platform::Facebook).scoring;
        assert_eq!(fb.threshold, 0.9);
        assert_eq!(fb.boost_two, 0.1);
        assert_eq!(fb.boost_three, 0.20);

        let ig = &table.get(Platform::Instagram).scoring;
        assert_eq!(ig.weights.identity, 0.40);
        assert_eq!(ig.threshold, 0.70);
    }

    #[test]
    fn unknown_fields_and_platforms_are_rejected() {
        assert!(matches!(
            parse("[facebook]\nthreshhold = 0.9\n"),
            Err(ConfigError::PolicyFile { .. })
        ));
        assert!(matches!(
            parse("[myspace]\nthreshold = 0.9\n"),
            Err(ConfigError::PolicyFile { .. })
        ));
    }

    #[test]
    fn partial_weights_are_rejected() {
        assert!(parse("[twitter.weights]\ntext = 0.5\n").is_err());
    }

    #[test]
    fn invalid_values_fail_validation() {
        let file = parse(
            "[tiktok.weights]\ntext = 0.5\nidentity = 0.5\nrank = 0.5\noccurrence = 0.0\n",
        )
        .unwrap();
        assert!(matches!(
            PolicyTable::with_overrides(&file),
            Err(ConfigError::WeightSum { .. })
        ));

        let file = parse("[youtube]\nsaturation = 0\n").unwrap();
        assert!(matches!(
            PolicyTable::with_overrides(&file),
            Err(ConfigError::OutOfRange { field: "saturation", .. })
        ));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        assert!(matches!(
            load_policy_file(Path::new("/nonexistent/profilematch-policy.toml")),
            Err(ConfigError::PolicyFile { .. })
        ));
    }
}
