use serde::{Deserialize, Serialize};

use lectern_cluster::{EngineConfig, Family};
use lectern_micro::MicroConfig;
use lectern_theme::ThemeConfig;

use crate::error::LecternError;

/// Content summary settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Clusters smaller than this are not summarized.
    pub min_cluster_size: usize,

    /// Title terms reported per cluster.
    pub top_terms: usize,

    /// Sample titles reported per cluster.
    pub sample_titles: usize,

    /// Leading members whose body text feeds the text terms.
    pub text_sample: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            min_cluster_size: 3,
            top_terms: 10,
            sample_titles: 10,
            text_sample: 50,
        }
    }
}

/// Configuration of a full pipeline run.
///
/// Every section and field has a default, so a config file only names what
/// it changes:
///
/// ```yaml
/// engine:
///   k_range: { min: 2, max: 20 }
///   seed: 7
/// micro:
///   similarity_threshold: 0.7
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LecternConfig {
    pub engine: EngineConfig,
    pub micro: MicroConfig,
    pub theme: ThemeConfig,
    pub summary: SummaryConfig,

    /// Coarse clusters at least this large are reported as subdivision
    /// candidates.
    pub large_cluster_size: usize,
}

impl Default for LecternConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            micro: MicroConfig::default(),
            theme: ThemeConfig::default(),
            summary: SummaryConfig::default(),
            large_cluster_size: 15,
        }
    }
}

impl LecternConfig {
    /// Parses and validates a YAML config.
    pub fn from_yaml(s: &str) -> Result<Self, LecternError> {
        let cfg: Self = serde_yaml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parses and validates a JSON config.
    pub fn from_json(s: &str) -> Result<Self, LecternError> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), LecternError> {
        self.engine.validate()?;
        if !self.engine.runs(Family::KMeans) {
            return Err(LecternError::Config(
                "engine.algorithms must include kmeans, micro-clusters subdivide its clusters".into(),
            ));
        }
        self.micro.validate()?;
        if self.summary.min_cluster_size == 0 {
            return Err(LecternError::Config("summary.min_cluster_size must be positive".into()));
        }
        if self.large_cluster_size == 0 {
            return Err(LecternError::Config("large_cluster_size must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_cluster::{KRange, Linkage};

    #[test]
    fn yaml_sections() {
        let cfg = LecternConfig::from_yaml(
            r#"
engine:
  k_range: { min: 2, max: 20 }
  linkage_methods: [average]
  seed: 7
micro:
  similarity_threshold: 0.7
  global_cap: 10
theme:
  whole_words: true
"#,
        )
        .unwrap();
        assert_eq!(cfg.engine.k_range, KRange::new(2, 20));
        assert_eq!(cfg.engine.linkage_methods, vec![Linkage::Average]);
        assert_eq!(cfg.engine.seed, 7);
        assert_eq!(cfg.micro.similarity_threshold, 0.7);
        assert_eq!(cfg.micro.global_cap, 10);
        assert_eq!(cfg.micro.per_parent_cap, 2);
        assert!(cfg.theme.whole_words);
        assert_eq!(cfg.summary, SummaryConfig::default());
        assert_eq!(cfg.large_cluster_size, 15);
    }

    #[test]
    fn json_round_trip() {
        let cfg = LecternConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        assert_eq!(LecternConfig::from_json(&json).unwrap(), cfg);
        assert_eq!(LecternConfig::from_json("{}").unwrap(), cfg);
    }

    #[test]
    fn validation_errors() {
        assert!(matches!(
            LecternConfig::from_yaml("engine: { k_range: { min: 9, max: 3 } }"),
            Err(LecternError::Cluster(_))
        ));
        assert!(matches!(
            LecternConfig::from_yaml("micro: { global_cap: 0 }"),
            Err(LecternError::Micro(_))
        ));
        assert!(matches!(
            LecternConfig::from_yaml("engine: { algorithms: [hierarchical, dbscan] }"),
            Err(LecternError::Config(_))
        ));
        assert!(matches!(
            LecternConfig::from_yaml("large_cluster_size: 0"),
            Err(LecternError::Config(_))
        ));
        assert!(matches!(
            LecternConfig::from_json("{\"engine\": 3}"),
            Err(LecternError::Json(_))
        ));
    }
}
