use std::path::PathBuf;

use crate::training::TrainingConfig;

/// Process-level settings, resolved from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Where trained models are written and looked up by name.
    pub model_dir: PathBuf,
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            seed: None,
        }
    }
}

impl Settings {
    /// Reads `DEEDSCAN_MODEL_DIR` and `DEEDSCAN_SEED`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let model_dir = lookup("DEEDSCAN_MODEL_DIR")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(default_model_dir, PathBuf::from);

        let seed = lookup("DEEDSCAN_SEED").and_then(|v| match v.trim().parse() {
            Ok(seed) => Some(seed),
            Err(_) => {
                tracing::warn!("Ignoring DEEDSCAN_SEED={:?}: not an unsigned integer", v);
                None
            }
        });

        Self { model_dir, seed }
    }

    #[must_use]
    pub fn model_path(&self, name: &str) -> PathBuf {
        self.model_dir.join(format!("{name}.json"))
    }

    /// Applies environment overrides on top of `config`.
    #[must_use]
    pub fn apply(&self, mut config: TrainingConfig) -> TrainingConfig {
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config
    }
}

fn default_model_dir() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from("models"),
        |dir| dir.join("deedscan").join("models"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lookup_overrides() {
        let settings = Settings::from_lookup(|key| match key {
            "DEEDSCAN_MODEL_DIR" => Some("/tmp/models".into()),
            "DEEDSCAN_SEED" => Some(" 7 ".into()),
            _ => None,
        });

        assert_eq!(settings.model_dir, PathBuf::from("/tmp/models"));
        assert_eq!(settings.seed, Some(7));
        assert_eq!(
            settings.model_path("deeds"),
            PathBuf::from("/tmp/models/deeds.json")
        );
        assert_eq!(settings.apply(TrainingConfig::default()).seed, 7);
    }

    #[test]
    fn test_from_lookup_defaults() {
        let settings = Settings::from_lookup(|key| match key {
            "DEEDSCAN_SEED" => Some("not-a-number".into()),
            _ => None,
        });

        assert_eq!(settings.model_dir, default_model_dir());
        assert_eq!(settings.seed, None);
        assert_eq!(settings.apply(TrainingConfig::default()).seed, 42);
    }
}
