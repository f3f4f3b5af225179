//! Fitting a recognizer from synthesized examples.
//!
//! Fitting is a separate phase from extraction: a model is built here,
//! then handed to an extraction pipeline which only reads it.

use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::recognize::{GazetteerRecognizer, ModelCard};
use crate::synthesis::{
    synthesize_all, SynthesisError, Synthesizer, Template, TrainableEntity, TrainingExample,
};

/// Base model identifier meaning "start from an empty model".
pub const BLANK_BASE_MODEL: &str = "blank";

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Invalid training configuration: {0}")]
    InvalidConfig(String),
    #[error("No training examples")]
    NoExamples,
    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),
}

pub type TrainingResult<T> = Result<T, TrainingError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub model_name: String,
    pub base_model: String,
    pub seed: u64,
    pub batch_size: usize,
    /// Probability of skipping a span's update within one pass.
    pub dropout: f64,
    /// Passes over the data. A training run defaults this to the number of
    /// source addresses.
    pub passes: Option<usize>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            model_name: "address_ner_model".to_string(),
            base_model: BLANK_BASE_MODEL.to_string(),
            seed: 42,
            batch_size: 2,
            dropout: 0.5,
            passes: None,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> TrainingResult<()> {
        if self.model_name.trim().is_empty() {
            return Err(TrainingError::InvalidConfig("model name is empty".into()));
        }
        if self.batch_size == 0 {
            return Err(TrainingError::InvalidConfig("batch size must be at least 1".into()));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(TrainingError::InvalidConfig(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        if self.passes == Some(0) {
            return Err(TrainingError::InvalidConfig("passes must be at least 1".into()));
        }
        Ok(())
    }

    #[must_use]
    pub fn with_passes(mut self, passes: usize) -> Self {
        self.passes = Some(passes);
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub const fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }
}

/// Anything that can turn labelled examples into a model.
pub trait Trainer {
    type Model;

    fn fit(&self, examples: &[TrainingExample], config: &TrainingConfig)
        -> TrainingResult<Self::Model>;
}

/// Learns the surface form of every labelled span it is shown.
///
/// Each pass shuffles the examples with the configured seed and walks them
/// in minibatches; every span update is skipped with probability `dropout`.
/// A batch is committed as a whole, and a pass's loss is the share of
/// presented spans the model did not know at the start of their batch.
///
/// The fitted model always gets a fresh card. Passes and losses carry over
/// from a base model so the history of a resumed model stays complete.
#[derive(Debug, Clone, Default)]
pub struct GazetteerTrainer {
    base: Option<GazetteerRecognizer>,
}

impl GazetteerTrainer {
    #[must_use]
    pub const fn new() -> Self {
        Self { base: None }
    }

    /// Continue training an existing model instead of starting blank.
    #[must_use]
    pub fn with_base(mut self, base: GazetteerRecognizer) -> Self {
        self.base = Some(base);
        self
    }
}

impl Trainer for GazetteerTrainer {
    type Model = GazetteerRecognizer;

    fn fit(
        &self,
        examples: &[TrainingExample],
        config: &TrainingConfig,
    ) -> TrainingResult<GazetteerRecognizer> {
        config.validate()?;
        if examples.is_empty() {
            return Err(TrainingError::NoExamples);
        }

        let passes = config.passes.unwrap_or(1);
        let mut model = self.base.clone().unwrap_or_else(|| {
            GazetteerRecognizer::new(ModelCard::new(&config.model_name, &config.base_model))
        });

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut order: Vec<usize> = (0..examples.len()).collect();
        let mut losses = Vec::with_capacity(passes);

        for pass in 0..passes {
            order.shuffle(&mut rng);
            let mut presented = 0usize;
            let mut unseen = 0usize;

            for batch in order.chunks(config.batch_size) {
                let mut updates = Vec::new();
                for example in batch.iter().map(|&i| &examples[i]) {
                    for span in &example.spans {
                        if rng.random_bool(config.dropout) {
                            continue;
                        }
                        match span.slice(&example.text) {
                            Some(form) if !form.trim().is_empty() => {
                                updates.push((span.label.as_str(), form));
                            }
                            Some(_) => {}
                            None => tracing::warn!(
                                start = span.start,
                                end = span.end,
                                "Skipping span outside its example text"
                            ),
                        }
                    }
                }

                // Scored against the model as it stood before this batch.
                presented += updates.len();
                unseen += updates
                    .iter()
                    .filter(|(label, form)| !model.contains(label, form))
                    .count();
                for (label, form) in updates {
                    model.insert(label, form);
                }
            }

            #[allow(clippy::cast_precision_loss)]
            let loss = if presented == 0 {
                0.0
            } else {
                unseen as f64 / presented as f64
            };
            tracing::info!("Pass {}, spans {}, loss {:.4}", pass, presented, loss);
            losses.push(loss);
        }

        let prior = model.card().clone();
        let mut card = ModelCard::new(&config.model_name, &config.base_model);
        card.seed = config.seed;
        card.passes = prior.passes + passes;
        card.losses = prior.losses;
        card.losses.extend(losses);
        *model.card_mut() = card;

        Ok(model)
    }
}

/// Synthesizes examples for a list of known addresses and fits a model.
#[derive(Debug, Clone)]
pub struct TrainingRun {
    pub config: TrainingConfig,
    pub entities: Vec<TrainableEntity>,
    pub templates: Vec<Template>,
    pub addresses: Vec<String>,
}

#[derive(Debug)]
pub struct TrainingOutcome<M> {
    pub model: M,
    pub examples: usize,
    pub passes: usize,
}

impl TrainingRun {
    /// Address-only run over the default templates.
    #[must_use]
    pub fn for_addresses(config: TrainingConfig, addresses: Vec<String>) -> Self {
        Self {
            config,
            entities: vec![TrainableEntity::address()],
            templates: Template::defaults(),
            addresses,
        }
    }

    #[must_use]
    pub fn with_templates(mut self, templates: Vec<Template>) -> Self {
        self.templates = templates;
        self
    }

    pub fn examples(&self) -> TrainingResult<Vec<TrainingExample>> {
        let synthesizer = Synthesizer::new(self.entities.clone(), self.templates.clone())?;
        Ok(synthesize_all(
            &synthesizer,
            self.addresses.iter().map(String::as_str),
        ))
    }

    pub fn run<T: Trainer>(&self, trainer: &T) -> TrainingResult<TrainingOutcome<T::Model>> {
        tracing::info!("Run for {} started", self.config.model_name);
        self.config.validate()?;

        let examples = self.examples()?;
        tracing::info!("Generated {} training examples", examples.len());

        let passes = self.config.passes.unwrap_or(self.addresses.len()).max(1);
        let config = self.config.clone().with_passes(passes);
        let model = trainer.fit(&examples, &config)?;

        Ok(TrainingOutcome {
            model,
            examples: examples.len(),
            passes,
        })
    }
}

/// Runs `run` with a gazetteer trainer, optionally resuming from `base`,
/// and writes the fitted model to `path`.
pub fn train_gazetteer(
    run: &TrainingRun,
    base: Option<GazetteerRecognizer>,
    path: &Path,
) -> crate::Result<TrainingOutcome<GazetteerRecognizer>> {
    let trainer = base.map_or_else(GazetteerTrainer::new, |b| GazetteerTrainer::new().with_base(b));
    let outcome = run.run(&trainer)?;
    outcome.model.save(path)?;
    tracing::info!("Saved model {} to {}", outcome.model.card().name, path.display());
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognize::{Recognizer, ADDRESS_LABEL};

    fn addresses() -> Vec<String> {
        vec![
            "123 Main Street, Springfield, IL, 62704".to_string(),
            "9 North Elm Avenue, Dover, DE, 19901".to_string(),
        ]
    }

    #[test]
    fn test_config_validation() {
        assert!(TrainingConfig::default().validate().is_ok());

        let bad = [
            TrainingConfig {
                batch_size: 0,
                ..Default::default()
            },
            TrainingConfig::default().with_dropout(1.0),
            TrainingConfig::default().with_dropout(-0.1),
            TrainingConfig::default().with_passes(0),
            TrainingConfig {
                model_name: " ".into(),
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(TrainingError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: TrainingConfig = serde_json::from_str(r#"{"seed": 7}"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.batch_size, 2);
        assert_eq!(config.base_model, BLANK_BASE_MODEL);
    }

    #[test]
    fn test_fit_without_dropout_learns_every_address() {
        let run = TrainingRun::for_addresses(TrainingConfig::default().with_dropout(0.0), addresses());

        let outcome = run.run(&GazetteerTrainer::new()).unwrap();

        assert_eq!(outcome.examples, 16);
        assert_eq!(outcome.passes, 2);
        for address in addresses() {
            assert!(outcome.model.contains(ADDRESS_LABEL, &address));
        }
        assert_eq!(outcome.model.card().losses.len(), 2);
        assert!(outcome.model.card().losses[1].abs() < f64::EPSILON);
    }

    #[test]
    fn test_fit_is_deterministic_for_a_seed() {
        let examples = TrainingRun::for_addresses(TrainingConfig::default(), addresses())
            .examples()
            .unwrap();
        let config = TrainingConfig::default().with_passes(1).with_seed(3);

        let a = GazetteerTrainer::new().fit(&examples, &config).unwrap();
        let b = GazetteerTrainer::new().fit(&examples, &config).unwrap();

        assert_eq!(a.card().losses, b.card().losses);
        assert_eq!(a.entry_count(), b.entry_count());
    }

    #[test]
    fn test_fit_requires_examples() {
        let result = GazetteerTrainer::new().fit(&[], &TrainingConfig::default());
        assert!(matches!(result, Err(TrainingError::NoExamples)));
    }

    #[test]
    fn test_fit_resumes_from_base() {
        let config = TrainingConfig::default().with_dropout(0.0);
        let first = TrainingRun::for_addresses(config.clone(), vec![addresses()[0].clone()])
            .run(&GazetteerTrainer::new())
            .unwrap()
            .model;

        let second = TrainingRun::for_addresses(config, vec![addresses()[1].clone()])
            .run(&GazetteerTrainer::new().with_base(first))
            .unwrap()
            .model;

        assert_eq!(second.entry_count(), 2);
        assert_eq!(second.card().passes, 2);
    }

    #[test]
    fn test_fit_resumed_model_gets_fresh_card() {
        let first = TrainingRun::for_addresses(
            TrainingConfig::default().with_dropout(0.0),
            vec![addresses()[0].clone()],
        )
        .run(&GazetteerTrainer::new())
        .unwrap()
        .model;
        let first_card = first.card().clone();

        let config = TrainingConfig {
            model_name: "second".into(),
            base_model: "first".into(),
            ..TrainingConfig::default().with_dropout(0.0)
        };
        let second = TrainingRun::for_addresses(config, vec![addresses()[1].clone()])
            .run(&GazetteerTrainer::new().with_base(first))
            .unwrap()
            .model;

        let card = second.card();
        assert_ne!(card.id, first_card.id);
        assert!(card.created_at >= first_card.created_at);
        assert_eq!(card.name, "second");
        assert_eq!(card.base_model, "first");
        assert_eq!(card.passes, 2);
        assert_eq!(card.losses.len(), 2);
    }

    #[test]
    fn test_batch_size_changes_scoring() {
        let examples = TrainingRun::for_addresses(TrainingConfig::default(), addresses())
            .examples()
            .unwrap();
        let config = TrainingConfig::default().with_dropout(0.0).with_passes(3);

        let single = GazetteerTrainer::new()
            .fit(&examples, &TrainingConfig { batch_size: 1, ..config.clone() })
            .unwrap();
        let whole = GazetteerTrainer::new()
            .fit(&examples, &TrainingConfig { batch_size: 1000, ..config })
            .unwrap();

        assert_ne!(single.card().losses, whole.card().losses);
        assert!((single.card().losses[0] - 2.0 / 16.0).abs() < 1e-9);
        assert!((whole.card().losses[0] - 1.0).abs() < 1e-9);
        assert_eq!(single.entry_count(), whole.entry_count());
    }

    #[test]
    fn test_trained_model_recognizes_in_new_text() {
        let model = TrainingRun::for_addresses(TrainingConfig::default().with_dropout(0.0), addresses())
            .run(&GazetteerTrainer::new())
            .unwrap()
            .model;

        let text = "Grantee takes the premises at 9 North Elm Avenue, Dover, DE, 19901 in fee.";
        let spans = model.recognize(text).unwrap();

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "9 North Elm Avenue, Dover, DE, 19901");
    }

    #[test]
    fn test_train_gazetteer_writes_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("address_ner_model.json");
        let run = TrainingRun::for_addresses(TrainingConfig::default().with_dropout(0.0), addresses());

        let outcome = train_gazetteer(&run, None, &path).unwrap();
        let loaded = GazetteerRecognizer::load(&path).unwrap();

        assert_eq!(loaded.entry_count(), outcome.model.entry_count());
        assert_eq!(loaded.card().name, "address_ner_model");
    }

    #[test]
    fn test_run_fails_fast_on_unregistered_tag() {
        let run = TrainingRun::for_addresses(TrainingConfig::default(), addresses())
            .with_templates(vec![Template::new("{OWNER} at {ADDRESS}")]);

        assert!(matches!(
            run.run(&GazetteerTrainer::new()),
            Err(TrainingError::Synthesis(SynthesisError::UnregisteredTag { .. }))
        ));
    }
}
