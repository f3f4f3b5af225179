use anyhow::{bail, Context, Result};

use deedscan_core::training::{train_gazetteer, TrainingConfig, TrainingRun, BLANK_BASE_MODEL};
use deedscan_core::{load_address_list, Settings};

use super::{load_model, load_templates, TrainArgs};

pub fn run(settings: &Settings, args: &TrainArgs) -> Result<()> {
    let addresses = load_address_list(&args.addresses).with_context(|| {
        format!("failed to read addresses from {}", args.addresses.display())
    })?;
    if addresses.is_empty() {
        bail!("address list is empty");
    }

    let config = build_config(settings, args);
    config.validate()?;

    let base = match config.base_model.as_str() {
        BLANK_BASE_MODEL => None,
        reference => Some(load_model(settings, reference)?),
    };

    let model_path = args
        .model_dir
        .as_ref()
        .map_or_else(
            || settings.model_path(&config.model_name),
            |dir| dir.join(format!("{}.json", config.model_name)),
        );

    let run = TrainingRun::for_addresses(config, addresses)
        .with_templates(load_templates(args.templates.as_deref())?);
    let outcome = train_gazetteer(&run, base, &model_path)?;

    eprintln!(
        "Trained {} on {} examples over {} passes",
        outcome.model.card().name,
        outcome.examples,
        outcome.passes
    );
    eprintln!("  Entries: {}", outcome.model.entry_count());
    eprintln!("  Saved: {}", model_path.display());

    Ok(())
}

fn build_config(settings: &Settings, args: &TrainArgs) -> TrainingConfig {
    let mut config = settings.apply(TrainingConfig::default());
    if let Some(name) = &args.name {
        config.model_name.clone_from(name);
    }
    if let Some(base) = &args.base {
        config.base_model.clone_from(base);
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(dropout) = args.dropout {
        config.dropout = dropout;
    }
    if args.passes.is_some() {
        config.passes = args.passes;
    }
    config
}
