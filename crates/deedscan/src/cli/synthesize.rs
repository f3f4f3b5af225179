use std::path::Path;

use anyhow::{bail, Context, Result};

use deedscan_core::load_address_list;
use deedscan_core::synthesis::{self, synthesize_all, Synthesizer, TrainableEntity};

use super::{load_templates, write_output};

pub fn run(addresses: &Path, templates: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let addresses = load_address_list(addresses)
        .with_context(|| format!("failed to read addresses from {}", addresses.display()))?;
    if addresses.is_empty() {
        bail!("address list is empty");
    }

    let synthesizer = Synthesizer::new(vec![TrainableEntity::address()], load_templates(templates)?)?;
    let examples = synthesize_all(&synthesizer, addresses.iter().map(String::as_str));
    let json = synthesis::to_json(&examples)?;

    match output {
        Some(path) => {
            write_output(path, &json)?;
            eprintln!(
                "Wrote {} examples for {} addresses to {}",
                examples.len(),
                addresses.len(),
                path.display()
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}
