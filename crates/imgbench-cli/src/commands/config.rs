use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use imgbench_core::provider::example_document;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &ConfigArgs) -> Result<()> {
    let text = toml::to_string_pretty(&example_document())
        .context("Failed to serialize example config")?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &text)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Config written to {}", path.display());
    } else {
        print!("{text}");
    }

    Ok(())
}
