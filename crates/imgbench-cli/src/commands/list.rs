use std::path::Path;

use anyhow::Result;
use clap::Args;

use crate::summary::print_algorithms;

#[derive(Args)]
pub struct ListArgs {
    /// Validate the clean entries even if others failed to parse
    #[arg(long)]
    pub lenient: bool,
}

pub fn run(config: Option<&Path>, args: &ListArgs) -> Result<()> {
    let path = super::resolve_config_path(config);
    let outcome = super::load(&path, args.lenient);
    super::report_and_require(&outcome)?;

    print_algorithms(&outcome.algorithms);
    Ok(())
}
