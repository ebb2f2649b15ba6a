use std::path::Path;

use anyhow::{bail, Result};
use clap::Args;

use crate::summary::print_load_summary;

#[derive(Args)]
pub struct CheckArgs {
    /// Validate the clean entries even if others failed to parse
    #[arg(long)]
    pub lenient: bool,

    /// Fail if any algorithm was rejected
    #[arg(long)]
    pub strict: bool,
}

pub fn run(config: Option<&Path>, args: &CheckArgs) -> Result<()> {
    let path = super::resolve_config_path(config);
    let outcome = super::load(&path, args.lenient);

    print_load_summary(&path, &outcome);
    super::report_and_require(&outcome)?;

    if args.strict && !outcome.report.is_empty() {
        bail!("{}", outcome.report.title());
    }
    Ok(())
}
