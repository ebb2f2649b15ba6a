use anyhow::Result;
use imgbench_core::provider::builtin_registry;

use crate::summary::print_modules;

pub fn run() -> Result<()> {
    print_modules(&builtin_registry());
    Ok(())
}
