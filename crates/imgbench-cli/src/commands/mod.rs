pub mod check;
pub mod config;
pub mod list;
pub mod modules;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use imgbench_core::loader::{load_algorithms, load_algorithms_lenient, LoadOutcome};
use imgbench_core::provider::builtin_registry;
use tracing::debug;

pub const DEFAULT_CONFIG_NAME: &str = "algorithms.toml";

/// `--config` if given, else `data/algorithms.toml` next to the executable,
/// else `algorithms.toml` in the working directory.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let bundled = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("data").join(DEFAULT_CONFIG_NAME)));
    match bundled {
        Some(path) if path.exists() => path,
        _ => PathBuf::from(DEFAULT_CONFIG_NAME),
    }
}

/// Load the config against the built-in modules.
pub fn load(path: &Path, lenient: bool) -> LoadOutcome {
    debug!(path = %path.display(), lenient, "Loading algorithm config");
    let registry = builtin_registry();
    if lenient {
        load_algorithms_lenient(path, &registry)
    } else {
        load_algorithms(path, &registry)
    }
}

/// Print the error report, if any, and fail when nothing is usable.
pub fn report_and_require(outcome: &LoadOutcome) -> Result<()> {
    if !outcome.report.is_empty() {
        eprintln!("{}", outcome.report.formatted_text());
        eprintln!();
    }
    if outcome.algorithms.is_empty() {
        bail!("No valid algorithms found in config file.");
    }
    Ok(())
}

/// Split `NAME=TEXT` into its parts.
pub fn parse_assignment(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((name, text)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), text.trim().to_string()))
        }
        _ => bail!("Expected NAME=VALUE, got '{raw}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_config_path_wins() {
        let path = resolve_config_path(Some(Path::new("/tmp/custom.toml")));
        assert_eq!(path, PathBuf::from("/tmp/custom.toml"));
    }

    #[test]
    fn test_parse_assignment() {
        let (name, text) = parse_assignment("Sigma = 2.5").unwrap();
        assert_eq!(name, "Sigma");
        assert_eq!(text, "2.5");

        let (name, text) = parse_assignment("Kernel=np.ones((3, 3)) == 1").unwrap();
        assert_eq!(name, "Kernel");
        assert_eq!(text, "np.ones((3, 3)) == 1");

        assert!(parse_assignment("no-equals").is_err());
        assert!(parse_assignment("=3").is_err());
    }

    #[test]
    fn test_load_missing_file_reports_parse_error() {
        let outcome = load(Path::new("/nonexistent/imgbench/algorithms.toml"), false);
        assert!(outcome.algorithms.is_empty());
        assert_eq!(outcome.report.len(), 1);
        assert!(report_and_require(&outcome).is_err());
    }

    #[test]
    fn test_bundled_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("data")
            .join(DEFAULT_CONFIG_NAME);
        let outcome = load(&path, false);
        assert!(outcome.report.is_empty(), "{}", outcome.report.formatted_text());
        assert_eq!(outcome.algorithms.len(), 8);
    }
}
