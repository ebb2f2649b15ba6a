use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Args;
use imgbench_core::io::{load_image, save_image};
use imgbench_core::params::ParameterDeclaration;
use imgbench_core::session::Session;
use indicatif::{ProgressBar, ProgressStyle};

use crate::summary::{print_run_header, print_run_result};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Args)]
pub struct RunArgs {
    /// Input image file
    pub file: PathBuf,

    /// Name of the algorithm to run, as declared in the config
    #[arg(short, long)]
    pub algorithm: String,

    /// Parameter value as NAME=EXPRESSION (NAME may also be #N); repeatable
    #[arg(short, long = "param", value_name = "NAME=EXPR")]
    pub params: Vec<String>,

    /// Output image path (defaults to <input>_<algorithm>.png)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Validate the clean entries even if others failed to parse
    #[arg(long)]
    pub lenient: bool,
}

pub fn run(config: Option<&Path>, args: &RunArgs) -> Result<()> {
    let path = super::resolve_config_path(config);
    let outcome = super::load(&path, args.lenient);
    super::report_and_require(&outcome)?;

    let mut session = Session::new(outcome.algorithms)?;
    let params = session.select(&args.algorithm)?.params.clone();

    for raw in &args.params {
        let (key, text) = super::parse_assignment(raw)?;
        let index = find_param(&params, &key)
            .with_context(|| format!("Algorithm '{}' has no parameter '{key}'", args.algorithm))?;
        session.set_parameter(index, text)?;
    }

    let image = load_image(&args.file)
        .with_context(|| format!("Failed to load image {}", args.file.display()))?;
    session.set_input(image)?;

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.file, &args.algorithm));
    print_run_header(&session, &args.file, &output_path);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner} {msg} [{elapsed}]")?);
    pb.set_message(format!("Running {}", args.algorithm));
    pb.enable_steady_tick(Duration::from_millis(80));

    let start = Instant::now();
    session.start()?;
    let finished = loop {
        if let Some(result) = session.poll() {
            break result.map(|_| ());
        }
        thread::sleep(POLL_INTERVAL);
    };
    pb.finish_and_clear();
    finished?;

    let Some(output) = session.output() else {
        bail!("Algorithm '{}' returned no image", args.algorithm);
    };
    save_image(output, &output_path)
        .with_context(|| format!("Failed to save image to {}", output_path.display()))?;

    print_run_result(output, &output_path, start.elapsed());
    Ok(())
}

/// Position of the parameter called `key`, or `#N` (one-based).
fn find_param(params: &[ParameterDeclaration], key: &str) -> Option<usize> {
    if let Some(n) = key.strip_prefix('#').and_then(|n| n.parse::<usize>().ok()) {
        return (1..=params.len()).contains(&n).then(|| n - 1);
    }
    params
        .iter()
        .position(|p| p.name == key)
        .or_else(|| params.iter().position(|p| p.name.eq_ignore_ascii_case(key)))
}

fn default_output(input: &Path, algorithm: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".into());
    let slug: String = algorithm
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    input.with_file_name(format!("{stem}_{slug}.png"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgbench_core::params::ParamType;

    fn params() -> Vec<ParameterDeclaration> {
        vec![
            ParameterDeclaration::new("Radius", ParamType::Float),
            ParameterDeclaration::new("Amount", ParamType::Float),
        ]
    }

    #[test]
    fn test_find_param_by_name_and_position() {
        let params = params();
        assert_eq!(find_param(&params, "Amount"), Some(1));
        assert_eq!(find_param(&params, "radius"), Some(0));
        assert_eq!(find_param(&params, "#2"), Some(1));
        assert_eq!(find_param(&params, "#0"), None);
        assert_eq!(find_param(&params, "#3"), None);
        assert_eq!(find_param(&params, "Sigma"), None);
    }

    #[test]
    fn test_default_output_name() {
        let out = default_output(Path::new("/data/moon.tif"), "Unsharp mask");
        assert_eq!(out, PathBuf::from("/data/moon_unsharp_mask.png"));
    }
}
