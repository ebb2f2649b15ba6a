use std::path::Path;
use std::time::Duration;

use console::Style;
use imgbench_core::array::NdArray;
use imgbench_core::loader::{LoadOutcome, ValidatedAlgorithm};
use imgbench_core::provider::{ModuleRegistry, Signature};
use imgbench_core::session::Session;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }

    fn title(&self, text: &str) {
        println!();
        println!("  {}", self.title.apply_to(text));
        println!("  {}", self.title.apply_to("\u{2550}".repeat(text.chars().count())));
        println!();
    }
}

pub fn print_load_summary(path: &Path, outcome: &LoadOutcome) {
    let s = Styles::new();
    s.title("imgbench config check");

    println!("  {:<14}{}", s.label.apply_to("Config"), s.path.apply_to(path.display()));
    println!(
        "  {:<14}{}",
        s.label.apply_to("Declared"),
        s.value.apply_to(outcome.declarations.len())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Valid"),
        s.method.apply_to(outcome.algorithms.len())
    );
    if outcome.report.is_empty() {
        println!("  {:<14}{}", s.label.apply_to("Errors"), s.value.apply_to("none"));
    } else {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Errors"),
            s.disabled.apply_to(format!("{} ({})", outcome.report.kind, outcome.report.len()))
        );
    }

    if !outcome.algorithms.is_empty() {
        println!();
        println!("  {}", s.header.apply_to("Algorithms"));
        for algorithm in &outcome.algorithms {
            println!(
                "    {}  {}",
                s.value.apply_to(&algorithm.name),
                s.label.apply_to(format!("{}.{}", algorithm.module, algorithm.method_name))
            );
        }
    }
    println!();
}

pub fn print_algorithms(algorithms: &[ValidatedAlgorithm]) {
    let s = Styles::new();
    s.title("Available algorithms");

    for algorithm in algorithms {
        println!(
            "  {}  {}",
            s.header.apply_to(&algorithm.name),
            s.label.apply_to(format!("{}.{}", algorithm.module, algorithm.method_name))
        );
        if algorithm.params.is_empty() {
            println!("    {}", s.disabled.apply_to("no parameters"));
        }
        for (i, param) in algorithm.params.iter().enumerate() {
            let default = match &param.default {
                Some(text) => s.value.apply_to(text.clone()),
                None => s.disabled.apply_to("(none)".to_string()),
            };
            println!(
                "    {:<4}{:<22}{:<8}{}",
                s.label.apply_to(format!("#{}", i + 1)),
                param.display_name(),
                s.method.apply_to(param.param_type),
                default
            );
            if let Some(description) = param.description.as_deref().filter(|d| !d.is_empty()) {
                println!("        {}", s.label.apply_to(description));
            }
        }
        println!();
    }
}

pub fn print_modules(registry: &ModuleRegistry) {
    let s = Styles::new();
    s.title("Built-in modules");

    for module in registry.modules() {
        println!("  {}", s.header.apply_to(module.name()));
        for (_, algorithm) in module.methods() {
            println!("    {}", s.method.apply_to(signature_text(algorithm.signature())));
        }
        println!();
    }
}

pub fn print_run_header(session: &Session, input: &Path, output: &Path) {
    let s = Styles::new();
    s.title("imgbench run");

    if let Some(algorithm) = session.selected() {
        println!("  {:<14}{}", s.label.apply_to("Algorithm"), s.method.apply_to(&algorithm.name));
        for (param, text) in algorithm.params.iter().zip(session.parameter_texts()) {
            let text = match text {
                Some(text) => s.value.apply_to(text.clone()),
                None => s.disabled.apply_to("(unset)".to_string()),
            };
            println!("  {:<14}{}", s.label.apply_to(param.display_name()), text);
        }
    }
    if let Some(image) = session.input() {
        println!(
            "  {:<14}{} {}",
            s.label.apply_to("Image"),
            s.value.apply_to(image.shape_string()),
            s.label.apply_to(image.dtype())
        );
    }
    println!("  {:<14}{}", s.label.apply_to("Input"), s.path.apply_to(input.display()));
    println!("  {:<14}{}", s.label.apply_to("Output"), s.path.apply_to(output.display()));
    println!();
}

pub fn print_run_result(output: &NdArray, path: &Path, elapsed: Duration) {
    let s = Styles::new();
    println!(
        "  {:<14}{} {}",
        s.label.apply_to("Result"),
        s.value.apply_to(output.shape_string()),
        s.label.apply_to(output.dtype())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Time"),
        s.value.apply_to(format!("{:.2}s", elapsed.as_secs_f64()))
    );
    println!("  {:<14}{}", s.label.apply_to("Saved"), s.path.apply_to(path.display()));
    println!();
}

fn signature_text(signature: &Signature) -> String {
    let mut args = vec!["image".to_string()];
    for (i, param) in signature.params.iter().enumerate() {
        if i < signature.required {
            args.push(param.clone());
        } else {
            args.push(format!("[{param}]"));
        }
    }
    format!("{}({})", signature.name, args.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_text_marks_optional_params() {
        let signature = Signature::new("unsharp_mask", &["radius", "amount", "threshold"]).with_required(2);
        assert_eq!(
            signature_text(&signature),
            "unsharp_mask(image, radius, amount, [threshold])"
        );
    }
}
