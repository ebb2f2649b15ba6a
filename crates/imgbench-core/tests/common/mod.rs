#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use imgbench_core::array::NdArray;
use imgbench_core::provider::{
    algorithm, Algorithm, AlgorithmError, FnAlgorithm, Module, ModuleRegistry, Signature,
};
use imgbench_core::value::Value;
use ndarray::{ArrayD, IxDyn};
use tempfile::TempDir;

pub const FAKE: &str = "fake";

/// Registry with one `fake` module whose methods cover the interesting
/// outcomes of a self-test or invocation.
pub fn fake_registry() -> ModuleRegistry {
    ModuleRegistry::new().with_module(fake_module())
}

pub fn fake_module() -> Module {
    Module::new(FAKE)
        .with(algorithm("identity", &[], |image, _, _| {
            Ok(Value::Array(image.clone()))
        }))
        .with(algorithm("wrong_shape", &[], |_, _, _| {
            Ok(Value::Array(NdArray::U8(ArrayD::zeros(IxDyn(&[100, 100, 2])))))
        }))
        .with(algorithm("int32_output", &[], |_, _, _| {
            Ok(Value::Array(NdArray::I32(ArrayD::zeros(IxDyn(&[100, 100])))))
        }))
        .with(algorithm("scalar_output", &[], |_, _, _| Ok(Value::Int(3))))
        .with(algorithm("two_params", &["a", "b"], |image, _, _| {
            Ok(Value::Array(image.clone()))
        }))
        .with(algorithm("failing", &[], |_, _, _| {
            Err(AlgorithmError::invalid("boom"))
        }))
        .with(algorithm("panicking", &[], |_, _, _| panic!("kaboom")))
        .with(algorithm("scale", &["factor"], |image, args, _| {
            let factor = args[0]
                .as_f64()
                .ok_or_else(|| AlgorithmError::invalid("factor must be a number"))?;
            Ok(Value::Array(NdArray::F64(image.to_f64() * factor)))
        }))
        .with(algorithm("add_kernel_sum", &["kernel"], |image, args, _| {
            let kernel = args[0]
                .as_array()
                .ok_or_else(|| AlgorithmError::invalid("kernel must be an array"))?;
            let total: f64 = kernel.to_f64().sum();
            Ok(Value::Array(NdArray::F64(image.to_f64() + total)))
        }))
        .with(slow_algorithm())
}

/// Sleeps `steps` times for 10 ms, checking for cancellation in between.
fn slow_algorithm() -> Arc<dyn Algorithm> {
    let signature = Signature::new("slow", &["steps"]).with_required(0);
    Arc::new(FnAlgorithm::new(signature, |image, args, ctx| {
        let steps = args.first().and_then(Value::as_i64).unwrap_or(1);
        for _ in 0..steps {
            ctx.check_cancelled()?;
            thread::sleep(Duration::from_millis(10));
        }
        Ok(Value::Array(image.clone()))
    }))
}

/// One `[[algorithms]]` table calling `fake.<method>` without parameters.
pub fn fake_entry(name: &str, method: &str) -> String {
    format!("[[algorithms]]\nname = \"{name}\"\nmodule = \"{FAKE}\"\nmethod = \"{method}\"\n\n")
}

/// Write `text` to `algorithms.toml` in a fresh temporary directory.
pub fn write_config(text: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("algorithms.toml");
    std::fs::write(&path, text).unwrap();
    (dir, path)
}

/// Constant `uint8` gray image.
pub fn gray_u8(h: usize, w: usize, value: u8) -> NdArray {
    NdArray::U8(ArrayD::from_elem(IxDyn(&[h, w]), value))
}

/// `float64` color image with a horizontal ramp in every channel.
pub fn color_ramp_f64(h: usize, w: usize) -> NdArray {
    NdArray::F64(ArrayD::from_shape_fn(IxDyn(&[h, w, 3]), |idx| {
        idx[1] as f64 / (w.max(2) - 1) as f64
    }))
}
