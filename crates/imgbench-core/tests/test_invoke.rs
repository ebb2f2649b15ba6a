mod common;

use approx::assert_abs_diff_eq;
use imgbench_core::array::{DType, NdArray};
use imgbench_core::config::AlgorithmDeclaration;
use imgbench_core::contract::ImageContractError;
use imgbench_core::invoke::{coerce_parameter, coerce_parameters, invoke, InvocationError};
use imgbench_core::loader::{ValidatedAlgorithm, Validator};
use imgbench_core::params::{ParamType, ParameterDeclaration};
use imgbench_core::provider::{builtin_registry, CallContext, CancelToken};
use imgbench_core::value::Value;
use ndarray::{ArrayD, IxDyn};

use common::{fake_registry, gray_u8, FAKE};

fn validated(name: &str, method: &str, params: Vec<ParameterDeclaration>) -> ValidatedAlgorithm {
    let registry = fake_registry();
    let declaration = AlgorithmDeclaration {
        name: name.to_string(),
        module: FAKE.to_string(),
        method: method.to_string(),
        params,
    };
    Validator::new(&registry).validate(&declaration).unwrap()
}

fn scale() -> ValidatedAlgorithm {
    validated(
        "Scale",
        "scale",
        vec![ParameterDeclaration::new("Factor", ParamType::Float).with_default("2.0")],
    )
}

fn texts(values: &[&str]) -> Vec<Option<String>> {
    values.iter().map(|v| Some(v.to_string())).collect()
}

// ---------------------------------------------------------------------------
// Parameter coercion
// ---------------------------------------------------------------------------

#[test]
fn test_coerce_by_type() {
    let int = ParameterDeclaration::new("n", ParamType::Int);
    assert_eq!(coerce_parameter(0, &int, Some("2.7")).unwrap(), Value::Int(2));
    assert_eq!(coerce_parameter(0, &int, Some("True")).unwrap(), Value::Int(1));

    let float = ParameterDeclaration::new("x", ParamType::Float);
    assert_eq!(coerce_parameter(0, &float, Some("3")).unwrap(), Value::Float(3.0));

    let flag = ParameterDeclaration::new("flag", ParamType::Bool);
    assert_eq!(coerce_parameter(0, &flag, Some("1")).unwrap(), Value::Bool(true));
    assert_eq!(coerce_parameter(0, &flag, Some("0")).unwrap(), Value::Bool(false));

    let kernel = ParameterDeclaration::new("kernel", ParamType::Array);
    let value = coerce_parameter(0, &kernel, Some("[[1, 2], [3, 4]]")).unwrap();
    let array = value.as_array().unwrap();
    assert_eq!(array.shape(), &[2, 2]);
}

#[test]
fn test_null_parameter() {
    let param = ParameterDeclaration::new("Factor", ParamType::Float);
    let err = coerce_parameter(1, &param, None).unwrap_err();
    assert_eq!(err.to_string(), "Parameter #2 (Factor) is null.");
}

#[test]
fn test_invalid_parameter_text() {
    let param = ParameterDeclaration::new("Factor", ParamType::Float);
    let err = coerce_parameter(0, &param, Some("abc")).unwrap_err();
    assert_eq!(err.to_string(), "Parameter #1 (Factor): name 'abc' is not defined");
}

#[test]
fn test_constructor_failure() {
    let param = ParameterDeclaration::new("Factor", ParamType::Float);
    let err = coerce_parameter(0, &param, Some("[1, 2]")).unwrap_err();
    assert!(matches!(err, InvocationError::InvalidParameter { index: 1, .. }));
    assert!(err.to_string().starts_with("Parameter #1 (Factor): float() argument"));
}

#[test]
fn test_parameter_count_mismatch() {
    let algorithm = scale();
    let err = coerce_parameters(&algorithm, &texts(&["1", "2"])).unwrap_err();
    assert!(matches!(
        err,
        InvocationError::ParameterCount {
            expected: 1,
            given: 2,
            ..
        }
    ));
}

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

#[test]
fn test_invoke_applies_parameters() {
    let algorithm = scale();
    let image = gray_u8(8, 8, 10);
    let output = invoke(&algorithm, &image, &texts(&["3"]), &CallContext::default()).unwrap();
    assert_eq!(output.dtype(), DType::F64);
    assert_abs_diff_eq!(output.to_f64()[[0, 0]], 30.0);
}

#[test]
fn test_invoke_with_expression() {
    let algorithm = scale();
    let image = gray_u8(4, 4, 100);
    let output = invoke(&algorithm, &image, &texts(&["1 / 4"]), &CallContext::default()).unwrap();
    assert_abs_diff_eq!(output.to_f64()[[3, 3]], 25.0);
}

#[test]
fn test_invoke_null_parameter_fails_before_call() {
    let algorithm = scale();
    let err = invoke(&algorithm, &gray_u8(4, 4, 1), &[None], &CallContext::default()).unwrap_err();
    assert_eq!(err.to_string(), "Parameter #1 (Factor) is null.");
}

#[test]
fn test_invoke_algorithm_failure() {
    let mut algorithm = validated("Fails", "identity", Vec::new());
    algorithm.method = fake_registry_method("failing");
    let err = invoke(&algorithm, &gray_u8(4, 4, 1), &[], &CallContext::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error while processing input image with algorithm 'Fails':\nboom"
    );
}

#[test]
fn test_invoke_panic_is_reported() {
    let mut algorithm = validated("Panics", "identity", Vec::new());
    algorithm.method = fake_registry_method("panicking");
    let err = invoke(&algorithm, &gray_u8(4, 4, 1), &[], &CallContext::default()).unwrap_err();
    assert!(matches!(err, InvocationError::Failed { .. }));
    assert!(err.to_string().contains("kaboom"));
}

#[test]
fn test_invoke_checks_output_contract() {
    let algorithm = validated("Identity", "identity", Vec::new());
    let image = NdArray::I32(ArrayD::zeros(IxDyn(&[5, 5])));
    let err = invoke(&algorithm, &image, &[], &CallContext::default()).unwrap_err();
    assert!(matches!(
        err,
        InvocationError::Contract(ImageContractError::InvalidPixelType(DType::I32))
    ));
}

#[test]
fn test_invoke_rejects_non_array_output() {
    let mut algorithm = validated("Scalar", "identity", Vec::new());
    algorithm.method = fake_registry_method("scalar_output");
    let err = invoke(&algorithm, &gray_u8(4, 4, 1), &[], &CallContext::default()).unwrap_err();
    assert_eq!(err.to_string(), "Object is int. Expected numpy.array.");
}

#[test]
fn test_invoke_cancelled() {
    let algorithm = validated(
        "Slow",
        "slow",
        vec![ParameterDeclaration::new("Steps", ParamType::Int).with_default("1")],
    );
    let token = CancelToken::new();
    token.cancel();
    let err = invoke(
        &algorithm,
        &gray_u8(4, 4, 1),
        &texts(&["100"]),
        &CallContext::new(token),
    )
    .unwrap_err();
    assert!(matches!(err, InvocationError::Cancelled(ref name) if name == "Slow"));
}

#[test]
fn test_oversized_parameter_is_rejected() {
    let param = ParameterDeclaration::new("Kernel", ParamType::Array);
    let err = coerce_parameter(0, &param, Some("np.ones((2**40, 2**40))")).unwrap_err();
    assert_eq!(err.to_string(), "Parameter #1 (Kernel): array is too big");
}

#[test]
fn test_invoke_gaussian_blur_with_huge_sigma() {
    let registry = builtin_registry();
    let declaration = AlgorithmDeclaration {
        name: "Blur".to_string(),
        module: "algorithms.filters".to_string(),
        method: "gaussian_blur".to_string(),
        params: vec![ParameterDeclaration::new("Sigma", ParamType::Float).with_default("1.5")],
    };
    let algorithm = Validator::new(&registry).validate(&declaration).unwrap();
    let image = gray_u8(12, 9, 77);
    let output = invoke(&algorithm, &image, &texts(&["1e12"]), &CallContext::default()).unwrap();
    assert_eq!(output.shape(), &[12, 9]);
    for &v in output.to_f64().iter() {
        assert_abs_diff_eq!(v, 77.0, epsilon = 1.0);
    }
}

fn fake_registry_method(method: &str) -> std::sync::Arc<dyn imgbench_core::provider::Algorithm> {
    use imgbench_core::provider::AlgorithmProvider;
    fake_registry().resolve(FAKE, method).unwrap()
}
