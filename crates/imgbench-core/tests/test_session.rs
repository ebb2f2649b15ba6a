mod common;

use std::thread;
use std::time::{Duration, Instant};

use imgbench_core::array::{DType, NdArray};
use imgbench_core::invoke::InvocationError;
use imgbench_core::loader::{load_algorithms_str, ValidatedAlgorithm};
use imgbench_core::session::{initial_texts, Session, SessionError};
use imgbench_core::worker::spawn_invocation;
use ndarray::{ArrayD, IxDyn};

use common::{fake_entry, fake_registry, gray_u8};

const CONFIG: &str = r#"
[[algorithms]]
name = "Scale"
module = "fake"
method = "scale"

[[algorithms.params]]
name = "Factor"
type = "float"
description = "Multiplier"
default = 2.0

[[algorithms]]
name = "Slow"
module = "fake"
method = "slow"

[[algorithms.params]]
name = "Steps"
type = "int"
default = 1

[[algorithms]]
name = "Two"
module = "fake"
method = "two_params"

[[algorithms.params]]
name = "a"
type = "bool"
default = false

[[algorithms.params]]
name = "b"
type = "int"
"#;

fn algorithms() -> Vec<ValidatedAlgorithm> {
    let outcome = load_algorithms_str(CONFIG, &fake_registry());
    assert!(outcome.report.is_empty(), "{}", outcome.report.formatted_text());
    outcome.algorithms
}

fn session() -> Session {
    Session::new(algorithms()).unwrap()
}

/// Poll until the running invocation finishes.
fn poll_until_done(session: &mut Session) -> Result<NdArray, SessionError> {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if let Some(result) = session.poll() {
            return result.cloned();
        }
        assert!(Instant::now() < deadline, "invocation did not finish");
        thread::sleep(Duration::from_millis(5));
    }
}

// ---------------------------------------------------------------------------
// Selection and parameters
// ---------------------------------------------------------------------------

#[test]
fn test_empty_session_rejected() {
    let err = Session::new(Vec::new()).err().unwrap();
    assert_eq!(err.to_string(), "No valid algorithms found in config file.");
}

#[test]
fn test_select_resets_texts() {
    let mut session = session();
    session.select("Scale").unwrap();
    assert_eq!(session.parameter_texts(), &[Some("2.0".to_string())]);

    session.set_parameters(vec!["5".into()]).unwrap();
    assert_eq!(session.parameter_texts(), &[Some("5".to_string())]);

    session.select("Scale").unwrap();
    assert_eq!(session.parameter_texts(), &[Some("2.0".to_string())]);
}

#[test]
fn test_initial_texts_show_bools_as_digits() {
    let mut session = session();
    let algorithm = session.select("Two").unwrap();
    assert_eq!(
        initial_texts(&algorithm.params),
        vec![Some("0".to_string()), None]
    );
}

#[test]
fn test_unknown_algorithm() {
    let mut session = session();
    let err = session.select("Nope").unwrap_err();
    assert!(matches!(err, SessionError::UnknownAlgorithm(ref n) if n == "Nope"));
}

#[test]
fn test_set_parameters_validates_every_text() {
    let mut session = session();
    session.select("Two").unwrap();
    let err = session
        .set_parameters(vec!["1".into(), "undefined_name".into()])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Parameter #2 (b): name 'undefined_name' is not defined"
    );
    // Nothing changed.
    assert_eq!(session.parameter_texts(), &[Some("0".to_string()), None]);
}

#[test]
fn test_set_single_parameter() {
    let mut session = session();
    session.select("Two").unwrap();
    session.set_parameter(1, "4".into()).unwrap();
    assert_eq!(
        session.parameter_texts(),
        &[Some("0".to_string()), Some("4".to_string())]
    );
    assert!(session.set_parameter(2, "1".into()).is_err());
}

#[test]
fn test_parameters_need_selection() {
    let mut session = session();
    assert!(matches!(
        session.set_parameters(Vec::new()),
        Err(SessionError::NoAlgorithmSelected)
    ));
}

#[test]
fn test_input_is_contract_checked() {
    let mut session = session();
    let bad = NdArray::I64(ArrayD::zeros(IxDyn(&[4, 4])));
    assert!(matches!(session.set_input(bad), Err(SessionError::Image(_))));
    assert!(session.input().is_none());
    session.set_input(gray_u8(4, 4, 9)).unwrap();
    assert!(session.input().is_some());
}

// ---------------------------------------------------------------------------
// Running
// ---------------------------------------------------------------------------

#[test]
fn test_start_requires_image() {
    let mut session = session();
    session.select("Scale").unwrap();
    assert!(matches!(session.start(), Err(SessionError::NoImage)));
}

#[test]
fn test_run_and_poll() {
    let mut session = session();
    session.select("Scale").unwrap();
    session.set_input(gray_u8(6, 6, 10)).unwrap();
    session.set_parameters(vec!["1.5".into()]).unwrap();

    session.start().unwrap();
    let output = poll_until_done(&mut session).unwrap();
    assert_eq!(output.dtype(), DType::F64);
    assert_eq!(output.to_f64()[[2, 2]], 15.0);
    assert!(!session.is_running());
    assert!(session.output().is_some());
}

#[test]
fn test_run_and_wait() {
    let mut session = session();
    session.select("Slow").unwrap();
    session.set_input(gray_u8(3, 3, 7)).unwrap();
    session.start().unwrap();
    assert!(matches!(session.start(), Err(SessionError::Busy(_))));

    let output = session.wait().unwrap();
    assert_eq!(output.shape(), &[3, 3]);
    assert!(matches!(session.wait(), Err(SessionError::NotRunning)));
}

#[test]
fn test_null_parameter_reported_at_run() {
    let mut session = session();
    session.select("Two").unwrap();
    session.set_input(gray_u8(3, 3, 7)).unwrap();
    session.start().unwrap();
    let err = session.wait().unwrap_err();
    assert_eq!(err.to_string(), "Parameter #2 (b) is null.");
    assert!(session.output().is_none());
}

#[test]
fn test_clear_cancels_and_resets() {
    let mut session = session();
    session.select("Slow").unwrap();
    session.set_parameters(vec!["500".into()]).unwrap();
    session.set_input(gray_u8(3, 3, 7)).unwrap();
    session.start().unwrap();

    session.clear();
    assert!(!session.is_running());
    assert!(session.input().is_none());
    assert!(session.output().is_none());
    assert_eq!(session.parameter_texts(), &[Some("1".to_string())]);
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

#[test]
fn test_worker_cancellation() {
    let outcome = load_algorithms_str(CONFIG, &fake_registry());
    let slow = outcome
        .algorithms
        .into_iter()
        .find(|a| a.name == "Slow")
        .unwrap();

    let handle = spawn_invocation(slow, gray_u8(3, 3, 1), vec![Some("1000".into())]).unwrap();
    assert_eq!(handle.algorithm_name(), "Slow");
    handle.cancel();
    assert!(handle.is_cancelled());

    let start = Instant::now();
    let err = handle.wait().unwrap_err();
    assert!(matches!(err, InvocationError::Cancelled(_)));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_worker_result_delivered_once() {
    let outcome = load_algorithms_str(&fake_entry("Identity", "identity"), &fake_registry());
    let identity = outcome.algorithms[0].clone();

    let mut handle = spawn_invocation(identity, gray_u8(2, 2, 3), Vec::new()).unwrap();
    let result = loop {
        if let Some(result) = handle.wait_timeout(Duration::from_millis(50)) {
            break result;
        }
    };
    assert_eq!(result.unwrap().shape(), &[2, 2]);
    assert!(handle.is_finished());
    assert!(handle.try_result().is_none());
}
