/// Side length of the square probe image every algorithm is self-tested on.
pub const PROBE_SIZE: usize = 100;

/// Flat gray level of the probe image.
pub const PROBE_VALUE: u8 = 128;

/// Parameter names longer than this are shortened for display.
pub const PARAM_NAME_MAX_LENGTH: usize = 20;

/// Fallback self-test argument for `int` parameters without a default.
pub const FALLBACK_INT: i64 = 1;

/// Fallback self-test argument for `float` parameters without a default.
pub const FALLBACK_FLOAT: f64 = 1.23;

/// Fallback self-test argument for `bool` parameters without a default.
pub const FALLBACK_BOOL: bool = true;

/// Side length of the zero matrix used as fallback `array` argument.
pub const FALLBACK_ARRAY_SIZE: usize = 3;

/// Largest number of scalars an expression may build, arrays and
/// repeated sequences alike.
pub const MAX_ARRAY_ELEMENTS: usize = 1 << 22;

/// Top-level config key holding the algorithm list.
pub const ALGORITHMS_KEY: &str = "algorithms";

/// Builder that array-typed default expressions are wrapped in.
pub const ARRAY_BUILDER: &str = "array";

/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f32 = 1e-10;

/// Name of the thread that runs algorithm invocations.
pub const INVOKE_THREAD_NAME: &str = "imgbench-invoke";
