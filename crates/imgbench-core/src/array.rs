use std::fmt;

use ndarray::{Array2, ArrayD, Axis, Ix2, IxDyn};
use num_traits::AsPrimitive;

use crate::consts::{PROBE_SIZE, PROBE_VALUE};

/// Element type of an [`NdArray`], named the way numpy names them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    Bool,
    U8,
    U16,
    I32,
    I64,
    F32,
    F64,
}

impl DType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "uint8",
            Self::U16 => "uint16",
            Self::I32 => "int32",
            Self::I64 => "int64",
            Self::F32 => "float32",
            Self::F64 => "float64",
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// White level of this element type: integer images span `0..=max`,
    /// float images are expected in `[0.0, 1.0]`.
    pub fn white_level(self) -> f64 {
        match self {
            Self::Bool => 1.0,
            Self::U8 => u8::MAX as f64,
            Self::U16 => u16::MAX as f64,
            Self::I32 => i32::MAX as f64,
            Self::I64 => i64::MAX as f64,
            Self::F32 | Self::F64 => 1.0,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// N-dimensional array with a runtime element type.
///
/// This is the image currency between the host and algorithms: a grayscale
/// image is `(H, W)`, a color image `(H, W, 3)`.
#[derive(Clone, Debug, PartialEq)]
pub enum NdArray {
    Bool(ArrayD<bool>),
    U8(ArrayD<u8>),
    U16(ArrayD<u16>),
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
}

macro_rules! dispatch {
    ($array:expr, $inner:ident => $body:expr) => {
        match $array {
            NdArray::Bool($inner) => $body,
            NdArray::U8($inner) => $body,
            NdArray::U16($inner) => $body,
            NdArray::I32($inner) => $body,
            NdArray::I64($inner) => $body,
            NdArray::F32($inner) => $body,
            NdArray::F64($inner) => $body,
        }
    };
}

macro_rules! impl_from_array {
    ($($elem:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<ArrayD<$elem>> for NdArray {
                fn from(data: ArrayD<$elem>) -> Self {
                    Self::$variant(data)
                }
            }

            impl From<Array2<$elem>> for NdArray {
                fn from(data: Array2<$elem>) -> Self {
                    Self::$variant(data.into_dyn())
                }
            }
        )*
    };
}

impl_from_array!(
    bool => Bool,
    u8 => U8,
    u16 => U16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
);

impl NdArray {
    /// The synthetic self-test image: 100x100 `uint8` filled with 128.
    pub fn probe() -> Self {
        Self::U8(ArrayD::from_elem(IxDyn(&[PROBE_SIZE, PROBE_SIZE]), PROBE_VALUE))
    }

    /// `float64` zeros of the given shape.
    pub fn zeros(shape: &[usize]) -> Self {
        Self::F64(ArrayD::zeros(IxDyn(shape)))
    }

    pub fn dtype(&self) -> DType {
        match self {
            Self::Bool(_) => DType::Bool,
            Self::U8(_) => DType::U8,
            Self::U16(_) => DType::U16,
            Self::I32(_) => DType::I32,
            Self::I64(_) => DType::I64,
            Self::F32(_) => DType::F32,
            Self::F64(_) => DType::F64,
        }
    }

    pub fn shape(&self) -> &[usize] {
        dispatch!(self, a => a.shape())
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    pub fn len(&self) -> usize {
        dispatch!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shape rendered as a tuple, e.g. `(100, 100, 3)`.
    pub fn shape_string(&self) -> String {
        format_shape(self.shape())
    }

    pub fn to_f64(&self) -> ArrayD<f64> {
        match self {
            Self::Bool(a) => a.mapv(|v| if v { 1.0 } else { 0.0 }),
            Self::U8(a) => widen(a),
            Self::U16(a) => widen(a),
            Self::I32(a) => widen(a),
            Self::I64(a) => widen(a),
            Self::F32(a) => widen(a),
            Self::F64(a) => a.clone(),
        }
    }

    pub fn to_f32(&self) -> ArrayD<f32> {
        match self {
            Self::F32(a) => a.clone(),
            other => other.to_f64().mapv(|v| v as f32),
        }
    }

    /// Build an array of `dtype` from `float64` data. Integer targets are
    /// rounded and saturated to their range.
    pub fn from_f64(data: ArrayD<f64>, dtype: DType) -> Self {
        match dtype {
            DType::Bool => Self::Bool(data.mapv(|v| v != 0.0)),
            DType::U8 => Self::U8(narrow(&data, 0.0, u8::MAX as f64)),
            DType::U16 => Self::U16(narrow(&data, 0.0, u16::MAX as f64)),
            DType::I32 => Self::I32(narrow(&data, i32::MIN as f64, i32::MAX as f64)),
            DType::I64 => Self::I64(narrow(&data, i64::MIN as f64, i64::MAX as f64)),
            DType::F32 => Self::F32(data.mapv(|v| v as f32)),
            DType::F64 => Self::F64(data),
        }
    }

    /// Split an image into `f32` channel planes in native value scale.
    ///
    /// `(H, W)` yields one plane, `(H, W, C)` yields `C`. Other shapes yield `None`.
    pub fn planes(&self) -> Option<Vec<Array2<f32>>> {
        let data = self.to_f32();
        match data.ndim() {
            2 => Some(vec![data.into_dimensionality::<Ix2>().ok()?]),
            3 => (0..data.shape()[2])
                .map(|c| {
                    data.index_axis(Axis(2), c)
                        .to_owned()
                        .into_dimensionality::<Ix2>()
                        .ok()
                })
                .collect(),
            _ => None,
        }
    }

    /// Inverse of [`NdArray::planes`]: one plane gives `(H, W)`, several are
    /// stacked into `(H, W, C)`.
    pub fn from_planes(planes: &[Array2<f32>], dtype: DType) -> Option<Self> {
        let data = match planes {
            [] => return None,
            [single] => single.mapv(f64::from).into_dyn(),
            many => {
                let views: Vec<_> = many.iter().map(|p| p.view()).collect();
                ndarray::stack(Axis(2), &views).ok()?.mapv(f64::from).into_dyn()
            }
        };
        Some(Self::from_f64(data, dtype))
    }
}

impl fmt::Display for NdArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "array(shape={}, dtype={})", self.shape_string(), self.dtype())
    }
}

/// Render a shape as a tuple: `()`, `(5,)`, `(4, 4, 3)`.
pub fn format_shape(shape: &[usize]) -> String {
    match shape {
        [] => "()".to_string(),
        [single] => format!("({single},)"),
        dims => {
            let parts: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
            format!("({})", parts.join(", "))
        }
    }
}

fn widen<T: AsPrimitive<f64>>(data: &ArrayD<T>) -> ArrayD<f64> {
    data.mapv(|v| v.as_())
}

fn narrow<T>(data: &ArrayD<f64>, lo: f64, hi: f64) -> ArrayD<T>
where
    T: Copy + 'static,
    f64: AsPrimitive<T>,
{
    data.mapv(|v| v.round().clamp(lo, hi).as_())
}
