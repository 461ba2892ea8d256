//! Dense numeric arrays
//!
//! Row-major, rectangular, single element type.

use crate::error::{Result, StashError};

/// Element type of an array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    U8,
    I32,
    I64,
    F32,
    F64,
}

impl DType {
    /// Size of one element in bytes
    pub fn size(&self) -> usize {
        match self {
            DType::U8 => 1,
            DType::I32 | DType::F32 => 4,
            DType::I64 | DType::F64 => 8,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DType::U8 => "u8",
            DType::I32 => "i32",
            DType::I64 => "i64",
            DType::F32 => "f32",
            DType::F64 => "f64",
        }
    }
}

/// Element storage, one variant per dtype
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    U8(Vec<u8>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl ArrayData {
    pub fn len(&self) -> usize {
        match self {
            ArrayData::U8(v) => v.len(),
            ArrayData::I32(v) => v.len(),
            ArrayData::I64(v) => v.len(),
            ArrayData::F32(v) => v.len(),
            ArrayData::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> DType {
        match self {
            ArrayData::U8(_) => DType::U8,
            ArrayData::I32(_) => DType::I32,
            ArrayData::I64(_) => DType::I64,
            ArrayData::F32(_) => DType::F32,
            ArrayData::F64(_) => DType::F64,
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Rust types usable as array elements
pub trait Element: Copy + sealed::Sealed {
    const DTYPE: DType;

    fn into_data(values: Vec<Self>) -> ArrayData;

    fn slice(data: &ArrayData) -> Option<&[Self]>;
}

macro_rules! impl_element {
    ($ty:ty, $dtype:ident) => {
        impl sealed::Sealed for $ty {}

        impl Element for $ty {
            const DTYPE: DType = DType::$dtype;

            fn into_data(values: Vec<Self>) -> ArrayData {
                ArrayData::$dtype(values)
            }

            fn slice(data: &ArrayData) -> Option<&[Self]> {
                match data {
                    ArrayData::$dtype(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_element!(u8, U8);
impl_element!(i32, I32);
impl_element!(i64, I64);
impl_element!(f32, F32);
impl_element!(f64, F64);

/// A rectangular n-dimensional array
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    shape: Vec<usize>,
    data: ArrayData,
}

impl NdArray {
    /// Create an array, checking that `shape` accounts for every element
    ///
    /// An empty shape is a zero-dimensional array holding exactly one element.
    pub fn new(shape: Vec<usize>, data: ArrayData) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(StashError::ShapeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    pub fn from_vec<T: Element>(shape: Vec<usize>, values: Vec<T>) -> Result<Self> {
        Self::new(shape, T::into_data(values))
    }

    /// Build a 2-D array from equally long rows
    ///
    /// ```
    /// use stashkv::NdArray;
    ///
    /// let array = NdArray::from_rows(vec![vec![1i64, 2, 3], vec![4, 5, 6]]).unwrap();
    /// assert_eq!(array.shape(), &[2, 3]);
    /// ```
    pub fn from_rows<T: Element>(rows: Vec<Vec<T>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let total: usize = rows.iter().map(|r| r.len()).sum();

        if rows.iter().any(|r| r.len() != n_cols) {
            return Err(StashError::ShapeMismatch {
                expected: n_rows * n_cols,
                actual: total,
            });
        }

        let values: Vec<T> = rows.into_iter().flatten().collect();
        Self::from_vec(vec![n_rows, n_cols], values)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    /// Flat row-major view, if `T` is the element type
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::slice(&self.data)
    }

    /// Element at a multi-dimensional index
    pub fn get<T: Element>(&self, index: &[usize]) -> Option<T> {
        if index.len() != self.shape.len() {
            return None;
        }

        // Row-major offset
        let mut offset = 0;
        for (&i, &dim) in index.iter().zip(&self.shape) {
            if i >= dim {
                return None;
            }
            offset = offset * dim + i;
        }

        self.as_slice::<T>()?.get(offset).copied()
    }
}
