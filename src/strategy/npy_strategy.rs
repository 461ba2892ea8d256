//! NPY strategy
//!
//! Dense arrays in the NumPy `.npy` layout, readable by `numpy.load`.
//!
//! ## File Format (V1)
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Preamble (10 bytes)                                          │
//! │   Magic: "\x93NUMPY" (6) | Major (1) | Minor (1) | HdrLen u16 │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Header (HdrLen bytes, ASCII)                                 │
//! │   {'descr': '<i8', 'fortran_order': False, 'shape': (2, 3), } │
//! │   space padded, '\n' terminated, data starts on 64-byte line │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Data (row-major elements, byte order given by descr)         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Versions 2.0 and 3.0 differ only in a u32 header length (12-byte
//! preamble); both are accepted on read. Writes use 1.0 unless the header
//! does not fit in a u16.

use std::fs;
use std::path::Path;

use crate::error::{Result, StashError};
use crate::value::{ArrayData, DType, NdArray, StoredValue};

use super::FormatStrategy;

// =============================================================================
// Format Constants
// =============================================================================

/// Magic bytes identifying an NPY file
const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Preamble size for version 1.0: Magic (6) + Version (2) + HeaderLen u16 (2)
const PREAMBLE_V1: usize = 10;

/// Preamble size for versions 2.0/3.0: Magic (6) + Version (2) + HeaderLen u32 (4)
const PREAMBLE_V2: usize = 12;

/// Header + preamble are padded to a multiple of this
const ALIGNMENT: usize = 64;

pub struct NpyStrategy;

impl FormatStrategy for NpyStrategy {
    fn name(&self) -> &'static str {
        "npy"
    }

    fn matches_value(&self, value: &StoredValue) -> bool {
        matches!(value, StoredValue::Array(_))
    }

    fn matches_extension(&self, extension: &str) -> bool {
        extension == ".npy"
    }

    fn canonical_extension(&self) -> &'static str {
        ".npy"
    }

    fn serialize(&self, value: &StoredValue, dest: &Path) -> Result<()> {
        let StoredValue::Array(array) = value else {
            return Err(StashError::unsupported_value(value.kind()));
        };
        fs::write(dest, encode_npy(array))?;
        Ok(())
    }

    fn deserialize(&self, path: &Path) -> Result<StoredValue> {
        let bytes = fs::read(path)?;
        let array = decode_npy(&bytes).map_err(|e| match e {
            StashError::Decode(reason) => {
                StashError::Decode(format!("{}: {}", path.display(), reason))
            }
            other => other,
        })?;
        Ok(StoredValue::Array(array))
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode an array as NPY bytes (little-endian, C order)
pub fn encode_npy(array: &NdArray) -> Vec<u8> {
    let dtype = array.dtype();
    let mut header = format!(
        "{{'descr': '{}', 'fortran_order': False, 'shape': {}, }}",
        descr_for(dtype),
        shape_literal(array.shape())
    );

    // Pick the smallest version whose length field fits the header
    let unpadded_v1 = PREAMBLE_V1 + header.len() + 1;
    let padded_v1 = unpadded_v1.div_ceil(ALIGNMENT) * ALIGNMENT;
    let (major, preamble) = if padded_v1 - PREAMBLE_V1 <= u16::MAX as usize {
        (1u8, PREAMBLE_V1)
    } else {
        (2u8, PREAMBLE_V2)
    };

    let unpadded = preamble + header.len() + 1;
    let padding = (ALIGNMENT - unpadded % ALIGNMENT) % ALIGNMENT;
    header.extend(std::iter::repeat(' ').take(padding));
    header.push('\n');

    let mut out = Vec::with_capacity(preamble + header.len() + array.len() * dtype.size());
    out.extend_from_slice(MAGIC);
    out.push(major);
    out.push(0);
    if major == 1 {
        out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    } else {
        out.extend_from_slice(&(header.len() as u32).to_le_bytes());
    }
    out.extend_from_slice(header.as_bytes());
    write_elements(array.data(), &mut out);

    out
}

fn descr_for(dtype: DType) -> &'static str {
    match dtype {
        DType::U8 => "|u1",
        DType::I32 => "<i4",
        DType::I64 => "<i8",
        DType::F32 => "<f4",
        DType::F64 => "<f8",
    }
}

/// Python tuple literal: `()`, `(3,)`, `(2, 3)`
fn shape_literal(shape: &[usize]) -> String {
    match shape {
        [] => "()".to_string(),
        [n] => format!("({},)", n),
        dims => {
            let parts: Vec<String> = dims.iter().map(ToString::to_string).collect();
            format!("({})", parts.join(", "))
        }
    }
}

fn write_elements(data: &ArrayData, out: &mut Vec<u8>) {
    match data {
        ArrayData::U8(values) => out.extend_from_slice(values),
        ArrayData::I32(values) => values
            .iter()
            .for_each(|v| out.extend_from_slice(&v.to_le_bytes())),
        ArrayData::I64(values) => values
            .iter()
            .for_each(|v| out.extend_from_slice(&v.to_le_bytes())),
        ArrayData::F32(values) => values
            .iter()
            .for_each(|v| out.extend_from_slice(&v.to_le_bytes())),
        ArrayData::F64(values) => values
            .iter()
            .for_each(|v| out.extend_from_slice(&v.to_le_bytes())),
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Parsed header dictionary
#[derive(Debug)]
struct NpyHeader {
    dtype: DType,
    big_endian: bool,
    fortran_order: bool,
    shape: Vec<usize>,
}

/// Decode NPY bytes into an array
pub fn decode_npy(bytes: &[u8]) -> Result<NdArray> {
    if bytes.len() < PREAMBLE_V1 || &bytes[0..6] != MAGIC {
        return Err(StashError::Decode("Invalid NPY magic".to_string()));
    }

    let major = bytes[6];
    let (header_len, header_start) = match major {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, PREAMBLE_V1),
        2 | 3 => {
            if bytes.len() < PREAMBLE_V2 {
                return Err(StashError::Decode("Truncated NPY preamble".to_string()));
            }
            let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
            (len as usize, PREAMBLE_V2)
        }
        other => {
            return Err(StashError::Decode(format!(
                "Unsupported NPY version: {}.{}",
                other, bytes[7]
            )));
        }
    };

    let header_end = header_start + header_len;
    if bytes.len() < header_end {
        return Err(StashError::Decode(format!(
            "Truncated NPY header: expected {} bytes, got {}",
            header_end,
            bytes.len()
        )));
    }

    let header_text = std::str::from_utf8(&bytes[header_start..header_end])
        .map_err(|_| StashError::Decode("NPY header is not valid text".to_string()))?;
    let header = parse_header(header_text)?;

    if header.fortran_order {
        return Err(StashError::Decode(
            "Fortran-ordered NPY arrays are not supported".to_string(),
        ));
    }

    let expected = header
        .shape
        .iter()
        .try_fold(header.dtype.size(), |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| StashError::Decode("NPY shape is too large".to_string()))?;
    let raw = &bytes[header_end..];
    if raw.len() != expected {
        return Err(StashError::Decode(format!(
            "NPY data size mismatch: expected {} bytes, got {}",
            expected,
            raw.len()
        )));
    }

    let data = read_elements(header.dtype, header.big_endian, raw);
    NdArray::new(header.shape, data)
}

fn parse_header(text: &str) -> Result<NpyHeader> {
    let descr = quoted(dict_value(text, "descr")?)?;
    let (dtype, big_endian) = parse_descr(descr)?;

    let fortran_order = {
        let rest = dict_value(text, "fortran_order")?;
        if rest.starts_with("True") {
            true
        } else if rest.starts_with("False") {
            false
        } else {
            return Err(StashError::Decode(
                "NPY header has an invalid 'fortran_order'".to_string(),
            ));
        }
    };

    let shape = parse_shape(dict_value(text, "shape")?)?;

    Ok(NpyHeader {
        dtype,
        big_endian,
        fortran_order,
        shape,
    })
}

/// Text following `'key':` in the header dictionary
fn dict_value<'a>(text: &'a str, key: &str) -> Result<&'a str> {
    let single = format!("'{}'", key);
    let double = format!("\"{}\"", key);
    let (pos, len) = text
        .find(&single)
        .map(|p| (p, single.len()))
        .or_else(|| text.find(&double).map(|p| (p, double.len())))
        .ok_or_else(|| StashError::Decode(format!("NPY header is missing '{}'", key)))?;

    let rest = text[pos + len..].trim_start();
    let rest = rest
        .strip_prefix(':')
        .ok_or_else(|| StashError::Decode(format!("NPY header has a malformed '{}'", key)))?;
    Ok(rest.trim_start())
}

/// Contents of a leading quoted string
fn quoted(text: &str) -> Result<&str> {
    let quote = text
        .chars()
        .next()
        .filter(|c| *c == '\'' || *c == '"')
        .ok_or_else(|| StashError::Decode("NPY 'descr' is not a string".to_string()))?;
    let body = &text[1..];
    let end = body
        .find(quote)
        .ok_or_else(|| StashError::Decode("Unterminated NPY 'descr'".to_string()))?;
    Ok(&body[..end])
}

/// Map a descriptor like `<i8` to (dtype, big_endian)
fn parse_descr(descr: &str) -> Result<(DType, bool)> {
    let (order, code) = match descr.chars().next() {
        Some(c @ ('<' | '>' | '|' | '=')) => (c, &descr[1..]),
        _ => ('=', descr),
    };

    let dtype = match code {
        "u1" => DType::U8,
        "i4" => DType::I32,
        "i8" => DType::I64,
        "f4" => DType::F32,
        "f8" => DType::F64,
        _ => {
            return Err(StashError::Decode(format!(
                "Unsupported NPY dtype: {}",
                descr
            )));
        }
    };

    let big_endian = match order {
        '>' => true,
        '=' => cfg!(target_endian = "big"),
        _ => false,
    };

    Ok((dtype, big_endian))
}

/// Parse a tuple literal like `(2, 3)` or `(3,)`
fn parse_shape(text: &str) -> Result<Vec<usize>> {
    let inner = text
        .strip_prefix('(')
        .and_then(|rest| rest.find(')').map(|end| &rest[..end]))
        .ok_or_else(|| StashError::Decode("NPY header has a malformed 'shape'".to_string()))?;

    inner
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            // Python 2 writers emit long literals such as `3L`
            part.trim_end_matches('L').parse::<usize>().map_err(|_| {
                StashError::Decode(format!("Invalid NPY dimension: {}", part))
            })
        })
        .collect()
}

macro_rules! read_as {
    ($raw:expr, $ty:ty, $width:expr, $big:expr) => {
        $raw.chunks_exact($width)
            .map(|chunk| {
                let mut buf = [0u8; $width];
                buf.copy_from_slice(chunk);
                if $big {
                    <$ty>::from_be_bytes(buf)
                } else {
                    <$ty>::from_le_bytes(buf)
                }
            })
            .collect::<Vec<$ty>>()
    };
}

fn read_elements(dtype: DType, big_endian: bool, raw: &[u8]) -> ArrayData {
    match dtype {
        DType::U8 => ArrayData::U8(raw.to_vec()),
        DType::I32 => ArrayData::I32(read_as!(raw, i32, 4, big_endian)),
        DType::I64 => ArrayData::I64(read_as!(raw, i64, 8, big_endian)),
        DType::F32 => ArrayData::F32(read_as!(raw, f32, 4, big_endian)),
        DType::F64 => ArrayData::F64(read_as!(raw, f64, 8, big_endian)),
    }
}
