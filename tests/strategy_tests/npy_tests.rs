//! Tests for the NPY codec and strategy
//!
//! These tests verify:
//! - Byte-exact header layout (compatible with numpy.save)
//! - Round trips for every dtype and dimensionality
//! - Reading big-endian and version 2.0 files
//! - Rejection of malformed input

use serde_json::json;
use stashkv::strategy::{decode_npy, encode_npy, FormatStrategy, NpyStrategy};
use stashkv::{ArrayData, DType, NdArray, StashError, StoredValue};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

/// Build an NPY file by hand from a header dict and raw data
fn craft_npy(major: u8, dict: &str, data: &[u8]) -> Vec<u8> {
    let preamble = if major == 1 { 10 } else { 12 };
    let mut header = dict.to_string();
    while (preamble + header.len() + 1) % 64 != 0 {
        header.push(' ');
    }
    header.push('\n');

    let mut out = b"\x93NUMPY".to_vec();
    out.push(major);
    out.push(0);
    if major == 1 {
        out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    } else {
        out.extend_from_slice(&(header.len() as u32).to_le_bytes());
    }
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(data);
    out
}

fn header_text(bytes: &[u8]) -> String {
    let len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    String::from_utf8(bytes[10..10 + len].to_vec()).unwrap()
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encode_header_layout() {
    let array = NdArray::from_rows(vec![vec![1i64, 2, 3], vec![4, 5, 6]]).unwrap();

    let bytes = encode_npy(&array);

    assert_eq!(&bytes[0..6], b"\x93NUMPY");
    assert_eq!(bytes[6], 1);
    assert_eq!(bytes[7], 0);

    let header = header_text(&bytes);
    assert!(header.starts_with("{'descr': '<i8', 'fortran_order': False, 'shape': (2, 3), }"));
    assert!(header.ends_with('\n'));

    // Data starts on a 64-byte boundary
    let data_start = 10 + header.len();
    assert_eq!(data_start % 64, 0);
    assert_eq!(bytes.len(), data_start + 6 * 8);
    assert_eq!(&bytes[data_start..data_start + 8], &1i64.to_le_bytes());
}

#[test]
fn test_encode_shape_literals() {
    let scalar = NdArray::from_vec(vec![], vec![7i32]).unwrap();
    let vector = NdArray::from_vec(vec![3], vec![1u8, 2, 3]).unwrap();

    assert!(header_text(&encode_npy(&scalar)).contains("'shape': (), "));
    assert!(header_text(&encode_npy(&vector)).contains("'shape': (3,), "));
    assert!(header_text(&encode_npy(&vector)).contains("'descr': '|u1'"));
}

// =============================================================================
// Round Trip Tests
// =============================================================================

#[test]
fn test_round_trip_every_dtype() {
    let arrays = vec![
        NdArray::from_vec(vec![2, 2], vec![0u8, 1, 254, 255]).unwrap(),
        NdArray::from_vec(vec![4], vec![i32::MIN, -1, 0, i32::MAX]).unwrap(),
        NdArray::from_vec(vec![2, 1], vec![i64::MIN, i64::MAX]).unwrap(),
        NdArray::from_vec(vec![3], vec![f32::MIN, 0.1f32, f32::INFINITY]).unwrap(),
        NdArray::from_vec(vec![1, 1, 2], vec![-0.0f64, 1e-300]).unwrap(),
    ];

    for array in arrays {
        let decoded = decode_npy(&encode_npy(&array)).unwrap();
        assert_eq!(decoded, array);
        assert_eq!(decoded.dtype(), array.dtype());
        assert_eq!(decoded.shape(), array.shape());
    }
}

#[test]
fn test_round_trip_empty_array() {
    let array = NdArray::from_vec::<f64>(vec![0, 3], vec![]).unwrap();

    let decoded = decode_npy(&encode_npy(&array)).unwrap();

    assert_eq!(decoded.shape(), &[0, 3]);
    assert!(decoded.is_empty());
}

#[test]
fn test_round_trip_nan_bits() {
    let array = NdArray::from_vec(vec![1], vec![f64::NAN]).unwrap();

    let decoded = decode_npy(&encode_npy(&array)).unwrap();
    let value = decoded.as_slice::<f64>().unwrap()[0];

    assert!(value.is_nan());
    assert_eq!(value.to_bits(), f64::NAN.to_bits());
}

#[test]
fn test_strategy_round_trip_through_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("a.npy");
    let value = StoredValue::Array(NdArray::from_rows(vec![vec![1.5f32, 2.5]]).unwrap());

    NpyStrategy.serialize(&value, &path).unwrap();

    assert_eq!(NpyStrategy.deserialize(&path).unwrap(), value);
}

// =============================================================================
// Compatibility Tests
// =============================================================================

#[test]
fn test_decode_big_endian() {
    let mut data = Vec::new();
    for v in [1i32, -2, 300] {
        data.extend_from_slice(&v.to_be_bytes());
    }
    let bytes = craft_npy(
        1,
        "{'descr': '>i4', 'fortran_order': False, 'shape': (3,), }",
        &data,
    );

    let array = decode_npy(&bytes).unwrap();

    assert_eq!(array.data(), &ArrayData::I32(vec![1, -2, 300]));
}

#[test]
fn test_decode_version_two_header() {
    let mut data = Vec::new();
    for v in [0.5f64, 2.0] {
        data.extend_from_slice(&v.to_le_bytes());
    }
    let bytes = craft_npy(
        2,
        "{\"descr\": \"<f8\", \"fortran_order\": False, \"shape\": (1, 2)}",
        &data,
    );

    let array = decode_npy(&bytes).unwrap();

    assert_eq!(array.dtype(), DType::F64);
    assert_eq!(array.shape(), &[1, 2]);
    assert_eq!(array.get::<f64>(&[0, 1]), Some(2.0));
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn test_decode_rejects_bad_magic() {
    let err = decode_npy(b"NOTNUMPY\x01\x00").unwrap_err();
    assert!(matches!(err, StashError::Decode(_)));
}

#[test]
fn test_decode_rejects_unknown_version() {
    let mut bytes = craft_npy(1, "{'descr': '<i4', 'fortran_order': False, 'shape': (0,), }", &[]);
    bytes[6] = 9;

    assert!(matches!(decode_npy(&bytes), Err(StashError::Decode(_))));
}

#[test]
fn test_decode_rejects_fortran_order() {
    let bytes = craft_npy(
        1,
        "{'descr': '<i4', 'fortran_order': True, 'shape': (1, 1), }",
        &1i32.to_le_bytes(),
    );

    assert!(matches!(decode_npy(&bytes), Err(StashError::Decode(_))));
}

#[test]
fn test_decode_rejects_unsupported_dtype() {
    let bytes = craft_npy(
        1,
        "{'descr': '<c16', 'fortran_order': False, 'shape': (1,), }",
        &[0u8; 16],
    );

    let err = decode_npy(&bytes).unwrap_err();

    assert!(err.to_string().contains("<c16"));
}

#[test]
fn test_decode_rejects_truncated_data() {
    let array = NdArray::from_vec(vec![4], vec![1i64, 2, 3, 4]).unwrap();
    let mut bytes = encode_npy(&array);
    bytes.truncate(bytes.len() - 3);

    assert!(matches!(decode_npy(&bytes), Err(StashError::Decode(_))));
}

#[test]
fn test_decode_rejects_truncated_header() {
    let array = NdArray::from_vec(vec![1], vec![1u8]).unwrap();
    let bytes = encode_npy(&array);

    assert!(matches!(decode_npy(&bytes[..20]), Err(StashError::Decode(_))));
}

#[test]
fn test_strategy_refuses_structured_values() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("x.npy");

    let result = NpyStrategy.serialize(&StoredValue::Structured(json!([[1, 2]])), &path);

    assert!(matches!(result, Err(StashError::UnsupportedValue { .. })));
    assert!(!NpyStrategy.matches_value(&StoredValue::Structured(json!([[1, 2]]))));
}

#[test]
fn test_strategy_error_names_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.npy");
    std::fs::write(&path, b"garbage").unwrap();

    let err = NpyStrategy.deserialize(&path).unwrap_err();

    assert!(err.to_string().contains("broken.npy"));
}
