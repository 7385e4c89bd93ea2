//! Helpers for writing SafeTensors files in tests.

use std::path::Path;

use crate::dtype::Dtype;

pub struct Entry {
    key: String,
    dtype: Dtype,
    shape: Vec<usize>,
    bytes: Vec<u8>,
}

impl Entry {
    pub fn f32(key: &str, shape: &[usize], values: &[f32]) -> Self {
        Self::raw(key, Dtype::F32, shape, f32_bytes(values))
    }

    pub fn raw(key: &str, dtype: Dtype, shape: &[usize], bytes: Vec<u8>) -> Self {
        Self {
            key: key.to_string(),
            dtype,
            shape: shape.to_vec(),
            bytes,
        }
    }
}

pub fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Assemble a SafeTensors buffer from a header value and a data section.
pub fn raw_file(header: &serde_json::Value, data: &[u8]) -> Vec<u8> {
    let json = serde_json::to_vec(header).unwrap();
    let mut buf = (json.len() as u64).to_le_bytes().to_vec();
    buf.extend_from_slice(&json);
    buf.extend_from_slice(data);
    buf
}

/// Write `entries` to `path`, laying out data in the given order.
pub fn write_safetensors(path: &Path, entries: &[Entry]) {
    let mut header = serde_json::Map::new();
    header.insert("__metadata__".into(), serde_json::json!({"format": "pt"}));
    let mut data = Vec::new();
    for entry in entries {
        let start = data.len();
        data.extend_from_slice(&entry.bytes);
        header.insert(
            entry.key.clone(),
            serde_json::json!({
                "dtype": entry.dtype.to_string(),
                "shape": entry.shape,
                "data_offsets": [start, data.len()],
            }),
        );
    }
    std::fs::write(path, raw_file(&serde_json::Value::Object(header), &data)).unwrap();
}
