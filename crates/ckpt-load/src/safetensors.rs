//! SafeTensors reader.
//!
//! Layout:
//! ```text
//! [8 bytes: u64 little-endian header length N]
//! [N bytes: JSON object, tensor name -> {dtype, shape, data_offsets}]
//! [data section: raw little-endian tensor bytes]
//! ```
//!
//! Keys starting with `__` (such as `__metadata__`) are format bookkeeping and
//! are skipped. Tensors are returned in data-offset order, the order in which
//! the writer laid them out, rather than the JSON key order.

use std::fs::File;
use std::path::Path;

use ckpt_types::{Shape, StateDict, Tensor};
use memmap2::Mmap;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::dtype::Dtype;
use crate::error::{LoadError, LoadResult};

/// Header entry for one tensor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TensorInfo {
    pub key: String,
    pub dtype: Dtype,
    pub shape: Shape,
    /// Byte range `[start, end)` relative to the start of the data section.
    pub data_offsets: [usize; 2],
}

#[derive(Deserialize)]
struct RawEntry {
    dtype: String,
    shape: Vec<usize>,
    data_offsets: [usize; 2],
}

/// Read a SafeTensors file into a [`StateDict`].
pub fn read_safetensors(path: &Path) -> LoadResult<StateDict> {
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_err)?;
    let len = file.metadata().map_err(io_err)?.len();
    if len < 8 {
        return Err(LoadError::InvalidHeader {
            path: path.to_path_buf(),
            reason: format!("file is {len} bytes, need at least 8"),
        });
    }

    // SAFETY: the mapping is read-only and lives only for this call. A
    // concurrent writer truncating the file is outside what we support.
    let mmap = unsafe { Mmap::map(&file) }.map_err(io_err)?;

    let (infos, data_start) = parse_header(&mmap).map_err(|reason| LoadError::InvalidHeader {
        path: path.to_path_buf(),
        reason,
    })?;
    let dict = decode_tensors(&mmap[data_start..], &infos)?;
    debug!(path = %path.display(), tensors = dict.len(), "loaded SafeTensors file");
    Ok(dict)
}

/// Parse the header of a SafeTensors buffer.
///
/// Returns the tensor entries sorted by data offset and the byte position
/// where the data section starts.
pub fn parse_header(bytes: &[u8]) -> Result<(Vec<TensorInfo>, usize), String> {
    let len_bytes: [u8; 8] = bytes
        .get(..8)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| format!("buffer is {} bytes, need at least 8", bytes.len()))?;
    let header_len = usize::try_from(u64::from_le_bytes(len_bytes))
        .map_err(|_| "header length does not fit in memory".to_string())?;
    let data_start = header_len
        .checked_add(8)
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| format!("header length {header_len} exceeds file size {}", bytes.len()))?;

    let header: serde_json::Value = serde_json::from_slice(&bytes[8..data_start])
        .map_err(|e| format!("header is not valid JSON: {e}"))?;
    let serde_json::Value::Object(map) = header else {
        return Err("header is not a JSON object".to_string());
    };

    let mut infos = Vec::with_capacity(map.len());
    for (key, value) in map {
        if key.starts_with("__") {
            continue;
        }
        let raw: RawEntry = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "skipping unreadable header entry");
                continue;
            }
        };
        let dtype = raw.dtype.parse::<Dtype>().map_err(|dtype| {
            format!("tensor {key:?} has unsupported dtype {dtype}")
        })?;
        infos.push(TensorInfo {
            key,
            dtype,
            shape: Shape::from(raw.shape),
            data_offsets: raw.data_offsets,
        });
    }
    infos.sort_by_key(|info| info.data_offsets);
    Ok((infos, data_start))
}

/// Decode tensors from the data section, in the order given.
pub fn decode_tensors(data: &[u8], infos: &[TensorInfo]) -> LoadResult<StateDict> {
    let mut dict = StateDict::new();
    for info in infos {
        let [start, end] = info.data_offsets;
        let invalid = |reason: String| LoadError::InvalidTensor {
            key: info.key.clone(),
            reason,
        };
        if start > end || end > data.len() {
            return Err(invalid(format!(
                "data offsets [{start}, {end}) outside data section of {} bytes",
                data.len()
            )));
        }
        let expected = info
            .shape
            .checked_numel()
            .and_then(|n| n.checked_mul(info.dtype.size()))
            .ok_or_else(|| invalid(format!("shape {} is too large", info.shape)))?;
        if end - start != expected {
            return Err(invalid(format!(
                "{} bytes for {} {}, expected {expected}",
                end - start,
                info.dtype,
                info.shape
            )));
        }
        let values = info.dtype.decode(&data[start..end]);
        dict.insert(info.key.clone(), Tensor::new(info.shape.clone(), values)?)?;
    }
    Ok(dict)
}
