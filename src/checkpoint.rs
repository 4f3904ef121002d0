//! Checkpoint sources
//!
//! The engine consumes a checkpoint through two operations: enumerate
//! names and load one tensor by name. It performs no file-format parsing
//! of its own beyond the safetensors adapter in this module.
//!
//! ## Safetensors layout
//!
//! ```text
//! Safetensors := HEADER METADATA TENSOR_DATA
//!
//! HEADER := {
//!   metadata_len: u64 (little-endian)
//! }
//!
//! METADATA := JSON {
//!   "tensor_name": {
//!     "dtype": "F32" | "F16" | ...,
//!     "shape": [dim1, dim2, ...],
//!     "data_offsets": [start, end]
//!   },
//!   ...
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{InjertarError, Result};
use crate::tensor::Tensor;

/// A checkpoint exposed as an ordered sequence of named tensors
///
/// The whole checkpoint is treated as already materialized; enumeration
/// order drives the load loop but no mapping decision depends on it.
pub trait CheckpointSource {
    /// Variable names in enumeration order
    fn tensor_names(&self) -> Vec<String>;

    /// Load one tensor by name
    ///
    /// # Errors
    ///
    /// Returns an error if the name is unknown to the checkpoint or the
    /// stored payload cannot be decoded.
    fn load_tensor(&self, name: &str) -> Result<Tensor<f32>>;
}

/// In-memory checkpoint with explicit enumeration order
///
/// Used by tests and by callers that already hold decoded tensors.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpoint {
    entries: Vec<(String, Tensor<f32>)>,
}

impl MemoryCheckpoint {
    /// Create an empty checkpoint
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named tensor; enumeration follows insertion order
    pub fn push(&mut self, name: impl Into<String>, tensor: Tensor<f32>) {
        self.entries.push((name.into(), tensor));
    }
}

impl CheckpointSource for MemoryCheckpoint {
    fn tensor_names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    fn load_tensor(&self, name: &str) -> Result<Tensor<f32>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t.clone())
            .ok_or_else(|| InjertarError::FormatError {
                reason: format!("Tensor '{name}' not found in checkpoint"),
            })
    }
}

/// Safetensors data type
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum SafetensorsDtype {
    /// 32-bit float
    F32,
    /// 16-bit float
    F16,
    /// Brain float 16
    BF16,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 8-bit unsigned integer
    U8,
    /// Boolean
    Bool,
}

/// JSON tensor metadata (internal)
#[derive(Debug, Deserialize)]
struct TensorMetadata {
    dtype: SafetensorsDtype,
    shape: Vec<usize>,
    data_offsets: [usize; 2],
}

/// Memory-mapped safetensors checkpoint
///
/// Opening is O(1) with respect to file size: only the 8-byte header and
/// the JSON metadata are parsed; tensor payloads stay untouched until
/// `load_tensor` is called. Enumeration order is the sorted name order,
/// so repeated passes over the same file are deterministic.
#[derive(Debug)]
pub struct SafetensorsCheckpoint {
    /// Memory-mapped file data
    mmap: memmap2::Mmap,
    /// File path (for diagnostics)
    path: PathBuf,
    /// Tensor metadata parsed from the header
    tensors: HashMap<String, TensorMetadata>,
    /// Offset where tensor data begins (after header + JSON metadata)
    data_offset: usize,
}

impl SafetensorsCheckpoint {
    /// Open a safetensors file with zero-copy memory mapping
    ///
    /// # Errors
    ///
    /// Returns [`InjertarError::MissingDependency`] if the file cannot be
    /// opened or mapped (the checkpoint-reading capability is absent from
    /// this environment), and [`InjertarError::FormatError`] if the
    /// header or metadata is malformed. Both abort before any mapping
    /// work begins.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = std::fs::File::open(&path).map_err(|e| InjertarError::MissingDependency {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        // SAFETY: file is opened read-only and never modified while mapped
        let mmap = unsafe {
            memmap2::MmapOptions::new().map(&file).map_err(|e| {
                InjertarError::MissingDependency {
                    path: path.display().to_string(),
                    reason: format!("mmap failed: {e}"),
                }
            })?
        };

        if mmap.len() < 8 {
            return Err(InjertarError::FormatError {
                reason: format!(
                    "File too small: {} bytes (minimum 8 for header)",
                    mmap.len()
                ),
            });
        }

        let metadata_len = u64::from_le_bytes(
            mmap[0..8]
                .try_into()
                .expect("slice is exactly 8 bytes"),
        );
        let metadata_len =
            usize::try_from(metadata_len).map_err(|_| InjertarError::FormatError {
                reason: format!("Metadata length {metadata_len} exceeds platform limit"),
            })?;

        let data_offset = 8 + metadata_len;
        if mmap.len() < data_offset {
            return Err(InjertarError::FormatError {
                reason: format!(
                    "File truncated: need {} bytes for header+metadata, have {}",
                    data_offset,
                    mmap.len()
                ),
            });
        }

        let tensors = Self::parse_metadata(&mmap[8..data_offset])?;

        Ok(Self {
            mmap,
            path,
            tensors,
            data_offset,
        })
    }

    /// File path this checkpoint was opened from
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of tensors in the checkpoint
    #[must_use]
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// Whether the checkpoint holds no tensors
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Parse JSON metadata, skipping special `__metadata__` keys
    fn parse_metadata(json_bytes: &[u8]) -> Result<HashMap<String, TensorMetadata>> {
        let json_value: serde_json::Value =
            serde_json::from_slice(json_bytes).map_err(|e| InjertarError::FormatError {
                reason: format!("Metadata is not valid JSON: {e}"),
            })?;

        let json_map = json_value
            .as_object()
            .ok_or_else(|| InjertarError::FormatError {
                reason: "Expected JSON object in metadata".to_string(),
            })?;

        let mut tensors = HashMap::new();
        for (name, value) in json_map {
            if name.starts_with("__") {
                continue;
            }
            let meta: TensorMetadata =
                serde_json::from_value(value.clone()).map_err(|e| InjertarError::FormatError {
                    reason: format!("Bad metadata for tensor '{name}': {e}"),
                })?;
            tensors.insert(name.clone(), meta);
        }

        Ok(tensors)
    }
}

impl CheckpointSource for SafetensorsCheckpoint {
    fn tensor_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tensors.keys().cloned().collect();
        names.sort();
        names
    }

    fn load_tensor(&self, name: &str) -> Result<Tensor<f32>> {
        let meta = self
            .tensors
            .get(name)
            .ok_or_else(|| InjertarError::FormatError {
                reason: format!("Tensor '{name}' not found in checkpoint"),
            })?;

        if meta.dtype != SafetensorsDtype::F32 {
            return Err(InjertarError::FormatError {
                reason: format!(
                    "Tensor '{name}' has dtype {:?}, expected F32",
                    meta.dtype
                ),
            });
        }

        let [start, end] = meta.data_offsets;
        let data = &self.mmap[self.data_offset..];
        if end > data.len() || start > end {
            return Err(InjertarError::FormatError {
                reason: format!(
                    "Tensor '{name}' offsets [{start}, {end}) exceed data size {}",
                    data.len()
                ),
            });
        }

        let bytes = &data[start..end];
        if bytes.len() % 4 != 0 {
            return Err(InjertarError::FormatError {
                reason: format!("Data size {} is not a multiple of 4", bytes.len()),
            });
        }

        let values = bytes
            .chunks_exact(4)
            .map(|chunk| {
                f32::from_le_bytes(
                    chunk
                        .try_into()
                        .expect("chunks_exact(4) guarantees 4-byte slices"),
                )
            })
            .collect();

        Tensor::from_vec(meta.shape.clone(), values)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    /// Build minimal safetensors bytes from (name, shape, values) triples
    fn build_safetensors(entries: &[(&str, &[usize], &[f32])]) -> Vec<u8> {
        let mut json_parts = Vec::new();
        let mut payload = Vec::new();
        for (name, shape, values) in entries {
            let start = payload.len();
            for v in *values {
                payload.extend_from_slice(&v.to_le_bytes());
            }
            let end = payload.len();
            json_parts.push(format!(
                r#""{name}":{{"dtype":"F32","shape":{shape:?},"data_offsets":[{start},{end}]}}"#
            ));
        }
        let json = format!("{{{}}}", json_parts.join(","));

        let mut data = Vec::new();
        data.extend_from_slice(&(json.len() as u64).to_le_bytes());
        data.extend_from_slice(json.as_bytes());
        data.extend_from_slice(&payload);
        data
    }

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_memory_checkpoint_preserves_order() {
        let mut ckpt = MemoryCheckpoint::new();
        ckpt.push("b", Tensor::from_vec(vec![1], vec![2.0]).unwrap());
        ckpt.push("a", Tensor::from_vec(vec![1], vec![1.0]).unwrap());
        assert_eq!(ckpt.tensor_names(), vec!["b", "a"]);
        assert_eq!(ckpt.load_tensor("a").unwrap().data(), &[1.0]);
    }

    #[test]
    fn test_memory_checkpoint_unknown_name() {
        let ckpt = MemoryCheckpoint::new();
        assert!(matches!(
            ckpt.load_tensor("missing").unwrap_err(),
            InjertarError::FormatError { .. }
        ));
    }

    #[test]
    fn test_safetensors_open_and_load() {
        let bytes = build_safetensors(&[
            ("beta", &[2], &[1.0, 2.0]),
            ("alpha", &[2, 2], &[1.0, 2.0, 3.0, 4.0]),
        ]);
        let file = write_temp(&bytes);

        let ckpt = SafetensorsCheckpoint::open(file.path()).unwrap();
        assert_eq!(ckpt.len(), 2);
        // Names are sorted for deterministic enumeration
        assert_eq!(ckpt.tensor_names(), vec!["alpha", "beta"]);

        let t = ckpt.load_tensor("alpha").unwrap();
        assert_eq!(t.shape(), &[2, 2]);
        assert_eq!(t.data(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_safetensors_missing_file_is_missing_dependency() {
        let err = SafetensorsCheckpoint::open("/nonexistent/model.safetensors").unwrap_err();
        assert!(matches!(err, InjertarError::MissingDependency { .. }));
        assert!(err.to_string().contains("/nonexistent/model.safetensors"));
    }

    #[test]
    fn test_safetensors_truncated_header() {
        let file = write_temp(&[0u8; 4]);
        let err = SafetensorsCheckpoint::open(file.path()).unwrap_err();
        assert!(matches!(err, InjertarError::FormatError { .. }));
    }

    #[test]
    fn test_safetensors_truncated_metadata() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&100u64.to_le_bytes());
        bytes.extend_from_slice(b"{}");
        let file = write_temp(&bytes);
        let err = SafetensorsCheckpoint::open(file.path()).unwrap_err();
        assert!(matches!(err, InjertarError::FormatError { .. }));
    }

    #[test]
    fn test_safetensors_invalid_json() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&10u64.to_le_bytes());
        bytes.extend_from_slice(b"not json!!");
        let file = write_temp(&bytes);
        let err = SafetensorsCheckpoint::open(file.path()).unwrap_err();
        assert!(matches!(err, InjertarError::FormatError { .. }));
    }

    #[test]
    fn test_safetensors_skips_dunder_metadata_key() {
        let json = r#"{"__metadata__":{"format":"pt"},"w":{"dtype":"F32","shape":[1],"data_offsets":[0,4]}}"#;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(json.len() as u64).to_le_bytes());
        bytes.extend_from_slice(json.as_bytes());
        bytes.extend_from_slice(&1.0f32.to_le_bytes());
        let file = write_temp(&bytes);

        let ckpt = SafetensorsCheckpoint::open(file.path()).unwrap();
        assert_eq!(ckpt.tensor_names(), vec!["w"]);
    }

    #[test]
    fn test_safetensors_non_f32_rejected() {
        let json = r#"{"h":{"dtype":"F16","shape":[1],"data_offsets":[0,2]}}"#;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(json.len() as u64).to_le_bytes());
        bytes.extend_from_slice(json.as_bytes());
        bytes.extend_from_slice(&[0u8; 2]);
        let file = write_temp(&bytes);

        let ckpt = SafetensorsCheckpoint::open(file.path()).unwrap();
        let err = ckpt.load_tensor("h").unwrap_err();
        assert!(matches!(err, InjertarError::FormatError { .. }));
        assert!(err.to_string().contains("F16"));
    }

    #[test]
    fn test_safetensors_out_of_range_offsets() {
        let json = r#"{"w":{"dtype":"F32","shape":[4],"data_offsets":[0,16]}}"#;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(json.len() as u64).to_le_bytes());
        bytes.extend_from_slice(json.as_bytes());
        bytes.extend_from_slice(&[0u8; 8]); // only half the payload
        let file = write_temp(&bytes);

        let ckpt = SafetensorsCheckpoint::open(file.path()).unwrap();
        assert!(matches!(
            ckpt.load_tensor("w").unwrap_err(),
            InjertarError::FormatError { .. }
        ));
    }
}
