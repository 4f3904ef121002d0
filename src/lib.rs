//! # Injertar
//!
//! Remaps TensorFlow BERT checkpoints onto a native model parameter tree.
//!
//! Injertar (Spanish: "to graft") takes a foreign checkpoint - a flat
//! namespace of named tensors written by one training framework - and
//! grafts its values onto the hierarchical parameter tree a different
//! runtime expects. The engine resolves three naming conventions at once
//! (global embedding names, per-layer templated names with an index parsed
//! out of the source name, and the pooling head), transposes dense kernels
//! where the two frameworks disagree on axis order, validates every shape
//! exactly, and writes values in place.
//!
//! A single silent misassignment corrupts the loaded model with no visible
//! error, so the pass is all-or-nothing: known-irrelevant names (optimizer
//! state, classifier heads, step counters) are skipped and counted, and
//! everything else either assigns cleanly or aborts the load.
//!
//! ## Example
//!
//! ```
//! use injertar::checkpoint::MemoryCheckpoint;
//! use injertar::params::BertConfig;
//! use injertar::{load_checkpoint, Tensor};
//!
//! let config = BertConfig { hidden_size: 2, num_layers: 0, num_heads: 1,
//!     intermediate_size: 4, vocab_size: 3, type_vocab_size: 2,
//!     max_position_embeddings: 4 };
//! let mut params = config.build_params();
//!
//! let mut ckpt = MemoryCheckpoint::new();
//! ckpt.push(
//!     "bert/embeddings/LayerNorm/gamma",
//!     Tensor::from_vec(vec![2], vec![1.0, 1.0]).unwrap(),
//! );
//!
//! let report = load_checkpoint(&ckpt, &mut params).unwrap();
//! assert_eq!(report.assigned, 1);
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
// Clippy allows (MUST come after deny/warn to override them)
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::uninlined_format_args)]

/// Static mapping tables from checkpoint names to parameter paths
pub mod catalog;
/// Checkpoint sources: the enumerate/load boundary and its adapters
pub mod checkpoint;
pub mod error;
/// The load pass: resolve, transform, validate, assign
pub mod loader;
/// Target parameter tree and architecture configuration
pub mod params;
/// Checkpoint variable name resolution
pub mod resolver;
pub mod tensor;

pub use error::{InjertarError, Result};
pub use loader::{load_checkpoint, LoadReport};
pub use tensor::Tensor;
