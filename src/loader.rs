//! Checkpoint load pass
//!
//! Drives the full remapping pipeline, one source tensor at a time:
//!
//! ```text
//! enumerate -> resolve -> (skip | load -> transform -> validate -> assign)
//! ```
//!
//! The pass is strictly sequential and all-or-nothing: the first error
//! aborts it, skipped names are counted, and every parameter path is
//! written at most once. Skip decisions are made from the name alone, so
//! skip-filtered tensors are never loaded or decoded.

use std::collections::HashSet;

use crate::catalog::Transform;
use crate::checkpoint::CheckpointSource;
use crate::error::{InjertarError, Result};
use crate::params::ParamTree;
use crate::resolver::{self, Resolution};
use crate::tensor::Tensor;

/// Summary of one completed load pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Number of tensors assigned into the parameter tree
    pub assigned: usize,
    /// Number of checkpoint variables skipped by the filter
    pub skipped: usize,
}

/// Remap every checkpoint tensor into the parameter tree
///
/// The caller must hold exclusive access to `params` for the duration of
/// the pass. On error the tree may hold a prefix of the assignments;
/// callers treat that as a failed load, never as a usable model.
///
/// # Errors
///
/// Returns the first of:
/// - [`InjertarError::UnresolvedName`] for a name no rule covers
/// - [`InjertarError::PathNotFound`] if a resolved path has no slot
/// - [`InjertarError::ShapeMismatch`] on any shape disagreement
/// - [`InjertarError::DuplicateAssignment`] if two names resolve to one slot
/// - any checkpoint decode error from the source
///
/// # Examples
///
/// ```
/// use injertar::checkpoint::MemoryCheckpoint;
/// use injertar::params::BertConfig;
/// use injertar::{load_checkpoint, Tensor};
///
/// let config = BertConfig { hidden_size: 2, num_layers: 0, num_heads: 1,
///     intermediate_size: 4, vocab_size: 3, type_vocab_size: 2,
///     max_position_embeddings: 4 };
/// let mut params = config.build_params();
///
/// let mut ckpt = MemoryCheckpoint::new();
/// ckpt.push(
///     "bert/pooler/dense/bias",
///     Tensor::from_vec(vec![2], vec![0.5, -0.5]).unwrap(),
/// );
/// ckpt.push("global_step", Tensor::from_vec(vec![1], vec![9000.0]).unwrap());
///
/// let report = load_checkpoint(&ckpt, &mut params).unwrap();
/// assert_eq!(report.assigned, 1);
/// assert_eq!(report.skipped, 1);
/// ```
pub fn load_checkpoint<S: CheckpointSource>(
    source: &S,
    params: &mut ParamTree,
) -> Result<LoadReport> {
    let mut report = LoadReport::default();
    let mut assigned_paths = HashSet::new();

    for name in source.tensor_names() {
        match resolver::resolve(&name)? {
            Resolution::Skip => report.skipped += 1,
            Resolution::Assign { path, transform } => {
                let tensor = source.load_tensor(&name)?;
                apply(params, &mut assigned_paths, &name, path, transform, tensor)?;
                report.assigned += 1;
            }
        }
    }

    Ok(report)
}

/// Write one resolved tensor into its parameter slot
///
/// Validates before mutating: the destination must exist, must not have
/// been written earlier in this pass, and must match the transformed
/// shape exactly. A failed call leaves the slot untouched.
fn apply(
    params: &mut ParamTree,
    assigned_paths: &mut HashSet<String>,
    name: &str,
    path: String,
    transform: Transform,
    tensor: Tensor<f32>,
) -> Result<()> {
    if !assigned_paths.insert(path.clone()) {
        return Err(InjertarError::DuplicateAssignment { path });
    }

    let param = params
        .resolve_path_mut(&path)
        .ok_or_else(|| InjertarError::PathNotFound { path: path.clone() })?;

    let tensor = match transform {
        Transform::Identity => tensor,
        Transform::Transpose => tensor.transposed()?,
    };

    if param.shape() != tensor.shape() {
        return Err(InjertarError::ShapeMismatch {
            name: name.to_string(),
            source: tensor.shape().to_vec(),
            target: param.shape().to_vec(),
        });
    }

    param.set(tensor.into_data());
    Ok(())
}
