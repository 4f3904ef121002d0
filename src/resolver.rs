//! Checkpoint variable name resolution
//!
//! Decides, for each source name, whether the tensor is skipped or where
//! it lands in the parameter tree. Resolution order is fixed:
//!
//! 1. Skip filter - classifier heads, optimizer state, step counter.
//!    Always first, so a known-irrelevant name can never reach a table.
//! 2. Exact lookup in the global/pooler tables.
//! 3. Layer parse (`bert/encoder/layer_N/<suffix>`) + layer-table lookup.
//!
//! Anything left over is `UnresolvedName`: an unrecognized tensor means a
//! checkpoint/architecture mismatch or a missing catalog entry, and must
//! abort the load rather than silently drop.

use crate::catalog::{self, Transform};
use crate::error::{InjertarError, Result};

/// Outcome of resolving one checkpoint variable name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Known-irrelevant name; never loaded, never assigned, only counted
    Skip,
    /// Assign into `path` after applying `transform`
    Assign {
        /// Dotted path of the destination parameter
        path: String,
        /// Transform required before assignment
        transform: Transform,
    },
}

/// Whether a checkpoint variable carries no correspondence in the target
///
/// Matches the classifier head (`cls*`), the training step counter, and
/// Adam optimizer accumulators. The filter runs before any table lookup.
#[must_use]
pub fn should_skip(name: &str) -> bool {
    name.starts_with("cls")
        || name == "global_step"
        || name.ends_with("adam_m")
        || name.ends_with("adam_v")
}

/// Parse `bert/encoder/layer_N/<suffix>` into `(N, suffix)`
///
/// Returns `None` for any deviation: wrong scope prefix, missing or
/// non-numeric layer segment, empty suffix. The caller turns `None` into
/// `UnresolvedName`; a malformed name is a mapping failure, not a crash.
fn parse_layer_name(name: &str) -> Option<(usize, &str)> {
    let rest = name.strip_prefix("bert/encoder/")?;
    let (segment, suffix) = rest.split_once('/')?;
    let layer_index: usize = segment.strip_prefix("layer_")?.parse().ok()?;
    if suffix.is_empty() {
        return None;
    }
    Some((layer_index, suffix))
}

/// Resolve one checkpoint variable name
///
/// # Errors
///
/// Returns [`InjertarError::UnresolvedName`] if the name passes the skip
/// filter but matches no mapping rule.
pub fn resolve(name: &str) -> Result<Resolution> {
    if should_skip(name) {
        return Ok(Resolution::Skip);
    }

    if let Some(rule) = catalog::lookup_exact(name) {
        return Ok(Resolution::Assign {
            path: rule.target.to_string(),
            transform: rule.transform,
        });
    }

    if let Some((layer_index, suffix)) = parse_layer_name(name) {
        if let Some(rule) = catalog::lookup_layer(suffix) {
            return Ok(Resolution::Assign {
                path: catalog::substitute_layer(rule.target, layer_index),
                transform: rule.transform,
            });
        }
    }

    Err(InjertarError::UnresolvedName {
        name: name.to_string(),
    })
}
