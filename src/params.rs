//! Target model parameter tree
//!
//! The addressable namespace the remapping engine writes into. The engine
//! never creates or destroys slots; it only overwrites values of slots
//! that already exist. `BertConfig::build_params` constructs every slot a
//! catalog rule can target, sized from the architecture hyperparameters.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One mutable parameter slot: a shaped, row-major f32 buffer
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Parameter {
    /// Create a zero-initialized parameter of the given shape
    #[must_use]
    pub fn zeros(shape: Vec<usize>) -> Self {
        let size = shape.iter().product();
        Self {
            shape,
            data: vec![0.0; size],
        }
    }

    /// Shape of the slot; fixed for the slot's lifetime
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Stored values in row-major order
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.data
    }

    /// Overwrite the stored values
    ///
    /// The caller (the applier) has already validated that `values` has
    /// exactly `shape.iter().product()` elements; the slot's shape never
    /// changes.
    pub(crate) fn set(&mut self, values: Vec<f32>) {
        debug_assert_eq!(values.len(), self.data.len());
        self.data = values;
    }
}

/// Hierarchical parameter namespace addressed by dotted paths
///
/// # Examples
///
/// ```
/// use injertar::params::ParamTree;
///
/// let mut tree = ParamTree::new();
/// tree.insert("pooler.dense.bias", vec![768]);
/// assert_eq!(tree.resolve_path("pooler.dense.bias").unwrap().shape(), &[768]);
/// assert!(tree.resolve_path("pooler.dense.kernel").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamTree {
    slots: HashMap<String, Parameter>,
}

impl ParamTree {
    /// Create an empty tree
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a zero-initialized slot at `path`
    pub fn insert(&mut self, path: impl Into<String>, shape: Vec<usize>) {
        self.slots.insert(path.into(), Parameter::zeros(shape));
    }

    /// Look up a parameter by dotted path
    #[must_use]
    pub fn resolve_path(&self, path: &str) -> Option<&Parameter> {
        self.slots.get(path)
    }

    /// Look up a parameter by dotted path, mutably
    #[must_use]
    pub fn resolve_path_mut(&mut self, path: &str) -> Option<&mut Parameter> {
        self.slots.get_mut(path)
    }

    /// Number of slots in the tree
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the tree has no slots
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate over slot paths (unordered)
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }
}

/// BERT architecture hyperparameters
///
/// Only the sizes that shape the parameter tree; tokenization, dropout,
/// and training settings are out of scope. Defaults match
/// BERT-base-uncased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BertConfig {
    /// Hidden representation width
    pub hidden_size: usize,
    /// Number of repeated encoder blocks
    pub num_layers: usize,
    /// Attention heads per block (informational; head split is internal
    /// to the merged Q/K/V weight shapes)
    pub num_heads: usize,
    /// Feed-forward inner width
    pub intermediate_size: usize,
    /// Wordpiece vocabulary size
    pub vocab_size: usize,
    /// Segment (token type) vocabulary size
    pub type_vocab_size: usize,
    /// Maximum sequence length for learned position embeddings
    pub max_position_embeddings: usize,
}

impl Default for BertConfig {
    fn default() -> Self {
        Self {
            hidden_size: 768,
            num_layers: 12,
            num_heads: 12,
            intermediate_size: 3072,
            vocab_size: 30522,
            type_vocab_size: 2,
            max_position_embeddings: 512,
        }
    }
}

impl BertConfig {
    /// Build the full parameter tree for this architecture
    ///
    /// Creates every slot the rule catalog can target, zero-initialized:
    /// embeddings, per-layer attention/FFN/normalization parameters for
    /// layers `0..num_layers`, and the pooling head. Weight matrices are
    /// `[out_features, in_features]`.
    #[must_use]
    pub fn build_params(&self) -> ParamTree {
        let h = self.hidden_size;
        let i = self.intermediate_size;
        let mut tree = ParamTree::new();

        tree.insert("embeddings.word.weight", vec![self.vocab_size, h]);
        tree.insert("embeddings.segment.weight", vec![self.type_vocab_size, h]);
        tree.insert(
            "embeddings.position.weight",
            vec![self.max_position_embeddings, h],
        );
        tree.insert("embeddings.norm.weight", vec![h]);
        tree.insert("embeddings.norm.bias", vec![h]);

        for layer in 0..self.num_layers {
            let prefix = format!("encoder.layers.{layer}");
            for proj in ["query", "key", "value", "output"] {
                tree.insert(format!("{prefix}.attention.{proj}.weight"), vec![h, h]);
                tree.insert(format!("{prefix}.attention.{proj}.bias"), vec![h]);
            }
            tree.insert(format!("{prefix}.attention.norm.weight"), vec![h]);
            tree.insert(format!("{prefix}.attention.norm.bias"), vec![h]);

            tree.insert(format!("{prefix}.ffn.intermediate.weight"), vec![i, h]);
            tree.insert(format!("{prefix}.ffn.intermediate.bias"), vec![i]);
            tree.insert(format!("{prefix}.ffn.output.weight"), vec![h, i]);
            tree.insert(format!("{prefix}.ffn.output.bias"), vec![h]);
            tree.insert(format!("{prefix}.ffn.norm.weight"), vec![h]);
            tree.insert(format!("{prefix}.ffn.norm.bias"), vec![h]);
        }

        tree.insert("pooler.dense.weight", vec![h, h]);
        tree.insert("pooler.dense.bias", vec![h]);

        tree
    }
}
