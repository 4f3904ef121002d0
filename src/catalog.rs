//! Rule catalog for checkpoint name remapping
//!
//! Static lookup tables declaring how TensorFlow BERT variable names
//! translate to this crate's parameter paths. Four tables partition the
//! source namespace:
//!
//! ```text
//! global          bert/embeddings/*            exact name, no transform
//! pooler          bert/pooler/dense/*          exact name, kernel transposed
//! layer (plain)   <suffix after layer_N/>      biases + LayerNorm, no transform
//! layer (kernel)  <suffix after layer_N/>      dense kernels, transposed
//! ```
//!
//! The tables are process-wide constants, constructed once and never
//! mutated. Supporting a new architecture variant means extending these
//! tables only; the resolver and applier are table-driven.

/// Transform applied to a source tensor before assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Assign the tensor unchanged
    Identity,
    /// Swap the two axes of a 2-D tensor before assignment
    ///
    /// TensorFlow dense kernels are `[in_features, out_features]`; the
    /// target parameters are `[out_features, in_features]`.
    Transpose,
}

/// Which part of the source namespace a rule matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    /// Matches a full checkpoint variable name exactly
    Global,
    /// Matches the suffix after the `layer_N/` segment; the target is a
    /// template with one `{}` placeholder for the layer index
    Layer,
}

/// One mapping rule, tagged with its scope and transform
///
/// All four tables dispatch through this single type, so the resolver is
/// one uniform lookup rather than four independent code paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    /// Source pattern: a full name (`Global`) or a post-index suffix (`Layer`)
    pub source: &'static str,
    /// Target path, or a template with one `{}` placeholder (`Layer`)
    pub target: &'static str,
    /// Namespace partition this rule belongs to
    pub scope: RuleScope,
    /// Transform required before assignment
    pub transform: Transform,
}

/// Embedding and top-level normalization tensors (exact names, no transform)
pub const GLOBAL_TENSOR_MAP: &[(&str, &str)] = &[
    ("bert/embeddings/word_embeddings", "embeddings.word.weight"),
    (
        "bert/embeddings/token_type_embeddings",
        "embeddings.segment.weight",
    ),
    (
        "bert/embeddings/position_embeddings",
        "embeddings.position.weight",
    ),
    ("bert/embeddings/LayerNorm/gamma", "embeddings.norm.weight"),
    ("bert/embeddings/LayerNorm/beta", "embeddings.norm.bias"),
];

/// Pooling head (exact names; the kernel is transposed, the bias is not)
pub const POOLER_MAP: &[(&str, &str, Transform)] = &[
    (
        "bert/pooler/dense/kernel",
        "pooler.dense.weight",
        Transform::Transpose,
    ),
    (
        "bert/pooler/dense/bias",
        "pooler.dense.bias",
        Transform::Identity,
    ),
];

/// Per-layer suffixes assigned as-is: biases and LayerNorm scale/shift
pub const LAYER_TENSOR_MAP: &[(&str, &str)] = &[
    (
        "attention/self/query/bias",
        "encoder.layers.{}.attention.query.bias",
    ),
    (
        "attention/self/key/bias",
        "encoder.layers.{}.attention.key.bias",
    ),
    (
        "attention/self/value/bias",
        "encoder.layers.{}.attention.value.bias",
    ),
    (
        "attention/output/dense/bias",
        "encoder.layers.{}.attention.output.bias",
    ),
    (
        "attention/output/LayerNorm/gamma",
        "encoder.layers.{}.attention.norm.weight",
    ),
    (
        "attention/output/LayerNorm/beta",
        "encoder.layers.{}.attention.norm.bias",
    ),
    (
        "intermediate/dense/bias",
        "encoder.layers.{}.ffn.intermediate.bias",
    ),
    ("output/dense/bias", "encoder.layers.{}.ffn.output.bias"),
    ("output/LayerNorm/gamma", "encoder.layers.{}.ffn.norm.weight"),
    ("output/LayerNorm/beta", "encoder.layers.{}.ffn.norm.bias"),
];

/// Per-layer dense kernels, transposed before assignment
pub const LAYER_TRANSPOSE_MAP: &[(&str, &str)] = &[
    (
        "attention/self/query/kernel",
        "encoder.layers.{}.attention.query.weight",
    ),
    (
        "attention/self/key/kernel",
        "encoder.layers.{}.attention.key.weight",
    ),
    (
        "attention/self/value/kernel",
        "encoder.layers.{}.attention.value.weight",
    ),
    (
        "attention/output/dense/kernel",
        "encoder.layers.{}.attention.output.weight",
    ),
    (
        "intermediate/dense/kernel",
        "encoder.layers.{}.ffn.intermediate.weight",
    ),
    ("output/dense/kernel", "encoder.layers.{}.ffn.output.weight"),
];

/// Look up a full checkpoint variable name in the global and pooler tables
///
/// Returns `None` if the name is not an exact match in either table;
/// layer-scoped resolution happens only after this fails.
#[must_use]
pub fn lookup_exact(name: &str) -> Option<Rule> {
    for &(source, target) in GLOBAL_TENSOR_MAP {
        if source == name {
            return Some(Rule {
                source,
                target,
                scope: RuleScope::Global,
                transform: Transform::Identity,
            });
        }
    }
    for &(source, target, transform) in POOLER_MAP {
        if source == name {
            return Some(Rule {
                source,
                target,
                scope: RuleScope::Global,
                transform,
            });
        }
    }
    None
}

/// Look up a post-index suffix in the two layer tables
#[must_use]
pub fn lookup_layer(suffix: &str) -> Option<Rule> {
    for &(source, target) in LAYER_TENSOR_MAP {
        if source == suffix {
            return Some(Rule {
                source,
                target,
                scope: RuleScope::Layer,
                transform: Transform::Identity,
            });
        }
    }
    for &(source, target) in LAYER_TRANSPOSE_MAP {
        if source == suffix {
            return Some(Rule {
                source,
                target,
                scope: RuleScope::Layer,
                transform: Transform::Transpose,
            });
        }
    }
    None
}

/// Substitute a layer index into a layer-scoped target template
#[must_use]
pub fn substitute_layer(template: &str, layer_index: usize) -> String {
    template.replacen("{}", &layer_index.to_string(), 1)
}

/// Iterate over every rule in the catalog, tagged with scope and transform
pub fn rules() -> impl Iterator<Item = Rule> {
    let globals = GLOBAL_TENSOR_MAP.iter().map(|&(source, target)| Rule {
        source,
        target,
        scope: RuleScope::Global,
        transform: Transform::Identity,
    });
    let pooler = POOLER_MAP.iter().map(|&(source, target, transform)| Rule {
        source,
        target,
        scope: RuleScope::Global,
        transform,
    });
    let layer_plain = LAYER_TENSOR_MAP.iter().map(|&(source, target)| Rule {
        source,
        target,
        scope: RuleScope::Layer,
        transform: Transform::Identity,
    });
    let layer_transpose = LAYER_TRANSPOSE_MAP.iter().map(|&(source, target)| Rule {
        source,
        target,
        scope: RuleScope::Layer,
        transform: Transform::Transpose,
    });
    globals.chain(pooler).chain(layer_plain).chain(layer_transpose)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_table_sizes_match_bert_base() {
        assert_eq!(GLOBAL_TENSOR_MAP.len(), 5);
        assert_eq!(POOLER_MAP.len(), 2);
        assert_eq!(LAYER_TENSOR_MAP.len(), 10);
        assert_eq!(LAYER_TRANSPOSE_MAP.len(), 6);
        assert_eq!(rules().count(), 23);
    }

    #[test]
    fn test_source_keys_disjoint_within_partition() {
        // Exact-name keys are unique across global + pooler
        let exact: HashSet<&str> = GLOBAL_TENSOR_MAP
            .iter()
            .map(|&(s, _)| s)
            .chain(POOLER_MAP.iter().map(|&(s, _, _)| s))
            .collect();
        assert_eq!(exact.len(), GLOBAL_TENSOR_MAP.len() + POOLER_MAP.len());

        // Suffix keys are unique across the two layer tables
        let suffixes: HashSet<&str> = LAYER_TENSOR_MAP
            .iter()
            .chain(LAYER_TRANSPOSE_MAP.iter())
            .map(|&(s, _)| s)
            .collect();
        assert_eq!(
            suffixes.len(),
            LAYER_TENSOR_MAP.len() + LAYER_TRANSPOSE_MAP.len()
        );
    }

    #[test]
    fn test_target_paths_unique() {
        let targets: HashSet<&str> = rules().map(|r| r.target).collect();
        assert_eq!(targets.len(), rules().count());
    }

    #[test]
    fn test_lookup_exact_finds_every_global_entry() {
        for &(source, target) in GLOBAL_TENSOR_MAP {
            let rule = lookup_exact(source).unwrap();
            assert_eq!(rule.target, target);
            assert_eq!(rule.transform, Transform::Identity);
            assert_eq!(rule.scope, RuleScope::Global);
        }
    }

    #[test]
    fn test_lookup_exact_pooler_transforms() {
        let kernel = lookup_exact("bert/pooler/dense/kernel").unwrap();
        assert_eq!(kernel.transform, Transform::Transpose);
        assert_eq!(kernel.target, "pooler.dense.weight");

        let bias = lookup_exact("bert/pooler/dense/bias").unwrap();
        assert_eq!(bias.transform, Transform::Identity);
        assert_eq!(bias.target, "pooler.dense.bias");
    }

    #[test]
    fn test_lookup_exact_rejects_layer_suffix() {
        assert!(lookup_exact("attention/self/query/kernel").is_none());
        assert!(lookup_exact("bert/encoder/layer_0/attention/self/query/kernel").is_none());
    }

    #[test]
    fn test_lookup_layer_transform_by_table() {
        for &(source, _) in LAYER_TENSOR_MAP {
            assert_eq!(
                lookup_layer(source).unwrap().transform,
                Transform::Identity
            );
        }
        for &(source, _) in LAYER_TRANSPOSE_MAP {
            assert_eq!(
                lookup_layer(source).unwrap().transform,
                Transform::Transpose
            );
        }
        assert!(lookup_layer("attention/self/query/weight").is_none());
    }

    #[test]
    fn test_layer_templates_have_exactly_one_placeholder() {
        for rule in rules().filter(|r| r.scope == RuleScope::Layer) {
            assert_eq!(rule.target.matches("{}").count(), 1, "{}", rule.target);
        }
        for rule in rules().filter(|r| r.scope == RuleScope::Global) {
            assert!(!rule.target.contains("{}"), "{}", rule.target);
        }
    }

    #[test]
    fn test_substitute_layer() {
        assert_eq!(
            substitute_layer("encoder.layers.{}.ffn.output.weight", 11),
            "encoder.layers.11.ffn.output.weight"
        );
    }
}
