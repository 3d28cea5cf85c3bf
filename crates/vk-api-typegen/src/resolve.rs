//! `$ref` lookup and `allOf` flattening over a [`SchemaCorpus`].

use crate::corpus::SchemaCorpus;
use crate::error::{CodegenError, Result};
use crate::node::{NodeId, NodeKind, SchemaNode};
use std::collections::{BTreeSet, HashSet};

pub const BASE_BOOL_INT: &str = "base_bool_int";
pub const BASE_OK_RESPONSE: &str = "base_ok_response";
pub const BASE_PROPERTY_EXISTS: &str = "base_property_exists";

/// Well-known refs whose meaning is hard-coded instead of looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    /// Boolean sent as 0 or 1
    BoolInt,
    /// Method that always answers 1
    OkResponse,
    /// Property that is 1 when present
    PropertyExists,
}

impl Sentinel {
    pub fn from_ref(name: &str) -> Option<Self> {
        match name {
            BASE_BOOL_INT => Some(Self::BoolInt),
            BASE_OK_RESPONSE => Some(Self::OkResponse),
            BASE_PROPERTY_EXISTS => Some(Self::PropertyExists),
            _ => None,
        }
    }

    pub fn ts_type(self) -> &'static str {
        match self {
            Self::BoolInt => "0 | 1",
            Self::OkResponse | Self::PropertyExists => "1",
        }
    }
}

/// Properties of an object after `allOf` merging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedProperties {
    pub properties: Vec<NodeId>,
    pub required: BTreeSet<String>,
}

impl SchemaCorpus {
    /// Object definition by name
    pub fn object(&self, name: &str) -> Option<NodeId> {
        self.objects.get(name).copied()
    }

    /// Response definition by name, falling back to objects
    pub fn response(&self, name: &str) -> Option<NodeId> {
        self.responses
            .get(name)
            .or_else(|| self.objects.get(name))
            .copied()
    }

    /// Look a definition up in objects, then responses
    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.objects
            .get(name)
            .or_else(|| self.responses.get(name))
            .copied()
    }

    /// Resolve a `$ref` target, failing when neither dictionary has it
    pub fn resolve_ref(&self, name: &str, referenced_from: &str) -> Result<NodeId> {
        self.lookup(name)
            .ok_or_else(|| CodegenError::unresolved(name, referenced_from))
    }

    /// Concrete bases reachable from a node's `allOf`, in declaration order.
    ///
    /// Nested `allOf` chains are expanded in place. A `$ref` met a second
    /// time during one walk is skipped, which both breaks cycles and drops
    /// the repeated arm of a diamond. An intermediate `allOf` node that
    /// declares properties of its own is kept ahead of its bases.
    pub fn flatten_all_of(&self, node: &SchemaNode) -> Result<Vec<NodeId>> {
        let NodeKind::AllOf { bases, .. } = &node.kind else {
            return Ok(Vec::new());
        };

        let mut visited = HashSet::new();
        let mut flattened = Vec::new();
        self.collect_all_of(&node.name, bases, &mut visited, &mut flattened)?;
        Ok(flattened)
    }

    fn collect_all_of(
        &self,
        owner: &str,
        bases: &[NodeId],
        visited: &mut HashSet<String>,
        flattened: &mut Vec<NodeId>,
    ) -> Result<()> {
        for &base in bases {
            let mut id = base;

            if let Some(ref_name) = self.node(base).ref_name() {
                if !visited.insert(ref_name.to_string()) {
                    tracing::debug!("{owner}: allOf ref \"{ref_name}\" already expanded, skipping");
                    continue;
                }
                id = self.resolve_ref(ref_name, owner)?;
            }

            let resolved = self.node(id);
            match &resolved.kind {
                NodeKind::AllOf { bases, properties } => {
                    if !properties.is_empty() {
                        flattened.push(id);
                    }
                    self.collect_all_of(&resolved.name, bases, visited, flattened)?;
                }
                _ => flattened.push(id),
            }
        }

        Ok(())
    }

    /// Own properties followed by those of every flattened base.
    ///
    /// The first declaration of a property name wins; later ones are dropped
    /// whole. `required` is the union over the node and all bases. Nothing
    /// in the corpus is modified.
    pub fn merge_properties(&self, node: &SchemaNode) -> Result<MergedProperties> {
        let mut seen = HashSet::new();
        let mut properties = Vec::new();
        let mut required = node.required.clone();

        let mut take = |ids: &[NodeId]| {
            for &id in ids {
                if seen.insert(self.node(id).name.clone()) {
                    properties.push(id);
                }
            }
        };

        take(node.properties());

        for base in self.flatten_all_of(node)? {
            let base = self.node(base);
            take(base.properties());
            required.extend(base.required.iter().cloned());
        }

        Ok(MergedProperties {
            properties,
            required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{ErrorsDocument, SchemaInputs};
    use serde_json::{Value, json};

    fn corpus(objects: Value) -> SchemaCorpus {
        SchemaCorpus::from_inputs(SchemaInputs {
            methods: serde_json::from_value(json!({ "methods": [] })).expect("methods"),
            objects: serde_json::from_value(json!({ "definitions": objects })).expect("objects"),
            responses: serde_json::from_value(json!({ "definitions": {
                "ok_response": { "type": "integer" }
            } }))
            .expect("responses"),
            errors: ErrorsDocument::default(),
        })
        .expect("corpus")
    }

    fn names(corpus: &SchemaCorpus, ids: &[NodeId]) -> Vec<String> {
        ids.iter().map(|id| corpus.node(*id).name.clone()).collect()
    }

    #[test]
    fn test_resolve_ref_checks_both_dictionaries() {
        let corpus = corpus(json!({ "base_object": { "type": "object" } }));
        assert!(corpus.resolve_ref("base_object", "test").is_ok());
        assert!(corpus.resolve_ref("ok_response", "test").is_ok());

        let err = corpus.resolve_ref("base_objcet", "users_user").unwrap_err();
        assert!(matches!(
            err,
            CodegenError::UnresolvedReference { ref ref_name, ref referenced_from }
                if ref_name == "base_objcet" && referenced_from == "users_user"
        ));
    }

    #[test]
    fn test_merge_first_declaration_wins() {
        let corpus = corpus(json!({
            "base_a": {
                "type": "object",
                "required": ["x"],
                "properties": { "x": { "type": "string" } }
            },
            "base_b": {
                "type": "object",
                "required": ["y"],
                "properties": {
                    "x": { "type": "number" },
                    "y": { "type": "integer" }
                }
            },
            "merged": {
                "type": "object",
                "allOf": [
                    { "$ref": "objects.json#/definitions/base_a" },
                    { "$ref": "objects.json#/definitions/base_b" }
                ]
            }
        }));

        let merged_id = corpus.object("merged").expect("merged");
        let merged = corpus
            .merge_properties(corpus.node(merged_id))
            .expect("merge");

        assert_eq!(names(&corpus, &merged.properties), ["x", "y"]);
        let x = corpus.node(merged.properties[0]);
        assert_eq!(x.declared_type.as_deref(), Some("string"));
        assert_eq!(
            merged.required.iter().map(String::as_str).collect::<Vec<_>>(),
            ["x", "y"]
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let corpus = corpus(json!({
            "base": { "type": "object", "required": ["id"], "properties": { "id": { "type": "integer" } } },
            "child": {
                "type": "object",
                "required": ["name"],
                "allOf": [{ "$ref": "objects.json#/definitions/base" }],
                "properties": { "name": { "type": "string" } }
            }
        }));

        let child = corpus.node(corpus.object("child").expect("child"));
        let first = corpus.merge_properties(child).expect("first");
        let second = corpus.merge_properties(child).expect("second");
        assert_eq!(first, second);
        assert_eq!(names(&corpus, &first.properties), ["name", "id"]);

        let base = corpus.node(corpus.object("base").expect("base"));
        assert_eq!(base.required.len(), 1);
    }

    #[test]
    fn test_flatten_terminates_on_cycles() {
        let corpus = corpus(json!({
            "cycle_a": {
                "type": "object",
                "allOf": [
                    { "$ref": "objects.json#/definitions/cycle_b" },
                    { "properties": { "a": { "type": "string" } } }
                ]
            },
            "cycle_b": {
                "type": "object",
                "allOf": [
                    { "$ref": "objects.json#/definitions/cycle_a" },
                    { "properties": { "b": { "type": "string" } } }
                ]
            }
        }));

        let a = corpus.node(corpus.object("cycle_a").expect("a"));
        let flattened = corpus.flatten_all_of(a).expect("flatten");
        // cycle_a's inline arm reached through cycle_b, cycle_b's inline arm,
        // then cycle_a's inline arm again from the top-level walk
        assert_eq!(flattened.len(), 3);

        let merged = corpus.merge_properties(a).expect("merge");
        assert_eq!(names(&corpus, &merged.properties), ["a", "b"]);
    }

    #[test]
    fn test_flatten_skips_repeated_diamond_arm() {
        let corpus = corpus(json!({
            "base": { "type": "object", "properties": { "id": { "type": "integer" } } },
            "left": { "type": "object", "allOf": [{ "$ref": "objects.json#/definitions/base" }] },
            "right": { "type": "object", "allOf": [{ "$ref": "objects.json#/definitions/base" }] },
            "diamond": {
                "type": "object",
                "allOf": [
                    { "$ref": "objects.json#/definitions/left" },
                    { "$ref": "objects.json#/definitions/right" }
                ]
            }
        }));

        let diamond = corpus.node(corpus.object("diamond").expect("diamond"));
        let flattened = corpus.flatten_all_of(diamond).expect("flatten");
        assert_eq!(names(&corpus, &flattened), ["base"]);
    }

    #[test]
    fn test_flatten_reports_missing_base() {
        let corpus = corpus(json!({
            "broken": { "type": "object", "allOf": [{ "$ref": "objects.json#/definitions/missing" }] }
        }));
        let broken = corpus.node(corpus.object("broken").expect("broken"));
        assert!(matches!(
            corpus.flatten_all_of(broken),
            Err(CodegenError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn test_sentinels() {
        assert_eq!(Sentinel::from_ref("base_bool_int").map(Sentinel::ts_type), Some("0 | 1"));
        assert_eq!(Sentinel::from_ref("base_ok_response").map(Sentinel::ts_type), Some("1"));
        assert_eq!(Sentinel::from_ref("users_user"), None);
    }
}
