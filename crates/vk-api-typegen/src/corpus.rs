use crate::codegen::names::interface_name;
use crate::error::{CodegenError, Result};
use crate::graph::{Dependencies, RefMark};
use crate::node::{NodeArena, NodeId, SchemaNode, ref_to_name};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// `methods.json`
#[derive(Debug, Clone, Deserialize)]
pub struct MethodsDocument {
    pub version: Option<String>,
    #[serde(default)]
    pub methods: Vec<MethodDefinition>,
}

/// A single method as declared in `methods.json`
#[derive(Debug, Clone, Deserialize)]
pub struct MethodDefinition {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub access_token_type: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<Value>,
    #[serde(default)]
    pub responses: Value,
    #[serde(default)]
    pub errors: Vec<Value>,
    #[serde(default, rename = "emptyResponse")]
    pub empty_response: bool,
}

/// `objects.json` and `responses.json`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefinitionsDocument {
    #[serde(default)]
    pub definitions: Map<String, Value>,
}

/// `errors.json`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorsDocument {
    #[serde(default)]
    pub errors: BTreeMap<String, ErrorDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDefinition {
    pub code: i64,
    pub description: String,
    #[serde(rename = "$comment")]
    pub comment: Option<String>,
    #[serde(default)]
    pub subcodes: Vec<ErrorSubcode>,
    #[serde(default)]
    pub global: bool,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorSubcode {
    pub subcode: Option<i64>,
    pub description: Option<String>,
    #[serde(rename = "$comment")]
    pub comment: Option<String>,
}

/// The raw input documents of one generation run
#[derive(Debug, Clone)]
pub struct SchemaInputs {
    pub methods: MethodsDocument,
    pub objects: DefinitionsDocument,
    pub responses: DefinitionsDocument,
    pub errors: ErrorsDocument,
}

impl SchemaInputs {
    /// Read `methods.json`, `objects.json`, `responses.json` and, when
    /// present, `errors.json` from a schema directory
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();

        let methods: MethodsDocument = load_document(&dir.join("methods.json"))?;
        if methods.methods.is_empty() {
            return Err(CodegenError::EmptyDocument {
                path: dir.join("methods.json"),
            });
        }

        let objects: DefinitionsDocument = load_document(&dir.join("objects.json"))?;
        if objects.definitions.is_empty() {
            return Err(CodegenError::EmptyDocument {
                path: dir.join("objects.json"),
            });
        }

        let responses: DefinitionsDocument = load_document(&dir.join("responses.json"))?;
        if responses.definitions.is_empty() {
            return Err(CodegenError::EmptyDocument {
                path: dir.join("responses.json"),
            });
        }

        let errors_path = dir.join("errors.json");
        let errors = if errors_path.exists() {
            load_document(&errors_path)?
        } else {
            ErrorsDocument::default()
        };

        Ok(Self {
            methods,
            objects,
            responses,
            errors,
        })
    }
}

fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| CodegenError::parse_error_with_source(e, path, content))
}

/// A method after normalization, with its fragments parsed into the arena
#[derive(Debug, Clone)]
pub struct MethodSchema {
    pub name: String,
    pub description: Option<String>,
    pub parameters: Vec<NodeId>,
    /// Definitions referenced by parameter `items`; generated, never imported
    pub parameter_refs: Dependencies,
    /// Response slot name and its node, named `{method}_{slot}`
    pub responses: Vec<(String, NodeId)>,
}

/// Every parsed definition of one generation run
#[derive(Debug, Clone)]
pub struct SchemaCorpus {
    pub(crate) arena: NodeArena,
    pub(crate) objects: BTreeMap<String, NodeId>,
    pub(crate) responses: BTreeMap<String, NodeId>,
    methods: Vec<MethodSchema>,
    errors: BTreeMap<String, ErrorDefinition>,
    version: Option<String>,
}

impl SchemaCorpus {
    /// Load and parse a schema directory
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::from_inputs(SchemaInputs::load_from_dir(dir)?)
    }

    /// Parse all input documents.
    ///
    /// The corpus is read-only once built.
    pub fn from_inputs(inputs: SchemaInputs) -> Result<Self> {
        let mut arena = NodeArena::new();

        let objects = parse_definitions(&mut arena, &inputs.objects)?;
        let responses = parse_definitions(&mut arena, &inputs.responses)?;
        let methods = inputs
            .methods
            .methods
            .iter()
            .map(|method| parse_method(&mut arena, method))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            arena,
            objects,
            responses,
            methods,
            errors: inputs.errors.errors,
            version: inputs.methods.version,
        })
    }

    pub fn node(&self, id: NodeId) -> &SchemaNode {
        self.arena.get(id)
    }

    pub fn methods(&self) -> &[MethodSchema] {
        &self.methods
    }

    pub fn errors(&self) -> &BTreeMap<String, ErrorDefinition> {
        &self.errors
    }

    /// API version declared in `methods.json`
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Iterate over object definitions by name
    pub fn objects(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.objects
            .iter()
            .map(|(name, id)| (name.as_str(), self.arena.get(*id)))
    }

    /// Iterate over response definitions by name
    pub fn responses(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.responses
            .iter()
            .map(|(name, id)| (name.as_str(), self.arena.get(*id)))
    }
}

fn parse_definitions(
    arena: &mut NodeArena,
    document: &DefinitionsDocument,
) -> Result<BTreeMap<String, NodeId>> {
    document
        .definitions
        .iter()
        .map(|(name, raw)| Ok((name.clone(), arena.parse(raw, name, None)?)))
        .collect()
}

fn parse_method(arena: &mut NodeArena, method: &MethodDefinition) -> Result<MethodSchema> {
    let mut parameter_refs = Dependencies::new();
    let mut parameters = Vec::with_capacity(method.parameters.len());

    for raw in &method.parameters {
        let (name, normalized) = normalize_parameter(raw, &method.name, &mut parameter_refs)?;
        parameters.push(arena.parse(&normalized, &name, None)?);
    }

    let responses = match &method.responses {
        Value::Object(slots) if !slots.is_empty() => slots,
        Value::Object(_) => {
            return Err(CodegenError::malformed(
                &method.name,
                "\"responses\" field is empty",
            ));
        }
        _ => {
            return Err(CodegenError::malformed(
                &method.name,
                "\"responses\" field is not an object",
            ));
        }
    };

    let responses = responses
        .iter()
        .map(|(slot, raw)| {
            let name = format!("{}_{}", method.name, slot);
            Ok((slot.clone(), arena.parse(raw, &name, None)?))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(MethodSchema {
        name: method.name.clone(),
        description: method.description.clone(),
        parameters,
        parameter_refs,
        responses,
    })
}

/// Patch a raw parameter for how the API actually transports it.
///
/// Booleans travel as 0/1 and arrays as comma separated strings. Refs found
/// in `items` are recorded so their definitions still get generated.
fn normalize_parameter(
    raw: &Value,
    method: &str,
    parameter_refs: &mut Dependencies,
) -> Result<(String, Value)> {
    let mut parameter = raw
        .as_object()
        .cloned()
        .ok_or_else(|| CodegenError::malformed(method, "parameter is not an object"))?;

    let name = parameter
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| CodegenError::malformed(method, "parameter has no name"))?
        .to_string();

    match parameter.get("type").and_then(Value::as_str) {
        Some("boolean") => {
            parameter.remove("type");
            parameter.insert("$ref".into(), Value::from(crate::resolve::BASE_BOOL_INT));
        }
        Some("array") => {
            parameter.insert("type".into(), Value::from("string"));
        }
        _ => {}
    }

    let items_ref = parameter
        .get("items")
        .and_then(|items| items.get("$ref"))
        .and_then(Value::as_str)
        .map(str::to_string);

    if let Some(reference) = items_ref {
        let ref_name = ref_to_name(&reference);
        parameter_refs.mark(ref_name, RefMark::GenerateOnly);

        let see = format!("@see {} ({})", interface_name(ref_name), reference);
        let description = match parameter.get("description").and_then(Value::as_str) {
            Some(text) if !text.trim().is_empty() => format!("{text}\n\n{see}"),
            _ => see,
        };
        parameter.insert("description".into(), Value::from(description));
    }

    Ok((name, Value::Object(parameter)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use serde_json::json;

    fn inputs(methods: Value, objects: Value, responses: Value) -> SchemaInputs {
        SchemaInputs {
            methods: serde_json::from_value(methods).expect("methods"),
            objects: serde_json::from_value(objects).expect("objects"),
            responses: serde_json::from_value(responses).expect("responses"),
            errors: ErrorsDocument::default(),
        }
    }

    #[test]
    fn test_parameter_normalization() {
        let corpus = SchemaCorpus::from_inputs(inputs(
            json!({ "methods": [{
                "name": "users.get",
                "parameters": [
                    { "name": "extended", "type": "boolean" },
                    {
                        "name": "fields",
                        "type": "array",
                        "items": { "$ref": "../objects.json#/definitions/users_fields" }
                    }
                ],
                "responses": { "response": { "$ref": "responses.json#/definitions/users_get_response" } }
            }]}),
            json!({ "definitions": { "users_fields": { "type": "string", "enum": ["photo_50"] } } }),
            json!({ "definitions": { "users_get_response": { "type": "object" } } }),
        ))
        .expect("corpus");

        let method = &corpus.methods()[0];
        let extended = corpus.node(method.parameters[0]);
        assert_eq!(extended.ref_name(), Some("base_bool_int"));

        let fields = corpus.node(method.parameters[1]);
        assert!(matches!(fields.kind, NodeKind::Primitive(_)));
        assert_eq!(fields.declared_type.as_deref(), Some("string"));
        assert_eq!(
            fields.description.as_deref(),
            Some("@see UsersFields (../objects.json#/definitions/users_fields)")
        );
        assert_eq!(
            method.parameter_refs.get("users_fields"),
            Some(RefMark::GenerateOnly)
        );

        assert_eq!(method.responses[0].0, "response");
        assert_eq!(
            corpus.node(method.responses[0].1).name,
            "users.get_response"
        );
    }

    #[test]
    fn test_empty_responses_are_malformed() {
        let err = SchemaCorpus::from_inputs(inputs(
            json!({ "methods": [{ "name": "users.get", "responses": {} }] }),
            json!({ "definitions": {} }),
            json!({ "definitions": {} }),
        ))
        .unwrap_err();

        assert!(matches!(err, CodegenError::MalformedNode { ref name, .. } if name == "users.get"));
    }

    #[test]
    fn test_load_from_dir_reports_parse_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("methods.json"), "{ \"methods\": [").expect("write");

        let err = SchemaInputs::load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, CodegenError::ParseError { .. }));
    }

    #[test]
    fn test_load_from_dir_rejects_empty_documents() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("methods.json"), "{ \"methods\": [] }").expect("write");

        let err = SchemaInputs::load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, CodegenError::EmptyDocument { .. }));
    }
}
