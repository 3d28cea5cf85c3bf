use crate::error::{CodegenError, Result};
use crate::graph::{OutputKind, import_statements};
use crate::node::{NodeKind, SchemaNode};
use std::path::PathBuf;

use super::declaration::{Declaration, Field};
use super::enums::standalone_enum;
use super::names::{interface_name, object_section};
use super::types::{EnumLookup, TypeContext};
use super::{Emitted, GenerationRun, TypingsGenerator, join_descriptions};

impl<'c> TypingsGenerator<'c> {
    /// Generate every queued object, including those discovered on the way
    pub(super) fn generate_discovered_objects(&self, run: &mut GenerationRun) -> Result<()> {
        while let Some(name) = run.queue.next_pending() {
            let Some(id) = self.corpus.lookup(&name) else {
                tracing::info!("\"{name}\" ref is not found, skipping");
                continue;
            };
            self.generate_object(run, &name, self.corpus.node(id))?;
        }
        Ok(())
    }

    /// Write `objects/{section}/{Name}.ts` for one definition
    fn generate_object(&self, run: &mut GenerationRun, name: &str, node: &SchemaNode) -> Result<()> {
        let mut emitted = self.object_declarations(node)?;
        emitted.dependencies.remove(name);

        let section = object_section(name);
        let type_name = interface_name(name);
        let imports = import_statements(&emitted.dependencies, Some(section), OutputKind::Object);

        run.add_unit(
            PathBuf::from("objects")
                .join(section)
                .join(format!("{type_name}.ts")),
            &format!("./objects/{section}/{type_name}"),
            &imports,
            &emitted.declarations,
        )?;
        run.queue.enqueue(&emitted.dependencies);

        tracing::debug!("generated object {name}");
        Ok(())
    }

    fn object_declarations(&self, node: &SchemaNode) -> Result<Emitted> {
        let ctx = TypeContext::new(EnumLookup::Always);

        match (&node.kind, &node.enumeration) {
            (NodeKind::Ref(_) | NodeKind::OneOf(_) | NodeKind::Array(_), _) => {
                self.type_alias_of(node, &ctx)
            }
            (NodeKind::Primitive(_) | NodeKind::Primitives(_) | NodeKind::Untyped, Some(spec)) => {
                Ok(standalone_enum(node, spec, self.options.enum_style)?.into())
            }
            (NodeKind::Primitive(_) | NodeKind::Primitives(_), None) => {
                self.type_alias_of(node, &ctx)
            }
            (NodeKind::Object(_) | NodeKind::AllOf { .. }, _) => self.interface_of(node),
            (NodeKind::Untyped, None) => Err(CodegenError::unknown_type(
                &node.name,
                node.declared_type.as_deref(),
            )),
        }
    }

    /// Interface over the merged properties of an object or `allOf` node.
    ///
    /// Enum lookup tables of the properties are emitted ahead of the
    /// interface and named after it.
    pub(super) fn interface_of(&self, node: &SchemaNode) -> Result<Emitted> {
        let merged = self.corpus.merge_properties(node)?;
        let ctx = TypeContext::new(EnumLookup::Always).with_parent(&node.name);

        let mut emitted = Emitted::default();
        let mut fields = Vec::with_capacity(merged.properties.len());

        for id in merged.properties {
            let property = self.corpus.node(id);
            let expr = self.type_of(property, &ctx)?;

            let required = property.is_pattern_property()
                || property.required_flag
                || merged.required.contains(&property.name);

            fields.push(
                Field::new(&property.name, expr.expression, required).with_description(
                    join_descriptions(
                        [property.description.as_deref(), expr.description.as_deref()],
                        "\n\n",
                    ),
                ),
            );
            emitted.declarations.extend(expr.declarations);
            emitted.dependencies.merge(&expr.dependencies);
        }

        emitted.declarations.push(
            Declaration::interface(interface_name(&node.name), fields)
                .with_ref(&node.name)
                .with_description(node.description.clone()),
        );
        Ok(emitted)
    }

    /// `export type Name = ..;` for any node [`TypingsGenerator::type_of`] handles
    pub(super) fn type_alias_of(&self, node: &SchemaNode, ctx: &TypeContext) -> Result<Emitted> {
        let expr = self.type_of(node, ctx)?;
        let description = join_descriptions(
            [node.description.as_deref(), expr.description.as_deref()],
            "\n\n",
        );

        let mut emitted = Emitted {
            declarations: expr.declarations,
            dependencies: expr.dependencies,
        };
        emitted.declarations.push(
            Declaration::type_alias(interface_name(&node.name), expr.expression)
                .with_ref(&node.name)
                .with_description(description),
        );
        Ok(emitted)
    }
}

#[cfg(test)]
mod tests {
    use crate::codegen::TypingsGenerator;
    use crate::config::{EnumStyle, GeneratorOptions};
    use crate::corpus::{ErrorsDocument, SchemaCorpus, SchemaInputs};
    use crate::graph::RefMark;
    use serde_json::{Value, json};

    fn corpus(objects: Value) -> SchemaCorpus {
        SchemaCorpus::from_inputs(SchemaInputs {
            methods: serde_json::from_value(json!({ "methods": [] })).expect("methods"),
            objects: serde_json::from_value(json!({ "definitions": objects })).expect("objects"),
            responses: serde_json::from_value(json!({ "definitions": {} })).expect("responses"),
            errors: ErrorsDocument::default(),
        })
        .expect("corpus")
    }

    fn rendered(corpus: &SchemaCorpus, options: &GeneratorOptions, name: &str) -> Vec<String> {
        let generator = TypingsGenerator::new(corpus, options);
        let node = corpus.node(corpus.object(name).expect("object"));
        generator
            .object_declarations(node)
            .expect("declarations")
            .declarations
            .iter()
            .map(|d| d.render().expect("render"))
            .collect()
    }

    fn objects() -> SchemaCorpus {
        corpus(json!({
            "base_object": {
                "type": "object",
                "required": ["id"],
                "properties": {
                    "id": { "type": "integer", "description": "Object ID" },
                    "title": { "type": "string" }
                }
            },
            "groups_group": {
                "type": "object",
                "allOf": [{ "$ref": "objects.json#/definitions/base_object" }],
                "required": ["is_closed"],
                "properties": {
                    "is_closed": {
                        "type": "integer",
                        "enum": [0, 1, 2],
                        "enumNames": ["open", "closed", "private"]
                    }
                },
                "patternProperties": { "^[0-9]+$": { "type": "integer" } }
            },
            "groups_role": { "type": "string", "enum": ["moderator", "editor"] },
            "groups_ids": { "type": "array", "items": { "type": "integer" } },
            "groups_empty": { "type": "object" },
            "groups_weird": { "description": "no type at all" }
        }))
    }

    #[test]
    fn test_interface_with_merged_base() {
        let corpus = objects();
        let options = GeneratorOptions::default();
        let blocks = rendered(&corpus, &options, "groups_group");

        assert_eq!(
            blocks[0],
            "// groups_group is_closed enumNames\nexport const GroupsGroupIsClosedEnumNames = {\n  OPEN: 0,\n  CLOSED: 1,\n  PRIVATE: 2,\n} as const;"
        );
        assert_eq!(
            blocks[1],
            "// groups_group\nexport interface GroupsGroup {\n  /**\n   * `0` - open\n   * `1` - closed\n   * `2` - private\n   */\n  is_closed: 0 | 1 | 2;\n  [key: number]: number;\n  /**\n   * Object ID\n   */\n  id: number;\n  title?: string;\n}"
        );
    }

    #[test]
    fn test_interface_dependencies() {
        let corpus = corpus(json!({
            "base_image": { "type": "object", "properties": { "url": { "type": "string" } } },
            "users_user": {
                "type": "object",
                "properties": {
                    "photo": { "$ref": "objects.json#/definitions/base_image" },
                    "crop": { "type": "array", "items": { "$ref": "objects.json#/definitions/base_image" } }
                }
            }
        }));
        let options = GeneratorOptions::default();
        let generator = TypingsGenerator::new(&corpus, &options);
        let emitted = generator
            .object_declarations(corpus.node(corpus.object("users_user").expect("user")))
            .expect("declarations");

        assert_eq!(
            emitted.dependencies.get("base_image"),
            Some(RefMark::GenerateAndImport)
        );
        assert_eq!(emitted.dependencies.len(), 1);
    }

    #[test]
    fn test_standalone_enum_follows_style() {
        let corpus = objects();

        let union = rendered(&corpus, &GeneratorOptions::default(), "groups_role");
        assert_eq!(
            union,
            [
                "// groups_role\nexport const GroupsRole = {\n  MODERATOR: 'moderator',\n  EDITOR: 'editor',\n} as const;",
                "// groups_role\nexport type GroupsRole = 'moderator' | 'editor';",
            ]
        );

        let options = GeneratorOptions {
            enum_style: EnumStyle::Enum,
            ..GeneratorOptions::default()
        };
        assert_eq!(
            rendered(&corpus, &options, "groups_role"),
            ["// groups_role\nexport enum GroupsRole {\n  MODERATOR = 'moderator',\n  EDITOR = 'editor',\n}"]
        );
    }

    #[test]
    fn test_aliases_and_empty_objects() {
        let corpus = objects();
        let options = GeneratorOptions::default();

        assert_eq!(
            rendered(&corpus, &options, "groups_ids"),
            ["// groups_ids\nexport type GroupsIds = number[];"]
        );
        assert_eq!(
            rendered(&corpus, &options, "groups_empty"),
            ["// groups_empty\nexport interface GroupsEmpty {\n  // empty interface\n  [key: string]: any;\n}"]
        );
    }

    #[test]
    fn test_untyped_object_is_unknown() {
        let corpus = objects();
        let options = GeneratorOptions::default();
        let generator = TypingsGenerator::new(&corpus, &options);
        let node = corpus.node(corpus.object("groups_weird").expect("weird"));

        assert!(matches!(
            generator.object_declarations(node),
            Err(crate::error::CodegenError::UnknownType { ref name, .. }) if name == "groups_weird"
        ));
    }
}
