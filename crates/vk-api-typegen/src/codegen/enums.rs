//! Enum classification: literal unions, lookup constants, standalone enums.

use crate::config::EnumStyle;
use crate::error::{CodegenError, Result};
use crate::node::{EnumSpec, EnumValue, SchemaNode};
use std::collections::HashSet;

use super::declaration::Declaration;
use super::names::{enum_key_name, interface_name};
use super::types::{EnumLookup, TypeContext, TypeExpr, join_union};

/// Display names of an enum, and whether the schema spelled them out
#[derive(Debug, Clone, PartialEq)]
pub struct EnumNames {
    pub names: Option<Vec<String>>,
    pub explicit: bool,
}

/// True when any value coerces to a non-zero number
pub fn is_numeric_like(values: &[EnumValue]) -> bool {
    values.iter().any(EnumValue::is_truthy_number)
}

/// Explicit `enumNames`, or the values themselves for non-numeric enums
pub fn resolve_names(spec: &EnumSpec) -> EnumNames {
    match &spec.names {
        Some(names) if !names.is_empty() => EnumNames {
            names: Some(names.clone()),
            explicit: true,
        },
        _ if !spec.values.is_empty() && !is_numeric_like(&spec.values) => EnumNames {
            names: Some(spec.values.iter().map(ToString::to_string).collect()),
            explicit: false,
        },
        _ => EnumNames {
            names: None,
            explicit: false,
        },
    }
}

/// Literal union of every value, in declaration order
pub fn literal_union(values: &[EnumValue]) -> String {
    let literals: Vec<String> = values.iter().map(EnumValue::ts_literal).collect();
    join_union(&literals)
}

/// Key/value pairs of a lookup table, keys made unique with a numeric suffix
fn lookup_entries(names: &[String], values: &[EnumValue]) -> Vec<(String, EnumValue)> {
    let mut seen = HashSet::new();

    names
        .iter()
        .zip(values)
        .map(|(name, value)| {
            let base = enum_key_name(name);
            let mut key = base.clone();
            let mut n = 2;
            while !seen.insert(key.clone()) {
                key = format!("{base}_{n}");
                n += 1;
            }
            (key, value.clone())
        })
        .collect()
}

fn ensure_values(node: &SchemaNode, spec: &EnumSpec) -> Result<()> {
    if spec.values.is_empty() {
        return Err(CodegenError::EmptyResult {
            name: node.name.clone(),
            what: "enum",
        });
    }
    Ok(())
}

/// Enum used in place: the expression is always the literal union, with a
/// lookup constant attached when the context asks for one
pub fn inline_enum(node: &SchemaNode, spec: &EnumSpec, ctx: &TypeContext) -> Result<TypeExpr> {
    ensure_values(node, spec)?;

    let EnumNames { names, explicit } = resolve_names(spec);
    let mut expr = TypeExpr::plain(literal_union(&spec.values));

    let Some(names) = names else {
        return Ok(expr);
    };

    if explicit {
        let lines: Vec<String> = names
            .iter()
            .zip(&spec.values)
            .map(|(name, value)| format!("`{value}` - {name}"))
            .collect();
        expr.description = Some(lines.join("\n"));
    }

    let wants_table = match ctx.enum_lookup {
        EnumLookup::Always => true,
        EnumLookup::Auto => explicit,
        EnumLookup::Never => false,
    };

    if wants_table {
        let table_name = match &ctx.parent_name {
            Some(parent) => format!("{parent} {} enumNames", node.name),
            None => node.name.clone(),
        };
        expr.declarations.push(
            Declaration::const_object(
                interface_name(&table_name),
                lookup_entries(&names, &spec.values),
            )
            .with_ref(table_name),
        );
    }

    Ok(expr)
}

/// Enum that is a definition of its own
pub fn standalone_enum(
    node: &SchemaNode,
    spec: &EnumSpec,
    style: EnumStyle,
) -> Result<Vec<Declaration>> {
    ensure_values(node, spec)?;

    let type_name = interface_name(&node.name);
    let names = resolve_names(spec).names;

    match (style, names) {
        (EnumStyle::Enum, Some(names)) => Ok(vec![
            Declaration::enumeration(type_name, lookup_entries(&names, &spec.values))
                .with_ref(&node.name)
                .with_description(node.description.clone()),
        ]),
        (EnumStyle::Union, Some(names)) => Ok(vec![
            Declaration::const_object(&type_name, lookup_entries(&names, &spec.values))
                .with_ref(&node.name),
            Declaration::type_alias(type_name, literal_union(&spec.values))
                .with_ref(&node.name)
                .with_description(node.description.clone()),
        ]),
        (_, None) => Ok(vec![
            Declaration::type_alias(type_name, literal_union(&spec.values))
                .with_ref(&node.name)
                .with_description(node.description.clone()),
        ]),
    }
}
