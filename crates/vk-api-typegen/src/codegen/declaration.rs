//! Declaration shapes and their TypeScript rendering.
//!
//! Generation decides *what* a declaration is; this module only turns a
//! decided [`Declaration`] into text.

use crate::error::{CodegenError, Result};
use crate::node::{EnumValue, is_pattern_property};

use super::names::needs_quotes;

/// Interface member
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub description: Option<String>,
    pub required: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            description: None,
            required,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }
}

/// Shape of a top-level declaration
#[derive(Debug, Clone, PartialEq)]
pub enum DeclarationKind {
    /// `export interface Name { .. }`
    Interface {
        fields: Vec<Field>,
        /// Render `{}` instead of an index signature when there are no fields
        allow_empty: bool,
    },
    /// `export type Name = value;`
    TypeAlias { value: String },
    /// `export enum Name { KEY = value, .. }`
    Enum { members: Vec<(String, EnumValue)> },
    /// `export const Name = { KEY: value, .. } as const;`
    ConstObject { entries: Vec<(String, EnumValue)> },
    /// `export const NAME = value;`
    Const { value: String },
    /// Free-standing doc comment
    Comment { lines: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    /// Schema name, written as a `// name` marker line
    pub ref_name: Option<String>,
    pub description: Option<String>,
    pub kind: DeclarationKind,
}

impl Declaration {
    fn new(name: impl Into<String>, kind: DeclarationKind) -> Self {
        Self {
            name: name.into(),
            ref_name: None,
            description: None,
            kind,
        }
    }

    pub fn interface(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self::new(
            name,
            DeclarationKind::Interface {
                fields,
                allow_empty: false,
            },
        )
    }

    pub fn type_alias(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(
            name,
            DeclarationKind::TypeAlias {
                value: value.into(),
            },
        )
    }

    pub fn enumeration(name: impl Into<String>, members: Vec<(String, EnumValue)>) -> Self {
        Self::new(name, DeclarationKind::Enum { members })
    }

    pub fn const_object(name: impl Into<String>, entries: Vec<(String, EnumValue)>) -> Self {
        Self::new(name, DeclarationKind::ConstObject { entries })
    }

    pub fn constant(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(
            name,
            DeclarationKind::Const {
                value: value.into(),
            },
        )
    }

    pub fn comment(lines: Vec<String>) -> Self {
        Self::new(String::new(), DeclarationKind::Comment { lines })
    }

    pub fn with_ref(mut self, ref_name: impl Into<String>) -> Self {
        self.ref_name = Some(ref_name.into());
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    /// Allow an interface without fields to render as `{}`
    pub fn allow_empty(mut self) -> Self {
        if let DeclarationKind::Interface { allow_empty, .. } = &mut self.kind {
            *allow_empty = true;
        }
        self
    }

    /// Name this declaration contributes to its unit's exports
    pub fn exported_name(&self) -> Option<&str> {
        match self.kind {
            DeclarationKind::Comment { .. } => None,
            _ => Some(&self.name),
        }
    }

    /// Render to TypeScript source, without a trailing newline
    pub fn render(&self) -> Result<String> {
        let mut out = String::new();

        if let Some(description) = &self.description {
            out.push_str(&doc_block(description, ""));
        }
        if let Some(ref_name) = &self.ref_name {
            out.push_str(&format!("// {ref_name}\n"));
        }

        let name = &self.name;
        match &self.kind {
            DeclarationKind::Interface {
                fields,
                allow_empty,
            } => {
                if fields.is_empty() && *allow_empty {
                    out.push_str(&format!("export interface {name} {{}}"));
                } else if fields.is_empty() {
                    out.push_str(&format!(
                        "export interface {name} {{\n  // empty interface\n  [key: string]: any;\n}}"
                    ));
                } else {
                    out.push_str(&format!("export interface {name} {{\n"));
                    out.push_str(&render_fields(fields));
                    out.push('}');
                }
            }
            DeclarationKind::TypeAlias { value } => {
                if value.trim().is_empty() {
                    return Err(CodegenError::EmptyResult {
                        name: name.clone(),
                        what: "type expression",
                    });
                }
                out.push_str(&format!("export type {name} = {value};"));
            }
            DeclarationKind::Enum { members } => {
                let quote = quote_char(members.iter().map(|(key, _)| key.as_str()));
                out.push_str(&format!("export enum {name} {{\n"));
                for (key, value) in members {
                    out.push_str(&format!("  {quote}{key}{quote} = {},\n", value.ts_literal()));
                }
                out.push('}');
            }
            DeclarationKind::ConstObject { entries } => {
                let quote = quote_char(entries.iter().map(|(key, _)| key.as_str()));
                out.push_str(&format!("export const {name} = {{\n"));
                for (key, value) in entries {
                    out.push_str(&format!("  {quote}{key}{quote}: {},\n", value.ts_literal()));
                }
                out.push_str("} as const;");
            }
            DeclarationKind::Const { value } => {
                if value.trim().is_empty() {
                    return Err(CodegenError::EmptyResult {
                        name: name.clone(),
                        what: "constant value",
                    });
                }
                out.push_str(&format!("export const {name} = {value};"));
            }
            DeclarationKind::Comment { lines } => {
                out.push_str("/**\n");
                for line in lines {
                    out.push_str(&comment_line(line, ""));
                }
                out.push_str(" */");
            }
        }

        Ok(out)
    }
}

/// Quote every key of a declaration when at least one of them needs it
fn quote_char<'a>(mut keys: impl Iterator<Item = &'a str>) -> &'static str {
    if keys.any(|key| !is_pattern_property(key) && needs_quotes(key)) {
        "'"
    } else {
        ""
    }
}

fn render_fields(fields: &[Field]) -> String {
    let quote = quote_char(fields.iter().map(|f| f.name.as_str()));
    let mut out = String::new();

    for field in fields {
        if let Some(description) = &field.description {
            out.push_str(&doc_block(description, "  "));
        }

        let q = if is_pattern_property(&field.name) {
            ""
        } else {
            quote
        };
        let divider = if field.required { ":" } else { "?:" };
        out.push_str(&format!("  {q}{}{q}{divider} {};\n", field.name, field.value));
    }

    out
}

/// `/** .. */` block with surrounding blank lines of `text` dropped
fn doc_block(text: &str, indent: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());

    let (Some(start), Some(end)) = (start, end) else {
        return String::new();
    };

    let mut out = format!("{indent}/**\n");
    for line in &lines[start..=end] {
        out.push_str(&comment_line(line, indent));
    }
    out.push_str(&format!("{indent} */\n"));
    out
}

fn comment_line(line: &str, indent: &str) -> String {
    // `*/` inside a description would close the comment early
    let line = line.trim_end().replace("*/", "*\\/");
    if line.is_empty() {
        format!("{indent} *\n")
    } else {
        format!("{indent} * {line}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_interface_with_docs() {
        let decl = Declaration::interface(
            "UsersUserMin",
            vec![
                Field::new("id", "number", true).with_description(Some("User ID".into())),
                Field::new("deactivated", "string", false),
            ],
        )
        .with_ref("users_user_min")
        .with_description(Some("Short user info\n".into()));

        assert_eq!(
            decl.render().expect("render"),
            "/**\n * Short user info\n */\n// users_user_min\nexport interface UsersUserMin {\n  /**\n   * User ID\n   */\n  id: number;\n  deactivated?: string;\n}"
        );
    }

    #[test]
    fn test_render_quotes_all_fields_together() {
        let decl = Declaration::interface(
            "Counters",
            vec![
                Field::new("user-id", "number", true),
                Field::new("albums", "number", false),
                Field::new("[key: string]", "number", true),
            ],
        );

        assert_eq!(
            decl.render().expect("render"),
            "export interface Counters {\n  'user-id': number;\n  'albums'?: number;\n  [key: string]: number;\n}"
        );
    }

    #[test]
    fn test_render_empty_interfaces() {
        let strict = Declaration::interface("BaseEmpty", Vec::new());
        assert_eq!(
            strict.render().expect("render"),
            "export interface BaseEmpty {\n  // empty interface\n  [key: string]: any;\n}"
        );

        let params = Declaration::interface("AccountGetInfoParams", Vec::new()).allow_empty();
        assert_eq!(
            params.render().expect("render"),
            "export interface AccountGetInfoParams {}"
        );
    }

    #[test]
    fn test_render_empty_type_alias_fails() {
        let err = Declaration::type_alias("Broken", "  ").render().unwrap_err();
        assert!(matches!(err, CodegenError::EmptyResult { ref name, .. } if name == "Broken"));
    }

    #[test]
    fn test_render_const_object_and_enum() {
        let entries = vec![
            ("MALE".to_string(), EnumValue::String("male".into())),
            ("FEMALE".to_string(), EnumValue::String("female".into())),
        ];

        assert_eq!(
            Declaration::const_object("UsersSex", entries.clone())
                .render()
                .expect("render"),
            "export const UsersSex = {\n  MALE: 'male',\n  FEMALE: 'female',\n} as const;"
        );
        assert_eq!(
            Declaration::enumeration("UsersSex", entries)
                .render()
                .expect("render"),
            "export enum UsersSex {\n  MALE = 'male',\n  FEMALE = 'female',\n}"
        );
    }

    #[test]
    fn test_render_comment_and_const() {
        let comment = Declaration::comment(vec![
            "users.get".into(),
            String::new(),
            "Returns detailed information on users.".into(),
        ]);
        assert_eq!(
            comment.render().expect("render"),
            "/**\n * users.get\n *\n * Returns detailed information on users.\n */"
        );
        assert_eq!(comment.exported_name(), None);

        let constant = Declaration::constant("API_ERROR_UNKNOWN", "1")
            .with_description(Some("Unknown error occurred\n\n".into()));
        assert_eq!(
            constant.render().expect("render"),
            "/**\n * Unknown error occurred\n */\nexport const API_ERROR_UNKNOWN = 1;"
        );
    }
}
