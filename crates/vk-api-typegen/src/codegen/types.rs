use crate::error::{CodegenError, Result};
use crate::graph::{Dependencies, RefMark};
use crate::node::{NodeKind, Primitive, SchemaNode};
use crate::resolve::Sentinel;

use super::TypingsGenerator;
use super::declaration::Declaration;
use super::enums::inline_enum;
use super::names::interface_name;

/// Type expression of a node, plus what it needs to be valid
#[derive(Debug, Clone, Default)]
pub struct TypeExpr {
    pub expression: String,
    pub dependencies: Dependencies,
    /// Auxiliary declarations (enum lookup tables) emitted next to the user
    pub declarations: Vec<Declaration>,
    /// Extra commentary for the field or alias using this expression
    pub description: Option<String>,
}

impl TypeExpr {
    pub fn plain(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            ..Self::default()
        }
    }

    fn imported(ref_name: &str) -> Self {
        let mut expr = Self::plain(interface_name(ref_name));
        expr.dependencies.mark(ref_name, RefMark::GenerateAndImport);
        expr
    }
}

/// When an enum with display names gets a constant lookup table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumLookup {
    /// Only for explicit `enumNames`
    #[default]
    Auto,
    /// Also for names derived from non-numeric values
    Always,
    /// Never, the literal union only
    Never,
}

/// Naming scope and policy for one [`TypingsGenerator::type_of`] walk
#[derive(Debug, Clone, Default)]
pub struct TypeContext {
    pub parent_name: Option<String>,
    pub enum_lookup: EnumLookup,
    /// Refs whose `oneOf` is currently being inlined
    inlining: Vec<String>,
}

impl TypeContext {
    pub fn new(enum_lookup: EnumLookup) -> Self {
        Self {
            enum_lookup,
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent_name: impl Into<String>) -> Self {
        self.parent_name = Some(parent_name.into());
        self
    }

    fn scoped(&self, parent_name: Option<&str>) -> Self {
        Self {
            parent_name: parent_name.map(str::to_string),
            ..self.clone()
        }
    }
}

impl<'c> TypingsGenerator<'c> {
    /// Type expression for `node`.
    ///
    /// Rules are tried in order: `oneOf`, array, `$ref`, declared type. A
    /// node matching none of them is an [`CodegenError::UnknownType`].
    pub(super) fn type_of(&self, node: &SchemaNode, ctx: &TypeContext) -> Result<TypeExpr> {
        match &node.kind {
            NodeKind::OneOf(alternatives) => {
                let nodes: Vec<_> = alternatives.iter().map(|id| self.corpus.node(*id)).collect();
                self.union_of(&nodes, ctx)
            }
            NodeKind::Array(_) => self.array_type(node, ctx),
            NodeKind::Ref(ref_name) => self.ref_type(node, ref_name, ctx),
            _ => self.base_type(node, ctx),
        }
    }

    fn union_of(&self, alternatives: &[&SchemaNode], ctx: &TypeContext) -> Result<TypeExpr> {
        let mut union = TypeExpr::default();
        let mut expressions = Vec::with_capacity(alternatives.len());

        for alternative in alternatives {
            let expr = self.type_of(alternative, ctx)?;
            union.dependencies.merge(&expr.dependencies);
            union.declarations.extend(expr.declarations);
            expressions.push(expr.expression);
        }

        union.expression = join_union(&expressions);
        Ok(union)
    }

    fn array_type(&self, node: &SchemaNode, ctx: &TypeContext) -> Result<TypeExpr> {
        let mut depth = 0;
        let mut item = node;
        while let NodeKind::Array(inner) = &item.kind {
            depth += 1;
            item = self.corpus.node(*inner);
        }

        if let Some(ref_name) = item.ref_name() {
            self.corpus.resolve_ref(ref_name, &node.name)?;
            let mut expr = TypeExpr::imported(ref_name);
            expr.expression = format_array_depth(&expr.expression, depth);
            return Ok(expr);
        }

        // Enum tables of array items are named after the enclosing declaration.
        // A nested array renamed out of its arena scope stands in for it.
        let scope = ctx
            .parent_name
            .as_deref()
            .or(node.parent_name.as_ref().map(|_| node.name.as_str()));
        let mut expr = self.type_of(item, &ctx.scoped(scope))?;
        expr.expression = format_array_depth(&expr.expression, depth);
        Ok(expr)
    }

    fn ref_type(&self, node: &SchemaNode, ref_name: &str, ctx: &TypeContext) -> Result<TypeExpr> {
        if let Some(sentinel) = Sentinel::from_ref(ref_name) {
            return Ok(TypeExpr::plain(sentinel.ts_type()));
        }

        let target = self.corpus.node(self.corpus.resolve_ref(ref_name, &node.name)?);

        if target.enumeration.is_some() {
            return Ok(TypeExpr::imported(ref_name));
        }

        match &target.kind {
            NodeKind::OneOf(alternatives) if !ctx.inlining.iter().any(|r| r == ref_name) => {
                let mut inner = ctx.clone();
                inner.inlining.push(ref_name.to_string());
                let nodes: Vec<_> = alternatives.iter().map(|id| self.corpus.node(*id)).collect();
                self.union_of(&nodes, &inner)
            }
            NodeKind::Primitive(primitive) if primitive.is_scalar() => {
                Ok(TypeExpr::plain(primitive.ts_type()))
            }
            _ => Ok(TypeExpr::imported(ref_name)),
        }
    }

    /// Declared type of a leaf, with the enum classifier taking precedence
    fn base_type(&self, node: &SchemaNode, ctx: &TypeContext) -> Result<TypeExpr> {
        if let Some(spec) = &node.enumeration {
            return inline_enum(node, spec, ctx);
        }

        match &node.kind {
            NodeKind::Primitive(primitive) => Ok(TypeExpr::plain(primitive.ts_type())),
            NodeKind::Primitives(primitives) => {
                let expressions: Vec<String> = primitives
                    .iter()
                    .map(|p| p.ts_type().to_string())
                    .collect();
                Ok(TypeExpr::plain(join_union(&expressions)))
            }
            // Nested object shapes are not given names of their own
            NodeKind::Object(_) | NodeKind::AllOf { .. } => {
                Ok(TypeExpr::plain(Primitive::Object.ts_type()))
            }
            NodeKind::Untyped | NodeKind::OneOf(_) | NodeKind::Array(_) | NodeKind::Ref(_) => Err(
                CodegenError::unknown_type(&node.name, node.declared_type.as_deref()),
            ),
        }
    }
}

/// Wrap `value` in `depth` array levels.
///
/// Unions and string literals go through `Array<..>` for the first level so
/// `'a' | 'b'` never turns into `'a' | 'b'[]`.
pub fn format_array_depth(value: &str, depth: usize) -> String {
    if depth == 0 {
        return value.to_string();
    }

    if value.ends_with('\'') || value.contains('|') {
        format!("Array<{value}>{}", "[]".repeat(depth - 1))
    } else {
        format!("{value}{}", "[]".repeat(depth))
    }
}

/// Join expressions into one union.
///
/// Members of already-unioned expressions are lifted to the top level and
/// duplicates dropped, keeping first occurrences in order.
pub fn join_union(expressions: &[String]) -> String {
    let mut members: Vec<&str> = Vec::new();

    for expression in expressions {
        for member in split_union(expression) {
            if !members.contains(&member) {
                members.push(member);
            }
        }
    }

    members.join(" | ")
}

/// Top-level `|` members of a type expression
fn split_union(expression: &str) -> Vec<&str> {
    let mut members = Vec::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in expression.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '\'' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '\'' => in_string = true,
            '<' | '{' | '(' | '[' => depth += 1,
            '>' | '}' | ')' | ']' => depth -= 1,
            '|' if depth == 0 => {
                members.push(expression[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }

    members.push(expression[start..].trim());
    members.retain(|m| !m.is_empty());
    members
}
