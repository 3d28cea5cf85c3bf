use crate::corpus::MethodSchema;
use crate::error::{CodegenError, Result};
use crate::graph::{OutputKind, import_statements};
use crate::node::{NodeKind, SchemaNode};
use crate::resolve::Sentinel;
use std::mem;
use std::path::PathBuf;

use super::declaration::{Declaration, Field};
use super::names::{interface_name, method_section};
use super::types::{EnumLookup, TypeContext};
use super::{Emitted, GenerationRun, TypingsGenerator, join_descriptions};

impl<'c> TypingsGenerator<'c> {
    pub(super) fn generate_methods(&self, run: &mut GenerationRun) -> Result<()> {
        tracing::info!("creating method params and responses...");

        for method in self.corpus.methods() {
            if self.options.methods.matches(&method.name) {
                self.generate_method(run, method)?;
            }
        }
        Ok(())
    }

    fn generate_method(&self, run: &mut GenerationRun, method: &MethodSchema) -> Result<()> {
        let mut unit = Emitted::default();

        let mut heading = vec![method.name.clone()];
        if let Some(description) = method.description.as_deref().filter(|d| !d.trim().is_empty()) {
            heading.push(String::new());
            heading.extend(description.lines().map(str::to_string));
        }
        unit.declarations.push(Declaration::comment(heading));

        // Parameter item refs are generated but never imported here
        run.queue.enqueue(&method.parameter_refs);

        unit.extend(self.method_params(method)?);

        for (slot, id) in &method.responses {
            if self.options.is_ignored(&method.name, slot) {
                tracing::info!("{}: response \"{slot}\" is ignored", method.name);
                continue;
            }
            if let Some(response) = self.response_declarations(self.corpus.node(*id))? {
                unit.extend(response);
            }
        }

        run.queue.enqueue(&unit.dependencies);
        run.method_units
            .entry(method_section(&method.name).to_string())
            .or_default()
            .extend(unit);
        Ok(())
    }

    /// `{Method}Params` interface. Parameters never get enum lookup tables.
    fn method_params(&self, method: &MethodSchema) -> Result<Emitted> {
        let ctx = TypeContext::new(EnumLookup::Never);
        let mut emitted = Emitted::default();
        let mut fields = Vec::with_capacity(method.parameters.len());

        for id in &method.parameters {
            let parameter = self.corpus.node(*id);
            let expr = self.type_of(parameter, &ctx)?;

            fields.push(
                Field::new(&parameter.name, expr.expression, parameter.required_flag)
                    .with_description(join_descriptions(
                        [parameter.description.as_deref(), expr.description.as_deref()],
                        "\n\n",
                    )),
            );
            emitted.declarations.extend(expr.declarations);
            emitted.dependencies.merge(&expr.dependencies);
        }

        emitted.declarations.push(
            Declaration::interface(interface_name(&format!("{} params", method.name)), fields)
                .allow_empty(),
        );
        Ok(emitted)
    }

    /// Declarations for one response slot, `None` when the slot is skipped
    fn response_declarations(&self, slot: &SchemaNode) -> Result<Option<Emitted>> {
        let Some(ref_name) = slot.ref_name() else {
            tracing::warn!("response schema object \"{}\" has no $ref, skipping", slot.name);
            return Ok(None);
        };

        let ctx = TypeContext::new(EnumLookup::Auto);

        if Sentinel::from_ref(ref_name).is_some() {
            return self.type_alias_of(slot, &ctx).map(Some);
        }

        let target_id = self
            .corpus
            .response(ref_name)
            .ok_or_else(|| CodegenError::unresolved(ref_name, &slot.name))?;
        let mut target = self.corpus.node(target_id);

        // Most responses wrap their payload in a single `response` property
        if let [only] = target.properties() {
            let only = self.corpus.node(*only);
            if only.name == "response" {
                target = only;
            }
        }

        if target.ref_name().is_some() {
            let mut emitted = self.type_alias_of(&target.aliased(&slot.name), &ctx)?;
            if let Some(alias) = emitted.declarations.last_mut() {
                alias.description = join_descriptions(
                    [slot.description.as_deref(), alias.description.as_deref()],
                    "\n\n",
                );
            }
            return Ok(Some(emitted));
        }

        let aliased = target.aliased(&slot.name);
        match &aliased.kind {
            NodeKind::Object(_) | NodeKind::AllOf { .. } => self.interface_of(&aliased).map(Some),
            NodeKind::Primitive(_)
            | NodeKind::Primitives(_)
            | NodeKind::Array(_)
            | NodeKind::OneOf(_) => self.type_alias_of(&aliased, &ctx).map(Some),
            NodeKind::Ref(_) | NodeKind::Untyped => Err(CodegenError::unknown_type(
                &aliased.name,
                aliased.declared_type.as_deref(),
            )),
        }
    }

    /// Write `methods/{section}.ts` for every section that got declarations
    pub(super) fn emit_method_units(&self, run: &mut GenerationRun) -> Result<()> {
        for (section, unit) in mem::take(&mut run.method_units) {
            let imports = import_statements(&unit.dependencies, None, OutputKind::Methods);
            run.add_unit(
                PathBuf::from("methods").join(format!("{section}.ts")),
                &format!("./methods/{section}"),
                &imports,
                &unit.declarations,
            )?;
        }
        Ok(())
    }
}
