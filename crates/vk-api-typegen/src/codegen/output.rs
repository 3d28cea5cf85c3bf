use crate::config::DEFAULT_API_VERSION;
use crate::error::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use super::declaration::{Declaration, Field};
use super::{GenerationRun, TypingsGenerator, join_descriptions};

const GENERATED_HEADER: &str = "// @generated by vk-api-typegen. DO NOT EDIT.\n//\n// This file was automatically generated from VK API JSON schemas.\n// Any manual changes will be overwritten on the next regeneration.\n\n";

/// Output of a generation run: every unit's text and exported names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedTypings {
    /// Source text keyed by path relative to the output directory
    pub files: BTreeMap<PathBuf, String>,
    /// Exported declaration names keyed by module path (`./methods/users`)
    pub exports: BTreeMap<String, BTreeSet<String>>,
}

impl GeneratedTypings {
    pub fn file(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write every file under `out_dir`.
    ///
    /// The directory is removed first, so files left over from an earlier
    /// run with a different method selection do not linger.
    pub fn write_to_disk(&self, out_dir: &Path) -> Result<()> {
        tracing::info!("prepare out directory");
        if out_dir.exists() {
            fs::remove_dir_all(out_dir)?;
        }
        fs::create_dir_all(out_dir)?;

        tracing::info!("write files");
        for (path, content) in &self.files {
            let full_path = out_dir.join(path);
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&full_path, format!("{GENERATED_HEADER}{content}\n"))?;
        }

        Ok(())
    }
}

impl<'c> TypingsGenerator<'c> {
    /// `common/errors.ts`: one constant per error code, sorted by code
    pub(super) fn generate_errors(&self, run: &mut GenerationRun) -> Result<()> {
        let errors = self.corpus.errors();
        if errors.is_empty() {
            tracing::info!("no errors defined, skipping errors.ts");
            return Ok(());
        }

        tracing::info!("creating errors...");
        let mut sorted: Vec<_> = errors.iter().collect();
        sorted.sort_by_key(|(_, error)| error.code);

        let declarations: Vec<Declaration> = sorted
            .into_iter()
            .map(|(name, error)| {
                Declaration::constant(name.to_uppercase(), error.code.to_string()).with_description(
                    join_descriptions(
                        [Some(error.description.as_str()), error.comment.as_deref()],
                        "\n\n",
                    ),
                )
            })
            .collect();

        run.add_unit(
            PathBuf::from("common").join("errors.ts"),
            "./common/errors",
            &[],
            &declarations,
        )
    }

    /// `common/common.ts`: API version, `ValueOf` and the base request params
    pub(super) fn generate_common(&self, run: &mut GenerationRun) -> Result<()> {
        tracing::info!("creating common types...");

        let version = self
            .options
            .api_version
            .as_deref()
            .or(self.corpus.version())
            .unwrap_or(DEFAULT_API_VERSION);

        let api_version = Declaration::constant("API_VERSION", format!("'{version}'"));
        let base_params = Declaration::interface(
            "BaseAPIParams",
            vec![
                Field::new("v", "string", true),
                Field::new("access_token", "string", true),
                Field::new("lang", "number", false),
                Field::new("device_id", "string", false),
            ],
        );

        let blocks = [
            api_version.render()?,
            "export type ValueOf<T> = T[keyof T];".to_string(),
            base_params.render()?,
        ];

        for name in ["API_VERSION", "BaseAPIParams"] {
            run.exports.register("./common/common", name);
        }
        run.files
            .insert(PathBuf::from("common").join("common.ts"), blocks.join("\n\n"));
        Ok(())
    }
}
