use miette::{Diagnostic, SourceSpan};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving schemas and generating typings
///
/// Every variant is fatal for the generation run: a half-built dependency
/// graph would emit declarations with dangling imports.
#[derive(Debug, Error, Diagnostic)]
pub enum CodegenError {
    /// IO error when reading schema files or writing output
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Failed to parse a schema document
    #[error("Failed to parse schema JSON in {}", path.display())]
    #[diagnostic(
        code(typegen::parse_error),
        help("Check that the file is valid JSON and follows the VK API schema layout")
    )]
    ParseError {
        #[source]
        source: serde_json::Error,
        /// Path to the file that failed to parse
        path: PathBuf,
        /// Source text that failed to parse
        #[source_code]
        src: Option<String>,
        /// Location of the error in the source
        #[label("parse error here")]
        span: Option<SourceSpan>,
    },

    /// A schema document parsed but holds nothing to generate from
    #[error("Schema document {} is empty", path.display())]
    #[diagnostic(code(typegen::empty_document))]
    EmptyDocument {
        /// Path to the empty document
        path: PathBuf,
    },

    /// A schema fragment is not a key-value mapping, or has an invalid shape
    #[error("Malformed schema node \"{name}\": {message}")]
    #[diagnostic(code(typegen::malformed_node))]
    MalformedNode {
        /// Name the fragment was being parsed under
        name: String,
        /// What was wrong with it
        message: String,
    },

    /// `$ref` target missing from both the objects and responses dictionaries
    #[error("Reference to unknown definition: {ref_name}")]
    #[diagnostic(
        code(typegen::unresolved_ref),
        help("Check the spelling of the $ref or add the definition to objects.json / responses.json")
    )]
    UnresolvedReference {
        /// The definition name that couldn't be resolved
        ref_name: String,
        /// Name of the node holding the reference
        referenced_from: String,
    },

    /// A node's shape matches no generation rule
    #[error("Unknown type of \"{name}\"{}", .declared_type.as_deref().map(|t| format!(": \"{t}\"")).unwrap_or_default())]
    #[diagnostic(
        code(typegen::unknown_type),
        help("Supported types are integer, number, boolean, string, array, object and mixed")
    )]
    UnknownType {
        /// Name of the offending node
        name: String,
        /// The `type` value it declared, if any
        declared_type: Option<String>,
    },

    /// A declaration ended up with no content
    #[error("Declaration \"{name}\" has an empty {what}")]
    #[diagnostic(code(typegen::empty_result))]
    EmptyResult {
        /// Interface or type name of the declaration
        name: String,
        /// Which part is empty
        what: &'static str,
    },

    /// Invalid configuration file or option
    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(typegen::config))]
    Config {
        message: String,
    },
}

impl CodegenError {
    /// Create a parse error pointing at the failing line and column
    pub fn parse_error_with_source(
        source: serde_json::Error,
        path: impl Into<PathBuf>,
        src: String,
    ) -> Self {
        let span = source
            .line()
            .checked_sub(1)
            .map(|line| line_offset(&src, line) + source.column().saturating_sub(1))
            .map(|offset| SourceSpan::from((offset.min(src.len()), 1)));

        Self::ParseError {
            source,
            path: path.into(),
            src: Some(src),
            span,
        }
    }

    /// Create a malformed node error
    pub fn malformed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedNode {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an unresolved reference error
    pub fn unresolved(ref_name: impl Into<String>, referenced_from: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            ref_name: ref_name.into(),
            referenced_from: referenced_from.into(),
        }
    }

    /// Create an unknown type error
    pub fn unknown_type(name: impl Into<String>, declared_type: Option<&str>) -> Self {
        Self::UnknownType {
            name: name.into(),
            declared_type: declared_type.map(str::to_string),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Byte offset of the start of `line` (zero based) in `src`
fn line_offset(src: &str, line: usize) -> usize {
    src.split_inclusive('\n').take(line).map(str::len).sum()
}

/// Result type for codegen operations
pub type Result<T> = std::result::Result<T, CodegenError>;
