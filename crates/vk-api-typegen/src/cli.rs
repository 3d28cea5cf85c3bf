use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Generate TypeScript typings from the VK API JSON schema"
)]
pub struct TypegenArgs {
    /// Directory containing methods.json, objects.json, responses.json and errors.json
    #[arg(short = 's', long, default_value = "schema")]
    pub schema_dir: PathBuf,

    /// Output directory for generated typings (cleared before writing)
    #[arg(short = 'o', long)]
    pub out_dir: Option<PathBuf>,

    /// Methods to generate: "*", "section.*" or exact names, comma separated
    #[arg(short = 'm', long = "methods", value_name = "PATTERNS")]
    pub methods: Vec<String>,

    /// Path to KDL config file
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// How top-level enum definitions are emitted
    #[arg(long, value_enum)]
    pub enum_style: Option<EnumStyleArg>,

    /// Generate and report without writing any file
    #[arg(long)]
    pub no_emit: bool,

    /// Verbose output
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnumStyleArg {
    /// Literal union type plus a lookup constant
    Union,
    /// TypeScript enum declaration
    Enum,
}
