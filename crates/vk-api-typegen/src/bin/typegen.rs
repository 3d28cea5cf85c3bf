use clap::Parser;
use miette::miette;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use vk_api_typegen::cli::{EnumStyleArg, TypegenArgs};
use vk_api_typegen::codegen::TypingsGenerator;
use vk_api_typegen::config::{Config, EnumStyle, GeneratorOptions, MethodFilter};
use vk_api_typegen::corpus::SchemaCorpus;

fn main() -> miette::Result<()> {
    let args = TypegenArgs::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let started = Instant::now();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let mut options = GeneratorOptions::from_config(&config);
    if !args.methods.is_empty() {
        options.methods = MethodFilter::parse(args.methods.iter().map(String::as_str));
    }
    if let Some(style) = args.enum_style {
        options.enum_style = match style {
            EnumStyleArg::Union => EnumStyle::Union,
            EnumStyleArg::Enum => EnumStyle::Enum,
        };
    }

    let out_dir: Option<PathBuf> = args.out_dir.clone().or(config.output.clone());

    tracing::info!("loading schema from {}", args.schema_dir.display());
    let corpus = SchemaCorpus::load_from_dir(&args.schema_dir)?;
    tracing::info!(
        "loaded {} methods, {} objects, {} responses",
        corpus.methods().len(),
        corpus.objects().count(),
        corpus.responses().count()
    );

    let typings = TypingsGenerator::new(&corpus, &options).generate()?;

    if args.no_emit {
        tracing::info!("--no-emit given, {} files not written", typings.len());
    } else {
        let out_dir = out_dir
            .ok_or_else(|| miette!("no output directory, pass --out-dir or set `output` in the config"))?;
        typings.write_to_disk(&out_dir)?;
        println!("Generated {} files to {}", typings.len(), out_dir.display());
    }

    tracing::info!("done in {:.2?}", started.elapsed());
    Ok(())
}
