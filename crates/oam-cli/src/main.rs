use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use oam_core::config::{self, CONFIG_FILE_NAME, OamConfig};
use oam_core::merge::{MergeStrategy, discover_parts};
use oam_core::{Analysis, Diagnostic, Severity, SourceFile, analyze};

#[derive(Parser)]
#[command(name = "oam", about = "Merge, validate and inspect multi-file OpenAPI 3.x specs", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Base OpenAPI document (YAML or JSON)
    #[arg(short, long)]
    input: PathBuf,

    /// Additional part files; siblings named `<base>_<part>.<ext>` are found automatically
    #[arg(short, long = "part")]
    parts: Vec<PathBuf>,

    /// Only merge the parts given with --part
    #[arg(long)]
    no_discover: bool,

    /// Config file (defaults to ./.oam.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured merge strategy
    #[arg(long)]
    strategy: Option<MergeStrategy>,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge a base document and its parts into one document
    Merge {
        #[command(flatten)]
        args: InputArgs,

        /// Write the merged document here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: DocumentFormat,
    },

    /// Run the validation rules over the merged document
    Validate {
        #[command(flatten)]
        args: InputArgs,

        /// Also run strict-only rules
        #[arg(long)]
        strict: bool,

        /// Report format
        #[arg(long, default_value = "text")]
        format: ReportFormat,
    },

    /// Print resolved types, operations and naming conflicts
    Inspect {
        #[command(flatten)]
        args: InputArgs,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: DocumentFormat,
    },

    /// Initialize a new oam configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DocumentFormat {
    Yaml,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

fn main() -> Result<ExitCode> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Merge {
            args,
            output,
            format,
        } => cmd_merge(&args, output, format),

        Commands::Validate {
            args,
            strict,
            format,
        } => cmd_validate(&args, strict, format),

        Commands::Inspect { args, format } => cmd_inspect(&args, format),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "oam", &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Load the explicit config, or `.oam.yaml` from the current directory.
fn load_config(args: &InputArgs) -> Result<OamConfig> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => {
            let default = PathBuf::from(CONFIG_FILE_NAME);
            if !default.exists() {
                return Ok(apply_overrides(OamConfig::default(), args));
            }
            default
        }
    };
    let content =
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let config = OamConfig::from_yaml(&content)
        .with_context(|| format!("invalid config {}", path.display()))?;
    log::debug!("loaded config from {}", path.display());
    Ok(apply_overrides(config, args))
}

fn apply_overrides(mut config: OamConfig, args: &InputArgs) -> OamConfig {
    if let Some(strategy) = args.strategy {
        config.merge.strategy = strategy;
    }
    config
}

/// Explicit parts plus any discovered next to the base file.
fn collect_parts(args: &InputArgs) -> Result<Vec<PathBuf>> {
    let mut parts = args.parts.clone();
    if args.no_discover {
        return Ok(parts);
    }
    let dir = match args.input.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut candidates = Vec::new();
    for entry in fs::read_dir(&dir).with_context(|| format!("failed to list {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() {
            candidates.push(path.to_string_lossy().into_owned());
        }
    }
    let base = args.input.to_string_lossy();
    for found in discover_parts(&base, &candidates) {
        let found = PathBuf::from(found);
        if !parts.iter().any(|p| same_file(p, &found)) {
            parts.push(found);
        }
    }
    Ok(parts)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn read_source(path: &Path, base: bool) -> Result<SourceFile> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let name = path.to_string_lossy().into_owned();
    Ok(if base {
        SourceFile::base(name, content)
    } else {
        SourceFile::part(name, content)
    })
}

fn run_pipeline(args: &InputArgs, config: &OamConfig) -> Result<Analysis> {
    let mut sources = vec![read_source(&args.input, true)?];
    for part in collect_parts(args)? {
        sources.push(read_source(&part, false)?);
    }
    eprintln!("Analyzing {} file(s)", sources.len());
    Ok(analyze(&sources, config)?)
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("  {diagnostic}");
    }
}

fn count(diagnostics: &[Diagnostic], severity: Severity) -> usize {
    diagnostics.iter().filter(|d| d.severity == severity).count()
}

fn exit_code(analysis: &Analysis) -> ExitCode {
    if analysis.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn cmd_merge(args: &InputArgs, output: Option<PathBuf>, format: DocumentFormat) -> Result<ExitCode> {
    let config = load_config(args)?;
    let analysis = run_pipeline(args, &config)?;
    print_diagnostics(&analysis.merge.diagnostics);

    let rendered = match format {
        DocumentFormat::Yaml => serde_yaml_ng::to_string(analysis.document())?,
        DocumentFormat::Json => serde_json::to_string_pretty(analysis.document())? + "\n",
    };
    match output {
        Some(path) => {
            fs::write(&path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            let counts = analysis.merge.counts;
            eprintln!(
                "Merged {} file(s) into {}: {} path(s), {} operation(s), {} schema(s)",
                counts.files,
                path.display(),
                counts.paths,
                counts.operations,
                counts.schemas
            );
        }
        None => print!("{rendered}"),
    }

    Ok(if analysis.merge.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_validate(args: &InputArgs, strict: bool, format: ReportFormat) -> Result<ExitCode> {
    let mut config = load_config(args)?;
    config.validation.strict_mode |= strict;
    let analysis = run_pipeline(args, &config)?;
    let diagnostics = &analysis.diagnostics;

    match format {
        ReportFormat::Text => {
            print_diagnostics(diagnostics);
            eprintln!(
                "{} error(s), {} warning(s), {} info",
                count(diagnostics, Severity::Error),
                count(diagnostics, Severity::Warning),
                count(diagnostics, Severity::Info)
            );
        }
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(diagnostics)?),
    }

    Ok(exit_code(&analysis))
}

fn cmd_inspect(args: &InputArgs, format: DocumentFormat) -> Result<ExitCode> {
    let config = load_config(args)?;
    let analysis = run_pipeline(args, &config)?;
    let summary = build_inspect_summary(&analysis);

    match format {
        DocumentFormat::Yaml => print!("{}", serde_yaml_ng::to_string(&summary)?),
        DocumentFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    Ok(exit_code(&analysis))
}

fn build_inspect_summary(analysis: &Analysis) -> serde_json::Value {
    let conflicts: Vec<serde_json::Value> = analysis
        .conflicts
        .conflicts()
        .iter()
        .map(|c| {
            serde_json::json!({
                "schema": c.schema,
                "qualified": analysis.conflicts.qualify(&c.schema),
            })
        })
        .collect();

    let operations: Vec<serde_json::Value> = analysis
        .operations
        .iter()
        .map(|op| {
            serde_json::json!({
                "name": op.name.camel_case,
                "method": op.method.as_str(),
                "path": op.path,
                "tags": op.tags,
                "parameters": op.parameters,
                "request_body": op.request_body,
                "responses": op.responses,
                "deprecated": op.deprecated,
            })
        })
        .collect();

    let info = analysis.document().info.as_ref();
    serde_json::json!({
        "info": {
            "title": info.map(|i| i.title.as_str()),
            "version": info.map(|i| i.version.as_str()),
        },
        "counts": analysis.merge.counts,
        "types": analysis.types,
        "operations": operations,
        "conflicts": conflicts,
        "diagnostics": analysis.diagnostics.len(),
    })
}

fn cmd_init(force: bool) -> Result<ExitCode> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())?;
    eprintln!("Created {}", config_path.display());
    Ok(ExitCode::SUCCESS)
}
