mod registry;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use mapforge_config::{
    ConfigError, GeneratorConfig, ValidationReport, config_json_schema, load_config_value,
    resolve_tables, validate_config,
};
use mapforge_core::{DatabaseSchema, Error as CoreError, TableDescriptor, validate_schema};
use mapforge_generate::{
    Cancellation, ExtensionPipeline, GenerateOptions, GenerationEngine, GenerationError,
};
use mapforge_merge::{
    FileWriter, MergeError, RootResolver, WriteAction, WriteOptions, WriteReport,
};
use registry::{
    RunContext, RunOptions, init_run_logging, log_config_issues, log_issues, start_run,
    write_reports,
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("write error: {0}")]
    Write(#[from] MergeError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0} error(s)")]
    InvalidConfig(usize),
}

#[derive(Parser, Debug)]
#[command(name = "mapforge", version, about = "MyBatis dynamic SQL generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate records, support classes and mappers into an output root.
    Generate(GenerateArgs),
    /// Validate the configuration against the schema snapshot.
    Check(InputArgs),
    /// Print the JSON Schema of the configuration format.
    ConfigSchema(ConfigSchemaArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Schema snapshot (schema.json).
    #[arg(long, default_value = "schema.json")]
    schema: PathBuf,
    /// Generator configuration (.toml or .json).
    #[arg(long, default_value = "mapforge.toml")]
    config: PathBuf,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Root below which directory keys are resolved.
    #[arg(long, default_value = ".")]
    out_root: PathBuf,
    /// Overwrite existing files that cannot be merged.
    #[arg(long, default_value_t = false)]
    overwrite: bool,
    /// Never merge; treat every existing file as non-mergeable.
    #[arg(long, default_value_t = false)]
    no_merge: bool,
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    runs_dir: PathBuf,
    /// Log filter directives for the run log; overrides `MAPFORGE_LOG`.
    #[arg(long)]
    log_filter: Option<String>,
}

#[derive(Args, Debug)]
struct ConfigSchemaArgs {
    /// Write to a file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Check(args) => run_check(args),
        Command::ConfigSchema(args) => run_config_schema(args),
    }
}

struct Inputs {
    schema: DatabaseSchema,
    config: GeneratorConfig,
    tables: Vec<TableDescriptor>,
    report: ValidationReport,
}

fn load_inputs(args: &InputArgs) -> Result<Inputs, CliError> {
    let raw = fs::read_to_string(&args.schema)?;
    let schema: DatabaseSchema = serde_json::from_str(&raw)?;
    validate_schema(&schema)?;

    let config_json = load_config_value(&args.config)?;
    let config_schema = serde_json::to_value(config_json_schema())?;
    let validated = match validate_config(&config_json, &config_schema, &schema) {
        Ok(validated) => validated,
        Err(report) => {
            print_report(&report);
            return Err(CliError::InvalidConfig(report.errors.len()));
        }
    };

    let (tables, resolved) = resolve_tables(&validated.config, &schema);
    let mut report = ValidationReport {
        errors: Vec::new(),
        warnings: validated.warnings,
    };
    report.merge(resolved);

    Ok(Inputs {
        schema,
        config: validated.config,
        tables,
        report,
    })
}

fn run_check(args: InputArgs) -> Result<(), CliError> {
    let inputs = load_inputs(&args)?;
    print_report(&inputs.report);
    if !inputs.report.is_ok() {
        return Err(CliError::InvalidConfig(inputs.report.errors.len()));
    }
    println!(
        "ok: {} table(s) resolved, {} warning(s)",
        inputs.tables.len(),
        inputs.report.warnings.len()
    );
    Ok(())
}

fn run_config_schema(args: ConfigSchemaArgs) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(&config_json_schema())?;
    match args.out {
        Some(path) => mapforge_merge::write_bytes_atomic(&path, rendered.as_bytes())?,
        None => println!("{rendered}"),
    }
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    let GenerateArgs {
        input,
        out_root,
        overwrite,
        no_merge,
        runs_dir,
        log_filter,
    } = args;

    let inputs = load_inputs(&input)?;
    print_report(&inputs.report);

    let write_options = WriteOptions {
        overwrite: overwrite || inputs.config.options.overwrite,
        merge: !no_merge && inputs.config.options.merge,
    };

    let run_id = Uuid::new_v4().to_string();
    let run_ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        schema_version: inputs.schema.schema_version.clone(),
        config_version: inputs.config.config_version.clone(),
        runs_dir,
        options: RunOptions {
            schema_path: input.schema.clone(),
            config_path: input.config.clone(),
            out_root: out_root.clone(),
            overwrite: write_options.overwrite,
            merge: write_options.merge,
            plugins: inputs
                .config
                .plugins
                .iter()
                .map(|plugin| plugin.id.clone())
                .collect(),
        },
    };

    let run_paths = start_run(&run_ctx)?;
    init_run_logging(&run_paths.logs_path, log_filter.as_deref())?;

    let span = tracing::info_span!("run", run_id = %run_id);
    let _entered = span.enter();
    tracing::info!(event = "run_started", tables = inputs.tables.len());
    let timer = Instant::now();

    log_config_issues(&inputs.report);

    let (pipeline, plugin_issues) = ExtensionPipeline::from_plugins(&inputs.config.plugins);
    let options = GenerateOptions {
        model_dir: inputs.config.targets.model_dir.clone(),
        client_dir: inputs.config.targets.client_dir.clone(),
    };
    let cancel = Cancellation::new();

    let mut output = GenerationEngine::new(options, pipeline).run(&inputs.tables, &cancel)?;
    for issue in plugin_issues {
        output.report.record_issue(issue);
    }
    log_issues("generation_issue", &output.report.issues);
    tracing::info!(event = "generation_finished", files = output.files.len());

    let writer = FileWriter::new(RootResolver::new(&out_root), write_options);
    let written = writer.write_all(&output.files, &cancel);
    log_issues("write_issue", &written.issues);
    write_reports(&run_paths, &output.report, &written)?;

    for issue in output.report.issues.iter().chain(&written.issues) {
        println!("{} {issue}", issue.level);
    }
    println!("{} ({})", write_summary(&written, output.report.errors()), run_paths.root.display());
    if written.cancelled {
        println!("cancelled: remaining files were left untouched");
    }

    let status = if written.cancelled {
        "cancelled"
    } else if output.report.errors() + written.errors() > 0 {
        "completed_with_errors"
    } else {
        "success"
    };
    let duration_ms = timer.elapsed().as_millis();
    tracing::info!(event = "run_finished", status, duration_ms = duration_ms);
    Ok(())
}

/// One line with every write outcome and the error count of the run.
fn write_summary(written: &WriteReport, generation_errors: usize) -> String {
    format!(
        "{} file(s): {} created, {} merged, {} overwritten, {} disambiguated, {} unchanged, {} skipped; {} error(s)",
        written.files.len(),
        written.count(WriteAction::Created),
        written.count(WriteAction::Merged),
        written.count(WriteAction::Overwritten),
        written.count(WriteAction::Disambiguated),
        written.count(WriteAction::Unchanged),
        written.count(WriteAction::Skipped),
        generation_errors + written.errors(),
    )
}

fn print_report(report: &ValidationReport) {
    for issue in &report.errors {
        eprintln!("error {issue}");
    }
    for issue in &report.warnings {
        eprintln!("warning {issue}");
    }
}
