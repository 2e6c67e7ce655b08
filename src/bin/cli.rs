//! Polyrun CLI
//!
//! Run and check code from the command line, list languages, and manage the
//! configuration file.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use futures::future::join_all;
use polyrun::config::{self, validate_config};
use polyrun::{CheckReport, CheckRequest, Config, Engine, ExecutionOutcome, ExecutionRequest, Severity, VERSION};

#[derive(Parser)]
#[command(
    name = "polyrun",
    author = "Polyrun Contributors",
    version = VERSION,
    about = "Polyrun - run and check code in many languages",
    long_about = None
)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, short, global = true, env = "POLYRUN_CONFIG")]
    config: Option<PathBuf>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile (if needed) and run a source file
    Run {
        /// Source file, or `-` for standard input
        file: Option<PathBuf>,
        /// Inline code instead of a file
        #[arg(long, short = 'e', conflicts_with = "file")]
        code: Option<String>,
        /// Language id or alias (inferred from the file name otherwise)
        #[arg(long, short)]
        language: Option<String>,
        /// Text fed to the program's stdin
        #[arg(long, short)]
        input: Option<String>,
        /// File whose contents are fed to the program's stdin
        #[arg(long, conflicts_with = "input")]
        input_file: Option<PathBuf>,
    },

    /// Statically check one or more source files
    Check {
        /// Source files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Language id or alias for every file
        #[arg(long, short)]
        language: Option<String>,
    },

    /// List languages and whether their toolchains are installed
    Languages,

    /// Write a configuration file with default values
    InitConfig {
        /// Target path (defaults to the user config path)
        #[arg(long)]
        path: Option<PathBuf>,
        /// File format
        #[arg(long, value_enum, default_value_t = ConfigFormat::Toml)]
        format: ConfigFormat,
        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },

    /// Validate the configuration file
    ValidateConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum ConfigFormat {
    Toml,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", style("error:").red().bold(), e);
            ExitCode::from(2)
        }
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<ExitCode> {
    let path = cli.config.as_deref();
    match cli.command {
        Commands::Run {
            file,
            code,
            language,
            input,
            input_file,
        } => {
            let config = prepare(path)?;
            let input = match input_file {
                Some(path) => Some(
                    std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?,
                ),
                None => input,
            };
            run(config, file, code, language, input, cli.json).await
        }
        Commands::Check { files, language } => check(prepare(path)?, files, language, cli.json).await,
        Commands::Languages => languages(prepare(path)?, cli.json),
        Commands::InitConfig { path, format, force } => init_config(path.as_deref(), format, force),
        Commands::ValidateConfig => validate(&prepare(path)?),
    }
}

/// Load the configuration and start logging
fn prepare(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = load(path)?;
    polyrun::logging::init(&config.logging);
    Ok(config)
}

fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            let mut config = config::load_config_from_path(path)?;
            config::apply_env_overrides(&mut config);
            Ok(config)
        }
        None => Ok(Config::from_env()?),
    }
}

fn read_source(file: &Path) -> anyhow::Result<String> {
    if file == Path::new("-") {
        let mut code = String::new();
        std::io::stdin().read_to_string(&mut code).context("reading stdin")?;
        return Ok(code);
    }
    std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))
}

async fn run(
    config: Config,
    file: Option<PathBuf>,
    code: Option<String>,
    language: Option<String>,
    input: Option<String>,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let (code, filename) = match (code, file) {
        (Some(code), _) => (code, None),
        (None, Some(file)) => {
            let code = read_source(&file)?;
            let filename = (file != Path::new("-")).then(|| file.to_string_lossy().into_owned());
            (code, filename)
        }
        (None, None) => bail!("nothing to run: pass a file, `-`, or --code"),
    };

    let request = ExecutionRequest {
        code,
        language,
        filename,
        input,
    };

    let engine = Engine::new(config);
    let report = engine.run(request).await;
    let success = report.outcome.is_success();

    if json {
        println!("{}", serde_json::to_string_pretty(&report.to_response())?);
    } else {
        let response = report.to_response();
        print!("{}", response.output);
        if let Some(error) = &response.error {
            let label = match &report.outcome {
                ExecutionOutcome::CompileFailure { .. } => "compile error",
                ExecutionOutcome::Timeout { .. } => "timed out",
                ExecutionOutcome::ToolchainMissing { .. } => "toolchain missing",
                ExecutionOutcome::Unsupported { .. } => "unsupported",
                ExecutionOutcome::InternalError { .. } => "internal error",
                _ => "runtime error",
            };
            eprintln!("{} {}", style(format!("{}:", label)).red().bold(), error.trim_end());
        }
        eprintln!(
            "{}",
            style(format!("[{} · {} ms]", report.language, response.execution_time)).dim()
        );
    }

    Ok(if success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn check(config: Config, files: Vec<PathBuf>, language: Option<String>, json: bool) -> anyhow::Result<ExitCode> {
    let engine = Engine::new(config);

    let mut requests = Vec::with_capacity(files.len());
    for file in &files {
        requests.push(CheckRequest {
            code: read_source(file)?,
            language: language.clone(),
            filename: Some(file.to_string_lossy().into_owned()),
        });
    }

    let reports: Vec<CheckReport> = join_all(requests.into_iter().map(|r| engine.check(r))).await;
    let has_errors = reports.iter().any(|r| !r.errors.is_empty());

    if json {
        let entries: Vec<_> = files
            .iter()
            .zip(&reports)
            .map(|(file, report)| serde_json::json!({ "file": file, "report": report }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for (file, report) in files.iter().zip(&reports) {
            print_report(file, report);
        }
    }

    Ok(if has_errors { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn print_report(file: &Path, report: &CheckReport) {
    let mut diagnostics: Vec<_> = report.errors.iter().chain(&report.warnings).collect();
    diagnostics.sort_by_key(|d| (d.line, d.column));

    for d in &diagnostics {
        let severity = match d.severity {
            Severity::Error => style("error").red().bold(),
            Severity::Warning => style("warning").yellow().bold(),
            Severity::Info => style("info").blue(),
        };
        println!("{}:{}:{}: {}: {}", file.display(), d.line, d.column, severity, d.message);
    }

    let summary = format!(
        "{} ({}): {} error(s), {} warning(s)",
        file.display(),
        report.language,
        report.errors.len(),
        report.warnings.len()
    );
    if report.is_clean() {
        println!("{} {}", style("✓").green(), summary);
    } else {
        println!("{}", style(summary).dim());
    }
}

fn languages(config: Config, json: bool) -> anyhow::Result<ExitCode> {
    let engine = Engine::new(config);
    let languages = engine.languages();

    if json {
        println!("{}", serde_json::to_string_pretty(&languages)?);
        return Ok(ExitCode::SUCCESS);
    }

    for info in &languages {
        let status = if info.available {
            style("✓ ready".to_string()).green()
        } else if info.runtime == "check-only" {
            style("· check only".to_string()).dim()
        } else {
            style(format!("✗ missing {}", info.missing.join(", "))).red()
        };
        println!(
            "  {:<12} {:<10} .{:<18} {}",
            style(&info.id).bold(),
            info.runtime,
            info.extensions.join(" ."),
            status
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn init_config(path: Option<&Path>, format: ConfigFormat, force: bool) -> anyhow::Result<ExitCode> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let name = match format {
                ConfigFormat::Toml => "config.toml",
                ConfigFormat::Json => "config.json",
            };
            config::config_dir().join(name)
        }
    };

    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    config::save_config(&Config::default(), &path)?;
    println!("{} Wrote {}", style("✓").green(), path.display());
    Ok(ExitCode::SUCCESS)
}

fn validate(config: &Config) -> anyhow::Result<ExitCode> {
    let result = validate_config(config);

    for issue in &result.errors {
        println!("{} {}: {}", style("error").red().bold(), issue.path, issue.message);
        if let Some(suggestion) = &issue.suggestion {
            println!("    {}", style(suggestion).dim());
        }
    }
    for issue in &result.warnings {
        println!("{} {}: {}", style("warning").yellow().bold(), issue.path, issue.message);
        if let Some(suggestion) = &issue.suggestion {
            println!("    {}", style(suggestion).dim());
        }
    }

    if result.valid {
        println!("{} Configuration is valid", style("✓").green());
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
