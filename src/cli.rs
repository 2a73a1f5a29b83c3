use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use ctwrap_model::{DeclarationModel, LoadError, ModelFormat, parse_model};
use ctwrap_utils::errors::emit_diagnostics;
use ctwrap_utils::logger;
use tracing::{debug, warn};

use crate::codegen::{ArgRole, MethodNaming, MethodPlan, WrapperGenerator};
use crate::config::{ConfigOverrides, GeneratorConfig, parse_alias};
use crate::utils::profiler::{PhaseTiming, Profiler};

#[derive(Parser, Debug)]
#[command(
    name = "ctwrap",
    version,
    about = "Generates Python ctypes wrappers for C-style native libraries"
)]
pub struct CtwrapCli {
    #[arg(long, global = true)]
    /// Display phase timing information.
    time: bool,

    #[arg(short, long, global = true)]
    /// Log debug output from every generation step.
    verbose: bool,

    #[arg(long, global = true)]
    /// Dump the validated declaration model as JSON before generating.
    dump_model: bool,

    #[command(subcommand)]
    command: Command,
}

impl CtwrapCli {
    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generates the wrapper module for a declaration model.
    Generate {
        model: PathBuf,
        #[arg(short, long)]
        /// Output file; the module is written to stdout when omitted.
        output: Option<PathBuf>,
        #[command(flatten)]
        generator: GeneratorArgs,
    },
    /// Fails when an existing wrapper differs from what would be generated.
    Check {
        model: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        generator: GeneratorArgs,
    },
    /// Prints the classified arguments and derived signature of every function.
    Inspect {
        model: PathBuf,
        #[command(flatten)]
        generator: GeneratorArgs,
    },
}

/// Config file and per-run overrides shared by all subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct GeneratorArgs {
    #[arg(short, long)]
    /// Generator config (.yaml, .json, or .toml with the `toml-config` feature).
    pub config: Option<PathBuf>,

    #[arg(long)]
    /// Prefix stripped from native symbols to derive method names.
    pub prefix: Option<String>,

    #[arg(long)]
    /// Native library name used for loading and for the wrapper class name.
    pub library: Option<String>,

    #[arg(long = "alias", value_name = "NATIVE=METHOD", value_parser = parse_alias)]
    /// Explicit method name for a native symbol. Repeatable.
    pub aliases: Vec<(String, String)>,

    #[arg(long)]
    /// Native symbol or user method the destructor calls.
    pub close: Option<String>,

    #[arg(long)]
    /// File whose contents are prepended to the module.
    pub license: Option<PathBuf>,
}

impl GeneratorArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            name_prefix: self.prefix.clone(),
            library_name: self.library.clone(),
            aliases: self.aliases.clone(),
            close_function_name: self.close.clone(),
            license_file: self.license.clone(),
        }
    }
}

pub fn run() -> Result<()> {
    let cli = CtwrapCli::parse();
    logger::init_logging(cli.verbose);
    match &cli.command {
        Command::Generate {
            model,
            output,
            generator,
        } => handle_generate(&cli, model, output.as_deref(), generator),
        Command::Check {
            model,
            output,
            generator,
        } => handle_check(&cli, model, output, generator),
        Command::Inspect { model, generator } => handle_inspect(&cli, model, generator),
    }
}

fn handle_generate(
    cli: &CtwrapCli,
    model_path: &Path,
    output: Option<&Path>,
    args: &GeneratorArgs,
) -> Result<()> {
    let mut profiler = Profiler::new();
    let module = generation_pipeline(cli, model_path, args, &mut profiler)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create output directory {}", parent.display())
                })?;
            }
            profiler.record_phase("Write", || fs::write(path, &module))
                .with_context(|| format!("failed to write wrapper {}", path.display()))?;
            eprintln!("{} {}", "generated".green().bold(), path.display());
        }
        None => print!("{module}"),
    }

    if cli.time {
        print_timings(&profiler);
    }
    Ok(())
}

fn handle_check(
    cli: &CtwrapCli,
    model_path: &Path,
    output: &Path,
    args: &GeneratorArgs,
) -> Result<()> {
    let mut profiler = Profiler::new();
    let module = generation_pipeline(cli, model_path, args, &mut profiler)?;
    let existing = fs::read_to_string(output)
        .with_context(|| format!("failed to read existing wrapper {}", output.display()))?;

    if cli.time {
        print_timings(&profiler);
    }

    if existing == module {
        eprintln!("{} {}", "up to date".green().bold(), output.display());
        Ok(())
    } else {
        eprintln!(
            "{} {} differs from the generated wrapper",
            "stale".red().bold(),
            output.display()
        );
        bail!("wrapper is stale")
    }
}

fn handle_inspect(cli: &CtwrapCli, model_path: &Path, args: &GeneratorArgs) -> Result<()> {
    let mut profiler = Profiler::new();
    let model = load_declarations(cli, model_path, &mut profiler)?;

    // Inspection only needs naming rules, so a missing library name falls
    // back to the model's file stem.
    let mut overrides = args.overrides();
    if overrides.library_name.is_none() {
        overrides.library_name = model_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
    }
    let config = GeneratorConfig::load(args.config.as_deref(), &overrides)?;
    let naming = MethodNaming::new(&config.name_prefix, &config.aliases);

    for function in &model.functions {
        println!("{}", function.name.bold());
        match MethodPlan::new(function, &naming) {
            Ok(plan) => {
                println!("  {}", plan.signature.header());
                for arg in &plan.args {
                    let role = arg.role.to_string();
                    let role = match arg.role {
                        ArgRole::Handle => role.as_str().cyan(),
                        _ => role.as_str().normal(),
                    };
                    println!("    {:<16} {:<7} {role}", arg.name(), arg.direction);
                }
                if let Some(ret) = &plan.return_value {
                    println!("    {:<16} {:<7} {}", ret.decl.name, "return", ret.role);
                }
            }
            Err(err) => println!("  {} {err}", "error:".red().bold()),
        }
    }

    if cli.time {
        print_timings(&profiler);
    }
    Ok(())
}

/// Loads the model and config, then renders the module in memory.
fn generation_pipeline(
    cli: &CtwrapCli,
    model_path: &Path,
    args: &GeneratorArgs,
    profiler: &mut Profiler,
) -> Result<String> {
    let model = load_declarations(cli, model_path, profiler)?;
    let config = profiler.record_phase("Load config", || {
        GeneratorConfig::load(args.config.as_deref(), &args.overrides())
    })?;

    for warning in config.unresolved_references(&model) {
        warn!("{warning}");
    }

    let generator = WrapperGenerator::new(config);
    let module = profiler
        .record_phase("Generate", || generator.generate(&model))
        .with_context(|| format!("failed to generate wrapper for {}", model_path.display()))?;
    debug!(bytes = module.len(), "wrapper module rendered");
    Ok(module)
}

fn load_declarations(
    cli: &CtwrapCli,
    path: &Path,
    profiler: &mut Profiler,
) -> Result<DeclarationModel> {
    let source = read_source(path)?;
    let source_id = path.display().to_string();

    let model = match profiler.record_phase("Load model", || {
        parse_model(&source, ModelFormat::from_path(path), &source_id)
    }) {
        Ok(model) => model,
        Err(err) => {
            emit_load_error(&err, &source);
            bail!("model loading failed");
        }
    };

    if cli.dump_model {
        println!("{}", "== Model ==".bold());
        println!(
            "{}",
            serde_json::to_string_pretty(&model).context("failed to serialise model")?
        );
    }

    Ok(model)
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("failed to read declaration model {}", path.display()))
}

fn emit_load_error(err: &LoadError, source: &str) {
    match err.to_diagnostic() {
        Some(diagnostic) => emit_diagnostics(&[diagnostic], source),
        None => eprintln!("{} {err}", "error:".red().bold()),
    }
}

fn print_timings(profiler: &Profiler) {
    eprintln!("{}", "[Timing]".bold());
    for PhaseTiming { name, duration } in profiler.phases() {
        eprintln!("{:>16}: {:>6.2} ms", name, millis(*duration));
    }
    eprintln!("{:>16}: {:>6.2} ms", "Total", millis(profiler.total()));
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
