use crate::config::{ResolvedConfig, ResolvedConfigFile};
use crate::errors::{AppError, AppResult};
use crate::logging;
use crate::models::Counters;
use crate::pipeline::{self, RunConfig};
use crate::shutdown::Shutdown;
use crate::utils::format_count;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::io::{self, Write};
use std::path::PathBuf;

// CLI metadata constants
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_ABOUT: &str = env!("CARGO_PKG_DESCRIPTION");

/// Everything a run needs once the arguments are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub run: RunConfig,
    pub quiet: bool,
    pub verbose: bool,
}

/// Builds the clap command tree.
///
/// - `run`: stream an export given on the command line
/// - `toml`: same, with parameters read from a TOML file
pub fn build_command() -> Command {
    Command::new("health-etl")
        .version(APP_VERSION)
        .about(APP_ABOUT)
        .subcommand(
            Command::new("run")
                .about("Stream-parse an export.xml into steps and workouts CSV tables")
                .after_help("Use a .gz suffix to gzip a table, or an empty name to skip it.\nExample:\n  health-etl run export.xml --outdir data --steps steps.csv.gz --workouts \"\"")
                .arg(
                    Arg::new("source")
                        .help("Path to the Apple Health export.xml (or export.xml.gz)")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("outdir")
                        .short('o')
                        .long("outdir")
                        .help("Directory to write outputs into (default: current dir)")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("steps")
                        .long("steps")
                        .help("Filename for the steps table (default: steps.csv)")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("workouts")
                        .long("workouts")
                        .help("Filename for the workouts table (default: workouts.csv)")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("progress_every")
                        .short('p')
                        .long("progress-every")
                        .help("Log progress every N <Record> elements, 0 disables (default: 250000)")
                        .value_parser(clap::value_parser!(u64))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("quiet")
                        .short('q')
                        .long("quiet")
                        .help("Reduce console logging")
                        .action(ArgAction::SetTrue),
                )
                .arg(verbose_arg()),
        )
        .subcommand(
            Command::new("toml")
                .about("Run using a TOML configuration file")
                .arg(
                    Arg::new("config")
                        .help("Path to the TOML config file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(verbose_arg()),
        )
}

fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .long("verbose")
        .help("Log debug details")
        .action(ArgAction::SetTrue)
}

/// Resolves parsed arguments into an [`Invocation`].
///
/// Returns `Ok(None)` when no subcommand was given.
pub fn invocation_from(matches: &ArgMatches) -> AppResult<Option<Invocation>> {
    match matches.subcommand() {
        Some(("run", sub)) => {
            let source = sub
                .get_one::<PathBuf>("source")
                .ok_or_else(|| AppError::InvalidInput("source path is required".into()))?;

            let mut resolved_config = ResolvedConfig::default();
            if let Some(out_dir) = sub.get_one::<PathBuf>("outdir") {
                resolved_config.out_dir = out_dir.clone();
            }
            if let Some(steps) = sub.get_one::<String>("steps") {
                resolved_config.steps = steps.clone();
            }
            if let Some(workouts) = sub.get_one::<String>("workouts") {
                resolved_config.workouts = workouts.clone();
            }
            if let Some(&every) = sub.get_one::<u64>("progress_every") {
                resolved_config.progress_every = every;
            }
            if sub.get_flag("quiet") {
                resolved_config.quiet = true;
            }

            Ok(Some(Invocation {
                run: resolved_config.run_config(source),
                quiet: resolved_config.quiet,
                verbose: sub.get_flag("verbose"),
            }))
        }
        Some(("toml", sub)) => {
            let config_path = sub
                .get_one::<PathBuf>("config")
                .ok_or_else(|| AppError::InvalidInput("config path is required".into()))?;

            let file_config = ResolvedConfigFile::from_toml_file(config_path)?;
            Ok(Some(Invocation {
                run: file_config.run_config(),
                quiet: file_config.pipeline.quiet,
                verbose: sub.get_flag("verbose"),
            }))
        }
        _ => Ok(None),
    }
}

/// Parses command-line arguments and executes the run.
///
/// The pipeline runs synchronously on the calling thread. A small tokio
/// runtime lives alongside it only to turn ctrl-c into a shutdown request,
/// which the pipeline observes between elements.
///
/// # Errors
///
/// Propagates every pipeline error; `AppError::Interrupted` when stopped by ctrl-c.
pub fn cli() -> AppResult<()> {
    let cmd = build_command();
    let mut cmd_for_help = cmd.clone();
    let matches = cmd.get_matches();

    let Some(invocation) = invocation_from(&matches)? else {
        cmd_for_help
            .print_help()
            .map_err(|e| AppError::IoError(format!("Failed to print help: {e}")))?;
        return Ok(());
    };

    logging::init(invocation.quiet, invocation.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .map_err(|e| AppError::IoError(format!("Failed to start signal runtime: {e}")))?;
    let shutdown = Shutdown::new();
    shutdown.watch_ctrl_c(&runtime);

    let counters = pipeline::run_with_shutdown(&invocation.run, &shutdown)?;

    if !invocation.quiet {
        print_summary(&mut io::stdout().lock(), &counters)?;
    }

    Ok(())
}

/// Prints `Done.` and the final counters. A closed pipe on the reader's side is not an error.
pub fn print_summary<W: Write>(out: &mut W, counters: &Counters) -> AppResult<()> {
    match write_summary(out, counters) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other.map_err(AppError::from),
    }
}

fn write_summary<W: Write>(out: &mut W, counters: &Counters) -> io::Result<()> {
    writeln!(out, "Done.")?;
    for (name, value) in counters.iter() {
        writeln!(out, "{name}: {}", format_count(value))?;
    }
    out.flush()
}
