use crate::errors::{AppError, AppResult};
use crate::models::{Counters, OutputTable};
use crate::parser::{classify, ElementStream};
use crate::progress::ProgressReporter;
use crate::shutdown::Shutdown;
use crate::sink::TableSinks;
use crate::utils::format_duration;
use std::io::BufRead;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// Fully resolved parameters of one run.
///
/// Paths are already joined onto the output directory; the directories
/// themselves may not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Source export document (`.gz` is decompressed on the fly)
    pub source: PathBuf,
    /// Steps table destination, `None` disables the table
    pub steps_path: Option<PathBuf>,
    /// Workouts table destination, `None` disables the table
    pub workouts_path: Option<PathBuf>,
    /// Progress line interval in `Record` elements, 0 disables
    pub progress_every: u64,
}

impl RunConfig {
    /// Requested tables paired with their destinations.
    pub fn targets(&self) -> Vec<(OutputTable, PathBuf)> {
        let mut targets = Vec::with_capacity(2);
        if let Some(path) = &self.steps_path {
            targets.push((OutputTable::Steps, path.clone()));
        }
        if let Some(path) = &self.workouts_path {
            targets.push((OutputTable::Workouts, path.clone()));
        }
        targets
    }

    /// Fails fast when no output table is requested.
    pub fn validate(&self) -> AppResult<()> {
        if self.steps_path.is_none() && self.workouts_path.is_none() {
            return Err(AppError::ConfigurationError(
                "No output table requested; provide a steps and/or workouts filename".to_string(),
            ));
        }
        Ok(())
    }
}

/// Runs the pipeline to completion with no way to interrupt it.
pub fn run(config: &RunConfig) -> AppResult<Counters> {
    run_with_shutdown(config, &Shutdown::new())
}

/// Streams the source document once, writing every selected row to its table.
///
/// Configuration is validated and the source opened before any output file
/// is created. On any error, or when `shutdown` is requested between
/// elements, the sinks already open are closed best-effort and the error is
/// returned; their contents must not be treated as complete.
///
/// # Errors
///
/// - `ConfigurationError` if no table is requested or an output directory cannot be created
/// - `IoError` if the source cannot be opened or a sink cannot be written or flushed
/// - `ParseError` if the document is malformed or truncated
/// - `Interrupted` if `shutdown` was requested before the end of the document
pub fn run_with_shutdown(config: &RunConfig, shutdown: &Shutdown) -> AppResult<Counters> {
    config.validate()?;

    let stream = ElementStream::open(&config.source)?;
    let targets = config.targets();
    let sinks = TableSinks::open(&targets)?;

    info!(
        source = %config.source.display(),
        tables = targets.len(),
        "Starting export parsing"
    );

    let start = Instant::now();
    let counters = stream_into(stream, sinks, config.progress_every, shutdown)?;

    info!(
        records = counters.records,
        steps = counters.steps,
        workouts = counters.workouts,
        elapsed = format_duration(start.elapsed()),
        "Parsing completed"
    );

    Ok(counters)
}

/// Drives `stream` through the selector into `sinks`, then closes them.
pub fn stream_into<R: BufRead>(
    mut stream: ElementStream<R>,
    mut sinks: TableSinks,
    progress_every: u64,
    shutdown: &Shutdown,
) -> AppResult<Counters> {
    let selection = sinks.selection();
    let mut counters = Counters::default();
    let mut reporter = ProgressReporter::new(progress_every);

    let outcome = loop {
        if shutdown.is_requested() {
            break Err(AppError::Interrupted);
        }

        let record = match stream.next_element() {
            Ok(Some(record)) => record,
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        };

        if let Some(projection) = classify(&record, selection, &mut counters) {
            if let Err(e) = sinks.write(&projection) {
                break Err(e);
            }
        }
        drop(record);

        reporter.observe(&counters);
    };

    match outcome {
        Ok(()) => {
            sinks.close()?;
            Ok(counters)
        }
        Err(AppError::Interrupted) => {
            warn!(
                records = counters.records,
                "Run interrupted, closing open tables"
            );
            sinks.abandon();
            Err(AppError::Interrupted)
        }
        Err(e) => {
            sinks.abandon();
            Err(e)
        }
    }
}
