use crate::errors::{AppError, AppResult};
use crate::models::{OutputTable, Row};
use crate::parser::{Projection, Selection};
use crate::utils::is_gzip_path;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Destination file behind a sink, plain or gzip-compressed.
///
/// Chosen once at construction from the filename suffix; row writing never
/// sees the difference.
enum SinkTarget {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl SinkTarget {
    fn create(path: &Path) -> io::Result<Self> {
        let file = BufWriter::new(File::create(path)?);
        if is_gzip_path(path) {
            Ok(Self::Gzip(GzEncoder::new(file, Compression::default())))
        } else {
            Ok(Self::Plain(file))
        }
    }

    /// Flushes everything and, for gzip, writes the stream trailer.
    fn finish(self) -> io::Result<()> {
        match self {
            Self::Plain(mut file) => file.flush(),
            Self::Gzip(encoder) => encoder.finish()?.flush(),
        }
    }
}

impl Write for SinkTarget {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(file) => file.write(buf),
            Self::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(file) => file.flush(),
            Self::Gzip(encoder) => encoder.flush(),
        }
    }
}

/// Writes the rows of one output table as CSV.
///
/// The header is emitted lazily, right before the first row. A sink that is
/// closed without ever receiving a row leaves an empty file (for gzip, a
/// valid stream that decompresses to nothing).
pub struct TableSink {
    table: OutputTable,
    path: PathBuf,
    writer: csv::Writer<SinkTarget>,
    header_written: bool,
    rows_written: u64,
}

impl TableSink {
    /// Creates the destination file, creating its parent directory first if needed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` when the parent directory cannot be
    /// created or denies writing, and `IoError` for any other failure to
    /// create the file.
    pub fn create(table: OutputTable, path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::ConfigurationError(format!(
                    "Failed to create output directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let target = SinkTarget::create(path).map_err(|e| match e.kind() {
            io::ErrorKind::PermissionDenied => AppError::ConfigurationError(format!(
                "Output location for {} table is not writable: {}: {e}",
                table.name(),
                path.display()
            )),
            _ => AppError::IoError(format!(
                "Failed to create {} table file {}: {e}",
                table.name(),
                path.display()
            )),
        })?;

        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(target);

        debug!(table = table.name(), path = %path.display(), "Opened table sink");

        Ok(Self {
            table,
            path: path.to_path_buf(),
            writer,
            header_written: false,
            rows_written: 0,
        })
    }

    pub fn table(&self) -> OutputTable {
        self.table
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header_written(&self) -> bool {
        self.header_written
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Appends one row, writing the header first if this is the first row.
    pub fn write_row(&mut self, row: &Row) -> AppResult<()> {
        debug_assert_eq!(row.len(), self.table.header().len());

        if !self.header_written {
            self.writer
                .write_record(self.table.header())
                .map_err(|e| self.write_error(e))?;
            self.header_written = true;
        }

        self.writer
            .write_record(row.fields())
            .map_err(|e| self.write_error(e))?;
        self.rows_written += 1;
        Ok(())
    }

    /// Flushes and closes the destination.
    pub fn close(self) -> AppResult<()> {
        let path = self.path;
        let target = self.writer.into_inner().map_err(|e| {
            AppError::IoError(format!("Failed to flush {}: {}", path.display(), e.error()))
        })?;
        target
            .finish()
            .map_err(|e| AppError::IoError(format!("Failed to close {}: {e}", path.display())))
    }

    fn write_error(&self, err: csv::Error) -> AppError {
        AppError::IoError(format!(
            "Failed to write {} row to {}: {err}",
            self.table.name(),
            self.path.display()
        ))
    }
}

/// The open sinks of one run, at most one per output table.
pub struct TableSinks {
    sinks: Vec<TableSink>,
}

impl TableSinks {
    /// Opens one sink per target.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if `targets` is empty or names a table
    /// twice. Sinks opened before a later one fails are closed again.
    pub fn open(targets: &[(OutputTable, PathBuf)]) -> AppResult<Self> {
        if targets.is_empty() {
            return Err(AppError::ConfigurationError(
                "No output table requested; enable steps and/or workouts".to_string(),
            ));
        }

        let mut sinks: Vec<TableSink> = Vec::with_capacity(targets.len());
        for (table, path) in targets {
            if sinks.iter().any(|sink| sink.table == *table) {
                Self { sinks }.abandon();
                return Err(AppError::ConfigurationError(format!(
                    "Table {} requested more than once",
                    table.name()
                )));
            }
            match TableSink::create(*table, path) {
                Ok(sink) => sinks.push(sink),
                Err(e) => {
                    Self { sinks }.abandon();
                    return Err(e);
                }
            }
        }

        Ok(Self { sinks })
    }

    pub fn selection(&self) -> Selection {
        let mut selection = Selection::default();
        for sink in &self.sinks {
            match sink.table {
                OutputTable::Steps => selection.steps = true,
                OutputTable::Workouts => selection.workouts = true,
            }
        }
        selection
    }

    pub fn get(&self, table: OutputTable) -> Option<&TableSink> {
        self.sinks.iter().find(|sink| sink.table == table)
    }

    /// Routes a projected row to the sink of its table.
    pub fn write(&mut self, projection: &Projection) -> AppResult<()> {
        match self
            .sinks
            .iter_mut()
            .find(|sink| sink.table == projection.table)
        {
            Some(sink) => sink.write_row(&projection.row),
            None => Err(AppError::ConfigurationError(format!(
                "No sink open for table {}",
                projection.table.name()
            ))),
        }
    }

    /// Closes every sink, reporting the first failure after attempting all of them.
    pub fn close(self) -> AppResult<()> {
        let mut first_error = None;
        for sink in self.sinks {
            let table = sink.table;
            let rows = sink.rows_written;
            match sink.close() {
                Ok(()) => debug!(table = table.name(), rows = rows, "Closed table sink"),
                Err(e) => {
                    warn!(table = table.name(), error = %e, "Failed to close table sink");
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Best-effort close on the failure path; errors are only logged.
    pub fn abandon(self) {
        for sink in self.sinks {
            let table = sink.table;
            let path = sink.path.clone();
            if let Err(e) = sink.close() {
                warn!(
                    table = table.name(),
                    path = %path.display(),
                    error = %e,
                    "Failed to close table sink after error"
                );
            }
        }
    }
}
