//! JSON output: page records as JSON Lines or a JSON array, failures as JSON Lines

use crate::config::{OutputConfig, OutputFormat};
use crate::output::traits::{FailureRecord, OutputError, OutputHandler, OutputResult, PageRecord};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Streams serializable values to a writer in the configured layout
#[derive(Debug)]
pub struct JsonWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    written: usize,
    finished: bool,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer,
            format,
            written: 0,
            finished: false,
        }
    }

    /// Appends one value
    pub fn write<T: Serialize>(&mut self, value: &T) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Finished);
        }

        match self.format {
            OutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, value)?;
                self.writer.write_all(b"\n")?;
            }
            OutputFormat::JsonArray => {
                let separator: &[u8] = if self.written == 0 { b"[\n" } else { b",\n" };
                self.writer.write_all(separator)?;
                serde_json::to_writer(&mut self.writer, value)?;
            }
        }

        self.written += 1;
        Ok(())
    }

    /// Closes the array (if any) and flushes; later calls are no-ops
    pub fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }

        if self.format == OutputFormat::JsonArray {
            if self.written == 0 {
                self.writer.write_all(b"[")?;
            }
            self.writer.write_all(b"\n]\n")?;
        }

        self.writer.flush()?;
        self.finished = true;
        Ok(())
    }

    /// Number of values written so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Output handler writing pages and (optionally) failures as JSON
#[derive(Debug)]
pub struct JsonOutput<W: Write = BufWriter<File>> {
    pages: JsonWriter<W>,
    failures: Option<JsonWriter<W>>,
}

impl<W: Write> JsonOutput<W> {
    /// Pages go to `pages` in `format`; failures, when a writer is given, as JSON Lines
    pub fn new(pages: W, format: OutputFormat, failures: Option<W>) -> Self {
        Self {
            pages: JsonWriter::new(pages, format),
            failures: failures.map(|w| JsonWriter::new(w, OutputFormat::JsonLines)),
        }
    }

    pub fn pages_written(&self) -> usize {
        self.pages.written()
    }

    pub fn failures_written(&self) -> usize {
        self.failures.as_ref().map_or(0, JsonWriter::written)
    }

    /// Returns the page and failure writers
    pub fn into_inner(self) -> (W, Option<W>) {
        (
            self.pages.into_inner(),
            self.failures.map(JsonWriter::into_inner),
        )
    }
}

impl JsonOutput {
    /// Creates the files named in the output configuration
    pub fn from_config(config: &OutputConfig) -> OutputResult<Self> {
        let pages = create_file(Path::new(&config.records_path))?;
        let failures = config
            .failures_path
            .as_deref()
            .map(|path| create_file(Path::new(path)))
            .transpose()?;

        Ok(Self::new(pages, config.format, failures))
    }
}

fn create_file(path: &Path) -> OutputResult<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

impl<W: Write> OutputHandler for JsonOutput<W> {
    fn write_page(&mut self, record: &PageRecord) -> OutputResult<()> {
        self.pages.write(record)
    }

    fn write_failure(&mut self, failure: &FailureRecord) -> OutputResult<()> {
        match self.failures.as_mut() {
            Some(writer) => writer.write(failure),
            None => Ok(()),
        }
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.pages.finish()?;
        if let Some(writer) = self.failures.as_mut() {
            writer.finish()?;
        }
        Ok(())
    }
}
