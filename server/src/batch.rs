//! One user selection, converted file by file.
//!
//! `BatchState` is the whole context of a batch. It is moved into the blocking task that converts a
//! file and handed back when that task is done, so only one file is ever in flight and results,
//! progress and status change in selection order.

use std::panic::{self, AssertUnwindSafe};

use common::{
    protocols::web::{BatchStatus, ConvertReport, Diagnostic},
    STATUS_DONE,
};

use crate::config::Config;
use crate::decode::{self, ImageFile};
use crate::error::{FileError, HeaderError};
use crate::header::{self, ConversionResult};
use crate::order;
use crate::progress::BatchProgressTracker;
use crate::quantize;

/// Gets told about everything the batch wants to show to the user.
pub trait BatchObserver: Send {
    fn on_status(&mut self, status: &str);
    fn on_progress(&mut self, percent: f64);
}

impl BatchObserver for () {
    fn on_status(&mut self, _status: &str) {}
    fn on_progress(&mut self, _percent: f64) {}
}

pub struct BatchState {
    progress: BatchProgressTracker,
    results: Vec<ConversionResult>,
    diagnostics: Vec<Diagnostic>,
    status: String,
    output_ready: bool,
    observer: Box<dyn BatchObserver>,
}

impl BatchState {
    pub fn new(file_count: usize, observer: Box<dyn BatchObserver>) -> Self {
        Self {
            progress: BatchProgressTracker::new(file_count),
            results: Vec::new(),
            diagnostics: Vec::new(),
            status: String::new(),
            output_ready: false,
            observer,
        }
    }

    pub fn results(&self) -> &[ConversionResult] {
        &self.results
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn output_ready(&self) -> bool {
        self.output_ready
    }

    pub fn status(&self) -> BatchStatus {
        BatchStatus {
            status: self.status.clone(),
            progress_percent: self.progress.percent(),
            output_ready: self.output_ready,
        }
    }

    pub fn report(&self) -> ConvertReport {
        ConvertReport {
            status: self.status(),
            files: self.results.iter().map(|r| r.filename.clone()).collect(),
            diagnostics: self.diagnostics.clone(),
        }
    }

    /// Renders `frames.h` from what was converted. Can be called again after a failure.
    pub fn render_header(&self, config: &Config) -> Result<String, HeaderError> {
        header::render(&self.results, config.max_header_bytes)
    }

    fn set_status(&mut self, status: String) {
        log::info!("{status}");
        self.observer.on_status(&status);
        self.status = status;
    }

    fn advance(&mut self, units: f64) {
        let percent = self.progress.advance(units);
        self.observer.on_progress(percent);
    }

    fn skip(&mut self, file: &str, message: String) {
        let diagnostic = Diagnostic {
            file: file.to_owned(),
            message,
        };
        log::warn!("Skipping {}: {}", diagnostic.file, diagnostic.message);
        self.diagnostics.push(diagnostic);
    }

    /// Decodes and quantizes one file, recording either a result or a diagnostic.
    fn convert_file(&mut self, file: &ImageFile, config: &Config) {
        match decode::decode(file, config) {
            Ok(image) => {
                let pixels = quantize::quantize(&image, |units| self.advance(units));
                self.results.push(ConversionResult {
                    filename: file.name.clone(),
                    pixels,
                    width: image.width(),
                    height: image.height(),
                });
            }
            Err(e) => self.skip(&file.name, e.to_string()),
        }
    }
}

/// Converts `files` in natural filename order, one after another.
pub async fn convert_batch(
    mut files: Vec<ImageFile>,
    config: &Config,
    observer: Box<dyn BatchObserver>,
) -> BatchState {
    order::sort_files(&mut files);
    let total = files.len();
    let mut state = BatchState::new(total, observer);
    log::info!("Starting batch of {total} file(s).");
    state.observer.on_progress(0.0);

    for (i, file) in files.into_iter().enumerate() {
        state.set_status(format!("Parsing {} {i}/{total}", file.name));

        let name = file.name.clone();
        let task_config = config.clone();
        let task = tokio::task::spawn_blocking(move || {
            let convert = || state.convert_file(&file, &task_config);
            if panic::catch_unwind(AssertUnwindSafe(convert)).is_err() {
                state.skip(&file.name, "Decoder crashed on this file.".to_owned());
            }
            state
        });
        state = match task.await {
            Ok(state) => state,
            Err(e) => {
                // Only happens when the runtime shuts down, the state is gone with the task.
                log::error!("Conversion of {name} did not finish: {e}");
                let mut state = BatchState::new(total, Box::new(()));
                let error = FileError::Io(std::io::Error::other(e.to_string()));
                state.skip(&name, error.to_string());
                state.set_status(format!("Batch aborted at {name}."));
                return state;
            }
        };
    }

    state.output_ready = true;
    state.set_status(STATUS_DONE.to_owned());
    state
}
