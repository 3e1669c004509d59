use std::path::{Path, PathBuf};

use anyhow::Context;
use argh::FromArgs;
use common::{FALLBACK_MIME, OUTPUT_FILENAME};
use frames_server::{
    batch::{self, BatchObserver},
    config::Config,
    decode::ImageFile,
    error::{FileError, Result},
};
use image::ImageFormat;

#[derive(FromArgs)]
/// Convert image files into a frames.h header of RGB565 arrays.
struct Args {
    /// output header path, defaults to frames.h
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,

    /// input images, one per frame
    #[argh(positional)]
    inputs: Vec<PathBuf>,
}

/// Logs the batch the way the web client would show it.
struct LogObserver {
    last_step: u32,
}

impl BatchObserver for LogObserver {
    fn on_status(&mut self, _status: &str) {}

    fn on_progress(&mut self, percent: f64) {
        let step = (percent / 10.0).floor() as u32;
        if step > self.last_step {
            self.last_step = step;
            log::info!("{:.0} %", percent);
        }
    }
}

fn mime_for(path: &Path) -> &'static str {
    ImageFormat::from_path(path)
        .map(|format| format.to_mime_type())
        .unwrap_or(FALLBACK_MIME)
}

async fn read_file(path: &Path) -> std::result::Result<ImageFile, FileError> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let bytes = tokio::fs::read(path).await?;
    Ok(ImageFile::new(name, bytes, mime_for(path)))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Args = argh::from_env();
    let config = Config::from_env()?;

    let mut files = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        match read_file(path).await {
            Ok(file) => files.push(file),
            Err(e) => log::warn!("Skipping {}: {e}", path.display()),
        }
    }

    let observer = Box::new(LogObserver { last_step: 0 });
    let state = batch::convert_batch(files, &config, observer).await;
    let text = state.render_header(&config)?;

    let output = args.output.unwrap_or_else(|| PathBuf::from(OUTPUT_FILENAME));
    tokio::fs::write(&output, text)
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;
    log::info!(
        "Wrote {} frame(s) to {}.",
        state.results().len(),
        output.display()
    );
    Ok(())
}
