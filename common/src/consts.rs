/// The generated header is always handed out under this name.
pub const OUTPUT_FILENAME: &str = "frames.h";

/// Every selected file gets the same share of the batch progress.
pub const PROGRESS_UNITS_PER_FILE: f64 = 100.0;

/// Media types starting with this prefix are eligible for decoding.
pub const IMAGE_MIME_PREFIX: &str = "image/";
/// Animated input is refused, frames have to be supplied one file each.
pub const GIF_MIME: &str = "image/gif";
pub const FALLBACK_MIME: &str = "application/octet-stream";

pub const RED_BITS: u32 = 5;
pub const GREEN_BITS: u32 = 6;
pub const BLUE_BITS: u32 = 5;
pub const RGBA_BYTES_PER_PIXEL: usize = 4;

pub const STATUS_SELECT_FILES: &str = "Select file(s)";
pub const STATUS_DONE: &str = "Done. Now you can download the code!";
pub const STATUS_SERIALIZING: &str = "Parsing..";
pub const STATUS_DOWNLOAD_READY: &str = "Download ready!";
pub const STATUS_HEADER_FAILED: &str = "Error while generating header file.";
