//! Renders converted frames into the `frames.h` text.
//!
//! The layout is fixed, downstream firmware builds include the file as is:
//!
//! ```text
//!
//! /*
//! * Used files with the same order:
//! * - first.png
//! * -second.png
//! */
//!
//! int frames=2;
//! int frameWidth=W;
//! int frameHeight=H;
//!
//! const unsigned short PROGMEM frame[][W*H] = {{0xF800, ...},
//! {...}};
//! ```

use std::fmt::Write;

use common::Rgb565;

use crate::error::HeaderError;

/// The durable output of converting one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub filename: String,
    pub pixels: Vec<Rgb565>,
    pub width: u32,
    pub height: u32,
}

// "0xABCD"
const LITERAL_LEN: u64 = 6;
// ", "
const SEPARATOR_LEN: u64 = 2;

/// Renders the header for `results` in their given order.
///
/// Dimensions come from the first frame and every other frame has to match them. Nothing is
/// allocated before the size check against `max_bytes` passed.
pub fn render(results: &[ConversionResult], max_bytes: u64) -> Result<String, HeaderError> {
    let first = results.first().ok_or(HeaderError::EmptyBatch)?;
    for result in &results[1..] {
        if result.width != first.width || result.height != first.height {
            return Err(HeaderError::FrameMismatch {
                file: result.filename.clone(),
                width: result.width,
                height: result.height,
                first_width: first.width,
                first_height: first.height,
            });
        }
    }

    let needed = estimate_len(results).ok_or(HeaderError::SizeOverflow {
        needed: u64::MAX,
        limit: max_bytes,
    })?;
    if needed > max_bytes {
        return Err(HeaderError::SizeOverflow {
            needed,
            limit: max_bytes,
        });
    }
    let capacity = usize::try_from(needed).map_err(|_| HeaderError::SizeOverflow {
        needed,
        limit: max_bytes,
    })?;

    let mut text = String::new();
    text.try_reserve(capacity).map_err(|_| HeaderError::SizeOverflow {
        needed,
        limit: max_bytes,
    })?;

    let filenames: Vec<&str> = results.iter().map(|r| r.filename.as_str()).collect();
    write!(
        text,
        "\n/*\n* Used files with the same order:\n* - {}\n*/\n\n",
        filenames.join("\n* -")
    )?;
    write!(
        text,
        "int frames={};\nint frameWidth={};\nint frameHeight={};\n\n",
        results.len(),
        first.width,
        first.height
    )?;
    write!(text, "const unsigned short PROGMEM frame[][{}] = {{", first.pixels.len())?;
    for (i, result) in results.iter().enumerate() {
        if i > 0 {
            text.push_str(",\n");
        }
        write_row(&mut text, &result.pixels)?;
    }
    text.push_str("};\n    ");

    Ok(text)
}

fn write_row(text: &mut String, pixels: &[Rgb565]) -> Result<(), HeaderError> {
    text.push('{');
    for (i, px) in pixels.iter().enumerate() {
        if i > 0 {
            text.push_str(", ");
        }
        write!(text, "{px}")?;
    }
    text.push('}');
    Ok(())
}

// Upper bound of the rendered length. `None` if it does not even fit into a u64.
fn estimate_len(results: &[ConversionResult]) -> Option<u64> {
    let mut len: u64 = 256;
    for result in results {
        let count = result.pixels.len() as u64;
        let row = count
            .checked_mul(LITERAL_LEN + SEPARATOR_LEN)?
            .checked_add(4)?;
        len = len
            .checked_add(row)?
            .checked_add(result.filename.len() as u64 + 4)?;
    }
    Some(len)
}
