use core::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::{BLUE_BITS, GREEN_BITS, RED_BITS};

const RED_MAX: u16 = (1 << RED_BITS) - 1;
const GREEN_MAX: u16 = (1 << GREEN_BITS) - 1;
const BLUE_MAX: u16 = (1 << BLUE_BITS) - 1;

/// One packed pixel: red in bits 15..11, green in 10..5, blue in 4..0.
///
/// The bit layout is done by the `rgb565` crate, this type only adds the C literal formatting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Rgb565(pub u16);

impl Rgb565 {
    /// Packs already quantized components, which must fit their 5/6/5 bits.
    pub fn from_components(r5: u8, g6: u8, b5: u8) -> Self {
        Self(rgb565::Rgb565::from_rgb565_components(r5, g6, b5).to_rgb565())
    }

    /// The quantized `[r5, g6, b5]` components.
    pub fn components(self) -> [u8; 3] {
        rgb565::Rgb565::from_rgb565(self.0).to_rgb565_components()
    }

    pub fn red(self) -> u8 {
        self.components()[0]
    }

    pub fn green(self) -> u8 {
        self.components()[1]
    }

    pub fn blue(self) -> u8 {
        self.components()[2]
    }

    /// Scales the components back to 8 bits, rounding to the nearest value.
    pub fn to_rgb888(self) -> [u8; 3] {
        let [r, g, b] = self.components();
        [expand(r, RED_MAX), expand(g, GREEN_MAX), expand(b, BLUE_MAX)]
    }
}

fn expand(component: u8, max: u16) -> u8 {
    (f64::from(component) * 255.0 / f64::from(max)).round() as u8
}

impl From<Rgb565> for u16 {
    fn from(value: Rgb565) -> Self {
        value.0
    }
}

impl fmt::UpperHex for Rgb565 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

impl fmt::LowerHex for Rgb565 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// C literal form used in the generated header, e.g. `0x07E0`.
impl fmt::Display for Rgb565 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}
