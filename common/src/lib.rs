pub mod consts;
pub mod types;

pub mod protocols {
    pub mod web;
}

pub use consts::*;
pub use types::Rgb565;
