use std::{
    env,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    str::FromStr,
};

use anyhow::Context;

use crate::error::Result;

const DEFAULT_ADDRESS: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 3000);

/// Limits and addresses for the converter. Every field can be overridden from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// `FRAMES_ADDRESS`
    pub address: SocketAddr,
    /// `FRAMES_UPLOAD_LIMIT`, whole multipart body in bytes.
    pub upload_limit: usize,
    /// `FRAMES_MAX_PIXELS`, per image.
    pub max_pixels: u64,
    /// `FRAMES_MAX_DECODE_BYTES`, allocation budget handed to the decoder.
    pub max_decode_bytes: u64,
    /// `FRAMES_MAX_HEADER_BYTES`, above this the header is refused as too large.
    pub max_header_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            upload_limit: 32 * 1024 * 1024,
            max_pixels: 40_000_000,
            max_decode_bytes: 512 * 1024 * 1024,
            max_header_bytes: 256 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Reads `.env` if there is one, then applies the `FRAMES_*` variables on top of the defaults.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => log::info!("Loaded environment from {}.", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e).context("failed to load .env file"),
        }

        let defaults = Self::default();
        Ok(Self {
            address: var_or("FRAMES_ADDRESS", defaults.address)?,
            upload_limit: var_or("FRAMES_UPLOAD_LIMIT", defaults.upload_limit)?,
            max_pixels: var_or("FRAMES_MAX_PIXELS", defaults.max_pixels)?,
            max_decode_bytes: var_or("FRAMES_MAX_DECODE_BYTES", defaults.max_decode_bytes)?,
            max_header_bytes: var_or("FRAMES_MAX_HEADER_BYTES", defaults.max_header_bytes)?,
        })
    }
}

fn var_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("invalid value '{value}' for {name}")),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(e) => Err(e).with_context(|| format!("failed to read {name}")),
    }
}
