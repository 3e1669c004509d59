pub mod batch;
pub mod config;
pub mod decode;
pub mod error;
pub mod handlers;
pub mod header;
pub mod order;
pub mod progress;
pub mod quantize;
