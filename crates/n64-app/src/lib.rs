#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod config;
pub mod error;
pub mod gate;
pub mod launcher;
pub mod module;
pub mod mount;
pub mod prelude;
pub mod resource;
pub mod state_transfer;
pub mod status;
pub mod ticket;
pub mod timer;

#[cfg(any(test, feature = "testing-utils"))]
pub mod test_utils;

pub use app::App;
pub use config::LoaderConfig;
pub use error::GlueError;
