#[allow(clippy::module_inception)]
pub mod app;
pub mod event;
pub mod layout;

pub use app::App;
