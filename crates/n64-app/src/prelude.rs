//! Convenient imports for hosts embedding the loader
//!
//! ```rust
//! use n64_app::prelude::*;
//! ```

// Application
pub use crate::app::App;
pub use crate::app::event::{AppEvent, ClientMessage, LoaderNotice};
pub use crate::app::layout::Layout;
pub use crate::config::{ElementIds, LoaderConfig};
pub use crate::error::{Capability, GlueError};

// Traits a host implements
pub use crate::module::{CallArgs, EntryPoint, InitCallback, InitSlot, ModuleSurface, Scope};
pub use crate::mount::{HttpClient, HttpResponse};
pub use crate::status::PageView;
pub use crate::timer::Timer;

// Conditional testing utilities
#[cfg(feature = "testing-utils")]
pub use crate::test_utils::*;
