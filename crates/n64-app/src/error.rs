use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A group of module primitives that is probed by name
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Capability {
    Filesystem,
    Launch,
    SaveState,
    LoadState,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Capability::Filesystem => "filesystem injection (FS_createDataFile)",
            Capability::Launch => "launch entry point (startEmulator / callMain / run)",
            Capability::SaveState => "save entry point (_save_state / save_state)",
            Capability::LoadState => "load entry point (_load_state / load_state)",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GlueError {
    #[error("Fetching {url} failed with HTTP status {status}")]
    Fetch { url: String, status: u16 },

    #[error("Fetching {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Module does not expose a {0}")]
    CapabilityMissing(Capability),

    #[error("{entry} threw: {message}")]
    Runtime { entry: &'static str, message: String },

    #[error("Writing {path} into the module filesystem failed: {message}")]
    Filesystem { path: String, message: String },

    #[error("Invalid ROM reference: {0:?}")]
    InvalidResource(String),

    #[error("Module not ready after {0:?}")]
    Timeout(Duration),

    #[error("Module is not attached yet")]
    NotAttached,

    #[error("Superseded by a newer load")]
    Cancelled,
}

impl GlueError {
    pub fn transport(url: &str, message: impl Into<String>) -> Self {
        GlueError::Transport {
            url: url.to_owned(),
            message: message.into(),
        }
    }

    /// Cancellation is the normal end of a superseded load, not a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, GlueError::Cancelled)
    }
}
