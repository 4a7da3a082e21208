use serde::{Deserialize, Serialize};

/// Something the page asked the loader to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Load and start a ROM; `None` means the configured default
    LoadRom(Option<String>),
    SaveState,
    LoadState,
    ToggleLayout,
}

/// `postMessage` payloads accepted from an embedding page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    LoadRom {
        #[serde(default)]
        url: Option<String>,
    },
    SaveState,
    LoadState,
    ToggleLayout,
}

impl From<ClientMessage> for AppEvent {
    fn from(message: ClientMessage) -> Self {
        match message {
            ClientMessage::LoadRom { url } => AppEvent::LoadRom(url),
            ClientMessage::SaveState => AppEvent::SaveState,
            ClientMessage::LoadState => AppEvent::LoadState,
            ClientMessage::ToggleLayout => AppEvent::ToggleLayout,
        }
    }
}

/// Posted back to the embedding page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LoaderNotice {
    Status { message: String },
}
