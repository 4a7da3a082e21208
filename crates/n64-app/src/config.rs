use crate::gate::GateSettings;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ROM: &str = "roms/game.z64";
pub const DEFAULT_MODULE_NAME: &str = "Module";
pub const DEFAULT_MOUNT_DIR: &str = "/";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("mount_dir must be absolute, got {0:?}")]
    RelativeMountDir(String),
}

/// DOM ids of the page controls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementIds {
    pub status: String,
    pub rom_select: String,
    pub load_button: String,
    pub toggle_mobile: String,
    pub save_button: String,
    pub load_state_button: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            status: "status".into(),
            rom_select: "rom-select".into(),
            load_button: "load-rom".into(),
            toggle_mobile: "toggle-mobile".into(),
            save_button: "save-state".into(),
            load_state_button: "load-state".into(),
        }
    }
}

/// Loader settings. Every field has a default, so a page can pass a partial object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoaderConfig {
    pub default_rom: String,
    /// Global name the emulator module is published under
    pub module_name: String,
    pub mount_dir: String,
    pub poll_interval_ms: u32,
    pub settle_delay_ms: u32,
    pub ready_timeout_ms: u32,
    pub autostart: bool,
    pub autostart_delay_ms: u32,
    pub mobile_class: String,
    pub log_level: LevelFilter,
    pub elements: ElementIds,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            default_rom: DEFAULT_ROM.into(),
            module_name: DEFAULT_MODULE_NAME.into(),
            mount_dir: DEFAULT_MOUNT_DIR.into(),
            poll_interval_ms: 50,
            settle_delay_ms: 50,
            ready_timeout_ms: 30_000,
            autostart: true,
            autostart_delay_ms: 500,
            mobile_class: "mobile".into(),
            log_level: LevelFilter::Info,
            elements: ElementIds::default(),
        }
    }
}

impl LoaderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("poll_interval_ms"));
        }
        if self.ready_timeout_ms == 0 {
            return Err(ConfigError::ZeroInterval("ready_timeout_ms"));
        }
        if self.module_name.is_empty() {
            return Err(ConfigError::Empty("module_name"));
        }
        if self.default_rom.trim().is_empty() {
            return Err(ConfigError::Empty("default_rom"));
        }
        if !self.mount_dir.starts_with('/') {
            return Err(ConfigError::RelativeMountDir(self.mount_dir.clone()));
        }
        Ok(())
    }

    pub fn gate_settings(&self) -> GateSettings {
        GateSettings {
            poll_interval: Duration::from_millis(self.poll_interval_ms as u64),
            settle_delay: Duration::from_millis(self.settle_delay_ms as u64),
            timeout: Duration::from_millis(self.ready_timeout_ms as u64),
        }
    }

    pub fn autostart_delay(&self) -> Duration {
        Duration::from_millis(self.autostart_delay_ms as u64)
    }
}
