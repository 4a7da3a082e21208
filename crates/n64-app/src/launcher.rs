use crate::error::{Capability, GlueError};
use crate::module::{EntryPoint, Slot};
use crate::resource::mount_path;

/// Starts the emulator on a mounted file through whichever launch entry the
/// module was attached with
pub struct Launcher<'a, E> {
    slot: Option<&'a Slot<E>>,
    mount_dir: &'a str,
}

impl<'a, E: EntryPoint> Launcher<'a, E> {
    pub fn new(slot: Option<&'a Slot<E>>, mount_dir: &'a str) -> Self {
        Self { slot, mount_dir }
    }

    /// Returns the name of the entry point that was called
    pub fn start(&self, filename: &str) -> Result<&'static str, GlueError> {
        let slot = self
            .slot
            .ok_or(GlueError::CapabilityMissing(Capability::Launch))?;
        let path = mount_path(self.mount_dir, filename);

        log::info!("launching {path} via {}", slot.name());
        slot.invoke_with_path(&path)
            .map_err(|message| GlueError::Runtime {
                entry: slot.name(),
                message,
            })?;
        Ok(slot.name())
    }
}
