use crate::error::{Capability, GlueError};
use crate::module::{Capabilities, EntryPoint, Slot};

/// Save-state and load-state requests. Both are single best-effort calls;
/// the state format belongs to the module.
pub struct StateTransfer<'a, E> {
    capabilities: &'a Capabilities<E>,
}

impl<'a, E: EntryPoint> StateTransfer<'a, E> {
    pub fn new(capabilities: &'a Capabilities<E>) -> Self {
        Self { capabilities }
    }

    pub fn save(&self) -> Result<&'static str, GlueError> {
        fire(self.capabilities.save.as_ref(), Capability::SaveState)
    }

    pub fn load(&self) -> Result<&'static str, GlueError> {
        fire(self.capabilities.load.as_ref(), Capability::LoadState)
    }
}

fn fire<E: EntryPoint>(slot: Option<&Slot<E>>, capability: Capability) -> Result<&'static str, GlueError> {
    let slot = slot.ok_or(GlueError::CapabilityMissing(capability))?;
    log::debug!("calling {}", slot.name());
    slot.invoke().map_err(|message| GlueError::Runtime {
        entry: slot.name(),
        message,
    })?;
    Ok(slot.name())
}
