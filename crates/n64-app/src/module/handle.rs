use crate::module::{Capabilities, EntryPoint, ModuleSurface};

/// The attached module. Created once the readiness gate opens and never
/// replaced for the rest of the session.
pub struct ModuleHandle<E> {
    capabilities: Capabilities<E>,
}

impl<E: EntryPoint> ModuleHandle<E> {
    pub fn attach<S: ModuleSurface<Entry = E>>(surface: &S) -> Self {
        let capabilities = Capabilities::resolve(surface);
        log::info!("module attached ({})", capabilities.summary());
        Self { capabilities }
    }

    pub fn capabilities(&self) -> &Capabilities<E> {
        &self.capabilities
    }
}
