use crate::module::{
    CallArgs, CallShape, EntryPoint, EntrySpec, LAUNCH_CANDIDATES, LOAD_CANDIDATES,
    ModuleSurface, SAVE_CANDIDATES,
};

/// A resolved entry point together with the candidate it matched
pub struct Slot<E> {
    pub spec: EntrySpec,
    pub entry: E,
}

impl<E: EntryPoint> Slot<E> {
    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    /// Calls the entry with `path` shaped the way this candidate expects it
    pub fn invoke_with_path(&self, path: &str) -> Result<(), String> {
        match self.spec.shape {
            CallShape::Path => self.entry.invoke(CallArgs::Path(path)),
            CallShape::ArgList => {
                let args = [path.to_owned()];
                self.entry.invoke(CallArgs::ArgList(&args))
            }
            CallShape::Nullary => self.entry.invoke(CallArgs::None),
        }
    }

    pub fn invoke(&self) -> Result<(), String> {
        self.entry.invoke(CallArgs::None)
    }
}

/// First candidate the surface actually exposes, in table order
pub fn resolve<S: ModuleSurface>(surface: &S, candidates: &[EntrySpec]) -> Option<Slot<S::Entry>> {
    candidates.iter().find_map(|spec| {
        surface
            .lookup(spec.scope, spec.name)
            .map(|entry| Slot { spec: *spec, entry })
    })
}

/// Entry points resolved once, when the module is attached
pub struct Capabilities<E> {
    pub launch: Option<Slot<E>>,
    pub save: Option<Slot<E>>,
    pub load: Option<Slot<E>>,
}

impl<E: EntryPoint> Capabilities<E> {
    pub fn resolve<S: ModuleSurface<Entry = E>>(surface: &S) -> Self {
        Self {
            launch: resolve(surface, &LAUNCH_CANDIDATES),
            save: resolve(surface, &SAVE_CANDIDATES),
            load: resolve(surface, &LOAD_CANDIDATES),
        }
    }

    pub fn summary(&self) -> String {
        fn name<E>(slot: &Option<Slot<E>>) -> &'static str {
            slot.as_ref().map_or("-", |s| s.spec.name)
        }
        format!(
            "launch={} save={} load={}",
            name(&self.launch),
            name(&self.save),
            name(&self.load)
        )
    }
}
