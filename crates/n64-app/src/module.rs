//! The external emulator module, seen from the page.
//!
//! The module is an opaque runtime published by its own loader script. Its
//! surface differs between builds, so everything here is probed by name:
//! [`ModuleSurface`] answers "does this function exist, and where", and the
//! candidate tables below fix the order in which names are tried.

pub mod capabilities;
pub mod handle;

pub use capabilities::{Capabilities, Slot};
pub use handle::ModuleHandle;

/// Where a probed function lives
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    /// A property of the module object
    Module,
    /// A global function defined by the page
    Page,
}

/// How a candidate expects to receive the ROM path
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CallShape {
    /// `f(path)`
    Path,
    /// `f([path])`, the emscripten `callMain` convention
    ArgList,
    /// `f()`
    Nullary,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EntrySpec {
    pub scope: Scope,
    pub name: &'static str,
    pub shape: CallShape,
}

impl EntrySpec {
    const fn new(scope: Scope, name: &'static str, shape: CallShape) -> Self {
        Self { scope, name, shape }
    }
}

/// Presence of this function means the runtime finished initializing
pub const PRIMARY_ENTRY: &str = "callMain";

pub const LAUNCH_CANDIDATES: [EntrySpec; 3] = [
    EntrySpec::new(Scope::Page, "startEmulator", CallShape::Path),
    EntrySpec::new(Scope::Module, "callMain", CallShape::ArgList),
    EntrySpec::new(Scope::Page, "run", CallShape::Path),
];

pub const SAVE_CANDIDATES: [EntrySpec; 2] = [
    EntrySpec::new(Scope::Module, "_save_state", CallShape::Nullary),
    EntrySpec::new(Scope::Page, "save_state", CallShape::Nullary),
];

pub const LOAD_CANDIDATES: [EntrySpec; 2] = [
    EntrySpec::new(Scope::Module, "_load_state", CallShape::Nullary),
    EntrySpec::new(Scope::Page, "load_state", CallShape::Nullary),
];

/// Arguments handed to an entry point
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CallArgs<'a> {
    None,
    Path(&'a str),
    ArgList(&'a [String]),
}

/// A function found on the module or the page
pub trait EntryPoint {
    /// Calls the function. `Err` carries whatever the function threw.
    fn invoke(&self, args: CallArgs<'_>) -> Result<(), String>;
}

/// A callback somebody else registered in the init slot before us
pub trait InitCallback {
    fn call(self) -> Result<(), String>;
}

/// State of the module's "runtime initialized" callback slot
pub enum InitSlot<C> {
    /// The module (or the slot) does not exist
    Absent,
    /// The slot exists but holds no function
    Vacant,
    Occupied(C),
}

impl<C> InitSlot<C> {
    pub fn is_present(&self) -> bool {
        !matches!(self, InitSlot::Absent)
    }
}

/// Everything the loader needs from the module and the page around it.
///
/// Implementations look the module up lazily: it may not exist yet when the
/// loader starts.
pub trait ModuleSurface {
    type Entry: EntryPoint;
    type InitCallback: InitCallback + 'static;

    fn lookup(&self, scope: Scope, name: &str) -> Option<Self::Entry>;

    fn has_function(&self, scope: Scope, name: &str) -> bool {
        self.lookup(scope, name).is_some()
    }

    fn init_slot(&self) -> InitSlot<Self::InitCallback>;

    /// Replaces whatever is in the init slot with `callback`
    fn set_init_callback(&self, callback: Box<dyn FnOnce()>);

    fn has_create_data_file(&self) -> bool;

    fn create_data_file(
        &self,
        parent: &str,
        name: &str,
        data: &[u8],
        can_read: bool,
        can_write: bool,
    ) -> Result<(), String>;

    fn unlink(&self, path: &str) -> Result<(), String>;
}
