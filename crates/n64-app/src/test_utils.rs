//! In-memory stand-ins for the module, the network, timers and the page.

use crate::app::layout::Layout;
use crate::error::GlueError;
use crate::module::{CallArgs, EntryPoint, InitCallback, InitSlot, ModuleSurface, PRIMARY_ENTRY, Scope};
use crate::mount::{HttpClient, HttpResponse};
use crate::status::PageView;
use crate::timer::Timer;
use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Recorded {
    Nullary,
    Path(String),
    List(Vec<String>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub scope: Scope,
    pub name: String,
    pub args: Recorded,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedFile {
    pub parent: String,
    pub name: String,
    pub data: Vec<u8>,
    pub can_read: bool,
    pub can_write: bool,
}

#[derive(Clone)]
enum Behavior {
    Succeed,
    Throw(String),
}

pub struct FakeEntry {
    scope: Scope,
    name: String,
    behavior: Behavior,
    calls: Rc<RefCell<Vec<Call>>>,
}

impl EntryPoint for FakeEntry {
    fn invoke(&self, args: CallArgs<'_>) -> Result<(), String> {
        let args = match args {
            CallArgs::None => Recorded::Nullary,
            CallArgs::Path(p) => Recorded::Path(p.to_owned()),
            CallArgs::ArgList(list) => Recorded::List(list.to_vec()),
        };
        self.calls.borrow_mut().push(Call {
            scope: self.scope,
            name: self.name.clone(),
            args,
        });
        match &self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Throw(message) => Err(message.clone()),
        }
    }
}

/// Callback a page registered in `onRuntimeInitialized` before the loader
pub struct FakeInitCallback {
    ran: Rc<Cell<bool>>,
    fails: bool,
}

impl InitCallback for FakeInitCallback {
    fn call(self) -> Result<(), String> {
        self.ran.set(true);
        if self.fails {
            Err("previous callback blew up".into())
        } else {
            Ok(())
        }
    }
}

enum FakeSlot {
    Absent,
    Vacant,
    Previous { fails: bool },
}

/// A scriptable emulator module
pub struct FakeModule {
    functions: RefCell<HashMap<(Scope, String), Behavior>>,
    calls: Rc<RefCell<Vec<Call>>>,

    slot: RefCell<FakeSlot>,
    previous_ran: Rc<Cell<bool>>,
    installed: RefCell<Option<Box<dyn FnOnce()>>>,
    install_count: Cell<usize>,

    /// Module-scope lookups of the primary entry that still come back empty
    hidden_probes: Cell<usize>,
    probes: Cell<usize>,

    filesystem: Cell<bool>,
    filesystem_needs_primary: Cell<bool>,
    unlink_fails: Cell<bool>,
    create_fails: Cell<bool>,
    created: RefCell<Vec<CreatedFile>>,
    unlinked: RefCell<Vec<String>>,
}

impl Default for FakeModule {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeModule {
    pub fn new() -> Self {
        Self {
            functions: RefCell::new(HashMap::new()),
            calls: Rc::new(RefCell::new(Vec::new())),
            slot: RefCell::new(FakeSlot::Absent),
            previous_ran: Rc::new(Cell::new(false)),
            installed: RefCell::new(None),
            install_count: Cell::new(0),
            hidden_probes: Cell::new(0),
            probes: Cell::new(0),
            filesystem: Cell::new(true),
            filesystem_needs_primary: Cell::new(false),
            unlink_fails: Cell::new(true),
            create_fails: Cell::new(false),
            created: RefCell::new(Vec::new()),
            unlinked: RefCell::new(Vec::new()),
        }
    }

    pub fn define(&self, scope: Scope, name: &str) {
        self.functions
            .borrow_mut()
            .insert((scope, name.to_owned()), Behavior::Succeed);
    }

    pub fn define_throwing(&self, scope: Scope, name: &str, message: &str) {
        self.functions
            .borrow_mut()
            .insert((scope, name.to_owned()), Behavior::Throw(message.to_owned()));
    }

    pub fn with_vacant_init_slot(self) -> Self {
        *self.slot.borrow_mut() = FakeSlot::Vacant;
        self
    }

    pub fn with_previous_init_callback(self, fails: bool) -> Self {
        *self.slot.borrow_mut() = FakeSlot::Previous { fails };
        self
    }

    /// The primary entry stays invisible for the first `probes` lookups
    pub fn with_primary_after(self, probes: usize) -> Self {
        self.define(Scope::Module, PRIMARY_ENTRY);
        self.hidden_probes.set(probes);
        self
    }

    /// `FS_createDataFile` shows up together with the primary entry
    pub fn with_filesystem_after_primary(self) -> Self {
        self.filesystem_needs_primary.set(true);
        self
    }

    fn primary_visible(&self) -> bool {
        self.hidden_probes.get() == 0
            && self
                .functions
                .borrow()
                .contains_key(&(Scope::Module, PRIMARY_ENTRY.to_owned()))
    }

    pub fn without_filesystem(self) -> Self {
        self.filesystem.set(false);
        self
    }

    pub fn with_failing_create(self) -> Self {
        self.create_fails.set(true);
        self
    }

    /// Runs the callback the loader put into the init slot, like the runtime would
    pub fn fire_runtime_initialized(&self) -> bool {
        let installed = self.installed.borrow_mut().take();
        match installed {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn call_names(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.name.clone()).collect()
    }

    pub fn created(&self) -> Vec<CreatedFile> {
        self.created.borrow().clone()
    }

    pub fn unlinked(&self) -> Vec<String> {
        self.unlinked.borrow().clone()
    }

    pub fn previous_callback_ran(&self) -> bool {
        self.previous_ran.get()
    }

    pub fn install_count(&self) -> usize {
        self.install_count.get()
    }

    pub fn probes(&self) -> usize {
        self.probes.get()
    }
}

impl ModuleSurface for FakeModule {
    type Entry = FakeEntry;
    type InitCallback = FakeInitCallback;

    fn lookup(&self, scope: Scope, name: &str) -> Option<FakeEntry> {
        if scope == Scope::Module && name == PRIMARY_ENTRY {
            self.probes.set(self.probes.get() + 1);
            let hidden = self.hidden_probes.get();
            if hidden > 0 {
                self.hidden_probes.set(hidden - 1);
                return None;
            }
        }
        let behavior = self.functions.borrow().get(&(scope, name.to_owned())).cloned()?;
        Some(FakeEntry {
            scope,
            name: name.to_owned(),
            behavior,
            calls: Rc::clone(&self.calls),
        })
    }

    fn init_slot(&self) -> InitSlot<FakeInitCallback> {
        if self.installed.borrow().is_some() {
            // our own hook sits in the slot now
            return InitSlot::Vacant;
        }
        match &*self.slot.borrow() {
            FakeSlot::Absent => InitSlot::Absent,
            FakeSlot::Vacant => InitSlot::Vacant,
            FakeSlot::Previous { fails } => InitSlot::Occupied(FakeInitCallback {
                ran: Rc::clone(&self.previous_ran),
                fails: *fails,
            }),
        }
    }

    fn set_init_callback(&self, callback: Box<dyn FnOnce()>) {
        self.install_count.set(self.install_count.get() + 1);
        *self.installed.borrow_mut() = Some(callback);
    }

    fn has_create_data_file(&self) -> bool {
        self.filesystem.get() && (!self.filesystem_needs_primary.get() || self.primary_visible())
    }

    fn create_data_file(
        &self,
        parent: &str,
        name: &str,
        data: &[u8],
        can_read: bool,
        can_write: bool,
    ) -> Result<(), String> {
        if self.create_fails.get() {
            return Err("ENOSPC".into());
        }
        self.created.borrow_mut().push(CreatedFile {
            parent: parent.to_owned(),
            name: name.to_owned(),
            data: data.to_vec(),
            can_read,
            can_write,
        });
        Ok(())
    }

    fn unlink(&self, path: &str) -> Result<(), String> {
        self.unlinked.borrow_mut().push(path.to_owned());
        if self.unlink_fails.get() {
            Err("ENOENT".into())
        } else {
            Ok(())
        }
    }
}

/// Serves canned responses; unknown urls get a 404
#[derive(Default)]
pub struct FakeHttp {
    responses: RefCell<HashMap<String, Result<HttpResponse, String>>>,
    requests: RefCell<Vec<String>>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(self, url: &str, body: &[u8]) -> Self {
        self.respond(url, 200, body)
    }

    pub fn respond(self, url: &str, status: u16, body: &[u8]) -> Self {
        self.responses.borrow_mut().insert(
            url.to_owned(),
            Ok(HttpResponse {
                status,
                body: body.to_vec(),
            }),
        );
        self
    }

    pub fn refuse(self, url: &str, message: &str) -> Self {
        self.responses
            .borrow_mut()
            .insert(url.to_owned(), Err(message.to_owned()));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl HttpClient for FakeHttp {
    fn get<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<HttpResponse, GlueError>> {
        self.requests.borrow_mut().push(url.to_owned());
        let result = match self.responses.borrow().get(url) {
            Some(Ok(response)) => Ok(response.clone()),
            Some(Err(message)) => Err(GlueError::transport(url, message.clone())),
            None => Ok(HttpResponse {
                status: 404,
                body: Vec::new(),
            }),
        };
        future::ready(result).boxed_local()
    }
}

/// Sleeps finish immediately, or never when frozen. Requested delays are recorded.
#[derive(Default)]
pub struct FakeTimer {
    frozen: Cell<bool>,
    slept: RefCell<Vec<Duration>>,
}

impl FakeTimer {
    pub fn instant() -> Self {
        Self::default()
    }

    pub fn frozen() -> Self {
        let timer = Self::default();
        timer.frozen.set(true);
        timer
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.slept.borrow().clone()
    }

    pub fn total_slept(&self) -> Duration {
        self.slept.borrow().iter().sum()
    }
}

impl Timer for FakeTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        self.slept.borrow_mut().push(duration);
        if self.frozen.get() {
            future::pending().boxed_local()
        } else {
            future::ready(()).boxed_local()
        }
    }
}

#[derive(Default)]
pub struct RecordingView {
    statuses: RefCell<Vec<String>>,
    layouts: RefCell<Vec<Layout>>,
    broken: bool,
}

impl RecordingView {
    pub fn failing() -> Self {
        Self {
            broken: true,
            ..Default::default()
        }
    }

    pub fn statuses(&self) -> Vec<String> {
        self.statuses.borrow().clone()
    }

    pub fn layouts(&self) -> Vec<Layout> {
        self.layouts.borrow().clone()
    }
}

impl PageView for RecordingView {
    fn show_status(&self, message: &str) -> Result<(), String> {
        if self.broken {
            return Err("no #status element".into());
        }
        self.statuses.borrow_mut().push(message.to_owned());
        Ok(())
    }

    fn apply_layout(&self, layout: Layout) -> Result<(), String> {
        if self.broken {
            return Err("no <body>".into());
        }
        self.layouts.borrow_mut().push(layout);
        Ok(())
    }
}
