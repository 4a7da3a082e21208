use crate::app::event::AppEvent;
use crate::app::layout::Layout;
use crate::config::LoaderConfig;
use crate::error::GlueError;
use crate::gate::ReadinessGate;
use crate::launcher::Launcher;
use crate::module::{ModuleHandle, ModuleSurface};
use crate::mount::{HttpClient, RomMounter};
use crate::resource::RomRef;
use crate::state_transfer::StateTransfer;
use crate::status::{PageView, StatusReporter};
use crate::ticket::{LoadTicket, LoadTickets};
use crate::timer::Timer;
use once_cell::unsync::OnceCell;
use std::cell::Cell;
use std::rc::Rc;

/// The page glue: ties the page controls to the emulator module.
///
/// Every public operation is best-effort. Failures end up on the status line
/// and in the log, never in the caller.
pub struct App<S: ModuleSurface, H, T> {
    config: LoaderConfig,
    surface: Rc<S>,
    http: Rc<H>,
    gate: ReadinessGate<S, T>,
    handle: OnceCell<ModuleHandle<S::Entry>>,
    tickets: LoadTickets,

    // UI
    view: Rc<dyn PageView>,
    status: StatusReporter,
    layout: Cell<Layout>,
}

impl<S: ModuleSurface, H: HttpClient, T: Timer> App<S, H, T> {
    pub fn new(
        config: LoaderConfig,
        surface: Rc<S>,
        http: Rc<H>,
        timer: Rc<T>,
        view: Rc<dyn PageView>,
    ) -> Self {
        let gate = ReadinessGate::new(Rc::clone(&surface), timer, config.gate_settings());
        Self {
            config,
            surface,
            http,
            gate,
            handle: OnceCell::new(),
            tickets: LoadTickets::new(),
            status: StatusReporter::new(Rc::clone(&view)),
            view,
            layout: Cell::new(Layout::default()),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Current status line
    pub fn status(&self) -> String {
        self.status.last()
    }

    pub fn layout(&self) -> Layout {
        self.layout.get()
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    pub async fn handle_event(&self, event: AppEvent) {
        log::debug!("handling {event:?}");
        match event {
            AppEvent::LoadRom(reference) => self.load_rom(reference.as_deref()).await,
            AppEvent::SaveState => self.save_state(),
            AppEvent::LoadState => self.load_state(),
            AppEvent::ToggleLayout => {
                self.toggle_layout();
            }
        }
    }

    /// Wait for the module, fetch and mount, start. A newer call supersedes this one.
    pub async fn load_rom(&self, reference: Option<&str>) {
        let ticket = self.tickets.issue();
        match self.run_pipeline(reference, &ticket).await {
            Ok(filename) => log::debug!("load #{} finished with {filename}", ticket.id()),
            Err(e) => self.status.report_error("Failed to load ROM", &e),
        }
    }

    async fn run_pipeline(
        &self,
        reference: Option<&str>,
        ticket: &LoadTicket,
    ) -> Result<String, GlueError> {
        let reference = reference
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(&self.config.default_rom);
        let rom = RomRef::parse(reference)?;
        self.status.report(format!("Loading {rom}..."));

        if !self.gate.is_ready() {
            self.status.report("Waiting for the emulator module...");
        }
        self.gate.await_ready(ticket).await?;
        ticket.check()?;

        let filename = RomMounter::new(&*self.surface, &*self.http, &self.config.mount_dir)
            .guarded_by(ticket)
            .mount(rom.url(), rom.filename())
            .await?;
        ticket.check()?;

        self.attach();
        self.start(&filename);
        Ok(filename)
    }

    /// Resolves the module's entry points. Only the first call does any work.
    pub fn attach(&self) -> &ModuleHandle<S::Entry> {
        self.handle
            .get_or_init(|| ModuleHandle::attach(&*self.surface))
    }

    fn attached(&self) -> Result<&ModuleHandle<S::Entry>, GlueError> {
        if let Some(handle) = self.handle.get() {
            return Ok(handle);
        }
        if self.gate.is_ready() {
            return Ok(self.attach());
        }
        Err(GlueError::NotAttached)
    }

    /// Starts the emulator on an already mounted file
    pub fn start(&self, filename: &str) {
        let result = self.attached().and_then(|handle| {
            Launcher::new(handle.capabilities().launch.as_ref(), &self.config.mount_dir)
                .start(filename)
        });
        match result {
            Ok(entry) => self.status.report(format!("Running {filename} ({entry})")),
            Err(e) => self.status.report_error("Failed to start emulator", &e),
        }
    }

    pub fn save_state(&self) {
        let result = self
            .attached()
            .and_then(|handle| StateTransfer::new(handle.capabilities()).save());
        match result {
            Ok(entry) => self.status.report(format!("State saved ({entry})")),
            Err(e) => self.status.report_error("Save state failed", &e),
        }
    }

    pub fn load_state(&self) {
        let result = self
            .attached()
            .and_then(|handle| StateTransfer::new(handle.capabilities()).load());
        match result {
            Ok(entry) => self.status.report(format!("State loaded ({entry})")),
            Err(e) => self.status.report_error("Load state failed", &e),
        }
    }

    pub fn toggle_layout(&self) -> Layout {
        let layout = self.layout.get().toggled();
        self.layout.set(layout);
        if let Err(e) = self.view.apply_layout(layout) {
            log::warn!("could not apply {layout:?} layout: {e}");
        }
        layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::event::ClientMessage;
    use crate::module::{PRIMARY_ENTRY, Scope};
    use crate::test_utils::{FakeHttp, FakeModule, FakeTimer, Recorded, RecordingView};
    use futures::executor::{LocalPool, block_on};
    use futures::task::LocalSpawnExt;

    type TestApp = App<FakeModule, FakeHttp, FakeTimer>;

    const ROM: &[u8] = b"\x80\x37\x12\x40rom";

    struct Fixture {
        module: Rc<FakeModule>,
        http: Rc<FakeHttp>,
        timer: Rc<FakeTimer>,
        view: Rc<RecordingView>,
        app: Rc<TestApp>,
    }

    fn fixture(module: FakeModule, http: FakeHttp, timer: FakeTimer) -> Fixture {
        let _ = env_logger::builder().is_test(true).try_init();
        let module = Rc::new(module);
        let http = Rc::new(http);
        let timer = Rc::new(timer);
        let view = Rc::new(RecordingView::default());
        let app = Rc::new(App::new(
            LoaderConfig::default(),
            Rc::clone(&module),
            Rc::clone(&http),
            Rc::clone(&timer),
            view.clone(),
        ));
        Fixture {
            module,
            http,
            timer,
            view,
            app,
        }
    }

    fn initialized_module() -> FakeModule {
        let module = FakeModule::new();
        module.define(Scope::Module, PRIMARY_ENTRY);
        module
    }

    #[test]
    fn load_mounts_then_starts_with_call_main() {
        let f = fixture(
            initialized_module(),
            FakeHttp::new().serve("roms/game.z64", ROM),
            FakeTimer::instant(),
        );

        block_on(f.app.load_rom(None));

        let created = f.module.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].name, "game.z64");
        assert_eq!(created[0].data, ROM);
        assert_eq!(f.module.call_names(), vec!["callMain"]);
        assert_eq!(
            f.module.calls()[0].args,
            Recorded::List(vec!["/game.z64".into()])
        );
        assert_eq!(f.app.status(), "Running game.z64 (callMain)");
        assert!(f.app.is_ready());
    }

    #[test]
    fn blank_selection_falls_back_to_default_rom() {
        let f = fixture(
            initialized_module(),
            FakeHttp::new().serve("roms/game.z64", ROM),
            FakeTimer::instant(),
        );

        block_on(f.app.load_rom(Some("  ")));
        assert_eq!(f.http.requests(), vec!["roms/game.z64"]);
    }

    #[test]
    fn http_failure_is_reported_and_nothing_runs() {
        let f = fixture(
            initialized_module(),
            FakeHttp::new().respond("roms/bad.z64", 500, b""),
            FakeTimer::instant(),
        );

        block_on(f.app.load_rom(Some("roms/bad.z64")));
        assert_eq!(
            f.app.status(),
            "Failed to load ROM: Fetching roms/bad.z64 failed with HTTP status 500"
        );
        assert!(f.module.created().is_empty());
        assert!(f.module.calls().is_empty());
    }

    #[test]
    fn waits_for_module_that_shows_up_late() {
        let f = fixture(
            FakeModule::new().with_primary_after(3),
            FakeHttp::new().serve("roms/game.z64", ROM),
            FakeTimer::instant(),
        );

        block_on(f.app.load_rom(None));
        let statuses = f.view.statuses();
        assert!(statuses.contains(&"Waiting for the emulator module...".to_string()));
        assert_eq!(f.app.status(), "Running game.z64 (callMain)");
    }

    #[test]
    fn mount_waits_until_module_filesystem_exists() {
        let f = fixture(
            FakeModule::new()
                .with_primary_after(3)
                .with_filesystem_after_primary(),
            FakeHttp::new().serve("roms/game.z64", ROM),
            FakeTimer::instant(),
        );
        assert!(!f.module.has_create_data_file());

        block_on(f.app.load_rom(None));
        assert_eq!(f.app.status(), "Running game.z64 (callMain)");
        assert!(f.module.probes() > 3);
        let created = f.module.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].name, "game.z64");
    }

    #[test]
    fn timed_out_load_never_fetches_or_mounts() {
        let f = fixture(
            FakeModule::new(),
            FakeHttp::new().serve("roms/game.z64", ROM),
            FakeTimer::instant(),
        );

        block_on(f.app.load_rom(None));
        assert!(f.http.requests().is_empty());
        assert!(f.module.created().is_empty());
    }

    #[test]
    fn module_that_never_appears_times_out() {
        let f = fixture(
            FakeModule::new(),
            FakeHttp::new().serve("roms/game.z64", ROM),
            FakeTimer::instant(),
        );

        block_on(f.app.load_rom(None));
        assert_eq!(f.app.status(), "Failed to load ROM: Module not ready after 30s");
        assert!(!f.app.is_ready());
    }

    #[test]
    fn start_without_launch_entry_reports_capability() {
        let f = fixture(FakeModule::new(), FakeHttp::new(), FakeTimer::instant());
        f.app.attach();

        f.app.start("game.z64");
        assert!(f.module.calls().is_empty());
        assert!(
            f.app
                .status()
                .starts_with("Failed to start emulator: Module does not expose a launch entry point")
        );
    }

    #[test]
    fn throwing_launch_leaves_app_usable() {
        let module = FakeModule::new();
        module.define_throwing(Scope::Module, PRIMARY_ENTRY, "RuntimeError: unreachable");
        module.define(Scope::Module, "_save_state");
        let f = fixture(
            module,
            FakeHttp::new().serve("roms/game.z64", ROM),
            FakeTimer::instant(),
        );

        block_on(f.app.load_rom(None));
        assert_eq!(
            f.app.status(),
            "Failed to start emulator: callMain threw: RuntimeError: unreachable"
        );

        f.app.save_state();
        assert_eq!(f.app.status(), "State saved (_save_state)");
    }

    #[test]
    fn save_before_module_is_ready() {
        let f = fixture(FakeModule::new(), FakeHttp::new(), FakeTimer::instant());
        f.module.define(Scope::Module, "_save_state");

        f.app.save_state();
        assert_eq!(f.app.status(), "Save state failed: Module is not attached yet");
        assert!(f.module.calls().is_empty());
    }

    #[test]
    fn save_prefers_module_level_entry() {
        let f = fixture(FakeModule::new(), FakeHttp::new(), FakeTimer::instant());
        f.module.define(Scope::Module, "_save_state");
        f.module.define(Scope::Page, "save_state");
        f.app.attach();

        f.app.save_state();
        assert_eq!(f.module.call_names(), vec!["_save_state"]);
    }

    #[test]
    fn load_state_failure_is_reported() {
        let f = fixture(FakeModule::new(), FakeHttp::new(), FakeTimer::instant());
        f.module.define_throwing(Scope::Page, "load_state", "no save found");
        f.app.attach();

        f.app.load_state();
        assert_eq!(
            f.app.status(),
            "Load state failed: load_state threw: no save found"
        );
    }

    #[test]
    fn toggle_layout_only_touches_the_view() {
        let f = fixture(FakeModule::new(), FakeHttp::new(), FakeTimer::instant());

        assert_eq!(f.app.toggle_layout(), Layout::Mobile);
        assert_eq!(f.app.toggle_layout(), Layout::Desktop);
        assert_eq!(f.view.layouts(), vec![Layout::Mobile, Layout::Desktop]);
        assert!(f.module.calls().is_empty());
    }

    #[test]
    fn client_messages_drive_the_same_operations() {
        let f = fixture(FakeModule::new(), FakeHttp::new(), FakeTimer::instant());
        f.module.define(Scope::Page, "load_state");
        f.app.attach();

        block_on(f.app.handle_event(ClientMessage::LoadState.into()));
        block_on(f.app.handle_event(ClientMessage::ToggleLayout.into()));
        assert_eq!(f.module.call_names(), vec!["load_state"]);
        assert_eq!(f.app.layout(), Layout::Mobile);
    }

    #[test]
    fn newer_load_supersedes_pending_one() {
        let f = fixture(
            FakeModule::new().with_vacant_init_slot(),
            FakeHttp::new()
                .serve("roms/a.z64", ROM)
                .serve("roms/b.z64", ROM),
            FakeTimer::frozen(),
        );
        f.module.define(Scope::Page, "startEmulator");

        let mut pool = LocalPool::new();
        for url in ["roms/a.z64", "roms/b.z64"] {
            let app = Rc::clone(&f.app);
            pool.spawner()
                .spawn_local(async move { app.load_rom(Some(url)).await })
                .unwrap();
        }
        pool.run_until_stalled();
        assert!(f.module.calls().is_empty());

        f.module.fire_runtime_initialized();
        pool.run_until_stalled();

        assert_eq!(f.module.calls().len(), 1);
        assert_eq!(f.module.calls()[0].args, Recorded::Path("/b.z64".into()));
        assert_eq!(f.http.requests(), vec!["roms/b.z64"]);
        let created = f.module.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].name, "b.z64");
        assert_eq!(f.app.status(), "Running b.z64 (startEmulator)");
    }
}
