//! Waits for the external module to finish initializing.
//!
//! Builds of the module disagree on how they announce readiness, so the gate
//! accepts three shapes, tried in order:
//!
//! 1. an `onRuntimeInitialized` slot exists: chain onto it (any callback
//!    already registered runs first) and open when it fires;
//! 2. the primary entry point is already exported: open after a short settle
//!    delay;
//! 3. neither: poll until one of them shows up, then settle.
//!
//! Once open, the gate stays open. Every wait is bounded by a timeout and
//! gives up early when its load ticket is superseded.

use crate::error::GlueError;
use crate::module::{InitCallback, InitSlot, ModuleSurface, PRIMARY_ENTRY, Scope};
use crate::ticket::LoadTicket;
use crate::timer::Timer;
use futures::channel::oneshot;
use futures::future::{self, Either};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GateSettings {
    pub poll_interval: Duration,
    pub settle_delay: Duration,
    pub timeout: Duration,
}

/// How the gate decided the module was ready
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Readiness {
    AlreadyReady,
    Callback,
    EntryPresent,
    Polled,
}

#[derive(Default)]
struct GateState {
    ready: Cell<bool>,
    hooked: Cell<bool>,
    waiters: RefCell<Vec<oneshot::Sender<()>>>,
}

impl GateState {
    fn open(&self) {
        self.ready.set(true);
        let waiters: Vec<_> = self.waiters.borrow_mut().drain(..).collect();
        for waiter in waiters {
            // receiver may belong to a cancelled load
            let _ = waiter.send(());
        }
    }
}

pub struct ReadinessGate<S, T> {
    surface: Rc<S>,
    timer: Rc<T>,
    settings: GateSettings,
    state: Rc<GateState>,
}

impl<S: ModuleSurface, T: Timer> ReadinessGate<S, T> {
    pub fn new(surface: Rc<S>, timer: Rc<T>, settings: GateSettings) -> Self {
        Self {
            surface,
            timer,
            settings,
            state: Rc::new(GateState::default()),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state.ready.get()
    }

    pub async fn await_ready(&self, ticket: &LoadTicket) -> Result<Readiness, GlueError> {
        if self.is_ready() {
            return Ok(Readiness::AlreadyReady);
        }

        let slot = self.surface.init_slot();
        let readiness = if slot.is_present() {
            self.wait_for_callback(slot, ticket).await?
        } else if self.surface.has_function(Scope::Module, PRIMARY_ENTRY) {
            self.settle(ticket).await?;
            Readiness::EntryPresent
        } else {
            log::debug!("module not initialized yet, polling");
            self.poll(ticket).await?;
            Readiness::Polled
        };

        log::info!("module ready ({readiness:?})");
        Ok(readiness)
    }

    fn hook_init_slot(&self, slot: InitSlot<S::InitCallback>) {
        if self.state.hooked.replace(true) {
            return;
        }
        let previous = match slot {
            InitSlot::Occupied(callback) => Some(callback),
            InitSlot::Absent | InitSlot::Vacant => None,
        };
        let state = Rc::clone(&self.state);
        self.surface.set_init_callback(Box::new(move || {
            if let Some(previous) = previous
                && let Err(e) = previous.call()
            {
                log::warn!("earlier onRuntimeInitialized handler failed: {e}");
            }
            state.open();
        }));
    }

    async fn wait_for_callback(
        &self,
        slot: InitSlot<S::InitCallback>,
        ticket: &LoadTicket,
    ) -> Result<Readiness, GlueError> {
        let (tx, mut rx) = oneshot::channel();
        self.state.waiters.borrow_mut().push(tx);
        self.hook_init_slot(slot);

        let mut waited = Duration::ZERO;
        loop {
            match future::select(rx, self.timer.sleep(self.settings.poll_interval)).await {
                Either::Left((Ok(()), _)) => return Ok(Readiness::Callback),
                Either::Left((Err(_), _)) => return Err(GlueError::Cancelled),
                Either::Right(((), pending)) => {
                    rx = pending;
                    waited += self.settings.poll_interval;
                    ticket.check()?;
                    if self.is_ready() {
                        return Ok(Readiness::Callback);
                    }
                    // the runtime may have initialized before the hook went in
                    if self.surface.has_function(Scope::Module, PRIMARY_ENTRY) {
                        self.settle(ticket).await?;
                        return Ok(Readiness::EntryPresent);
                    }
                    if waited >= self.settings.timeout {
                        return Err(GlueError::Timeout(self.settings.timeout));
                    }
                }
            }
        }
    }

    async fn poll(&self, ticket: &LoadTicket) -> Result<(), GlueError> {
        let mut waited = Duration::ZERO;
        while waited < self.settings.timeout {
            self.timer.sleep(self.settings.poll_interval).await;
            waited += self.settings.poll_interval;
            ticket.check()?;

            if self.is_ready() {
                return Ok(());
            }
            if self.surface.init_slot().is_present()
                || self.surface.has_function(Scope::Module, PRIMARY_ENTRY)
            {
                log::debug!("module appeared after {waited:?}");
                return self.settle(ticket).await;
            }
        }
        Err(GlueError::Timeout(self.settings.timeout))
    }

    async fn settle(&self, ticket: &LoadTicket) -> Result<(), GlueError> {
        self.timer.sleep(self.settings.settle_delay).await;
        self.state.open();
        ticket.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeModule, FakeTimer};
    use crate::ticket::LoadTickets;
    use futures::executor::{LocalPool, block_on};
    use futures::task::LocalSpawnExt;

    const SETTINGS: GateSettings = GateSettings {
        poll_interval: Duration::from_millis(10),
        settle_delay: Duration::from_millis(25),
        timeout: Duration::from_millis(100),
    };

    fn gate(module: &Rc<FakeModule>, timer: &Rc<FakeTimer>) -> ReadinessGate<FakeModule, FakeTimer> {
        ReadinessGate::new(Rc::clone(module), Rc::clone(timer), SETTINGS)
    }

    type Outcome = Rc<RefCell<Option<Result<Readiness, GlueError>>>>;

    fn spawn_wait(
        pool: &LocalPool,
        gate: &Rc<ReadinessGate<FakeModule, FakeTimer>>,
        tickets: &LoadTickets,
    ) -> Outcome {
        let outcome: Outcome = Rc::new(RefCell::new(None));
        let out = Rc::clone(&outcome);
        let gate = Rc::clone(gate);
        let ticket = tickets.issue();
        pool.spawner()
            .spawn_local(async move {
                let result = gate.await_ready(&ticket).await;
                *out.borrow_mut() = Some(result);
            })
            .unwrap();
        outcome
    }

    #[test]
    fn exported_entry_opens_after_settle_delay() {
        let module = Rc::new(FakeModule::new());
        module.define(Scope::Module, PRIMARY_ENTRY);
        let timer = Rc::new(FakeTimer::instant());
        let gate = gate(&module, &timer);

        let ticket = LoadTickets::new().issue();
        assert_eq!(block_on(gate.await_ready(&ticket)), Ok(Readiness::EntryPresent));
        assert_eq!(timer.slept(), vec![SETTINGS.settle_delay]);
        assert!(gate.is_ready());
    }

    #[test]
    fn polls_until_entry_appears() {
        let module = Rc::new(FakeModule::new().with_primary_after(3));
        let timer = Rc::new(FakeTimer::instant());
        let gate = gate(&module, &timer);

        let ticket = LoadTickets::new().issue();
        assert_eq!(block_on(gate.await_ready(&ticket)), Ok(Readiness::Polled));
        assert_eq!(
            timer.slept(),
            vec![
                SETTINGS.poll_interval,
                SETTINGS.poll_interval,
                SETTINGS.poll_interval,
                SETTINGS.settle_delay
            ]
        );
    }

    #[test]
    fn readiness_is_monotonic() {
        let module = Rc::new(FakeModule::new().with_primary_after(1));
        let timer = Rc::new(FakeTimer::instant());
        let gate = gate(&module, &timer);
        let tickets = LoadTickets::new();

        block_on(gate.await_ready(&tickets.issue())).unwrap();
        let probes = module.probes();
        let sleeps = timer.slept().len();

        assert_eq!(
            block_on(gate.await_ready(&tickets.issue())),
            Ok(Readiness::AlreadyReady)
        );
        assert_eq!(module.probes(), probes);
        assert_eq!(timer.slept().len(), sleeps);
    }

    #[test]
    fn polling_gives_up_at_timeout() {
        let module = Rc::new(FakeModule::new());
        let timer = Rc::new(FakeTimer::instant());
        let gate = gate(&module, &timer);

        let ticket = LoadTickets::new().issue();
        assert_eq!(
            block_on(gate.await_ready(&ticket)),
            Err(GlueError::Timeout(SETTINGS.timeout))
        );
        assert_eq!(timer.total_slept(), SETTINGS.timeout);
        assert!(!gate.is_ready());
    }

    #[test]
    fn superseded_ticket_stops_polling() {
        let module = Rc::new(FakeModule::new());
        let timer = Rc::new(FakeTimer::instant());
        let gate = gate(&module, &timer);

        let tickets = LoadTickets::new();
        let stale = tickets.issue();
        let _newer = tickets.issue();
        assert_eq!(block_on(gate.await_ready(&stale)), Err(GlueError::Cancelled));
        assert_eq!(timer.slept().len(), 1);
    }

    #[test]
    fn init_callback_opens_gate() {
        let module = Rc::new(FakeModule::new().with_vacant_init_slot());
        let timer = Rc::new(FakeTimer::frozen());
        let gate = Rc::new(gate(&module, &timer));
        let tickets = LoadTickets::new();
        let mut pool = LocalPool::new();

        let outcome = spawn_wait(&pool, &gate, &tickets);
        pool.run_until_stalled();
        assert!(outcome.borrow().is_none());
        assert_eq!(module.install_count(), 1);

        assert!(module.fire_runtime_initialized());
        pool.run_until_stalled();
        assert_eq!(*outcome.borrow(), Some(Ok(Readiness::Callback)));
        assert!(gate.is_ready());
    }

    #[test]
    fn earlier_callback_runs_first_and_its_failure_is_swallowed() {
        let module = Rc::new(FakeModule::new().with_previous_init_callback(true));
        let timer = Rc::new(FakeTimer::frozen());
        let gate = Rc::new(gate(&module, &timer));
        let tickets = LoadTickets::new();
        let mut pool = LocalPool::new();

        let outcome = spawn_wait(&pool, &gate, &tickets);
        pool.run_until_stalled();
        module.fire_runtime_initialized();
        pool.run_until_stalled();

        assert!(module.previous_callback_ran());
        assert_eq!(*outcome.borrow(), Some(Ok(Readiness::Callback)));
    }

    #[test]
    fn concurrent_waiters_share_one_hook() {
        let module = Rc::new(FakeModule::new().with_vacant_init_slot());
        let timer = Rc::new(FakeTimer::frozen());
        let gate = Rc::new(gate(&module, &timer));
        let tickets = LoadTickets::new();
        let mut pool = LocalPool::new();

        // separate ticket sources so neither waiter supersedes the other
        let first = spawn_wait(&pool, &gate, &tickets);
        let second = spawn_wait(&pool, &gate, &LoadTickets::new());
        pool.run_until_stalled();
        assert_eq!(module.install_count(), 1);

        module.fire_runtime_initialized();
        pool.run_until_stalled();
        assert_eq!(*first.borrow(), Some(Ok(Readiness::Callback)));
        assert_eq!(*second.borrow(), Some(Ok(Readiness::Callback)));
    }

    #[test]
    fn init_slot_that_already_fired_falls_back_to_entry() {
        let module = Rc::new(FakeModule::new().with_vacant_init_slot());
        module.define(Scope::Module, PRIMARY_ENTRY);
        let timer = Rc::new(FakeTimer::instant());
        let gate = gate(&module, &timer);

        let ticket = LoadTickets::new().issue();
        assert_eq!(block_on(gate.await_ready(&ticket)), Ok(Readiness::EntryPresent));
        assert_eq!(timer.slept(), vec![SETTINGS.poll_interval, SETTINGS.settle_delay]);
        assert!(gate.is_ready());
    }

    #[test]
    fn silent_init_slot_times_out() {
        let module = Rc::new(FakeModule::new().with_vacant_init_slot());
        let timer = Rc::new(FakeTimer::instant());
        let gate = gate(&module, &timer);

        let ticket = LoadTickets::new().issue();
        assert_eq!(
            block_on(gate.await_ready(&ticket)),
            Err(GlueError::Timeout(SETTINGS.timeout))
        );
    }
}
