use std::{
    future::Future,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, OnceLock, PoisonError,
    },
    time::Duration,
};

use futures::FutureExt;
use wiring_di::{CloseError, DiBuilder, DiContainer, OneShotLatch, TeardownReport};

use crate::{
    errors::LifecycleError,
    state::{LifecycleState, StateCell},
};

/// Handoff between whoever closes the registry and everyone waiting for it
pub type ShutdownSignal = OneShotLatch<CloseReport>;

/// Callback run once after the registry was torn down, before waiters are released
pub type CloseHook = Box<dyn FnOnce(&CloseReport) + Send>;

/// Callback run once when closing begins, before anything is torn down
pub type ClosingHook = Box<dyn FnOnce() + Send>;

/// Final state of a closed registry
#[derive(Debug, Clone)]
pub struct CloseReport {
    /// The registry no longer resolves anything
    pub inactive: bool,
    pub teardown: TeardownReport,
}

/// Starts a registry and shuts it down exactly once
///
/// Cheap to clone - hand a clone to every shutdown trigger and waiter.
#[derive(Clone)]
pub struct LifecycleController(Arc<ControllerInner>);
struct ControllerInner {
    state: StateCell,
    /// Claimed by the start in progress
    starting: AtomicBool,
    container: OnceLock<DiContainer>,
    /// None once closing has begun
    hooks: Mutex<Option<Hooks>>,
    signal: ShutdownSignal,
}

#[derive(Default)]
struct Hooks {
    closing: Vec<ClosingHook>,
    closed: Vec<CloseHook>,
}

/// Gives the start claim back unless the start went through
struct StartClaim<'a>(Option<&'a AtomicBool>);
impl StartClaim<'_> {
    fn keep(mut self) {
        self.0 = None;
    }
}
impl Drop for StartClaim<'_> {
    fn drop(&mut self) {
        if let Some(starting) = self.0.take() {
            starting.store(false, Ordering::Release);
        }
    }
}

impl Default for LifecycleController {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LifecycleController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleController")
            .field("state", &self.state())
            .field("container", &self.0.container.get())
            .finish()
    }
}

impl LifecycleController {
    pub fn new() -> Self {
        Self(Arc::new(ControllerInner {
            state: StateCell::new(),
            starting: AtomicBool::new(false),
            container: OnceLock::new(),
            hooks: Mutex::new(Some(Hooks::default())),
            signal: ShutdownSignal::new(),
        }))
    }

    pub fn state(&self) -> LifecycleState {
        self.0.state.get()
    }

    /// The started registry
    pub fn container(&self) -> Option<&DiContainer> {
        self.0.container.get()
    }

    /// Wires the registry and makes it active
    ///
    /// Wiring errors are returned as is and leave the controller not started.
    /// A start while another one is still wiring fails with [LifecycleError::AlreadyStarted]
    /// without running any factory.
    pub async fn start(&self, builder: DiBuilder) -> Result<DiContainer, LifecycleError> {
        self.start_inner(builder, None).await
    }

    /// Like [LifecycleController::start], giving up if wiring takes longer than `timeout`
    pub async fn start_timeout(
        &self,
        builder: DiBuilder,
        timeout: Duration,
    ) -> Result<DiContainer, LifecycleError> {
        self.start_inner(builder, Some(timeout)).await
    }

    async fn start_inner(
        &self,
        builder: DiBuilder,
        timeout: Option<Duration>,
    ) -> Result<DiContainer, LifecycleError> {
        if self.0.starting.swap(true, Ordering::AcqRel) {
            return Err(LifecycleError::AlreadyStarted);
        }
        // Released again if wiring fails or this future is dropped
        let claim = StartClaim(Some(&self.0.starting));

        tracing::info!("Starting registry with {} entries", builder.len());
        let container = match timeout {
            Some(timeout) => builder.build_timeout(timeout).await?,
            None => builder.build().await?,
        };

        if let Err(container) = self.0.container.set(container.clone()) {
            let _ = container.close();
            return Err(LifecycleError::AlreadyStarted);
        }

        self.0
            .state
            .transition(LifecycleState::NotStarted, LifecycleState::Active)
            .map_err(|_| LifecycleError::AlreadyStarted)?;
        claim.keep();

        tracing::info!("Registry active: {:?}", container.names());
        Ok(container)
    }

    /// Registers a hook run after teardown, before waiters are released
    ///
    /// Returns false if closing has already begun, the hook is then dropped without running.
    pub fn on_close(&self, hook: impl FnOnce(&CloseReport) + Send + 'static) -> bool {
        match self.lock_hooks().as_mut() {
            Some(hooks) => {
                hooks.closed.push(Box::new(hook));
                true
            }
            None => false,
        }
    }

    /// Registers a hook run when closing begins, before the registry is torn down
    ///
    /// Runs whatever triggered the close. Returns false if closing has already begun.
    pub fn on_closing(&self, hook: impl FnOnce() + Send + 'static) -> bool {
        match self.lock_hooks().as_mut() {
            Some(hooks) => {
                hooks.closing.push(Box::new(hook));
                true
            }
            None => false,
        }
    }

    /// Closes the registry, reports the outcome and releases all waiters
    ///
    /// Safe to call from several threads at once: exactly one caller tears the registry down,
    /// the others block until it is done and return the same report.
    pub fn close_and_report(&self) -> Result<CloseReport, LifecycleError> {
        match self
            .0
            .state
            .transition(LifecycleState::Active, LifecycleState::Closing)
        {
            Ok(()) => Ok(self.run_close()),
            Err(LifecycleState::NotStarted) => Err(LifecycleError::NotStarted),
            Err(state) => {
                tracing::debug!("Registry is {state}, waiting for the close in progress");
                self.await_close()
            }
        }
    }

    /// Performs the close - only ever entered once
    fn run_close(&self) -> CloseReport {
        tracing::info!("Shutting down registry ...");
        let hooks = self.lock_hooks().take().unwrap_or_default();
        for hook in hooks.closing {
            if catch_unwind(AssertUnwindSafe(hook)).is_err() {
                tracing::error!("A closing hook panicked");
            }
        }

        let (inactive, teardown) = match self.0.container.get() {
            Some(container) => {
                let teardown = match container.close() {
                    Ok(teardown) => teardown,
                    Err(CloseError::AlreadyClosed) => {
                        tracing::warn!(
                            "Registry was closed bypassing the lifecycle controller, waiting for its teardown"
                        );
                        container.await_teardown()
                    }
                };
                (!container.is_active(), teardown)
            }
            // Active is only entered after the container was set
            None => (true, TeardownReport::default()),
        };
        let report = CloseReport { inactive, teardown };

        for hook in hooks.closed {
            if catch_unwind(AssertUnwindSafe(|| hook(&report))).is_err() {
                tracing::error!("A close hook panicked");
            }
        }

        if report.inactive {
            tracing::info!("Shutdown completed with OK/inactive");
        } else {
            tracing::error!("Shutdown completed with FAIL/still active");
        }

        // Closed is only published after teardown and hooks finished
        let _ = self
            .0
            .state
            .transition(LifecycleState::Closing, LifecycleState::Closed);
        self.0.signal.signal(report.clone());

        report
    }

    /// Blocks until the registry has been closed
    ///
    /// Returns immediately if that already happened.
    pub fn await_close(&self) -> Result<CloseReport, LifecycleError> {
        self.0
            .signal
            .wait_blocking()
            .map_err(|_| LifecycleError::SignalDropped)
    }

    /// Blocks until the registry has been closed or `timeout` elapsed
    ///
    /// Returns `Ok(None)` on timeout.
    pub fn await_close_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Option<CloseReport>, LifecycleError> {
        self.0
            .signal
            .wait_timeout(timeout)
            .map_err(|_| LifecycleError::SignalDropped)
    }

    /// Resolves once the registry has been closed
    pub fn closed(&self) -> impl Future<Output = Result<CloseReport, LifecycleError>> + Send + 'static {
        self.0
            .signal
            .wait()
            .map(|result| result.map_err(|_| LifecycleError::SignalDropped))
    }

    /// Same as `state() == LifecycleState::Closed`
    pub fn is_closed(&self) -> bool {
        self.state() == LifecycleState::Closed
    }

    fn lock_hooks(&self) -> MutexGuard<'_, Option<Hooks>> {
        self.0
            .hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
