//! Test definition surface.
//!
//! A [`LoadTest`] describes its lifecycle by registering plain function
//! pointers on a [`TestPlan`]. Registration happens exactly once, during
//! container construction, and the resulting plan is immutable afterwards.

use std::sync::Arc;

use crate::context::TestContext;
use crate::error::TestError;
use crate::properties::Configurable;

/// Where a phase step runs across the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// On every worker hosting the test.
    Local,
    /// On one designated worker only.
    Global,
}

/// A phase step with exclusive access to the test instance.
pub type PhaseFn<T> = fn(&mut T) -> Result<(), TestError>;

/// A setup step that also receives the test context.
pub type SetupContextFn<T> = fn(&mut T, &TestContext) -> Result<(), TestError>;

/// The body of a primordial run strategy.
pub type RunFn<T> = fn(&T) -> Result<(), TestError>;

/// A factory producing the worker that drives load during the run phase.
pub type WorkerFactoryFn<T> = fn(&T) -> Result<Arc<dyn LoadWorker>, TestError>;

/// One time step, invoked repeatedly until the context stops.
pub type TimeStepFn<T> = fn(&T) -> Result<(), TestError>;

/// A long-lived worker driving load during the run phase.
pub trait LoadWorker: Send + Sync {
    /// Runs the workload until the context is stopped.
    fn run(&self, ctx: &TestContext) -> Result<(), TestError>;

    /// Number of workload iterations completed so far.
    fn iterations(&self) -> u64 {
        0
    }
}

/// A load test definition.
///
/// Implementations receive their configuration through [`Configurable`] and
/// describe their lifecycle by registering steps on the plan passed to
/// [`LoadTest::plan`]. Every test must register exactly one kind of run
/// strategy: a `run` body, a `run_with_worker` factory, or one or more
/// `time_step` functions.
pub trait LoadTest: Configurable + Send + Sync + 'static {
    /// Registers this test's phase steps and run strategy.
    fn plan(plan: &mut TestPlan<Self>)
    where
        Self: Sized;
}

pub(crate) enum SetupStep<T> {
    Plain(PhaseFn<T>),
    WithContext(SetupContextFn<T>),
}

impl<T> Clone for SetupStep<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SetupStep<T> {}

/// The registered lifecycle of one load test.
pub struct TestPlan<T> {
    pub(crate) setup: Vec<SetupStep<T>>,
    pub(crate) warmup: Vec<(Scope, PhaseFn<T>)>,
    pub(crate) verify: Vec<(Scope, PhaseFn<T>)>,
    pub(crate) teardown: Vec<(Scope, PhaseFn<T>)>,
    pub(crate) run: Vec<RunFn<T>>,
    pub(crate) run_with_worker: Vec<WorkerFactoryFn<T>>,
    pub(crate) time_steps: Vec<TimeStepFn<T>>,
}

impl<T> TestPlan<T> {
    pub(crate) fn new() -> Self {
        TestPlan {
            setup: Vec::new(),
            warmup: Vec::new(),
            verify: Vec::new(),
            teardown: Vec::new(),
            run: Vec::new(),
            run_with_worker: Vec::new(),
            time_steps: Vec::new(),
        }
    }

    /// Registers a setup step. Steps run in registration order.
    pub fn setup(&mut self, step: PhaseFn<T>) -> &mut Self {
        self.setup.push(SetupStep::Plain(step));
        self
    }

    /// Registers a setup step that receives the test context.
    pub fn setup_with_context(&mut self, step: SetupContextFn<T>) -> &mut Self {
        self.setup.push(SetupStep::WithContext(step));
        self
    }

    /// Registers a warmup step for the given scope.
    pub fn warmup(&mut self, scope: Scope, step: PhaseFn<T>) -> &mut Self {
        self.warmup.push((scope, step));
        self
    }

    /// Registers a verification step for the given scope.
    pub fn verify(&mut self, scope: Scope, step: PhaseFn<T>) -> &mut Self {
        self.verify.push((scope, step));
        self
    }

    /// Registers a teardown step for the given scope.
    pub fn teardown(&mut self, scope: Scope, step: PhaseFn<T>) -> &mut Self {
        self.teardown.push((scope, step));
        self
    }

    /// Registers the primordial run body. At most one per test.
    pub fn run(&mut self, body: RunFn<T>) -> &mut Self {
        self.run.push(body);
        self
    }

    /// Registers the worker factory. At most one per test.
    pub fn run_with_worker(&mut self, factory: WorkerFactoryFn<T>) -> &mut Self {
        self.run_with_worker.push(factory);
        self
    }

    /// Registers a time step. A test may register several; each run
    /// iteration executes all of them in registration order.
    pub fn time_step(&mut self, step: TimeStepFn<T>) -> &mut Self {
        self.time_steps.push(step);
        self
    }
}
