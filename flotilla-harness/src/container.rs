//! Phase dispatch for one test instance.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

use flotilla_protocol::{TestCase, TestPhase};

use crate::context::TestContext;
use crate::error::{IllegalTest, TestError};
use crate::plan::{LoadTest, PhaseFn, Scope, SetupStep, TestPlan};
use crate::properties::{parse_property, Configurable, PropertyBinding};
use crate::strategy::{select_strategy, RunStrategy};

type PhaseTask = Box<dyn Fn(&TestContext) -> Result<(), TestError> + Send + Sync>;

const DEFAULT_THREAD_COUNT: usize = 10;

/// Settings the container itself consumes from the property bag.
struct ContainerSettings {
    thread_count: usize,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        ContainerSettings {
            thread_count: DEFAULT_THREAD_COUNT,
        }
    }
}

impl Configurable for ContainerSettings {
    fn apply_property(&mut self, name: &str, value: &str) -> Result<bool, IllegalTest> {
        if name == "thread_count" {
            self.thread_count = parse_property(name, value)?;
            return Ok(true);
        }
        Ok(false)
    }
}

/// Drives one test instance through its lifecycle phases.
///
/// Construction binds the test case properties, collects the test's plan and
/// selects its run strategy, so a container that exists is known to be well
/// formed. [`TestContainer::invoke`] then executes individual phases on
/// demand; the coordinator decides ordering.
pub struct TestContainer {
    case: TestCase,
    ctx: TestContext,
    tasks: BTreeMap<TestPhase, PhaseTask>,
    strategy: Box<dyn RunStrategy>,
}

impl TestContainer {
    /// Builds a container for a test type with a `Default` instance.
    pub fn new<T: LoadTest + Default>(
        ctx: TestContext,
        case: TestCase,
    ) -> Result<Self, IllegalTest> {
        Self::with_instance(ctx, T::default(), case)
    }

    /// Builds a container around an already constructed test instance.
    ///
    /// Fails when a property value cannot be applied, when the test declares
    /// no run strategy or more than one, or when a supplied property is
    /// consumed by nothing.
    pub fn with_instance<T: LoadTest>(
        ctx: TestContext,
        instance: T,
        case: TestCase,
    ) -> Result<Self, IllegalTest> {
        let mut binding = PropertyBinding::new(&case.properties);

        let mut settings = ContainerSettings::default();
        binding.bind(&mut settings)?;

        let mut instance = instance;
        binding.bind(&mut instance)?;
        let instance = Arc::new(RwLock::new(instance));

        let mut plan = TestPlan::new();
        T::plan(&mut plan);

        let strategy = select_strategy(&case.id, &plan, &instance, settings.thread_count)?;
        let tasks = build_tasks(plan, &instance);

        binding.ensure_all_consumed()?;

        Ok(TestContainer {
            case,
            ctx,
            tasks,
            strategy,
        })
    }

    /// Executes one lifecycle phase.
    ///
    /// Phases the test never registered are a no-op. The run phase executes
    /// the selected strategy; all other phases run their registered steps in
    /// order with exclusive access to the instance. A panic inside test code
    /// is caught here and reported as [`TestError::Fault`].
    pub fn invoke(&self, phase: TestPhase) -> Result<(), TestError> {
        if phase == TestPhase::Run {
            return catch_faults(|| self.strategy.execute(&self.ctx));
        }
        match self.tasks.get(&phase) {
            Some(task) => catch_faults(|| task(&self.ctx)),
            None => Ok(()),
        }
    }

    /// Whether the run phase is executing right now.
    pub fn is_running(&self) -> bool {
        self.strategy.is_running()
    }

    /// Iterations completed by the run strategy so far.
    pub fn iterations(&self) -> u64 {
        self.strategy.iterations()
    }

    /// Unix timestamp in milliseconds of the last run start, 0 before any.
    pub fn started_at_millis(&self) -> u64 {
        self.strategy.started_at_millis()
    }

    /// The test case this container was built from.
    pub fn test_case(&self) -> &TestCase {
        &self.case
    }

    /// The context handed to test code.
    pub fn context(&self) -> &TestContext {
        &self.ctx
    }
}

impl fmt::Debug for TestContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContainer")
            .field("test_id", &self.case.id)
            .field("phases", &self.tasks.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn build_tasks<T: LoadTest>(
    plan: TestPlan<T>,
    instance: &Arc<RwLock<T>>,
) -> BTreeMap<TestPhase, PhaseTask> {
    let mut tasks = BTreeMap::new();

    if !plan.setup.is_empty() {
        let steps = plan.setup;
        let shared = Arc::clone(instance);
        let task: PhaseTask = Box::new(move |ctx| {
            let mut instance = shared.write().map_err(|_| TestError::poisoned_lock())?;
            for step in &steps {
                match step {
                    SetupStep::Plain(f) => f(&mut instance)?,
                    SetupStep::WithContext(f) => f(&mut instance, ctx)?,
                }
            }
            Ok(())
        });
        tasks.insert(TestPhase::Setup, task);
    }

    insert_scoped(&mut tasks, TestPhase::LocalWarmup, Scope::Local, &plan.warmup, instance);
    insert_scoped(&mut tasks, TestPhase::GlobalWarmup, Scope::Global, &plan.warmup, instance);
    insert_scoped(&mut tasks, TestPhase::LocalVerify, Scope::Local, &plan.verify, instance);
    insert_scoped(&mut tasks, TestPhase::GlobalVerify, Scope::Global, &plan.verify, instance);
    insert_scoped(
        &mut tasks,
        TestPhase::LocalTeardown,
        Scope::Local,
        &plan.teardown,
        instance,
    );
    insert_scoped(
        &mut tasks,
        TestPhase::GlobalTeardown,
        Scope::Global,
        &plan.teardown,
        instance,
    );

    tasks
}

fn insert_scoped<T: LoadTest>(
    tasks: &mut BTreeMap<TestPhase, PhaseTask>,
    phase: TestPhase,
    scope: Scope,
    steps: &[(Scope, PhaseFn<T>)],
    instance: &Arc<RwLock<T>>,
) {
    let selected: Vec<PhaseFn<T>> = steps
        .iter()
        .filter(|(step_scope, _)| *step_scope == scope)
        .map(|(_, step)| *step)
        .collect();
    if selected.is_empty() {
        return;
    }

    let shared = Arc::clone(instance);
    let task: PhaseTask = Box::new(move |_ctx| {
        let mut instance = shared.write().map_err(|_| TestError::poisoned_lock())?;
        for step in &selected {
            step(&mut instance)?;
        }
        Ok(())
    });
    tasks.insert(phase, task);
}

fn catch_faults(f: impl FnOnce() -> Result<(), TestError>) -> Result<(), TestError> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(TestError::Fault(panic_message(payload))),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
