//! Run strategy selection and execution.
//!
//! Every test declares exactly one way to drive load: a single primordial
//! `run` body, a `run_with_worker` factory, or one or more `time_step`
//! functions. Selection happens once at container construction and fails
//! fast when a test declares none or several.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::context::TestContext;
use crate::error::{IllegalTest, TestError};
use crate::plan::{LoadWorker, RunFn, TestPlan, TimeStepFn, WorkerFactoryFn};

/// The kind of run strategy a test declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    /// A single body owning the whole run phase.
    Primordial,
    /// A factory producing a [`LoadWorker`] that owns the run phase.
    RunWithWorker,
    /// Time steps invoked in a loop until the context stops.
    TimeStep,
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunKind::Primordial => "run",
            RunKind::RunWithWorker => "run_with_worker",
            RunKind::TimeStep => "time_step",
        };
        write!(f, "{name}")
    }
}

/// Executes the run phase of a test and exposes live introspection.
pub trait RunStrategy: Send + Sync {
    /// Runs the test until completion or until the context is stopped.
    fn execute(&self, ctx: &TestContext) -> Result<(), TestError>;

    /// Whether the run phase is executing right now.
    fn is_running(&self) -> bool;

    /// Iterations completed so far, for strategies that count them.
    fn iterations(&self) -> u64;

    /// Unix timestamp in milliseconds of the last run start, 0 before any.
    fn started_at_millis(&self) -> u64;
}

impl fmt::Debug for dyn RunStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn RunStrategy")
    }
}

/// Picks the single declared strategy, or reports why that is impossible.
pub(crate) fn select_strategy<T: Send + Sync + 'static>(
    test_id: &str,
    plan: &TestPlan<T>,
    instance: &Arc<RwLock<T>>,
    thread_count: usize,
) -> Result<Box<dyn RunStrategy>, IllegalTest> {
    let mut kinds = Vec::new();
    if !plan.run.is_empty() {
        kinds.push(RunKind::Primordial);
    }
    if !plan.run_with_worker.is_empty() {
        kinds.push(RunKind::RunWithWorker);
    }
    if !plan.time_steps.is_empty() {
        kinds.push(RunKind::TimeStep);
    }

    match kinds.as_slice() {
        [] => Err(IllegalTest::MissingRunStrategy {
            test_id: test_id.to_string(),
        }),
        [RunKind::Primordial] => {
            ensure_single(test_id, RunKind::Primordial, plan.run.len())?;
            Ok(Box::new(PrimordialRun {
                instance: Arc::clone(instance),
                body: plan.run[0],
                running: AtomicBool::new(false),
                started_at: AtomicU64::new(0),
            }))
        }
        [RunKind::RunWithWorker] => {
            ensure_single(test_id, RunKind::RunWithWorker, plan.run_with_worker.len())?;
            Ok(Box::new(WorkerRun {
                instance: Arc::clone(instance),
                factory: plan.run_with_worker[0],
                worker: Mutex::new(None),
                running: AtomicBool::new(false),
                started_at: AtomicU64::new(0),
            }))
        }
        [RunKind::TimeStep] => Ok(Box::new(TimeStepRun {
            instance: Arc::clone(instance),
            steps: plan.time_steps.clone(),
            thread_count: thread_count.max(1),
            iterations: AtomicU64::new(0),
            running: AtomicBool::new(false),
            started_at: AtomicU64::new(0),
        })),
        _ => Err(IllegalTest::AmbiguousRunStrategy {
            test_id: test_id.to_string(),
            kinds,
        }),
    }
}

fn ensure_single(test_id: &str, kind: RunKind, count: usize) -> Result<(), IllegalTest> {
    if count > 1 {
        return Err(IllegalTest::DuplicateRunStrategy {
            test_id: test_id.to_string(),
            kind,
        });
    }
    Ok(())
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// Clears the running flag even when the run body panics.
struct RunningGuard<'a>(&'a AtomicBool);

impl<'a> RunningGuard<'a> {
    fn arm(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        RunningGuard(flag)
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct PrimordialRun<T> {
    instance: Arc<RwLock<T>>,
    body: RunFn<T>,
    running: AtomicBool,
    started_at: AtomicU64,
}

impl<T: Send + Sync + 'static> RunStrategy for PrimordialRun<T> {
    fn execute(&self, _ctx: &TestContext) -> Result<(), TestError> {
        self.started_at.store(now_millis(), Ordering::Release);
        let _guard = RunningGuard::arm(&self.running);
        let instance = self.instance.read().map_err(|_| TestError::poisoned_lock())?;
        (self.body)(&instance)
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn iterations(&self) -> u64 {
        0
    }

    fn started_at_millis(&self) -> u64 {
        self.started_at.load(Ordering::Acquire)
    }
}

struct WorkerRun<T> {
    instance: Arc<RwLock<T>>,
    factory: WorkerFactoryFn<T>,
    worker: Mutex<Option<Arc<dyn LoadWorker>>>,
    running: AtomicBool,
    started_at: AtomicU64,
}

impl<T: Send + Sync + 'static> RunStrategy for WorkerRun<T> {
    fn execute(&self, ctx: &TestContext) -> Result<(), TestError> {
        // The factory runs once per run phase; the produced worker stays
        // available for iteration counts afterwards.
        let worker = {
            let instance = self.instance.read().map_err(|_| TestError::poisoned_lock())?;
            (self.factory)(&instance)?
        };
        *self.worker.lock().map_err(|_| TestError::poisoned_lock())? = Some(Arc::clone(&worker));

        self.started_at.store(now_millis(), Ordering::Release);
        let _guard = RunningGuard::arm(&self.running);
        worker.run(ctx)
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn iterations(&self) -> u64 {
        self.worker
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(|worker| worker.iterations()))
            .unwrap_or(0)
    }

    fn started_at_millis(&self) -> u64 {
        self.started_at.load(Ordering::Acquire)
    }
}

struct TimeStepRun<T> {
    instance: Arc<RwLock<T>>,
    steps: Vec<TimeStepFn<T>>,
    thread_count: usize,
    iterations: AtomicU64,
    running: AtomicBool,
    started_at: AtomicU64,
}

impl<T: Send + Sync + 'static> RunStrategy for TimeStepRun<T> {
    fn execute(&self, ctx: &TestContext) -> Result<(), TestError> {
        self.started_at.store(now_millis(), Ordering::Release);
        let _guard = RunningGuard::arm(&self.running);

        let failed = AtomicBool::new(false);
        let failure: Mutex<Option<TestError>> = Mutex::new(None);

        std::thread::scope(|scope| {
            for _ in 0..self.thread_count {
                scope.spawn(|| {
                    while !ctx.is_stopped() && !failed.load(Ordering::Acquire) {
                        let outcome = self
                            .instance
                            .read()
                            .map_err(|_| TestError::poisoned_lock())
                            .and_then(|instance| {
                                self.steps.iter().try_for_each(|step| step(&instance))
                            });
                        match outcome {
                            Ok(()) => {
                                self.iterations.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(err) => {
                                // First error wins; the rest of the threads
                                // see the flag and wind down.
                                if let Ok(mut slot) = failure.lock() {
                                    slot.get_or_insert(err);
                                }
                                failed.store(true, Ordering::Release);
                                break;
                            }
                        }
                    }
                });
            }
        });

        match failure.into_inner().unwrap_or_else(PoisonError::into_inner) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn iterations(&self) -> u64 {
        self.iterations.load(Ordering::Relaxed)
    }

    fn started_at_millis(&self) -> u64 {
        self.started_at.load(Ordering::Acquire)
    }
}
