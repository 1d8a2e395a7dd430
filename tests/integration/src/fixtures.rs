//! Load test types the scenarios execute.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use flotilla_harness::{
    parse_property, Configurable, IllegalTest, LoadTest, Scope, TestContext, TestError, TestPlan,
};

/// Time-step test hammering a keyed counter map, in the shape of a small
/// data-grid increment test.
///
/// Two properties configure it: `key_range` bounds the number of distinct
/// keys and `target_increments` stops the run once that many increments
/// have completed (0 means run until stopped from outside). Verification
/// adds the counters back up against the number of increments performed,
/// so a lost update surfaces as a phase failure.
#[derive(Default)]
pub struct CounterStorm {
    key_range: u64,
    target_increments: u64,
    ctx: Mutex<Option<TestContext>>,
    counters: Mutex<BTreeMap<u64, u64>>,
    increments: AtomicU64,
}

impl CounterStorm {
    fn capture_context(&mut self, ctx: &TestContext) -> Result<(), TestError> {
        *self.ctx.lock().map_err(|_| lock_poisoned())? = Some(ctx.clone());
        Ok(())
    }

    fn bump(&self) -> Result<(), TestError> {
        let n = self.increments.fetch_add(1, Ordering::Relaxed);
        let mut counters = self.counters.lock().map_err(|_| lock_poisoned())?;
        *counters.entry(n % self.key_range.max(1)).or_insert(0) += 1;
        drop(counters);

        if self.target_increments > 0 && n + 1 >= self.target_increments {
            if let Ok(slot) = self.ctx.lock() {
                if let Some(ctx) = slot.as_ref() {
                    ctx.stop();
                }
            }
        }
        Ok(())
    }

    fn check_totals(&mut self) -> Result<(), TestError> {
        let performed = self.increments.load(Ordering::Relaxed);
        let counted: u64 = self
            .counters
            .lock()
            .map_err(|_| lock_poisoned())?
            .values()
            .sum();
        if counted != performed {
            return Err(TestError::Failed(format!(
                "counters add up to {counted}, but {performed} increments were performed"
            )));
        }
        Ok(())
    }

    fn check_key_bound(&mut self) -> Result<(), TestError> {
        let keys = self.counters.lock().map_err(|_| lock_poisoned())?.len() as u64;
        if keys > self.key_range.max(1) {
            return Err(TestError::Failed(format!(
                "{keys} keys in use, bound is {}",
                self.key_range
            )));
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), TestError> {
        self.counters.get_mut().map_err(|_| lock_poisoned())?.clear();
        Ok(())
    }
}

impl Configurable for CounterStorm {
    fn apply_property(&mut self, name: &str, value: &str) -> Result<bool, IllegalTest> {
        match name {
            "key_range" => self.key_range = parse_property(name, value)?,
            "target_increments" => self.target_increments = parse_property(name, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl LoadTest for CounterStorm {
    fn plan(plan: &mut TestPlan<Self>) {
        plan.setup_with_context(Self::capture_context)
            .time_step(Self::bump)
            .verify(Scope::Local, Self::check_totals)
            .verify(Scope::Global, Self::check_key_bound)
            .teardown(Scope::Local, Self::clear);
    }
}

fn lock_poisoned() -> TestError {
    TestError::Fault("fixture lock poisoned by an earlier fault".to_string())
}
