//! Per-test execution context.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Handle given to running test code.
///
/// The context carries the test identifier, the cooperative stop flag and an
/// optional handle to the system under test. Cloning is cheap and every clone
/// shares the same stop flag, so a test can hand the context to as many
/// threads as it needs and stop them all with a single [`TestContext::stop`].
#[derive(Clone)]
pub struct TestContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    test_id: String,
    stopped: AtomicBool,
    target: Option<Arc<dyn Any + Send + Sync>>,
}

impl TestContext {
    /// Creates a context without a target instance.
    pub fn new(test_id: impl Into<String>) -> Self {
        Self::build(test_id.into(), None)
    }

    /// Creates a context carrying a shared handle to the system under test.
    ///
    /// Test code retrieves the handle with [`TestContext::target_instance`].
    pub fn with_target<T: Any + Send + Sync>(test_id: impl Into<String>, target: Arc<T>) -> Self {
        Self::build(test_id.into(), Some(target as Arc<dyn Any + Send + Sync>))
    }

    fn build(test_id: String, target: Option<Arc<dyn Any + Send + Sync>>) -> Self {
        TestContext {
            inner: Arc::new(ContextInner {
                test_id,
                stopped: AtomicBool::new(false),
                target,
            }),
        }
    }

    /// The identifier of the test this context belongs to.
    pub fn test_id(&self) -> &str {
        &self.inner.test_id
    }

    /// Whether the test has been asked to stop.
    ///
    /// Long-running test code is expected to poll this and return once it
    /// flips to `true`.
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::Acquire)
    }

    /// Asks the test to stop. Idempotent.
    pub fn stop(&self) {
        self.inner.stopped.store(true, Ordering::Release);
    }

    /// The system under test, if one was attached and its type matches.
    pub fn target_instance<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.inner.target.clone()?.downcast::<T>().ok()
    }
}

impl fmt::Debug for TestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContext")
            .field("test_id", &self.inner.test_id)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
