//! Registry of instantiable test types.

use std::collections::BTreeMap;
use std::fmt;

use flotilla_protocol::TestCase;

use crate::container::TestContainer;
use crate::context::TestContext;
use crate::error::IllegalTest;
use crate::plan::LoadTest;

type ContainerFactory =
    Box<dyn Fn(TestContext, TestCase) -> Result<TestContainer, IllegalTest> + Send + Sync>;

/// Maps test type names to constructible containers.
///
/// A worker registers every test type it ships at startup; test cases then
/// refer to types by name. Asking for an unregistered name fails with
/// [`IllegalTest::UnknownTestType`].
#[derive(Default)]
pub struct TestCatalog {
    factories: BTreeMap<String, ContainerFactory>,
}

impl TestCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a test type under the given name.
    ///
    /// Registering the same name twice replaces the earlier entry.
    pub fn register<T: LoadTest + Default>(&mut self, name: &str) -> &mut Self {
        self.factories.insert(
            name.to_string(),
            Box::new(|ctx, case| TestContainer::new::<T>(ctx, case)),
        );
        self
    }

    /// The registered type names, in sorted order.
    pub fn registered(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Builds a container for `case`, looking its test type up by name.
    pub fn create(&self, ctx: TestContext, case: TestCase) -> Result<TestContainer, IllegalTest> {
        match self.factories.get(&case.test_type) {
            Some(factory) => factory(ctx, case),
            None => Err(IllegalTest::UnknownTestType {
                name: case.test_type.clone(),
            }),
        }
    }
}

impl fmt::Debug for TestCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCatalog")
            .field("registered", &self.registered())
            .finish()
    }
}
