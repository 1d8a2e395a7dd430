//! Property binding for test instances.
//!
//! A test case carries free-form string properties. Binding offers each of
//! them, in name order, to every [`Configurable`] participating in container
//! construction. A property consumed by nobody is a definition error, which
//! catches both typos in property names and properties left behind after a
//! test was refactored.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::str::FromStr;

use crate::error::IllegalTest;

/// A type that can receive configuration properties by name.
pub trait Configurable {
    /// Offers one property to this instance.
    ///
    /// Returns `Ok(true)` if the property was consumed, `Ok(false)` if the
    /// name is not recognised here, and an error if the name is recognised
    /// but the value cannot be applied. The default recognises nothing.
    fn apply_property(&mut self, name: &str, value: &str) -> Result<bool, IllegalTest> {
        let _ = (name, value);
        Ok(false)
    }
}

/// Parses a property value, mapping the parse failure to
/// [`IllegalTest::InvalidProperty`] with the property name attached.
pub fn parse_property<V>(name: &str, value: &str) -> Result<V, IllegalTest>
where
    V: FromStr,
    V::Err: Display,
{
    value.parse().map_err(|err: V::Err| IllegalTest::InvalidProperty {
        name: name.to_string(),
        reason: err.to_string(),
    })
}

/// Tracks which supplied properties were consumed across bind passes.
#[derive(Debug)]
pub struct PropertyBinding {
    properties: BTreeMap<String, String>,
    consumed: BTreeSet<String>,
}

impl PropertyBinding {
    /// Creates a binding over the supplied properties.
    pub fn new(properties: &BTreeMap<String, String>) -> Self {
        PropertyBinding {
            properties: properties.clone(),
            consumed: BTreeSet::new(),
        }
    }

    /// Offers every property to `target` in name order.
    ///
    /// A property may be consumed by more than one target; consumption is
    /// recorded once per name.
    pub fn bind(&mut self, target: &mut dyn Configurable) -> Result<(), IllegalTest> {
        for (name, value) in &self.properties {
            if target.apply_property(name, value)? {
                self.consumed.insert(name.clone());
            }
        }
        Ok(())
    }

    /// Fails if any supplied property was never consumed.
    pub fn ensure_all_consumed(&self) -> Result<(), IllegalTest> {
        let unused: Vec<String> = self
            .properties
            .keys()
            .filter(|name| !self.consumed.contains(*name))
            .cloned()
            .collect();
        if unused.is_empty() {
            Ok(())
        } else {
            Err(IllegalTest::UnusedProperties { names: unused })
        }
    }
}
