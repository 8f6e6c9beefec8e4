//! Processor traits.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A set of bare file names flowing through the blacklist/whitelist chains.
///
/// Ordered so that chain output is identical across repeated runs.
pub type NameList = BTreeSet<String>;

/// One step of a processor chain.
///
/// Steps take ownership of the value and hand back the (possibly rewritten)
/// value for the next step. Implementations must be pure with respect to
/// their input: the same input always yields the same output.
pub trait Processor<T>: Send + Sync + fmt::Debug {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Transforms the value.
    fn process(&self, input: T) -> T;
}

/// A closure-based processor for quick step creation.
pub struct ClosureProcessor<T> {
    /// Step name.
    name: String,
    /// Transformation.
    func: Arc<dyn Fn(T) -> T + Send + Sync>,
}

impl<T> ClosureProcessor<T> {
    /// Creates a new closure-based processor.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }
}

impl<T> fmt::Debug for ClosureProcessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosureProcessor")
            .field("name", &self.name)
            .field("func", &"<closure>")
            .finish()
    }
}

impl<T> Processor<T> for ClosureProcessor<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, input: T) -> T {
        (self.func)(input)
    }
}
