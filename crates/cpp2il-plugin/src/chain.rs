//! Ordered processor chains.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::traits::{ClosureProcessor, Processor};

/// An ordered sequence of processors.
///
/// Steps run in the order they were pushed; each step's output feeds the
/// next. The chain never skips or reorders steps. An empty chain is the
/// identity.
pub struct ProcessorChain<T> {
    /// Steps in registration order.
    steps: Vec<Arc<dyn Processor<T>>>,
}

impl<T> ProcessorChain<T> {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Appends a step to the end of the chain.
    pub fn push(&mut self, step: Arc<dyn Processor<T>>) {
        self.steps.push(step);
    }

    /// Appends a closure step to the end of the chain.
    pub fn push_fn<F>(&mut self, name: impl Into<String>, func: F)
    where
        T: 'static,
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        self.steps.push(Arc::new(ClosureProcessor::new(name, func)));
    }

    /// Runs every step left-to-right.
    pub fn apply(&self, input: T) -> T {
        self.steps.iter().fold(input, |value, step| {
            trace!(processor = step.name(), "Applying processor");
            step.process(value)
        })
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the chain has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

impl<T> Default for ProcessorChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ProcessorChain<T> {
    fn clone(&self) -> Self {
        Self {
            steps: self.steps.clone(),
        }
    }
}

impl<T> fmt::Debug for ProcessorChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
