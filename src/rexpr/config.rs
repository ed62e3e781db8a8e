/// Configuration options for the expression evaluator
#[derive(Debug, Clone, Copy)]
pub struct EvalConfig {
    /// Maximum recursion depth for evaluation
    pub recursion_limit: usize,

    /// Upper bound on `Iterate` steps; `None` leaves iteration unbounded
    /// (the flow engine driving the core imposes its own guards)
    pub iteration_limit: Option<u64>,
}

impl EvalConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Guarded config for untrusted blueprints (bounded iteration)
    pub fn guarded() -> Self {
        Self {
            recursion_limit: 1000,
            iteration_limit: Some(100_000),
        }
    }

    /// Builder pattern methods
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn with_iteration_limit(mut self, limit: Option<u64>) -> Self {
        self.iteration_limit = limit;
        self
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            recursion_limit: 1000,
            iteration_limit: None,
        }
    }
}
