//! Instrumentation configuration.
//!
//! Everything here is fixed before the first file is rewritten and shared
//! read-only by every per-file task.

use crate::base::constants::DEFAULT_LINE_WIDTH;

use super::hygiene::Namespace;

/// Which kinds of trace calls are inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceCategories {
    /// One line per executed statement, plus if-chain conditions
    pub statement: bool,
    /// Values of declared, assigned and induction variables
    pub variable: bool,
    /// Function entry, parameters and results
    pub call: bool,
    /// The head of every switch/select clause taken
    pub clause: bool,
}

impl TraceCategories {
    pub fn all() -> Self {
        Self {
            statement: true,
            variable: true,
            call: true,
            clause: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_statement(mut self, enabled: bool) -> Self {
        self.statement = enabled;
        self
    }

    pub fn with_variable(mut self, enabled: bool) -> Self {
        self.variable = enabled;
        self
    }

    pub fn with_call(mut self, enabled: bool) -> Self {
        self.call = enabled;
        self
    }

    pub fn with_clause(mut self, enabled: bool) -> Self {
        self.clause = enabled;
        self
    }

    pub fn any(&self) -> bool {
        self.statement || self.variable || self.call || self.clause
    }
}

/// How the runtime prints each trace line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    pub show_timestamp: bool,
    pub show_task_id: bool,
    /// Lines are padded or truncated to this many bytes
    pub line_width: usize,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_timestamp: false,
            show_task_id: false,
            line_width: DEFAULT_LINE_WIDTH,
        }
    }
}

impl DisplayOptions {
    pub fn with_timestamp(mut self, show: bool) -> Self {
        self.show_timestamp = show;
        self
    }

    pub fn with_task_id(mut self, show: bool) -> Self {
        self.show_task_id = show;
        self
    }

    pub fn with_line_width(mut self, width: usize) -> Self {
        self.line_width = width;
        self
    }
}

/// Settings of one rewrite run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentationConfig {
    pub categories: TraceCategories,
    pub display: DisplayOptions,
    pub namespace: Namespace,
}

impl InstrumentationConfig {
    pub fn new(namespace: Namespace) -> Self {
        Self {
            categories: TraceCategories::default(),
            display: DisplayOptions::default(),
            namespace,
        }
    }

    pub fn with_categories(mut self, categories: TraceCategories) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_display(mut self, display: DisplayOptions) -> Self {
        self.display = display;
        self
    }
}
