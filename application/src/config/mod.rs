//! Application-level configuration.
//!
//! - [`WorkflowOptions`]: timeouts, retry budgets and gate thresholds for
//!   [`SubmitQueryUseCase`](crate::use_cases::submit_query::SubmitQueryUseCase)

pub mod workflow_options;

pub use workflow_options::WorkflowOptions;
