mod builder;
mod coordinator;
mod error;
mod task;

pub use builder::CoordinatorBuilder;
pub use coordinator::{Coordinator, SubmitReceipt};
pub use error::{Result, SubmitErr};
pub use task::{FailurePolicy, RoundOutcome};
