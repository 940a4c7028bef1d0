pub mod aggregation;
pub mod config;
pub mod http;
pub mod rounds;
pub mod service;
pub mod storage;
pub mod update;

pub use aggregation::Aggregator;
pub use rounds::{RoundState, RoundTracker};
pub use service::{Coordinator, CoordinatorBuilder, FailurePolicy, RoundOutcome};
pub use storage::{GlobalModelStore, ModelSnapshot};
pub use update::Update;
