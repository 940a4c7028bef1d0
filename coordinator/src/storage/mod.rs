mod snapshot;
mod store;

pub use snapshot::ModelSnapshot;
pub use store::GlobalModelStore;
