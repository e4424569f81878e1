pub mod generation;
pub mod metrics;
pub mod store;

pub use generation::GenerationClient;
pub use self::metrics::{get_metrics, init_metrics};
pub use store::{StoreError, StudentStore};
