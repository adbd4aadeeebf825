/// Worker deployment planner
pub mod planner;

/// Worker bootstrap payload
pub mod secret;

pub use planner::{plan, ReaderConfig, TwitterConfig};
pub use secret::{TwitterCredentials, WorkerSecret, WORKER_SECRET_NAME};
