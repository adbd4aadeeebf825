/// Lifecycle event protocol
pub mod events;

/// Create/Update/Delete reconciliation
pub mod reconciler;

pub use events::{ClassificationProperties, LifecycleEvent, RequestType, Response, Status};
pub use reconciler::{parse_event, Reconciler};
