//! Long-lived processing state.

mod reconstruction_worker;

pub use reconstruction_worker::{ReconstructionWorker, RequestKind, WorkerResult};
