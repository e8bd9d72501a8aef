//! Batch executor (§4.8, §5): bounded-parallelism execution of read/write/
//! strip/export/import-chapter operations across many files, plus a lazy
//! completion-ordered progress stream.

mod executor;
mod progress;

pub use executor::{
    BatchExecutor, BatchItem, BatchItemResult, BatchOperation, BatchPayload, BatchSummary, DEFAULT_CONCURRENCY,
};
pub use progress::ProgressEvent;
