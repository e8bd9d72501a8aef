//! Bounded-parallelism batch execution (§4.8).

use std::path::PathBuf;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::error::Error;
use crate::exchange::{self, ChapterFormat};
use crate::facade::Facade;
use crate::model::{AudioFileInfo, ChapterList};

/// Default bounded parallelism, per spec.md §4.8/§5.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// One operation a [`BatchItem`] can request.
#[derive(Debug, Clone)]
pub enum BatchOperation {
    /// Read full file info.
    Read,
    /// Full replace with the given info.
    Write(AudioFileInfo),
    /// Remove all metadata and chapters.
    Strip,
    /// Render the file's chapters as `format` and write them to `output_path`.
    ExportChapters {
        /// The exchange format to emit.
        format: ChapterFormat,
        /// Where to write the rendered text.
        output_path: PathBuf,
    },
    /// Parse `input_path` as `format` and write the result as the file's
    /// chapter list, preserving other metadata.
    ImportChapters {
        /// The exchange format to parse.
        format: ChapterFormat,
        /// Where to read the source text from.
        input_path: PathBuf,
    },
}

/// One file plus the operation to run against it.
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// The target file.
    pub path: PathBuf,
    /// The operation to run.
    pub operation: BatchOperation,
}

impl BatchItem {
    /// Builds a batch item.
    pub fn new(path: impl Into<PathBuf>, operation: BatchOperation) -> Self {
        BatchItem {
            path: path.into(),
            operation,
        }
    }
}

/// The payload a successful operation produces, if any.
#[derive(Debug, Clone)]
pub enum BatchPayload {
    /// `Read`'s result.
    Info(AudioFileInfo),
    /// No payload (write/strip/export/import).
    None,
}

/// The outcome of one [`BatchItem`].
#[derive(Debug, Clone)]
pub struct BatchItemResult {
    /// The file this result is for.
    pub path: PathBuf,
    /// Success payload, or the error message on failure. Errors are
    /// collected by message rather than by [`Error`] value so results stay
    /// `Clone` and plain to move across the progress channel.
    pub outcome: Result<BatchPayload, String>,
}

impl BatchItemResult {
    /// Whether this item succeeded.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// The aggregate result of a finished batch.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Total items submitted.
    pub total: usize,
    /// Items that succeeded.
    pub succeeded: usize,
    /// Items that failed.
    pub failed: usize,
    /// `(path, message)` for every failure.
    pub errors: Vec<(PathBuf, String)>,
    /// Every `AudioFileInfo` produced by a `Read` operation, in completion order.
    pub read_results: Vec<AudioFileInfo>,
}

/// Runs a sequence of [`BatchItem`]s with bounded parallelism (§4.8, §5).
///
/// Stateless beyond its [`Facade`] and concurrency cap; safe to share
/// across threads (`Facade` carries only configuration).
pub struct BatchExecutor {
    facade: Facade,
    concurrency: usize,
}

impl BatchExecutor {
    /// Builds an executor around `facade` with the default concurrency.
    pub fn new(facade: Facade) -> Self {
        BatchExecutor {
            facade,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Overrides the default concurrency. Clamped to at least 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub(super) fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub(super) fn facade(&self) -> &Facade {
        &self.facade
    }

    fn dispatch(&self, item: &BatchItem) -> crate::error::Result<BatchPayload> {
        match &item.operation {
            BatchOperation::Read => self.facade.read(&item.path).map(BatchPayload::Info),
            BatchOperation::Write(info) => self.facade.write(info, &item.path).map(|_| BatchPayload::None),
            BatchOperation::Strip => self.facade.strip(&item.path).map(|_| BatchPayload::None),
            BatchOperation::ExportChapters { format, output_path } => {
                let text = self.facade.export_chapters(&item.path, *format)?;
                std::fs::write(output_path, text).map_err(Error::from)?;
                Ok(BatchPayload::None)
            }
            BatchOperation::ImportChapters { format, input_path } => {
                let text = std::fs::read_to_string(input_path).map_err(Error::from)?;
                let chapters: ChapterList = exchange::parse(*format, &text)?;
                self.facade.write_chapters(&chapters, &item.path)?;
                Ok(BatchPayload::None)
            }
        }
    }

    pub(super) fn run_one(&self, item: &BatchItem) -> BatchItemResult {
        let outcome = self.dispatch(item).map_err(|e| e.to_string());
        if let Err(message) = &outcome {
            tracing::debug!(path = %item.path.display(), error = %message, "batch item failed");
        }
        BatchItemResult {
            path: item.path.clone(),
            outcome,
        }
    }

    /// Runs every item, blocking until all complete. Returns per-item
    /// results in input order plus the aggregate summary.
    pub fn execute(&self, items: &[BatchItem]) -> (Vec<BatchItemResult>, BatchSummary) {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .build()
            .expect("failed to build batch thread pool");

        let results: Vec<BatchItemResult> = pool.install(|| items.par_iter().map(|item| self.run_one(item)).collect());

        let mut summary = BatchSummary {
            total: items.len(),
            ..Default::default()
        };
        for result in &results {
            match &result.outcome {
                Ok(BatchPayload::Info(info)) => {
                    summary.succeeded += 1;
                    summary.read_results.push(info.clone());
                }
                Ok(BatchPayload::None) => summary.succeeded += 1,
                Err(message) => {
                    summary.failed += 1;
                    summary.errors.push((result.path.clone(), message.clone()));
                }
            }
        }
        (results, summary)
    }

    /// Runs `items`, returning a channel that receives a
    /// [`super::ProgressEvent`] as soon as each one finishes, in completion
    /// order. Dropping the receiver stops new items from being dispatched;
    /// items already in flight still run to completion.
    pub fn execute_with_progress(&self, items: Vec<BatchItem>) -> crossbeam_channel::Receiver<super::ProgressEvent> {
        super::progress::stream(self, items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn mp3_with_title(title: &str) -> tempfile::TempPath {
        let mut file = tempfile::Builder::new().suffix(".mp3").tempfile().unwrap();
        file.write_all(&[0xAAu8; 32]).unwrap();
        let path = file.into_temp_path();
        let facade = Facade::new();
        let mut info = AudioFileInfo::new();
        info.metadata.title = Some(title.to_string());
        facade.write(&info, &path).unwrap();
        path
    }

    #[test]
    fn executes_reads_with_bounded_concurrency() {
        let paths: Vec<_> = (0..6).map(|i| mp3_with_title(&format!("Track {i}"))).collect();
        let items: Vec<BatchItem> = paths.iter().map(|p| BatchItem::new(p.to_path_buf(), BatchOperation::Read)).collect();

        let executor = BatchExecutor::new(Facade::new()).with_concurrency(2);
        let (results, summary) = executor.execute(&items);

        assert_eq!(summary.total, 6);
        assert_eq!(summary.succeeded, 6);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.read_results.len(), 6);
        assert_eq!(results.len(), 6);
        assert!(results.iter().all(BatchItemResult::is_success));
    }

    #[test]
    fn missing_file_is_reported_as_a_failure_not_a_panic() {
        let items = vec![BatchItem::new("/nonexistent/path/does-not-exist.mp3", BatchOperation::Read)];
        let executor = BatchExecutor::new(Facade::new());
        let (_results, summary) = executor.execute(&items);
        assert_eq!(summary.total, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.succeeded, 0);
    }
}
