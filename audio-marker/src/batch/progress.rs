//! Lazy, completion-ordered progress stream (§4.8, §5).

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use super::executor::{BatchExecutor, BatchItem};

/// One element of the progress stream.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Total items submitted.
    pub total: usize,
    /// Items completed so far, including this one.
    pub completed: usize,
    /// `completed / total`, in `[0, 1]`.
    pub fraction: f64,
    /// The result of the item that just completed.
    pub latest_result: super::BatchItemResult,
    /// Whether this is the final event (`completed == total`).
    pub is_finished: bool,
}

/// Runs `items` on a dedicated thread pool sized to `executor`'s
/// concurrency, sending a [`ProgressEvent`] on the returned channel as
/// each one completes — in completion order, not input order. Dropping
/// the receiver stops new items from being dispatched; work already
/// started runs to completion (§5 cancellation).
pub(super) fn stream(executor: &BatchExecutor, items: Vec<BatchItem>) -> Receiver<ProgressEvent> {
    let total = items.len();
    let (tx, rx) = bounded(total.max(1));
    let completed = Arc::new(AtomicUsize::new(0));
    let cancelled = Arc::new(AtomicBool::new(false));
    let concurrency = executor.concurrency();
    let facade = executor.facade().clone();

    std::thread::spawn(move || {
        let pool = ThreadPoolBuilder::new()
            .num_threads(concurrency)
            .build()
            .expect("failed to build batch thread pool");
        let dispatcher = BatchExecutor::new(facade);

        pool.install(|| {
            let _ = items.into_par_iter().try_for_each(|item| {
                if cancelled.load(Ordering::Relaxed) {
                    return Err(());
                }
                let result = dispatcher.run_one(&item);
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                let event = ProgressEvent {
                    total,
                    completed: done,
                    fraction: done as f64 / total.max(1) as f64,
                    latest_result: result,
                    is_finished: done == total,
                };
                if tx.send(event).is_err() {
                    cancelled.store(true, Ordering::Relaxed);
                }
                Ok(())
            });
        });
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::super::executor::{BatchItem, BatchOperation, BatchExecutor};
    use crate::facade::Facade;
    use crate::model::AudioFileInfo;
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
    fn progress_events_end_with_is_finished() {
        let paths: Vec<_> = (0..4).map(|i| mp3_with_title(&format!("T{i}"))).collect();
        let items: Vec<BatchItem> = paths.iter().map(|p| BatchItem::new(p.to_path_buf(), BatchOperation::Read)).collect();

        let executor = BatchExecutor::new(Facade::new()).with_concurrency(2);
        let rx = executor.execute_with_progress(items);

        let mut events = Vec::new();
        while let Ok(event) = rx.recv() {
            events.push(event);
        }

        assert_eq!(events.len(), 4);
        assert!(events.iter().take(3).all(|e| !e.is_finished));
        assert!(events.last().unwrap().is_finished);
        assert_eq!(events.last().unwrap().completed, 4);
    }
}
