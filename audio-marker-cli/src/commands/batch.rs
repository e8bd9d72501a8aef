//! `audio-marker batch {read|strip}`.

use audio_marker::batch::{BatchExecutor, BatchItem, BatchOperation};
use audio_marker::Facade;

use crate::cli::BatchAction;

use super::{expand_pattern, Result};

pub fn run(action: BatchAction) -> Result<()> {
    match action {
        BatchAction::Read { pattern, recursive, concurrency } => {
            let files = expand_pattern(&pattern, recursive)?;
            let items: Vec<BatchItem> = files.into_iter().map(|path| BatchItem::new(path, BatchOperation::Read)).collect();
            run_batch(items, concurrency)
        }
        BatchAction::Strip { pattern, recursive, concurrency, force } => {
            if !force {
                return Err(super::CliError::Usage(
                    "refusing to strip a batch without --force, this removes all metadata and chapters".to_string(),
                ));
            }
            let files = expand_pattern(&pattern, recursive)?;
            let items: Vec<BatchItem> = files.into_iter().map(|path| BatchItem::new(path, BatchOperation::Strip)).collect();
            run_batch(items, concurrency)
        }
    }
}

fn run_batch(items: Vec<BatchItem>, concurrency: usize) -> Result<()> {
    let executor = BatchExecutor::new(Facade::new()).with_concurrency(concurrency);
    let (results, summary) = executor.execute(&items);

    for result in &results {
        match &result.outcome {
            Ok(_) => println!("ok    {}", result.path.display()),
            Err(message) => println!("error {}: {message}", result.path.display()),
        }
    }
    println!(
        "total {}, succeeded {}, failed {}",
        summary.total, summary.succeeded, summary.failed
    );

    if summary.failed > 0 {
        Err(super::CliError::Operation(format!("{} of {} items failed", summary.failed, summary.total)))
    } else {
        Ok(())
    }
}
