use crate::batch::{BatchItem, BatchReport, Context, Failure, ItemReport, process_item};
use async_stream::stream;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use std::sync::Arc;

/// Progress events emitted by [`stream`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started) exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete) exactly once, with the
///    total item count.
/// 3. [`Processed`](Self::Processed) once per item, in completion order.
/// 4. [`Complete`](Self::Complete) exactly once.
///
/// Item failures are carried inside the report; they never end the stream.
#[derive(Debug)]
pub enum BatchEvent {
    Started,
    DiscoveryComplete(u64),
    Processed(Box<ItemReport>),
    Complete,
}

/// Process `items` on the blocking thread pool, at most `concurrency` at a
/// time, yielding a [`BatchEvent`] as each one finishes.
pub fn stream(ctx: Arc<Context>, items: Vec<BatchItem>, concurrency: usize) -> impl Stream<Item = BatchEvent> {
    let concurrency = concurrency.max(1);
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield BatchEvent::Started;
        yield BatchEvent::DiscoveryComplete(u64::try_from(items.len()).unwrap_or(u64::MAX));

        let mut pending = items.into_iter();
        let mut processing = FuturesUnordered::new();
        processing.extend(pending.by_ref().take(concurrency).map(|item| spawn(Arc::clone(&ctx), item)));
        while let Some(report) = processing.next().await {
            yield BatchEvent::Processed(Box::new(report));
            if let Some(item) = pending.next() {
                processing.push(spawn(Arc::clone(&ctx), item));
            }
        }

        yield BatchEvent::Complete;
    })
}

async fn spawn(ctx: Arc<Context>, item: BatchItem) -> ItemReport {
    let fallback = item.clone();
    match tokio::task::spawn_blocking(move || process_item(&ctx, item)).await {
        Ok(report) => report,
        Err(err) => {
            tracing::error!(source = %fallback.source.display(), error = %err, "Worker did not finish");
            ItemReport {
                result: Err(Failure {
                    source: fallback.source.clone(),
                    kind: "panic".to_string(),
                    message: err.to_string(),
                }),
                item: fallback,
            }
        },
    }
}

/// Drain a [`stream`] into a [`BatchReport`].
pub async fn collect(events: impl Stream<Item = BatchEvent>) -> BatchReport {
    let mut events = std::pin::pin!(events);
    let mut report = BatchReport::default();
    while let Some(event) = events.next().await {
        match event {
            BatchEvent::Processed(item) => report.push(*item),
            BatchEvent::DiscoveryComplete(total) => tracing::debug!(total, "Batch discovered"),
            BatchEvent::Started | BatchEvent::Complete => {},
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Mode;
    use crate::batch::tests::{BAD, GOOD, OTHER, context, library};

    #[tokio::test]
    async fn test_event_order() {
        let (_root, items) = library(&[GOOD, OTHER, BAD]);
        let events: Vec<_> = stream(Arc::new(context(Mode::DryRun)), items, 2).collect().await;
        assert_eq!(events.len(), 6);
        assert!(matches!(events[0], BatchEvent::Started));
        assert!(matches!(events[1], BatchEvent::DiscoveryComplete(3)));
        assert!(events[2..5].iter().all(|event| matches!(event, BatchEvent::Processed(_))));
        assert!(matches!(events[5], BatchEvent::Complete));
    }

    #[tokio::test]
    async fn test_collect_matches_sequential_run() {
        let (_root, items) = library(&[GOOD, BAD, OTHER]);
        let report = collect(stream(Arc::new(context(Mode::Commit)), items.clone(), 8)).await;
        assert_eq!((report.succeeded, report.skipped, report.failed), (2, 0, 1));
        assert_eq!(report.failures[0].source, items[1].source);

        let again = collect(stream(Arc::new(context(Mode::Commit)), items, 1)).await;
        assert_eq!((again.succeeded, again.skipped, again.failed), (0, 2, 1));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let report = collect(stream(Arc::new(context(Mode::DryRun)), Vec::new(), 0)).await;
        assert_eq!(report.total(), 0);
        assert!(!report.has_failures());
    }
}
