use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;

/// Trailing-edge debouncer for search input.
///
/// Every keystroke is pushed; once the input has been quiet for `window`,
/// the handler runs once with the latest value. Dropping the debouncer stops
/// its task without firing a pending value.
#[derive(Debug, Clone)]
pub struct QueryDebouncer {
    tx: mpsc::UnboundedSender<String>,
}

impl QueryDebouncer {
    /// Spawn the debounce task on the current tokio runtime
    pub fn spawn<F, Fut>(window: Duration, on_settled: F) -> Self
    where
        F: Fn(String) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(rx, window, on_settled));
        Self { tx }
    }

    pub fn push(&self, query: impl Into<String>) {
        if self.tx.send(query.into()).is_err() {
            tracing::debug!("Debounce task has stopped; dropping query");
        }
    }
}

async fn run<F, Fut>(mut rx: mpsc::UnboundedReceiver<String>, window: Duration, on_settled: F)
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = ()>,
{
    while let Some(mut latest) = rx.recv().await {
        loop {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(query) => latest = query,
                    None => return,
                },
                _ = tokio::time::sleep(window) => break,
            }
        }

        on_settled(latest).await;
    }
}
