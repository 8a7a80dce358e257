use coachbot_client::{ChatBackend, GreetingQuery};
use coachbot_types::Greeting;
use std::sync::atomic::AtomicBool;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::guard::InFlight;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GreetingFetch {
    /// A fetch of the same mode is already running
    Skipped,
    Loaded { count: usize },
    /// Backend failure; the list is left as it was
    Failed(String),
    /// A fresh search replaced the list while this load-more was running
    Stale,
    Cancelled,
}

#[derive(Debug, Default)]
struct GreetingState {
    items: Vec<Greeting>,
    /// 0-based page of the last successful fetch
    page: u32,
    total: u64,
    query: Option<String>,
    /// Bumped whenever the list is replaced; load-more only appends to the
    /// list it started from
    generation: u64,
}

/// Paged, searchable list of canned prompts for the suggestion popover.
///
/// Searching and loading more are guarded separately: a running search does
/// not block a load-more and vice versa.
#[derive(Debug)]
pub struct GreetingSearch {
    page_size: u32,
    state: Mutex<GreetingState>,
    searching: AtomicBool,
    loading_more: AtomicBool,
}

impl GreetingSearch {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            state: Mutex::new(GreetingState::default()),
            searching: AtomicBool::new(false),
            loading_more: AtomicBool::new(false),
        }
    }

    /// Fresh search (`load_more == false`) replaces the list from page 0;
    /// load-more appends the next page. Load-more without a query keeps the
    /// current search term.
    ///
    /// Nothing is written once `cancel` has fired.
    pub async fn fetch(
        &self,
        backend: &dyn ChatBackend,
        query: Option<String>,
        load_more: bool,
        cancel: &CancellationToken,
    ) -> GreetingFetch {
        let flag = if load_more { &self.loading_more } else { &self.searching };
        let Some(_guard) = InFlight::acquire(flag) else {
            tracing::debug!(load_more, "Greeting fetch already in flight");
            return GreetingFetch::Skipped;
        };

        let (page, query, started_from) = {
            let state = self.lock();
            if load_more {
                (state.page + 1, query.or_else(|| state.query.clone()), state.generation)
            } else {
                (0, query, state.generation)
            }
        };

        let request = GreetingQuery::new(self.page_size, page + 1)
            .with_query(query.clone().unwrap_or_default());

        match backend.list_greetings(request).await {
            Ok(result) => {
                let count = result.greetings.len();
                let mut state = self.lock();
                if cancel.is_cancelled() {
                    return GreetingFetch::Cancelled;
                }
                if load_more {
                    if state.generation != started_from {
                        tracing::debug!("Search changed during load-more; dropping page");
                        return GreetingFetch::Stale;
                    }
                    state.items.extend(result.greetings);
                } else {
                    state.items = result.greetings;
                    state.generation += 1;
                }
                state.page = page;
                state.total = result.total;
                state.query = query;
                GreetingFetch::Loaded { count }
            }
            Err(e) => {
                tracing::warn!(error = %e, load_more, "Greeting fetch failed");
                GreetingFetch::Failed(e.to_string())
            }
        }
    }

    pub fn greetings(&self) -> Vec<Greeting> {
        self.lock().items.clone()
    }

    pub fn total(&self) -> u64 {
        self.lock().total
    }

    /// Whether a "load more" affordance should be offered
    pub fn has_more(&self) -> bool {
        let state = self.lock();
        (state.items.len() as u64) < state.total
    }

    pub fn query(&self) -> Option<String> {
        self.lock().query.clone()
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        let generation = state.generation + 1;
        *state = GreetingState {
            generation,
            ..GreetingState::default()
        };
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GreetingState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
