use coachbot_client::HistoryQuery;
use coachbot_types::{Message, MessageId};
use std::sync::atomic::AtomicBool;

use crate::guard::InFlight;

/// Where backward paging resumes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HistoryCursor {
    /// Nothing fetched yet
    #[default]
    Start,
    /// Continue after the oldest message seen so far
    After(MessageId),
    /// Backend returned an empty page; paging is over for this session
    ReachedEnd,
}

impl HistoryCursor {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, HistoryCursor::ReachedEnd)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Guard, exhausted cursor or error flag stopped the call before any request
    Skipped,
    Loaded(usize),
    Exhausted,
    Failed,
    Cancelled,
}

/// Backward pagination over conversation history.
///
/// The in-flight flag is an atomic separate from the session state lock so
/// bursts of scroll triggers collapse into one request.
#[derive(Debug)]
pub struct HistoryPaginator {
    page_size: u32,
    in_flight: AtomicBool,
}

impl HistoryPaginator {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub(crate) fn try_begin(&self) -> Option<InFlight<'_>> {
        InFlight::acquire(&self.in_flight)
    }

    /// Query for the next page, or None once the cursor is exhausted
    pub fn query_for(&self, user_id: &str, cursor: &HistoryCursor) -> Option<HistoryQuery> {
        let query = HistoryQuery::new(user_id, self.page_size);
        match cursor {
            HistoryCursor::Start => Some(query),
            HistoryCursor::After(id) => Some(query.after(id.as_str())),
            HistoryCursor::ReachedEnd => None,
        }
    }

    /// Move the cursor past a received page
    pub fn advance(cursor: &mut HistoryCursor, page: &[Message]) -> PageOutcome {
        match page.last() {
            Some(oldest) => {
                *cursor = HistoryCursor::After(oldest.id.clone());
                PageOutcome::Loaded(page.len())
            }
            None => {
                *cursor = HistoryCursor::ReachedEnd;
                PageOutcome::Exhausted
            }
        }
    }
}
