//! Events pushed to SSE subscribers.

/// Published whenever a login bumps the site visit counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitCountEvent {
    pub total_visits: u64,
}

impl VisitCountEvent {
    pub fn new(total_visits: u64) -> Self {
        Self { total_visits }
    }
}
