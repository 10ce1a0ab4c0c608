use std::num::IntErrorKind;

use chrono::{DateTime, Utc};

use crate::errors::AppError;
use crate::models::job::Job;
use crate::presentation::is_recent;
use crate::store::Store;

pub const PAGE_SIZE: i64 = 6;

/// A resolved page number. Never out of range, even for an empty listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub num_pages: i64,
}

impl Page {
    /// Non-numeric input falls back to the first page, out-of-range numbers
    /// to the last.
    pub fn resolve(requested: Option<&str>, total: i64) -> Self {
        let num_pages = ((total + PAGE_SIZE - 1) / PAGE_SIZE).max(1);
        let number = match requested.map(|raw| raw.trim().parse::<i64>()) {
            // Integers too large for i64 are still integers, just out of range.
            Some(Err(e))
                if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) =>
            {
                num_pages
            }
            None | Some(Err(_)) => 1,
            Some(Ok(n)) if n < 1 || n > num_pages => num_pages,
            Some(Ok(n)) => n,
        };
        Page { number, num_pages }
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * PAGE_SIZE
    }

    pub fn previous(&self) -> Option<i64> {
        (self.number > 1).then(|| self.number - 1)
    }

    pub fn next(&self) -> Option<i64> {
        (self.number < self.num_pages).then(|| self.number + 1)
    }
}

#[derive(Debug)]
pub struct Listing {
    /// Each job with its "new" flag.
    pub jobs: Vec<(Job, bool)>,
    pub query: String,
    pub total: i64,
    pub page: Page,
}

/// One page of jobs, optionally filtered by a case-insensitive substring
/// match on title, company or location.
pub async fn list_jobs(
    store: &dyn Store,
    query: Option<&str>,
    page: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Listing, AppError> {
    let query = query.map(str::trim).unwrap_or_default();
    let filter = (!query.is_empty()).then_some(query);

    let total = store.count_jobs(filter).await?;
    let page = Page::resolve(page, total);
    let jobs = store
        .search_jobs(filter, PAGE_SIZE, page.offset())
        .await?
        .into_iter()
        .map(|job| {
            let fresh = is_recent(job.created_at, now);
            (job, fresh)
        })
        .collect();

    Ok(Listing {
        jobs,
        query: query.to_string(),
        total,
        page,
    })
}

/// `?page=N`, keeping the search query.
pub fn page_href(number: i64, query: &str) -> String {
    if query.is_empty() {
        format!("?page={number}")
    } else {
        format!("?page={number}&q={}", urlencoding::encode(query))
    }
}
