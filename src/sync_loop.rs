//! The per-call paging algorithm shared by every resource syncer.
//!
//! Each call decodes the cursor, fetches one page for the top frame, maps the
//! records, advances the frame and re-encodes. No state survives between
//! calls: a failed call leaves the caller holding the cursor it passed in,
//! which can simply be retried.
//!
//! Upstream kinds come in three shapes:
//! - single fetch: the marker is ignored and no next marker is ever returned;
//! - offset windows: the marker is a decimal offset into the upstream list;
//! - phases: the marker is an index into an ordered list of sub-listings.

use crate::error::{ConnectorError, Result};
use crate::pagination::PageStack;
use crate::resources::ResourceKind;
use serde::Serialize;
use std::future::Future;
use tracing::debug;

/// Records returned by one upstream fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<R> {
    pub records: Vec<R>,
    /// Marker of the next page; `None` when the kind is exhausted.
    pub next_marker: Option<String>,
}

impl<R> Fetched<R> {
    /// A complete listing from an upstream with no paging.
    pub fn all(records: Vec<R>) -> Self {
        Self {
            records,
            next_marker: None,
        }
    }
}

/// One page handed back to the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: String,
}

impl<T> Page<T> {
    /// A page with nothing in it and nothing after it.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: String::new(),
        }
    }

    /// Everything in one page.
    pub fn single(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: String::new(),
        }
    }

    pub fn is_last(&self) -> bool {
        self.next_cursor.is_empty()
    }
}

/// Run one step of the paging loop for `kind`.
///
/// `fetch` receives the marker of the top frame (`None` at the start of the
/// kind) and returns the records of that page with the marker of the next.
pub async fn list_page<R, T, F, Fut, M>(
    cursor: &str,
    kind: ResourceKind,
    fetch: F,
    map: M,
) -> Result<Page<T>>
where
    F: FnOnce(Option<String>) -> Fut,
    Fut: Future<Output = Result<Fetched<R>>>,
    M: FnMut(R) -> T,
{
    let mut stack = PageStack::decode(cursor, kind)?;
    stack.ensure_current(kind);

    let marker = stack
        .current()
        .and_then(|state| state.marker())
        .map(str::to_string);

    let fetched = fetch(marker.clone()).await?;
    let items: Vec<T> = fetched.records.into_iter().map(map).collect();
    debug!(
        kind = %kind,
        marker = marker.as_deref().unwrap_or(""),
        count = items.len(),
        "fetched page"
    );

    stack.advance(fetched.next_marker);
    Ok(Page {
        items,
        next_cursor: stack.encode()?,
    })
}

/// Cut the window starting at `marker` (a decimal offset) out of a complete
/// upstream listing.
pub fn offset_window<R>(
    mut all: Vec<R>,
    marker: Option<&str>,
    page_size: usize,
) -> Result<Fetched<R>> {
    let offset = parse_index(marker, "offset")?;
    let page_size = page_size.max(1);
    let total = all.len();

    if offset >= total {
        return Ok(Fetched::all(Vec::new()));
    }

    let end = offset.saturating_add(page_size).min(total);
    let records: Vec<R> = all.drain(offset..end).collect();
    let next_marker = (end < total).then(|| end.to_string());
    Ok(Fetched {
        records,
        next_marker,
    })
}

/// Index of the phase named by `marker` within `phases`.
pub fn phase_index<P>(marker: Option<&str>, phases: &[P]) -> Result<usize> {
    let index = parse_index(marker, "phase")?;
    if index >= phases.len() {
        return Err(ConnectorError::Decode(format!(
            "phase {index} is out of range ({} phases)",
            phases.len()
        )));
    }
    Ok(index)
}

/// Marker of the phase after `index`, or `None` after the last one.
pub fn next_phase<P>(index: usize, phases: &[P]) -> Option<String> {
    let next = index + 1;
    (next < phases.len()).then(|| next.to_string())
}

fn parse_index(marker: Option<&str>, what: &str) -> Result<usize> {
    match marker {
        None => Ok(0),
        Some(m) => m
            .parse::<usize>()
            .map_err(|_| ConnectorError::Decode(format!("invalid {what} marker '{m}'"))),
    }
}
