//! Full sync pass over every resource kind, as run by the `sync` command.

use crate::connector::{Connector, ResourceSyncer};
use crate::error::{ConnectorError, Result};
use crate::resources::{Entitlement, Grant, Resource};
use crate::sync_loop::Page;
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// Everything one pass observed.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Resources per kind, keyed by the kind's type id.
    pub counts: BTreeMap<&'static str, usize>,
    pub resources: Vec<Resource>,
    pub entitlements: Vec<Entitlement>,
    pub grants: Vec<Grant>,
}

/// Bootstrap, then walk every syncer until each of its cursors is exhausted.
pub async fn run_full_sync(connector: &Connector) -> Result<SyncReport> {
    connector.bootstrap().await?;

    let mut report = SyncReport::default();
    for syncer in connector.resource_syncers() {
        sync_kind(&syncer, &mut report).await?;
    }

    info!(
        resources = report.resources.len(),
        entitlements = report.entitlements.len(),
        grants = report.grants.len(),
        "Sync pass complete"
    );
    Ok(report)
}

async fn sync_kind(syncer: &Arc<dyn ResourceSyncer>, report: &mut SyncReport) -> Result<()> {
    let kind = syncer.kind();
    let resources = drain(|cursor| async move { syncer.list(None, &cursor).await }).await?;
    debug!("Listed {} {} resource(s)", resources.len(), kind);

    for resource in &resources {
        let entitlements =
            drain(|cursor| async move { syncer.entitlements(resource, &cursor).await }).await?;
        report.entitlements.extend(entitlements);

        let grants = drain(|cursor| async move { syncer.grants(resource, &cursor).await }).await?;
        report.grants.extend(grants);
    }

    report.counts.insert(kind.as_str(), resources.len());
    report.resources.extend(resources);
    Ok(())
}

/// Follow next-cursors from the start until a page comes back last.
async fn drain<T, F, Fut>(mut next: F) -> Result<Vec<T>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut cursor = String::new();
    loop {
        let page = next(cursor.clone()).await?;
        items.extend(page.items);
        if page.next_cursor.is_empty() {
            return Ok(items);
        }
        if page.next_cursor == cursor {
            return Err(ConnectorError::Decode(
                "cursor did not advance between pages".to_string(),
            ));
        }
        cursor = page.next_cursor;
    }
}
