//! Best-effort record discovery.
//!
//! Existing record ids are found by scanning `RecordRegistered`
//! notifications over a bounded window of recent heights. Anything older
//! than the window, or anything a constrained backend refuses to return, is
//! simply not found; callers supply such ids manually and they are merged
//! in on equal footing.
//!
//! Scan failures never propagate. They are logged and the scan contributes
//! nothing.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use medvault_access::NotificationKind;
use medvault_core::RecordId;
use medvault_ledger::{Ledger, LedgerExt, Result as LedgerResult};

use crate::config::DiscoveryConfig;

/// Outcome of a discovery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Scanned and manual ids, deduplicated and sorted.
    pub ids: Vec<RecordId>,
    /// First height scanned (0 if nothing was scanned).
    pub scanned_from: u64,
    /// Last height scanned (0 if nothing was scanned).
    pub scanned_to: u64,
    /// Whether the scan succeeded and reached back to the first height.
    pub complete: bool,
}

struct Scan {
    ids: Vec<RecordId>,
    from: u64,
    to: u64,
}

/// Inclusive `[from, to]` covering the last `window` heights up to `height`.
fn scan_bounds(height: u64, window: u64) -> (u64, u64) {
    let from = height.saturating_sub(window).saturating_add(1).max(1);
    (from, height)
}

async fn scan<L: Ledger + ?Sized>(ledger: &L, config: &DiscoveryConfig) -> LedgerResult<Scan> {
    let height = ledger.height().await?;
    if height == 0 {
        return Ok(Scan {
            ids: Vec::new(),
            from: 0,
            to: 0,
        });
    }

    let (from, to) = scan_bounds(height, config.window);
    let ids = ledger
        .query_notifications(NotificationKind::RecordRegistered, from, to)
        .await?
        .into_iter()
        .filter_map(|r| r.notification.record_id().cloned())
        .collect();

    Ok(Scan { ids, from, to })
}

/// Discover record ids registered within the configured window and merge
/// them with `manual`.
pub async fn discover_record_ids<L: Ledger + ?Sized>(
    ledger: &L,
    config: &DiscoveryConfig,
    manual: impl IntoIterator<Item = RecordId>,
) -> DiscoveryReport {
    let mut ids: BTreeSet<RecordId> = manual.into_iter().collect();

    let report = match scan(ledger, config).await {
        Ok(scan) => {
            let scanned = scan.ids.len();
            ids.extend(scan.ids);
            // An empty ledger is trivially fully scanned.
            let complete = scan.to == 0 || scan.from <= 1;
            debug!(
                from = scan.from,
                to = scan.to,
                scanned,
                complete,
                "record discovery scan finished"
            );
            DiscoveryReport {
                ids: Vec::new(),
                scanned_from: scan.from,
                scanned_to: scan.to,
                complete,
            }
        }
        Err(e) => {
            warn!(error = %e, window = config.window, "record discovery scan failed, using manual ids only");
            DiscoveryReport {
                ids: Vec::new(),
                scanned_from: 0,
                scanned_to: 0,
                complete: false,
            }
        }
    };

    DiscoveryReport {
        ids: ids.into_iter().collect(),
        ..report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_bounds() {
        assert_eq!(scan_bounds(5, 10_000), (1, 5));
        assert_eq!(scan_bounds(100, 10), (91, 100));
        assert_eq!(scan_bounds(10, 10), (1, 10));
        // A zero window scans nothing.
        assert_eq!(scan_bounds(10, 0), (11, 10));
    }
}
