//! Paginated enumeration of the documents in a group.

use std::collections::BTreeSet;
use std::num::NonZeroU32;

use crate::config::SearchMode;
use crate::document::DocumentId;
use crate::observability::metrics;
use crate::remote::{RemoteResult, RemoteSource, SearchQuery};

/// Outcome of a discovery walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovered {
    pub ids: BTreeSet<DocumentId>,
    /// Number of search pages requested.
    pub pages: u32,
}

/// Collect the ids of every document in `group` matched by `filter`.
///
/// Pages are requested from 1 upwards until `page_no * page_size` reaches the
/// total count reported by the last page; an empty group still costs one
/// request. Any search error aborts the walk and no partial set is returned.
/// If the remote set changes while paging the result is best-effort.
pub async fn discover_ids<S: RemoteSource>(
    source: &S,
    group: &str,
    filter: &str,
    mode: SearchMode,
    page_size: NonZeroU32,
) -> RemoteResult<Discovered> {
    let mut discovered = Discovered::default();
    let mut page_no: u32 = 1;

    loop {
        let query = SearchQuery {
            filter: filter.to_string(),
            mode,
            page_size,
            page_no,
        };
        let page = source.search(group, &query).await?;
        discovered.pages += 1;
        metrics::record_discovery_page();

        tracing::debug!(
            group = %group,
            page_no,
            items = page.items.len(),
            total_count = page.total_count,
            "Discovery page received"
        );
        discovered.ids.extend(page.items);

        if u64::from(page_no) * u64::from(page_size.get()) >= page.total_count {
            break;
        }
        page_no += 1;
    }

    tracing::info!(
        group = %group,
        documents = discovered.ids.len(),
        pages = discovered.pages,
        "Discovery complete"
    );
    Ok(discovered)
}
