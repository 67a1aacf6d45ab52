use tracing::{debug, error};

use crate::client::NftSource;
use crate::metadata::Project;

/// Walks the paginated project listing. A failed page ends the walk with the
/// projects collected so far.
pub fn fetch_catalog<S: NftSource>(source: &S, page_size: u32) -> Vec<Project> {
    let mut projects = Vec::new();
    let mut page = 1u32;
    let mut total_pages = 1u32;

    while page <= total_pages {
        match source.project_page(page, page_size) {
            Ok(listing) => {
                debug!(page, total_pages = listing.meta.total_pages, "project page fetched");
                projects.extend(listing.results);
                total_pages = listing.meta.total_pages;
            }
            Err(e) => {
                error!(page, error = %e, "Error fetching projects");
                break;
            }
        }
        page += 1;
    }

    projects
}

/// Projects whose id is in `ids`, in the order of `ids`.
pub fn featured<'a>(projects: &'a [Project], ids: &[u64]) -> Vec<&'a Project> {
    ids.iter()
        .filter_map(|id| projects.iter().find(|p| p.id == *id))
        .collect()
}
