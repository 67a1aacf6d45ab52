//! Collects every NFT of a project and counts how many have been claimed.

use rayon::prelude::*;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::client::NftSource;
use crate::config::RetryConfig;
use crate::error::{FetchError, PaginationError};
use crate::metadata::Nft;

pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Supply every project is assumed to have when nothing else is known.
pub const FIXED_SUPPLY: u64 = 1000;

/// Owner addresses of tokens still held by the platform start with this.
pub const UNCLAIMED_PREFIX: &str = "shop";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClaimCounts {
    pub claimed: u64,
    pub unclaimed: u64,
}

impl ClaimCounts {
    pub fn total(&self) -> u64 {
        self.claimed + self.unclaimed
    }
}

pub fn is_unclaimed(nft: &Nft, prefix: &str) -> bool {
    nft.owner_address
        .as_deref()
        .is_some_and(|owner| owner.starts_with(prefix))
}

pub fn classify(records: &[Nft]) -> ClaimCounts {
    classify_by(records, UNCLAIMED_PREFIX)
}

pub fn classify_by(records: &[Nft], prefix: &str) -> ClaimCounts {
    let unclaimed = records.iter().filter(|n| is_unclaimed(n, prefix)).count() as u64;
    ClaimCounts {
        claimed: records.len() as u64 - unclaimed,
        unclaimed,
    }
}

/// Tokens left out of the fixed supply. Negative when the API reports more
/// claimed tokens than the supply allows.
pub fn remaining(claimed: u64) -> i64 {
    remaining_of(claimed, FIXED_SUPPLY)
}

pub fn remaining_of(claimed: u64, supply: u64) -> i64 {
    supply as i64 - claimed as i64
}

/// Result of aggregating one project.
#[derive(Debug)]
pub struct ProjectNfts {
    pub project_id: u64,
    pub records: Vec<Nft>,
    /// Set when a page failed and `records` holds only the pages before it.
    pub truncated_at: Option<u32>,
}

pub struct ProjectNftAggregator<'a, S: NftSource> {
    source: &'a S,
    page_size: u32,
    retry: RetryConfig,
}

impl<'a, S: NftSource> ProjectNftAggregator<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            page_size: DEFAULT_PAGE_SIZE,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn source(&self) -> &'a S {
        self.source
    }

    /// Fetches pages until one comes back empty. A failed page is logged and
    /// ends the collection early; whatever was fetched before it is returned.
    pub fn fetch_all(&self, project_id: u64) -> Vec<Nft> {
        self.fetch_project(project_id).records
    }

    /// [`fetch_all`](Self::fetch_all) that also records where a failed page
    /// cut the collection short.
    pub fn fetch_project(&self, project_id: u64) -> ProjectNfts {
        match self.try_fetch_all(project_id) {
            Ok(records) => ProjectNfts {
                project_id,
                records,
                truncated_at: None,
            },
            Err(err) => {
                error!(
                    project_id,
                    page = err.page,
                    error = %err.source,
                    "Error making the API request for project"
                );
                ProjectNfts {
                    project_id,
                    truncated_at: Some(err.page),
                    records: err.fetched,
                }
            }
        }
    }

    /// Like [`fetch_all`](Self::fetch_all), but a failed page is returned as an
    /// error carrying the records fetched so far.
    pub fn try_fetch_all(&self, project_id: u64) -> Result<Vec<Nft>, PaginationError> {
        let mut all = Vec::new();
        let mut page = 1u32;

        loop {
            let batch = match self.fetch_page(project_id, page) {
                Ok(batch) => batch,
                Err(source) => {
                    return Err(PaginationError {
                        project_id,
                        page,
                        fetched: all,
                        source,
                    });
                }
            };

            if batch.is_empty() {
                break;
            }

            debug!(project_id, page, count = batch.len(), "page fetched");
            all.extend(batch);
            page += 1;
        }

        Ok(all)
    }

    fn fetch_page(&self, project_id: u64, page: u32) -> Result<Vec<Nft>, FetchError> {
        let mut attempt = 0u32;
        loop {
            match self.source.nft_page(project_id, page, self.page_size) {
                Ok(batch) => return Ok(batch),
                Err(err) if err.is_retryable() && attempt < self.retry.attempts => {
                    attempt += 1;
                    let delay = Duration::from_millis(self.retry.backoff_ms * attempt as u64);
                    warn!(
                        project_id,
                        page,
                        attempt,
                        error = %err,
                        "page request failed, retrying in {:?}",
                        delay
                    );
                    thread::sleep(delay);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Aggregates several projects in parallel; pages within one project stay
    /// sequential. Results come back in the order of `project_ids`.
    pub fn fetch_projects(&self, project_ids: &[u64]) -> Vec<ProjectNfts> {
        project_ids
            .par_iter()
            .map(|&project_id| self.fetch_project(project_id))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::metadata::{NftAttributes, PageMeta, Project, ProjectPage};
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    pub(crate) fn nft(id: u64, project_id: u64, owner: Option<&str>) -> Nft {
        Nft {
            id,
            status: "confirmed".to_string(),
            project_id,
            mint_address: format!("mint{id}"),
            owner_address: owner.map(str::to_string),
            name: format!("#{id}"),
            symbol: "VD".to_string(),
            description: String::new(),
            image: String::new(),
            animation_url: None,
            attributes: NftAttributes::default(),
            external_url: None,
        }
    }

    pub(crate) fn project(id: u64) -> Project {
        Project {
            id,
            name: format!("Project {id}"),
            image: format!("https://example.com/{id}.png"),
            mint_address: format!("collection{id}"),
            description: None,
            attributes: None,
            network: None,
        }
    }

    /// In-memory source. Records every page request and fails the pages
    /// listed in `failing` a configurable number of times.
    #[derive(Default)]
    pub(crate) struct FakeSource {
        pub nfts: HashMap<u64, Vec<Nft>>,
        pub projects: Vec<Project>,
        pub missing_projects: HashSet<u64>,
        pub failing_listing_pages: HashSet<u32>,
        pub failing: Mutex<HashMap<(u64, u32), u32>>,
        /// HTTP status of injected page failures; 503 when unset.
        pub failure_status: Option<u16>,
        pub requests: Mutex<Vec<(u64, u32)>>,
    }

    impl FakeSource {
        pub(crate) fn with_project(mut self, project_id: u64, count: u64) -> Self {
            let records = (1..=count)
                .map(|i| {
                    let owner = if i % 4 == 0 { format!("shop{i}") } else { format!("7x{i}abc") };
                    nft(i, project_id, Some(&owner))
                })
                .collect();
            self.nfts.insert(project_id, records);
            self.projects.push(project(project_id));
            self
        }

        pub(crate) fn failing_page(self, project_id: u64, page: u32, times: u32) -> Self {
            self.failing.lock().unwrap().insert((project_id, page), times);
            self
        }

        pub(crate) fn requests_for(&self, project_id: u64) -> Vec<u32> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|(p, _)| *p == project_id)
                .map(|(_, page)| *page)
                .collect()
        }
    }

    impl NftSource for FakeSource {
        fn nft_page(&self, project_id: u64, page: u32, limit: u32) -> Result<Vec<Nft>, FetchError> {
            self.requests.lock().unwrap().push((project_id, page));

            if let Some(left) = self.failing.lock().unwrap().get_mut(&(project_id, page)) {
                if *left > 0 {
                    *left -= 1;
                    return Err(FetchError::Status {
                        url: format!("fake://projects/{project_id}/nfts?page={page}"),
                        status: self.failure_status.unwrap_or(503),
                    });
                }
            }

            let all = self.nfts.get(&project_id).map(Vec::as_slice).unwrap_or(&[]);
            let start = ((page - 1) * limit) as usize;
            let end = (start + limit as usize).min(all.len());
            Ok(all.get(start..end).map(<[Nft]>::to_vec).unwrap_or_default())
        }

        fn project(&self, project_id: u64) -> Result<Project, FetchError> {
            if self.missing_projects.contains(&project_id) {
                return Err(FetchError::Status {
                    url: format!("fake://projects/{project_id}"),
                    status: 404,
                });
            }
            self.projects
                .iter()
                .find(|p| p.id == project_id)
                .cloned()
                .ok_or_else(|| FetchError::Other(format!("no project {project_id}")))
        }

        fn project_page(&self, page: u32, limit: u32) -> Result<ProjectPage, FetchError> {
            if self.failing_listing_pages.contains(&page) {
                return Err(FetchError::Other(format!("listing page {page} unavailable")));
            }
            let limit = limit as usize;
            let total_pages = self.projects.len().div_ceil(limit).max(1) as u32;
            let start = (page as usize - 1) * limit;
            let end = (start + limit).min(self.projects.len());
            Ok(ProjectPage {
                results: self.projects.get(start..end).map(<[Project]>::to_vec).unwrap_or_default(),
                meta: PageMeta { total_pages },
            })
        }
    }

    fn owners(list: &[&str]) -> Vec<Nft> {
        list.iter()
            .enumerate()
            .map(|(i, o)| nft(i as u64, 1, Some(o)))
            .collect()
    }

    #[test]
    fn classify_example_addresses() {
        let counts = classify(&owners(&["shop1", "7x...abc", "shopXYZ"]));
        assert_eq!(counts, ClaimCounts { claimed: 1, unclaimed: 2 });
    }

    #[test]
    fn classify_empty_input() {
        assert_eq!(classify(&[]), ClaimCounts::default());
    }

    #[test]
    fn classify_is_total_for_odd_owners() {
        let mut records = owners(&["", "shop", "SHOP1", " shop", "sho", "shopping"]);
        records.push(nft(99, 1, None));
        let counts = classify(&records);
        assert_eq!(counts.total(), records.len() as u64);
        assert_eq!(counts.unclaimed, 2);
        assert_eq!(counts.claimed, 5);
    }

    #[test]
    fn classify_ignores_order() {
        let mut records = owners(&["shopA", "abc", "shopB", "def", "ghi", "shopC", "xyz"]);
        let expected = classify(&records);
        records.reverse();
        assert_eq!(classify(&records), expected);
        records.rotate_left(3);
        assert_eq!(classify(&records), expected);
    }

    #[test]
    fn classify_by_custom_prefix() {
        let counts = classify_by(&owners(&["vault1", "shop1", "user"]), "vault");
        assert_eq!(counts, ClaimCounts { claimed: 2, unclaimed: 1 });
    }

    #[test]
    fn remaining_boundaries() {
        assert_eq!(remaining(0), 1000);
        assert_eq!(remaining(1000), 0);
        assert_eq!(remaining(1200), -200);
        assert_eq!(remaining_of(30, 50), 20);
    }

    #[test]
    fn fetch_all_stops_at_first_empty_page() {
        let source = FakeSource::default().with_project(2, 137);
        let records = ProjectNftAggregator::new(&source).fetch_all(2);

        assert_eq!(records.len(), 137);
        assert_eq!(source.requests_for(2), vec![1, 2, 3]);
        let ids: Vec<u64> = records.iter().map(|n| n.id).collect();
        assert_eq!(ids, (1..=137).collect::<Vec<_>>());
    }

    #[test]
    fn fetch_all_exact_multiple_requests_terminating_page() {
        let source = FakeSource::default().with_project(4, 200);
        let records = ProjectNftAggregator::new(&source).fetch_all(4);

        assert_eq!(records.len(), 200);
        assert_eq!(source.requests_for(4), vec![1, 2, 3]);
    }

    #[test]
    fn fetch_all_empty_project() {
        let source = FakeSource::default().with_project(5, 0);
        assert!(ProjectNftAggregator::new(&source).fetch_all(5).is_empty());
        assert_eq!(source.requests_for(5), vec![1]);
    }

    #[test]
    fn fetch_all_keeps_pages_before_a_failure() {
        let source = FakeSource::default()
            .with_project(2, 250)
            .failing_page(2, 2, 1);
        let records = ProjectNftAggregator::new(&source).fetch_all(2);

        assert_eq!(records.len(), 100);
        assert_eq!(source.requests_for(2), vec![1, 2]);
    }

    #[test]
    fn try_fetch_all_reports_failed_page() {
        let source = FakeSource::default()
            .with_project(2, 250)
            .failing_page(2, 2, 1);
        let err = ProjectNftAggregator::new(&source).try_fetch_all(2).unwrap_err();

        assert_eq!(err.project_id, 2);
        assert_eq!(err.page, 2);
        assert_eq!(err.fetched.len(), 100);
        assert!(matches!(err.source, FetchError::Status { status: 503, .. }));
    }

    #[test]
    fn retry_recovers_a_flaky_page() {
        let source = FakeSource::default()
            .with_project(2, 150)
            .failing_page(2, 2, 2);
        let records = ProjectNftAggregator::new(&source)
            .with_retry(RetryConfig { attempts: 2, backoff_ms: 0 })
            .try_fetch_all(2)
            .unwrap();

        assert_eq!(records.len(), 150);
        assert_eq!(source.requests_for(2), vec![1, 2, 2, 2, 3]);
    }

    #[test]
    fn permanent_failure_is_not_retried() {
        let mut source = FakeSource::default()
            .with_project(2, 150)
            .failing_page(2, 2, 5);
        source.failure_status = Some(404);
        let err = ProjectNftAggregator::new(&source)
            .with_retry(RetryConfig { attempts: 3, backoff_ms: 0 })
            .try_fetch_all(2)
            .unwrap_err();

        assert!(matches!(err.source, FetchError::Status { status: 404, .. }));
        assert_eq!(source.requests_for(2), vec![1, 2]);
    }

    #[test]
    fn custom_page_size() {
        let source = FakeSource::default().with_project(2, 25);
        let records = ProjectNftAggregator::new(&source)
            .with_page_size(10)
            .fetch_all(2);

        assert_eq!(records.len(), 25);
        assert_eq!(source.requests_for(2), vec![1, 2, 3, 4]);
    }

    #[test]
    fn fetch_projects_preserves_input_order() {
        let source = FakeSource::default()
            .with_project(2, 120)
            .with_project(4, 7)
            .with_project(5, 301)
            .failing_page(5, 3, 1);
        let results = ProjectNftAggregator::new(&source).fetch_projects(&[5, 2, 4]);

        let ids: Vec<u64> = results.iter().map(|r| r.project_id).collect();
        assert_eq!(ids, vec![5, 2, 4]);
        assert_eq!(results[0].records.len(), 200);
        assert_eq!(results[0].truncated_at, Some(3));
        assert_eq!(results[1].records.len(), 120);
        assert_eq!(results[1].truncated_at, None);
        assert_eq!(results[2].records.len(), 7);
        assert!(results[2].records.iter().all(|n| n.project_id == 4));
    }
}
