//! Display lifecycle of a single project: `Idle -> Loading -> Loaded | Failed`.

use anyhow::{bail, Result};
use tracing::{info, warn};

use crate::aggregator::{
    classify_by, remaining_of, ProjectNftAggregator, FIXED_SUPPLY, UNCLAIMED_PREFIX,
};
use crate::client::NftSource;
use crate::metadata::Project;

/// Everything the project page shows.
#[derive(Debug, Clone)]
pub struct ProjectSummary {
    pub project: Project,
    /// Records actually retrieved; lower than the real count after a failed page.
    pub fetched: u64,
    pub claimed: u64,
    pub unclaimed: u64,
    pub remaining: i64,
    pub payment_link: Option<String>,
    /// Page whose failure cut the NFT listing short.
    pub truncated_at: Option<u32>,
}

#[derive(Debug, Clone)]
pub enum ViewState {
    Idle,
    Loading,
    Loaded(ProjectSummary),
    Failed(String),
}

pub struct ProjectView {
    project_id: u64,
    supply: u64,
    unclaimed_prefix: String,
    state: ViewState,
}

impl ProjectView {
    pub fn new(project_id: u64) -> Self {
        Self {
            project_id,
            supply: FIXED_SUPPLY,
            unclaimed_prefix: UNCLAIMED_PREFIX.to_string(),
            state: ViewState::Idle,
        }
    }

    pub fn with_supply(mut self, supply: u64) -> Self {
        self.supply = supply;
        self
    }

    pub fn with_unclaimed_prefix(mut self, prefix: &str) -> Self {
        self.unclaimed_prefix = prefix.to_string();
        self
    }

    pub fn project_id(&self) -> u64 {
        self.project_id
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn summary(&self) -> Option<&ProjectSummary> {
        match &self.state {
            ViewState::Loaded(summary) => Some(summary),
            _ => None,
        }
    }

    /// Switching to another project resets the view so it can load again.
    pub fn set_project(&mut self, project_id: u64) {
        if project_id != self.project_id {
            self.project_id = project_id;
            self.state = ViewState::Idle;
        }
    }

    /// Loads metadata and NFTs. Only a metadata failure moves the view to
    /// `Failed`; NFT page failures just shrink the counts. A view that already
    /// left `Idle` is not reloaded.
    pub fn load<S: NftSource>(&mut self, aggregator: &ProjectNftAggregator<'_, S>) -> &ViewState {
        if !matches!(self.state, ViewState::Idle) {
            return &self.state;
        }
        self.state = ViewState::Loading;

        let project = match aggregator.source().project(self.project_id) {
            Ok(project) => project,
            Err(e) => {
                warn!(project_id = self.project_id, error = %e, "project metadata unavailable");
                self.state = ViewState::Failed(e.to_string());
                return &self.state;
            }
        };

        let nfts = aggregator.fetch_project(self.project_id);
        let records = nfts.records;
        let counts = classify_by(&records, &self.unclaimed_prefix);
        let remaining = remaining_of(counts.claimed, self.supply);

        info!(
            project_id = self.project_id,
            name = %project.name,
            fetched = records.len(),
            claimed = counts.claimed,
            remaining,
            "project loaded"
        );

        let payment_link = project.payment_link().map(str::to_string);
        self.state = ViewState::Loaded(ProjectSummary {
            project,
            fetched: records.len() as u64,
            claimed: counts.claimed,
            unclaimed: counts.unclaimed,
            remaining,
            payment_link,
            truncated_at: nfts.truncated_at,
        });
        &self.state
    }
}

/// Fails when any view could not load or lost pages of its NFT listing.
pub fn ensure_complete(views: &[ProjectView]) -> Result<()> {
    let incomplete = views
        .iter()
        .filter(|view| match view.state() {
            ViewState::Loaded(summary) => summary.truncated_at.is_some(),
            _ => true,
        })
        .count();
    if incomplete > 0 {
        bail!("{} project(s) could not be fetched completely", incomplete);
    }
    Ok(())
}
