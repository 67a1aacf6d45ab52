use project_nft_stats::config::Config;
use project_nft_stats::view::{ensure_complete, ProjectView, ViewState};
use project_nft_stats::{ApiClient, ProjectNftAggregator};

use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use tracing::{info, warn};

fn main() -> Result<()> {
    project_nft_stats::init_tracing();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.yaml".to_string());
    let cfg = Config::load(&config_path)
        .with_context(|| format!("failed to load {}", config_path))?;

    if cfg.projects.is_empty() {
        bail!("no projects listed in {}", config_path);
    }

    let token = cfg.api.token()?;
    let client = ApiClient::new(&cfg.api, token).context("failed to build the API client")?;
    let aggregator = ProjectNftAggregator::new(&client)
        .with_page_size(cfg.api.page_size)
        .with_retry(cfg.retry);

    info!(
        base_url = client.base_url(),
        projects = ?cfg.projects,
        page_size = cfg.api.page_size,
        "Fetching NFTs"
    );

    let views: Vec<ProjectView> = cfg
        .projects
        .par_iter()
        .map(|&project_id| {
            let mut view = ProjectView::new(project_id)
                .with_supply(cfg.total_supply)
                .with_unclaimed_prefix(&cfg.unclaimed_prefix);
            view.load(&aggregator);
            view
        })
        .collect();

    println!("==============================");
    println!(" Project NFT Stats (supply {})", cfg.total_supply);
    println!("==============================\n");

    for view in &views {
        match view.state() {
            ViewState::Loaded(summary) => {
                println!("▶ #{} {}", summary.project.id, summary.project.name);
                println!("  Fetched:   {}", summary.fetched);
                println!("  Claimed:   {}", summary.claimed);
                println!("  Unclaimed: {}", summary.unclaimed);
                println!("  Remaining: {}", summary.remaining);
                if let Some(link) = &summary.payment_link {
                    println!("  Pay:       {}", link);
                }
                if let Some(page) = summary.truncated_at {
                    if cfg.strict {
                        warn!(
                            project_id = summary.project.id,
                            page,
                            "listing incomplete, counts cover only the pages before the failure"
                        );
                        println!("  ⚠ incomplete: page {} failed", page);
                    }
                }
                if summary.remaining < 0 {
                    warn!(
                        project_id = summary.project.id,
                        claimed = summary.claimed,
                        supply = cfg.total_supply,
                        "more claimed NFTs than the configured supply"
                    );
                }
            }
            ViewState::Failed(reason) => {
                println!("▶ #{} ❌ {}", view.project_id(), reason);
            }
            ViewState::Idle | ViewState::Loading => {}
        }
        println!();
    }

    if cfg.strict {
        ensure_complete(&views)?;
    }

    Ok(())
}
