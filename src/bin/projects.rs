use anyhow::{Context, Result};
use project_nft_stats::catalog::{featured, fetch_catalog};
use project_nft_stats::config::Config;
use project_nft_stats::ApiClient;

fn main() -> Result<()> {
    project_nft_stats::init_tracing();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.yaml".to_string());
    let cfg = Config::load(&config_path)?;

    let token = cfg.api.token()?;
    let client = ApiClient::new(&cfg.api, token).context("failed to build the API client")?;

    let projects = fetch_catalog(&client, cfg.api.page_size);
    let highlighted = featured(&projects, &cfg.projects);

    println!("==============================");
    println!(" Projects");
    println!(" Total: {}  Featured: {}", projects.len(), highlighted.len());
    println!("==============================\n");

    for project in &projects {
        let mark = if cfg.projects.contains(&project.id) { "★" } else { " " };
        println!("{} #{:<5} {:30} {}", mark, project.id, project.name, project.mint_address);
        if let Some(link) = project.payment_link() {
            println!("         pay: {}", link);
        }
    }

    let missing: Vec<u64> = cfg
        .projects
        .iter()
        .copied()
        .filter(|id| !highlighted.iter().any(|p| p.id == *id))
        .collect();
    if !missing.is_empty() {
        println!("\n⚠ featured projects not in the listing: {:?}", missing);
    }

    Ok(())
}
