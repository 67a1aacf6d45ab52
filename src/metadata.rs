use serde::{Deserialize, Serialize};

/// A collection tracked by the minting platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub mint_address: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub attributes: Option<ProjectAttributes>,
    #[serde(default)]
    pub network: Option<String>,
}

impl Project {
    pub fn payment_link(&self) -> Option<&str> {
        self.attributes
            .as_ref()
            .and_then(|a| a.payment_link.as_deref())
            .filter(|link| !link.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAttributes {
    #[serde(default)]
    pub payment_link: Option<String>,
}

/// One minted token and its current holder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nft {
    pub id: u64,
    #[serde(default)]
    pub status: String,
    pub project_id: u64,
    #[serde(default)]
    pub mint_address: String,
    /// Null for tokens the API has not assigned yet.
    #[serde(default)]
    pub owner_address: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub animation_url: Option<String>,
    #[serde(default)]
    pub attributes: NftAttributes,
    #[serde(default)]
    pub external_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftAttributes {
    #[serde(default)]
    pub seller_fee_basis_points: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub payment_link: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NftPage {
    pub results: Vec<Nft>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectPage {
    pub results: Vec<Project>,
    pub meta: PageMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total_pages: u32,
}
