use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    pub limit: Option<usize>,
}
