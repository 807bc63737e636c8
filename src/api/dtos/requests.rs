use serde::Deserialize;

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
pub struct ListLiveSessionsQuery {
    #[serde(default = "default_true")]
    pub include_cancelled: bool,
}
