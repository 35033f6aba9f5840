use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeRequest {
    pub expression1: f64,
    pub operator: String,
    pub expression2: Option<f64>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainRequest {
    pub expression: String,
    pub user_id: Option<i64>,
}

/// Body of the one-argument endpoints (`/log`, `/sqrt`, ...).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnaryRequest {
    #[serde(alias = "value")]
    pub x: Option<f64>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ManualRecordRequest {
    pub expression: String,
    pub result: String,
    #[serde(default)]
    pub operator: String,
}

#[derive(Debug, Serialize)]
pub struct CalculationResponse {
    pub result: f64,
    pub operator: String,
}

/// Last stored result, as recorded.
#[derive(Debug, Serialize)]
pub struct AnsResponse {
    pub result: String,
    pub operator: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<String>,
    pub operator: Option<String>,
}

impl HistoryQuery {
    /// Lenient page parsing: anything unreadable means the first page.
    pub fn page(&self) -> Option<usize> {
        self.page.as_deref().and_then(|p| p.trim().parse().ok())
    }
}
