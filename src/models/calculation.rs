use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// One stored computation. Never updated after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Calculation {
    pub id: i64,
    pub expression: String,
    pub operator: String,
    pub result: String,
    pub created_at: DateTime<Utc>,
    /// `None` for anonymous calculations.
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewCalculation {
    pub user_id: Option<i64>,
    pub expression: String,
    pub result: String,
    pub operator: String,
}

impl Calculation {
    /// `"<expression> = <result>"`, the form kept as a user's last calculation.
    pub fn summary(&self) -> String {
        format!("{} = {}", self.expression, self.result)
    }
}
