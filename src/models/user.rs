use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub name: String,
    pub icon: Option<i32>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub join_date: Option<NaiveDate>,
    pub last_login: Option<DateTime<Utc>>,
    pub calculations_count: i64,
    pub favorite_operator: Option<String>,
    pub last_calculation: Option<String>,
    #[serde(skip_serializing)]
    pub operator_tally: Json<OperatorTally>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub icon: Option<i32>,
    pub join_date: NaiveDate,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorCount {
    pub operator: String,
    pub count: u64,
}

/// Per-operator counters kept in the order each operator was first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatorTally(Vec<OperatorCount>);

impl OperatorTally {
    pub fn bump(&mut self, operator: &str) {
        match self.0.iter_mut().find(|entry| entry.operator == operator) {
            Some(entry) => entry.count += 1,
            None => self.0.push(OperatorCount {
                operator: operator.to_string(),
                count: 1,
            }),
        }
    }

    /// The operator with the highest count; on a tie the one seen first wins.
    pub fn leader(&self) -> Option<&str> {
        let mut best: Option<&OperatorCount> = None;
        for entry in &self.0 {
            if best.is_none_or(|b| entry.count > b.count) {
                best = Some(entry);
            }
        }
        best.map(|entry| entry.operator.as_str())
    }

    /// Counts sorted by descending count, ties kept in first-seen order.
    pub fn ranked(&self) -> Vec<OperatorCount> {
        let mut ranked = self.0.clone();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
