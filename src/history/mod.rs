//! Calculation history: the single write path that records a calculation
//! together with its owner's derived statistics, plus the read side.

mod aggregate;

pub use aggregate::fold_into;

use std::sync::Arc;

use serde::Serialize;

use crate::models::{Calculation, NewCalculation, OperatorCount, User};
use crate::store::{Store, StoreError};

pub const DEFAULT_PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub items: Vec<Calculation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteStats {
    pub favorite_operator: Option<String>,
    pub total_calculations: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorBreakdown {
    pub user_id: i64,
    pub total_calculations: i64,
    pub operators: Vec<OperatorCount>,
}

#[derive(Clone)]
pub struct History {
    store: Arc<dyn Store>,
    page_size: usize,
}

impl History {
    pub fn new(store: Arc<dyn Store>, page_size: usize) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
        }
    }

    /// Stores a calculation, anonymous when `user` is `None`. For an owned
    /// calculation the owner's count, favorite operator and last calculation
    /// are updated atomically with the insert.
    pub async fn record(
        &self,
        user: Option<&User>,
        expression: &str,
        result: &str,
        operator: &str,
    ) -> Result<Calculation, StoreError> {
        let calculation = self
            .store
            .append(NewCalculation {
                user_id: user.map(|u| u.id),
                expression: expression.to_string(),
                result: result.to_string(),
                operator: operator.to_string(),
            })
            .await?;

        tracing::debug!(
            "Recorded calculation {} for {:?}: {} = {} [{}]",
            calculation.id,
            calculation.user_id,
            calculation.expression,
            calculation.result,
            calculation.operator
        );
        Ok(calculation)
    }

    async fn owner(&self, user_id: i64) -> Result<User, StoreError> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or(StoreError::UserNotFound(user_id))
    }

    /// All of a user's calculations, newest first.
    pub async fn all_for_user(&self, user_id: i64) -> Result<Vec<Calculation>, StoreError> {
        self.owner(user_id).await?;
        self.store.list_by_user(user_id).await
    }

    /// One page of a user's history, newest first. The operator filter is an
    /// exact match on the stored tag and is applied before paging.
    pub async fn list_by_user(
        &self,
        user_id: i64,
        page: Option<usize>,
        operator: Option<&str>,
    ) -> Result<HistoryPage, StoreError> {
        let mut items = self.all_for_user(user_id).await?;
        if let Some(operator) = operator {
            items.retain(|c| c.operator == operator);
        }

        let page = page.unwrap_or(1).max(1);
        let total = items.len();
        let items = items
            .into_iter()
            .skip((page - 1).saturating_mul(self.page_size))
            .take(self.page_size)
            .collect();

        Ok(HistoryPage {
            total,
            page,
            page_size: self.page_size,
            items,
        })
    }

    pub async fn favorite_stats(&self, user_id: i64) -> Result<FavoriteStats, StoreError> {
        let user = self.owner(user_id).await?;
        Ok(FavoriteStats {
            favorite_operator: user.favorite_operator,
            total_calculations: user.calculations_count,
        })
    }

    pub async fn operator_breakdown(&self, user_id: i64) -> Result<OperatorBreakdown, StoreError> {
        let user = self.owner(user_id).await?;
        Ok(OperatorBreakdown {
            user_id,
            total_calculations: user.calculations_count,
            operators: user.operator_tally.ranked(),
        })
    }

    /// The most recent calculation, if the user has any.
    pub async fn last_result(&self, user_id: i64) -> Result<Option<Calculation>, StoreError> {
        Ok(self.all_for_user(user_id).await?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::NewUser;
    use crate::store::{CalculationStore, MemoryStore, UserStore};

    async fn setup() -> (History, Arc<MemoryStore>, User) {
        let store = Arc::new(MemoryStore::new());
        let user = store
            .create_user(NewUser {
                email: "grace@example.com".to_string(),
                password: "pw".to_string(),
                name: "Grace".to_string(),
                icon: None,
                join_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            })
            .await
            .unwrap();
        (History::new(store.clone(), DEFAULT_PAGE_SIZE), store, user)
    }

    #[tokio::test]
    async fn record_updates_aggregates() {
        let (history, store, user) = setup().await;
        history.record(Some(&user), "1 + 2", "3", "+").await.unwrap();
        history.record(Some(&user), "4 + 4", "8", "+").await.unwrap();
        history.record(Some(&user), "5 - 1", "4", "-").await.unwrap();

        let user = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(user.calculations_count, 3);
        assert_eq!(user.favorite_operator.as_deref(), Some("+"));

        let stats = history.favorite_stats(user.id).await.unwrap();
        assert_eq!(
            stats,
            FavoriteStats {
                favorite_operator: Some("+".to_string()),
                total_calculations: 3,
            }
        );
    }

    #[tokio::test]
    async fn record_sets_last_calculation_summary() {
        let (history, store, user) = setup().await;
        let calculation = history.record(Some(&user), "5 + 3", "8", "+").await.unwrap();
        assert_eq!(calculation.user_id, Some(user.id));

        let user = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(user.last_calculation.as_deref(), Some("5 + 3 = 8"));
    }

    #[tokio::test]
    async fn anonymous_records_are_not_aggregated() {
        let (history, store, user) = setup().await;
        let calculation = history.record(None, "2 * 2", "4", "*").await.unwrap();
        assert_eq!(calculation.user_id, None);

        let user = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(user.calculations_count, 0);
        assert_eq!(user.favorite_operator, None);
    }

    #[tokio::test]
    async fn pages_newest_first() {
        let (history, _, user) = setup().await;
        for i in 1..=12 {
            history
                .record(Some(&user), &format!("{i} + 0"), &i.to_string(), "+")
                .await
                .unwrap();
        }

        let first = history.list_by_user(user.id, Some(1), None).await.unwrap();
        assert_eq!(first.total, 12);
        assert_eq!(first.page_size, 5);
        let results: Vec<&str> = first.items.iter().map(|c| c.result.as_str()).collect();
        assert_eq!(results, ["12", "11", "10", "9", "8"]);

        let third = history.list_by_user(user.id, Some(3), None).await.unwrap();
        let results: Vec<&str> = third.items.iter().map(|c| c.result.as_str()).collect();
        assert_eq!(results, ["2", "1"]);

        let beyond = history.list_by_user(user.id, Some(4), None).await.unwrap();
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total, 12);

        let clamped = history.list_by_user(user.id, Some(0), None).await.unwrap();
        assert_eq!(clamped.page, 1);
        assert_eq!(clamped.items, first.items);
    }

    #[tokio::test]
    async fn listing_is_repeatable() {
        let (history, _, user) = setup().await;
        for op in ["+", "-", "*"] {
            history.record(Some(&user), "x", "1", op).await.unwrap();
        }
        let once = history.list_by_user(user.id, None, None).await.unwrap();
        let twice = history.list_by_user(user.id, None, None).await.unwrap();
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn filters_by_exact_operator_tag() {
        let (history, _, user) = setup().await;
        for op in ["+", "-", "+", "sin", "+"] {
            history.record(Some(&user), "x", "1", op).await.unwrap();
        }

        let plus = history.list_by_user(user.id, None, Some("+")).await.unwrap();
        assert_eq!(plus.total, 3);
        assert!(plus.items.iter().all(|c| c.operator == "+"));

        let spaced = history.list_by_user(user.id, None, Some(" ")).await.unwrap();
        assert_eq!(spaced.total, 0);
    }

    #[tokio::test]
    async fn breakdown_and_last_result() {
        let (history, _, user) = setup().await;
        assert_eq!(history.last_result(user.id).await.unwrap(), None);

        for op in ["-", "+", "+", ""] {
            history.record(Some(&user), "x", "7", op).await.unwrap();
        }
        history.record(Some(&user), "sin(30)", "0.5", "sin").await.unwrap();

        let breakdown = history.operator_breakdown(user.id).await.unwrap();
        assert_eq!(breakdown.total_calculations, 5);
        let ops: Vec<(&str, u64)> = breakdown
            .operators
            .iter()
            .map(|e| (e.operator.as_str(), e.count))
            .collect();
        assert_eq!(ops, [("+", 2), ("-", 1), ("sin", 1)]);

        let last = history.last_result(user.id).await.unwrap().unwrap();
        assert_eq!(last.result, "0.5");
        assert_eq!(last.operator, "sin");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_records_keep_aggregates_exact() {
        let (history, store, user) = setup().await;

        let mut tasks = Vec::new();
        for i in 0..200 {
            let history = history.clone();
            let user = user.clone();
            let operator = if i % 4 == 0 { "-" } else { "+" };
            tasks.push(tokio::spawn(async move {
                history
                    .record(Some(&user), &format!("{i} {operator} 1"), "0", operator)
                    .await
                    .unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let stored = store.list_by_user(user.id).await.unwrap();
        let user = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(stored.len(), 200);
        assert_eq!(user.calculations_count, 200);
        assert_eq!(user.favorite_operator.as_deref(), Some("+"));
        assert_eq!(user.last_calculation, Some(stored[0].summary()));

        let breakdown = history.operator_breakdown(user.id).await.unwrap();
        let counts: Vec<(&str, u64)> = breakdown
            .operators
            .iter()
            .map(|e| (e.operator.as_str(), e.count))
            .collect();
        assert_eq!(counts, [("+", 150), ("-", 50)]);
    }

    #[tokio::test]
    async fn unknown_user_is_reported() {
        let (history, _, _) = setup().await;
        assert!(matches!(
            history.list_by_user(404, None, None).await,
            Err(StoreError::UserNotFound(404))
        ));
        assert!(matches!(
            history.favorite_stats(404).await,
            Err(StoreError::UserNotFound(404))
        ));
    }
}
