use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use tokio::sync::Mutex;

use super::{CalculationStore, StoreError, UserStore};
use crate::history::fold_into;
use crate::models::{Calculation, NewCalculation, NewUser, OperatorTally, User, UserUpdate};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    calculations: Vec<Calculation>,
    last_user_id: i64,
    last_calculation_id: i64,
    last_created_at: Option<DateTime<Utc>>,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|user| user.email == email && Some(user.id) != except)
    }

    /// Creation timestamps never go backwards, even if the wall clock does.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let at = match self.last_created_at {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_created_at = Some(at);
        at
    }
}

/// Store kept entirely in process memory.
///
/// One lock covers both tables, so appending a calculation and updating its
/// owner can never interleave with another write.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(calculations: &mut [Calculation]) {
    calculations.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.email_taken(&new.email, None) {
            return Err(StoreError::EmailAlreadyUsed);
        }

        tables.last_user_id += 1;
        let user = User {
            id: tables.last_user_id,
            email: new.email,
            password: new.password,
            name: new.name,
            icon: new.icon,
            phone: None,
            department: None,
            join_date: Some(new.join_date),
            last_login: None,
            calculations_count: 0,
            favorite_operator: None,
            last_calculation: None,
            operator_tally: Json(OperatorTally::default()),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.tables.lock().await.users.values().cloned().collect())
    }

    async fn update_user(
        &self,
        id: i64,
        update: UserUpdate,
    ) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.lock().await;
        if let Some(email) = &update.email {
            if tables.email_taken(email, Some(id)) {
                return Err(StoreError::EmailAlreadyUsed);
            }
        }

        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(password) = update.password {
            user.password = password;
        }
        if let Some(name) = update.name {
            user.name = name;
        }
        Ok(Some(user.clone()))
    }

    async fn record_login(&self, id: i64, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let user = tables
            .users
            .get_mut(&id)
            .ok_or(StoreError::UserNotFound(id))?;
        user.last_login = Some(at);
        Ok(())
    }

    async fn delete_user(&self, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        tables.calculations.retain(|c| c.user_id != Some(id));
        Ok(true)
    }

    async fn delete_all_users(&self) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock().await;
        let removed = tables.users.len() as u64;
        tables.users.clear();
        tables.calculations.retain(|c| c.user_id.is_none());
        Ok(removed)
    }
}

#[async_trait]
impl CalculationStore for MemoryStore {
    async fn append(&self, new: NewCalculation) -> Result<Calculation, StoreError> {
        let mut tables = self.tables.lock().await;
        if let Some(user_id) = new.user_id {
            if !tables.users.contains_key(&user_id) {
                return Err(StoreError::UserNotFound(user_id));
            }
        }

        tables.last_calculation_id += 1;
        let calculation = Calculation {
            id: tables.last_calculation_id,
            expression: new.expression,
            operator: new.operator,
            result: new.result,
            created_at: tables.next_timestamp(),
            user_id: new.user_id,
        };

        if let Some(owner) = calculation
            .user_id
            .and_then(|id| tables.users.get_mut(&id))
        {
            fold_into(owner, &calculation);
        }
        tables.calculations.push(calculation.clone());
        Ok(calculation)
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Calculation>, StoreError> {
        let tables = self.tables.lock().await;
        let mut owned: Vec<Calculation> = tables
            .calculations
            .iter()
            .filter(|c| c.user_id == Some(user_id))
            .cloned()
            .collect();
        newest_first(&mut owned);
        Ok(owned)
    }

    async fn list_all(&self) -> Result<Vec<Calculation>, StoreError> {
        let mut all = self.tables.lock().await.calculations.clone();
        newest_first(&mut all);
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password: "pw".to_string(),
            name: "Test".to_string(),
            icon: Some(2),
            join_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        }
    }

    fn new_calculation(user_id: Option<i64>, operator: &str) -> NewCalculation {
        NewCalculation {
            user_id,
            expression: format!("1 {operator} 1"),
            result: "1".to_string(),
            operator: operator.to_string(),
        }
    }

    #[tokio::test]
    async fn rejects_duplicate_email() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@b.c")).await.unwrap();
        let err = store.create_user(new_user("a@b.c")).await.unwrap_err();
        assert!(matches!(err, StoreError::EmailAlreadyUsed));
    }

    #[tokio::test]
    async fn update_keeps_email_unique_across_users() {
        let store = MemoryStore::new();
        let first = store.create_user(new_user("one@x.io")).await.unwrap();
        let second = store.create_user(new_user("two@x.io")).await.unwrap();

        let conflict = UserUpdate {
            email: Some("one@x.io".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            store.update_user(second.id, conflict).await,
            Err(StoreError::EmailAlreadyUsed)
        ));

        let same = UserUpdate {
            email: Some("one@x.io".to_string()),
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        let updated = store.update_user(first.id, same).await.unwrap().unwrap();
        assert_eq!(updated.name, "Renamed");
        assert!(store.update_user(99, UserUpdate::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn append_updates_owner_and_lists_newest_first() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("u@x.io")).await.unwrap();
        for op in ["+", "+", "-"] {
            store.append(new_calculation(Some(user.id), op)).await.unwrap();
        }
        store.append(new_calculation(None, "*")).await.unwrap();

        let user = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(user.calculations_count, 3);
        assert_eq!(user.favorite_operator.as_deref(), Some("+"));

        let history = store.list_by_user(user.id).await.unwrap();
        let ids: Vec<i64> = history.iter().map(|c| c.id).collect();
        assert_eq!(ids, [3, 2, 1]);
        assert_eq!(store.list_all().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn append_for_missing_owner_stores_nothing() {
        let store = MemoryStore::new();
        let err = store.append(new_calculation(Some(7), "+")).await.unwrap_err();
        assert!(matches!(err, StoreError::UserNotFound(7)));
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_users_cascades_but_keeps_anonymous_history() {
        let store = MemoryStore::new();
        let a = store.create_user(new_user("a@x.io")).await.unwrap();
        let b = store.create_user(new_user("b@x.io")).await.unwrap();
        store.append(new_calculation(Some(a.id), "+")).await.unwrap();
        store.append(new_calculation(Some(b.id), "+")).await.unwrap();
        store.append(new_calculation(None, "+")).await.unwrap();

        assert!(store.delete_user(a.id).await.unwrap());
        assert!(!store.delete_user(a.id).await.unwrap());
        assert_eq!(store.list_all().await.unwrap().len(), 2);

        assert_eq!(store.delete_all_users().await.unwrap(), 1);
        let remaining = store.list_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].user_id, None);
    }
}
