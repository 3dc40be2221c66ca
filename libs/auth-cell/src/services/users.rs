use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::{decode, decode_all, encode, Collection, Filter, RecordStore, StoreError, ID_FIELD};
use shared_models::records::{Role, User};
use shared_models::responses::{InsertResult, UpdateResult};
use shared_utils::jwt::issue_token;

use crate::models::AuthError;

pub struct UserService {
    store: Arc<dyn RecordStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        let rows = self.store.find(Collection::Users, &Filter::new()).await?;
        Ok(decode_all(rows)?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let row = self.store
            .find_one(Collection::Users, &Filter::new().eq("email", email))
            .await?;
        Ok(row.map(decode::<User>).transpose()?)
    }

    /// Unknown emails are simply not admins.
    pub async fn is_admin(&self, email: &str) -> Result<bool, AuthError> {
        Ok(self.find_by_email(email)
            .await?
            .map(|user| user.role.is_admin())
            .unwrap_or(false))
    }

    /// Signup. Always stores a regular user; one record per email.
    pub async fn create_user(&self, mut user: User) -> Result<InsertResult, AuthError> {
        debug!("Creating user {}", user.email);
        user.role = Role::Regular;

        match self.store
            .insert_unique(Collection::Users, encode(&user)?, &["email"])
            .await
        {
            Ok(stored) => {
                info!("User {} created", user.email);
                let id = stored.get(ID_FIELD).and_then(|v| v.as_str()).map(str::to_string);
                Ok(InsertResult::inserted(id))
            }
            Err(StoreError::Conflict(_)) => {
                warn!("User {} already exists", user.email);
                Ok(InsertResult::rejected(format!("User {} already exists", user.email)))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn make_admin(&self, id: &str) -> Result<UpdateResult, AuthError> {
        let matched = self.store
            .update_by_id(Collection::Users, id, json!({ "role": Role::Admin }))
            .await?;

        if matched == 0 {
            return Err(AuthError::UserNotFound);
        }

        info!("User {} promoted to admin", id);
        Ok(UpdateResult {
            acknowledged: true,
            matched_count: matched,
            modified_count: matched,
        })
    }

    /// Issues a session token for a registered email; `None` otherwise.
    pub async fn issue_access_token(&self, email: &str, config: &AppConfig) -> Result<Option<String>, AuthError> {
        if self.find_by_email(email).await?.is_none() {
            warn!("Token requested for unknown email {}", email);
            return Ok(None);
        }

        let token = issue_token(email, &config.access_token_secret, config.token_ttl_hours)
            .map_err(AuthError::Token)?;
        Ok(Some(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::Value;
    use shared_database::InMemoryStore;
    use shared_utils::jwt::validate_token;
    use shared_utils::test_utils::{MockRecords, TestConfig};

    fn service(store: InMemoryStore) -> UserService {
        UserService::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_create_user_ignores_submitted_role() {
        let users = service(InMemoryStore::new());
        let user: User = serde_json::from_value(MockRecords::admin("sneaky@x.com")).unwrap();

        let result = users.create_user(user).await.unwrap();
        assert!(result.acknowledged);
        assert!(!users.is_admin("sneaky@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicate_email() {
        let users = service(InMemoryStore::new());
        let user: User = serde_json::from_value(MockRecords::user("a@x.com")).unwrap();

        assert!(users.create_user(user.clone()).await.unwrap().acknowledged);
        let second = users.create_user(user).await.unwrap();
        assert!(!second.acknowledged);
        assert_eq!(users.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_make_admin_by_id() {
        let store = InMemoryStore::new()
            .with_records(Collection::Users, vec![serde_json::json!({ "_id": "u1", "email": "a@x.com" })]);
        let users = service(store);

        let result = users.make_admin("u1").await.unwrap();
        assert_eq!(result.modified_count, 1);
        assert!(users.is_admin("a@x.com").await.unwrap());

        assert_matches!(users.make_admin("missing").await, Err(AuthError::UserNotFound));
    }

    #[tokio::test]
    async fn test_issue_access_token_only_for_known_users() {
        let config = TestConfig::default().to_app_config();
        let users = service(MockRecords::store_with_users("admin@x.com", "user@x.com"));

        let token = users.issue_access_token("user@x.com", &config).await.unwrap().unwrap();
        let caller = validate_token(&token, &config.access_token_secret).unwrap();
        assert_eq!(caller.email, "user@x.com");

        assert!(users.issue_access_token("ghost@x.com", &config).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oversized_token_lifetime_fails_instead_of_panicking() {
        let config = AppConfig {
            token_ttl_hours: i64::MAX,
            ..TestConfig::default().to_app_config()
        };
        let users = service(MockRecords::store_with_users("admin@x.com", "user@x.com"));

        let result = users.issue_access_token("user@x.com", &config).await;
        assert_matches!(result, Err(AuthError::Token(_)));
    }

    #[tokio::test]
    async fn test_listed_users_hide_regular_role() {
        let users = service(MockRecords::store_with_users("admin@x.com", "user@x.com"));
        let listed: Vec<Value> = users
            .list_users()
            .await
            .unwrap()
            .iter()
            .map(|u| serde_json::to_value(u).unwrap())
            .collect();

        assert_eq!(listed[0]["role"], "admin");
        assert!(listed[1].get("role").is_none());
    }
}
