// src/application/usecase/account_usecase.rs
// Account registration and credential checks. Session/token handling is
// left to the outer API surface.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::dto::RegisterRequest;
use crate::domain::errors::{AppError, AppResult};
use crate::domain::model::{User, UserRole, UserStatus};
use crate::domain::repository::{NewUser, UserRepository};

const MIN_PASSWORD_LEN: usize = 6;
const MIN_NAME_LEN: usize = 2;

#[async_trait]
pub trait AccountUseCase {
    /// Create an account. Sellers must name a company and start in
    /// `Pending` until verified; buyers start `Active`.
    async fn register(&self, request: RegisterRequest) -> AppResult<User>;

    /// Check credentials and return the account without its password.
    async fn login(&self, email: &str, password: &str) -> AppResult<User>;

    /// Admin moderation: approve a pending seller or suspend an account.
    async fn set_status(&self, user_id: Uuid, status: UserStatus) -> AppResult<User>;
}

pub struct AccountService {
    users: Arc<dyn UserRepository>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl AccountUseCase for AccountService {
    async fn register(&self, request: RegisterRequest) -> AppResult<User> {
        if !request.email.contains('@') {
            return Err(AppError::Validation("invalid email".into()));
        }
        if request.password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if request.name.trim().len() < MIN_NAME_LEN {
            return Err(AppError::Validation(format!(
                "name must be at least {} characters",
                MIN_NAME_LEN
            )));
        }
        if request.role == UserRole::Admin {
            return Err(AppError::Validation(
                "admin accounts cannot be self-registered".into(),
            ));
        }
        if request.role == UserRole::Seller && request.company_name.is_none() {
            return Err(AppError::Validation(
                "company name required for sellers".into(),
            ));
        }

        let user = self
            .users
            .create(NewUser {
                email: request.email,
                password: request.password,
                name: request.name,
                role: request.role,
                company_name: request.company_name,
            })
            .await?;

        log::info!("Registered {} account {} ({})", user.role, user.id, user.email);
        Ok(user.sanitized())
    }

    async fn login(&self, email: &str, password: &str) -> AppResult<User> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .filter(|user| user.password == password)
            .ok_or_else(|| AppError::Unauthorized("invalid email or password".into()))?;

        if user.status == UserStatus::Suspended {
            return Err(AppError::Suspended);
        }

        Ok(user.sanitized())
    }

    async fn set_status(&self, user_id: Uuid, status: UserStatus) -> AppResult<User> {
        let user = self.users.set_status(user_id, status).await?;
        log::info!("User {} status set to {:?}", user.id, user.status);
        Ok(user.sanitized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemoryStore;

    fn accounts() -> AccountService {
        AccountService::new(Arc::new(MemoryStore::new()))
    }

    fn seller_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "secret123".to_string(),
            name: "Paper Trail Ltd".to_string(),
            role: UserRole::Seller,
            company_name: Some("Paper Trail Ltd".to_string()),
        }
    }

    #[tokio::test]
    async fn sellers_start_pending_and_buyers_active() {
        let accounts = accounts();

        let seller = accounts
            .register(seller_request("seller@example.com"))
            .await
            .unwrap();
        assert_eq!(seller.status, UserStatus::Pending);
        assert!(seller.password.is_empty());

        let buyer = accounts
            .register(RegisterRequest {
                email: "buyer@example.com".to_string(),
                password: "secret123".to_string(),
                name: "A Buyer".to_string(),
                role: UserRole::Buyer,
                company_name: None,
            })
            .await
            .unwrap();
        assert_eq!(buyer.status, UserStatus::Active);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let accounts = accounts();
        accounts
            .register(seller_request("dup@example.com"))
            .await
            .unwrap();

        let err = accounts
            .register(seller_request("dup@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Store(crate::domain::errors::StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn seller_without_company_name_is_rejected() {
        let accounts = accounts();
        let mut request = seller_request("nocompany@example.com");
        request.company_name = None;

        let err = accounts.register(request).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn login_checks_credentials_and_suspension() {
        let accounts = accounts();
        let user = accounts
            .register(seller_request("login@example.com"))
            .await
            .unwrap();

        let err = accounts
            .login("login@example.com", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let ok = accounts
            .login("login@example.com", "secret123")
            .await
            .unwrap();
        assert_eq!(ok.id, user.id);
        assert!(ok.password.is_empty());

        accounts
            .set_status(user.id, UserStatus::Suspended)
            .await
            .unwrap();
        let err = accounts
            .login("login@example.com", "secret123")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Suspended));
    }
}
