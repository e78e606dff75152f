//! services/api/src/seed.rs
//!
//! Creates the administrator account. Safe to run on every startup.

use job_board_core::domain::{NewUser, Role, User};
use job_board_core::ports::{DatabaseService, PortError};
use tracing::info;

use crate::error::ApiError;
use crate::web::auth::hash_password;

const ADMIN_NAME: &str = "Admin";

#[derive(Debug)]
pub enum SeedOutcome {
    Created(User),
    /// An account with the admin email already exists and was left untouched.
    AlreadyExists,
}

pub async fn ensure_admin(
    db: &dyn DatabaseService,
    email: &str,
    password: &str,
) -> Result<SeedOutcome, ApiError> {
    match db.get_user_by_email(email).await {
        Ok(_) => return Ok(SeedOutcome::AlreadyExists),
        Err(PortError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    let new_user = NewUser::new(
        ADMIN_NAME.to_string(),
        email.trim().to_lowercase(),
        hash_password(password)?,
        Role::Admin,
    );
    match db.create_user(new_user).await {
        Ok(user) => {
            info!("Seeded admin account {}", user.email);
            Ok(SeedOutcome::Created(user))
        }
        // Another instance seeded it first.
        Err(PortError::Conflict(_)) => Ok(SeedOutcome::AlreadyExists),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryDbAdapter;

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let db = MemoryDbAdapter::new();

        let first = ensure_admin(&db, "Admin@Example.com", "changeme").await.unwrap();
        let SeedOutcome::Created(admin) = first else {
            panic!("expected a new admin");
        };
        assert_eq!(admin.role, Role::Admin);
        assert!(admin.is_approved);
        assert_eq!(admin.email, "admin@example.com");

        let second = ensure_admin(&db, "admin@example.com", "other").await.unwrap();
        assert!(matches!(second, SeedOutcome::AlreadyExists));
    }
}
