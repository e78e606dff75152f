//! services/api/src/web/response.rs
//!
//! Response bodies shared by several handlers.

use job_board_core::domain::User;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub success: bool,
    pub user: User,
}

impl UserResponse {
    pub fn new(user: User) -> Self {
        Self {
            success: true,
            user,
        }
    }
}
