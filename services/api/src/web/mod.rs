pub mod admin;
pub mod applications;
pub mod auth;
pub mod extract;
pub mod jobs;
pub mod middleware;
pub mod response;
pub mod rest;
pub mod state;
pub mod token;
pub mod users;

// Re-export what the binaries need to build the server.
pub use rest::{app_router, ApiDoc};
pub use state::AppState;
