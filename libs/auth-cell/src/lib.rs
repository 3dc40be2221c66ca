pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use services::gate::{require_admin, AccessGate};
pub use services::users::UserService;
