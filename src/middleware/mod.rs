pub mod auth;
pub mod response;

pub use crate::auth::StaffUser;
pub use auth::jwt_auth_middleware;
pub use response::{ApiResponse, ApiResult};
