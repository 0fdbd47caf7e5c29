pub mod auth;
pub mod json;
pub mod logging;
pub mod recovery;
pub mod response;
pub mod tenant;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use json::JsonBody;
pub use response::{ApiResponse, ApiResult};
pub use tenant::{require_tenant_middleware, TenantId};
