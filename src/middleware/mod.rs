// Middleware modules
pub mod jwt_auth;
pub mod logging;

// Export auth middleware components
pub use jwt_auth::{jwt_auth_middleware, tenant_middleware, TenantContext, UserIdentity};

// Export logging middleware
pub use logging::logging_middleware;
