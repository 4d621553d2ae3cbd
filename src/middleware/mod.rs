pub mod gateway;
pub mod response;

pub use gateway::{gateway_middleware, TenantContext};
pub use response::{ApiResponse, ApiResult};
