pub mod error;
pub mod requests;
pub mod responses;

pub use error::{api_error, bad_request, ApiError, ApiResult, ErrorResponse};
pub use requests::{AdRequest, CreateUserRequest, LoginRequest, UpdateUserRequest};
pub use responses::{AdResponse, HealthResponse, LoginResponse, UserResponse};
