pub mod identity;
pub mod request;
pub mod response;

pub use identity::{AuthEvent, Identity, IdentityMetadata, Session};
pub use request::ApiRequest;
pub use response::ApiResponse;
