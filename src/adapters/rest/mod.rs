//! REST backend adapters over `reqwest`.
//!
//! - [`HttpResourceClient`] - authenticated resource calls, 401 handling
//! - [`AuthApi`] - login and token validation
//! - [`FlagLoginRedirect`] - records that the user must log in again

mod auth_api;
mod problem;
mod redirect;
mod resource_client;

pub use auth_api::{AuthApi, AuthResponse, TokenValidation};
pub use redirect::FlagLoginRedirect;
pub use resource_client::HttpResourceClient;
