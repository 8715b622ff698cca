//! JSON-over-HTTP clients for the remote collaborators.

mod applications;
mod catalog;
mod credentials;
mod rest;

pub use applications::HttpApplicationCatalog;
pub use catalog::HttpDeviceCatalog;
pub use credentials::HttpCredentialService;
pub use rest::{DEFAULT_TIMEOUT, RestClient};
