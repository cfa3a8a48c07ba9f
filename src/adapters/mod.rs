//! Adapters layer: Concrete implementations of ports.
//!
//! - `http`: reqwest client for the predictor and auth endpoints
//! - `store`: file and in-memory credential stores
//! - `sanitize`: secret filtering for logs

pub mod http;
pub mod sanitize;
pub mod store;

pub use http::{HttpApi, HttpClientError};
pub use store::{FileCredentialStore, MemoryCredentialStore, StoreError};
