//! Client Module
//!
//! HTTP transport shared by the service clients.

pub mod http;

pub use http::{Auth, ByteStream, HttpClient};
