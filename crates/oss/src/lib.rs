//! Aliyun OSS backend for unistore
//!
//! Implements the `Storage` contract from unistore-core over the OSS REST
//! API directly: reqwest with manual V4 request signing, so no vendor SDK
//! dependency is needed. Directories are emulated with placeholder objects
//! and key prefixes, listing is marker-paginated.

pub mod client;
pub mod sign;
pub mod xml;

pub use client::OssStorage;
