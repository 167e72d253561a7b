//! MinIO backend for unistore
//!
//! Implements the `Storage` contract from unistore-core against a MinIO
//! endpoint through aws-sdk-s3, with path-style addressing and emulated
//! directories.

pub mod client;

pub use client::MinioStorage;
