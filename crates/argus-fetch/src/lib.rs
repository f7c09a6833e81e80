//! Snapshot fetching for the Argus vision service.
//!
//! This crate provides an HTTP client that retrieves a camera snapshot,
//! decodes it to an in-memory RGB bitmap, and re-encodes bitmaps as JPEG
//! data URIs for inline delivery in JSON responses.

pub mod client;
pub mod error;

pub use client::{data_url, SnapshotClient, SnapshotClientConfig};
pub use error::{FetchError, FetchResult};
