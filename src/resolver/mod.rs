//! Resolution of public video page URLs into downloadable files.
//!
//! This module provides:
//! - `ResolverClient` - client for the third-party resolution service
//! - `retry` - retry and backoff helpers for transient network errors

mod client;
pub mod retry;

pub use client::{
    validate_url, ResolveError, ResolvedVideo, ResolverClient, DEFAULT_RESOLVER_BASE_URL,
    DEFAULT_TIMEOUT,
};
