//! HTTP request handlers for the snapmark web API.

pub mod sessions;
