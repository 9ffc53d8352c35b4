//! API client library for the KAMAR parent portal.
//!
//! Provides the portal HTTP client, XML decoding, and the parsers that turn
//! the portal's positional XML payloads into a normalized schedule model.

/// Parent portal API client and schedule parsers.
pub mod portal;
