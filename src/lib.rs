//! woispace - client for the WOI learning platform
//!
//! This library provides the client side of the platform's learning flows:
//! an authenticated API client, a query cache, and the enrollment flow
//! controller that walks a user through impression, content and reflection.

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod services;
