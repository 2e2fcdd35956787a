//! Harbor Core - Shared domain types.
//!
//! This crate provides the types shared by the Harbor storefront components:
//! - `storefront` - Server-rendered storefront binary and library
//! - `integration-tests` - Router-level tests against the assembled app
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no clock access. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Validated currency codes, money, locales and local IDs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
