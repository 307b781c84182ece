//! PromptShop Core - Shared data model.
//!
//! This crate provides the typed shape of the shop state document used across
//! all PromptShop components:
//! - `prompt-shop` - The model-driven web shop (server + library)
//! - `prompt-shop-cli` - Operator tools for the state and fragment caches
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. The server
//! persists the state document as untyped JSON; these types are a typed lens
//! over it, used for optional validation and for summaries.
//!
//! # Modules
//!
//! - [`types`] - Product ids, prices, products, line items and the shop state

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
