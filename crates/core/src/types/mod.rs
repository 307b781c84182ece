//! Core types for PromptShop.
//!
//! This module provides type-safe wrappers for the shop's domain concepts.

pub mod id;
pub mod price;
pub mod shop;

pub use id::*;
pub use price::Price;
pub use shop::{LineItem, Product, ShopState, StateSummary};
