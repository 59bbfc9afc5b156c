//! Data models for the menu catalog.
//!
//! This module contains:
//!
//! - `CatalogItem`: the canonical dish shape (name, description, price, image)
//! - `StoredItem`: a `CatalogItem` committed to the local store with its id
//! - `MenuList`, `MenuEntry`: the remote wire format

pub mod item;

pub use item::{CatalogItem, MenuEntry, MenuList, StoredItem};
