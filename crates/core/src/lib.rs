//! Vitrine Core - Domain types and client-side commerce logic.
//!
//! This crate provides the types and rules shared by every Vitrine component:
//! - `client` - REST API client, file storage and checkout orchestration
//! - `cli` - Command-line front-end for browsing catalogues and ordering
//!
//! # Architecture
//!
//! The core crate performs no network I/O. Persistence goes through the
//! [`Storage`] port so the cart and session can live in memory, on disk, or in
//! any other key-value store an embedder provides.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, money, contact details and status enums
//! - [`catalogue`] - Catalogue, product and pricing model plus privacy derivation
//! - [`storage`] - Key-value persistence port and in-memory implementation
//! - [`cart`] - Persistent cart store
//! - [`access`] - Private catalogue access gate state machine
//! - [`order`] - Cart-to-order payload assembly

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod cart;
pub mod catalogue;
pub mod order;
pub mod storage;
pub mod types;

pub use access::{
    AccessError, AccessGate, AccessRequest, AccessRequestForm, AccessState, FieldError,
    INVALID_CODE_MESSAGE, VerificationCode,
};
pub use cart::{CartItemInput, CartLine, CartStore, CartSummary};
pub use catalogue::{
    Catalogue, CatalogueError, CatalogueProduct, Page, PaginationMeta, Product, ProductUnit,
    UnitPrice, derive_privacy,
};
pub use order::{
    CheckoutDetails, OrderError, OrderItem, OrderPayload, build_order_payload, order_total,
};
pub use storage::{MemoryStorage, Storage, StorageError, keys};
pub use types::*;
