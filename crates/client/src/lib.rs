//! Vitrine Client - REST client, local state and checkout for Vitrine catalogues.
//!
//! # Architecture
//!
//! - [`api`] talks to the commerce API over HTTP, caching catalogue metadata
//! - [`storage::FileStorage`] persists the cart and session as files
//! - [`view::CatalogueView`] drives one catalogue view: privacy, the access
//!   gate and product listing, with requests cancelled when the view drops
//! - [`checkout::submit`] turns the cart into an order
//!
//! Domain rules (pricing, cart, access gate state machine, order assembly)
//! live in `vitrine-core`; this crate adds I/O around them.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod checkout;
pub mod config;
pub mod error;
pub mod session;
pub mod storage;
pub mod telemetry;
pub mod view;

pub use api::{ApiClient, ApiError, CreatedOrder, VerifyAccessResponse};
pub use config::{ClientConfig, ConfigError, LogFormat};
pub use error::{ClientError, ErrorKind};
pub use session::{Session, UserProfile};
pub use storage::FileStorage;
pub use view::CatalogueView;
