//! Parcel-developer subscription core for the stormwater retrofit program.
//!
//! Property managers list parcels eligible for green-stormwater retrofits;
//! retrofit developers subscribe to the parcels they want to hear about.
//! This crate owns the data model linking the two, the diffing that decides
//! which notifications an update fires, the token-gated preferences surface,
//! and the saved-parcel bookmarks. HTTP routing and authentication live in
//! the consuming service, not here.

pub mod admin;
pub mod config;
pub mod db;
pub mod diff;
pub mod error;
pub mod mail;
pub mod notify;
pub mod ops;
pub mod util;

pub use config::{BrevoConfig, Config};
pub use error::ApiError;
pub use notify::{Notification, Notifier, NotifyError};
