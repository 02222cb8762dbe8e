//! Faro Core Library
//!
//! Core functionality for Faro - family safe-zone tracking for at-risk
//! individuals. This crate provides the family/membership/geofence/alert
//! engine; HTTP routing, rendering, authentication, and notification
//! delivery live in an adapter layer that calls in through the managers.
//!
//! # Architecture
//!
//! ```text
//! FamilyManager ───┐
//! InviteManager ───┼── DocumentStore (trait; MemoryStore reference backend)
//! LocationManager ─┤
//!     └── AlertManager
//! ```
//!
//! All identity (member IDs, tracked UIDs) is passed in explicitly by the
//! caller after authentication; the core never reads ambient session state.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![deny(unsafe_code)]

pub mod alert;
pub mod error;
pub mod family;
pub mod geo;
pub mod invite;
pub mod location;
pub mod store;

pub use error::{Error, Result};
