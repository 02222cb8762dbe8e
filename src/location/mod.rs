//! Location ingest and geofencing.
//!
//! Tracked devices report positions here. Every ping is stored with its
//! breach status against the family's safe zone; a breach raises a
//! geofence alert, deduplicated per member so one episode outside the
//! zone produces one alert rather than one per ping.
//!
//! # Architecture
//!
//! ```text
//! LocationManager (ingest + geofence decision)
//!     ├── FamilyManager (family/member validation)
//!     └── AlertManager (deduplicated alert creation)
//! ```

mod manager;
mod types;

pub use manager::LocationManager;
pub use types::{GeofencePolicy, LocationPing, RecordedLocation};
