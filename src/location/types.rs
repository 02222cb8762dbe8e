//! Location data types and geofence policy.

use serde::{Deserialize, Serialize};

use crate::alert::Alert;
use crate::geo::Coordinates;
use crate::store::{decode_document, Document, StoreResult};

/// Collection of a family's location pings, append-only.
pub(crate) fn locations_collection(family_id: &str) -> String {
    format!("families/{family_id}/locations")
}

/// A single recorded position of a tracked member.
///
/// Pings are immutable once stored; `is_outside_safe_radius` is computed
/// at ingest time against the family's safe zone and never recomputed.
/// Retention is an external policy — the core never deletes pings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPing {
    /// Generated document ID (not stored inside the document).
    #[serde(skip)]
    pub id: String,
    /// Member being tracked.
    pub uid: String,
    /// Reported position.
    pub coordinates: Coordinates,
    /// GPS accuracy in meters, if the device reported one.
    pub accuracy_meters: Option<f64>,
    /// Free-text device description (user agent and the like).
    pub device_info: Option<String>,
    /// Ingest time, Unix milliseconds.
    pub created_at: i64,
    /// Whether the position was outside the safe zone at ingest time.
    pub is_outside_safe_radius: bool,
}

impl LocationPing {
    pub(crate) fn from_document(
        family_id: &str,
        id: String,
        document: Document,
    ) -> StoreResult<Self> {
        let mut ping: Self = decode_document(&locations_collection(family_id), document)?;
        ping.id = id;
        Ok(ping)
    }
}

/// Result of ingesting one location update: the stored ping and the
/// breach alert, when one was raised.
#[derive(Debug, Clone)]
pub struct RecordedLocation {
    /// The persisted ping.
    pub ping: LocationPing,
    /// The geofence alert created for this ping, if the breach was not
    /// suppressed by the dedup policy.
    pub alert: Option<Alert>,
}

/// Tunable geofence-alerting behavior.
///
/// An unacknowledged geofence alert suppresses further alerts for the
/// same member while it is younger than the cooldown window; a ping back
/// inside the safe zone re-arms alerting immediately, as does
/// acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeofencePolicy {
    /// Cooldown window in minutes.
    pub alert_cooldown_minutes: u32,
}

impl Default for GeofencePolicy {
    fn default() -> Self {
        Self {
            alert_cooldown_minutes: 15,
        }
    }
}

impl GeofencePolicy {
    pub(crate) fn cooldown_millis(self) -> i64 {
        i64::from(self.alert_cooldown_minutes) * 60_000
    }
}
