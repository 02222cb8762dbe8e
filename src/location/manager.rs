//! Location ingest and geofence evaluation.
//!
//! [`LocationManager`] records every incoming position, decides breach
//! status against the family's safe zone, and raises deduplicated
//! geofence alerts. The ping write and the alert decision for one update
//! run under a per-member lock, so a breach episode yields at most one
//! alert no matter how many devices or retries report it concurrently,
//! while unrelated members and families proceed independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::types::{locations_collection, GeofencePolicy, LocationPing, RecordedLocation};
use crate::alert::{AlertManager, GEOFENCE_ALERT_TYPE};
use crate::error::{Error, Result};
use crate::family::FamilyManager;
use crate::geo::{is_outside_safe_zone, Coordinates};
use crate::store::{encode_document, Direction, DocumentStore, Query};

/// Serializes alert decisions per `(family, member)` key.
type IngestLocks = Mutex<HashMap<(String, String), Arc<Mutex<()>>>>;

/// High-level API for location ingest and geofence alerting.
pub struct LocationManager {
    store: Arc<dyn DocumentStore>,
    families: FamilyManager,
    alerts: AlertManager,
    policy: GeofencePolicy,
    ingest_locks: IngestLocks,
}

impl LocationManager {
    /// Creates a location manager with the default [`GeofencePolicy`].
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_policy(store, GeofencePolicy::default())
    }

    /// Creates a location manager with an explicit policy.
    #[must_use]
    pub fn with_policy(store: Arc<dyn DocumentStore>, policy: GeofencePolicy) -> Self {
        let families = FamilyManager::new(Arc::clone(&store));
        let alerts = AlertManager::new(Arc::clone(&store));
        Self {
            store,
            families,
            alerts,
            policy,
            ingest_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Records a location update for a tracked member.
    ///
    /// Persists the ping with its breach status and, when the position is
    /// outside the safe zone, raises a geofence alert unless a live
    /// unacknowledged alert for the member already covers the episode
    /// (see [`GeofencePolicy`]). The alert message names the member and
    /// embeds a human-readable UTC timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFamily`] / [`Error::InvalidMember`] if the
    /// references do not resolve, [`Error::InvalidCoordinate`] for
    /// malformed accuracy metadata, or [`Error::StorageUnavailable`] on
    /// backend failure (no internal retries).
    pub fn record_location(
        &self,
        family_id: &str,
        uid: &str,
        coordinates: Coordinates,
        accuracy_meters: Option<f64>,
        device_info: Option<&str>,
    ) -> Result<RecordedLocation> {
        // Validation happens before any write.
        let family = self.families.family(family_id)?;
        let member = self.families.member(family_id, uid)?;
        if let Some(accuracy) = accuracy_meters {
            if !accuracy.is_finite() || accuracy < 0.0 {
                return Err(Error::InvalidCoordinate(format!(
                    "accuracy {accuracy} must be a non-negative number of meters"
                )));
            }
        }

        let outside = is_outside_safe_zone(
            coordinates,
            family.home_location,
            family.safe_radius_meters,
        );

        let key_lock = self.ingest_lock(family_id, uid)?;
        let _guard = key_lock
            .lock()
            .map_err(|e| Error::StorageUnavailable(format!("ingest lock poisoned: {e}")))?;

        let now = Utc::now();
        let now_millis = now.timestamp_millis();

        let mut ping = LocationPing {
            id: String::new(),
            uid: uid.to_string(),
            coordinates,
            accuracy_meters,
            device_info: device_info.map(ToString::to_string),
            created_at: now_millis,
            is_outside_safe_radius: outside,
        };
        ping.id = self
            .store
            .insert(&locations_collection(family_id), encode_document(&ping)?)?;

        let alert = if outside && self.should_alert(family_id, uid, now_millis)? {
            let message = format!(
                "{} is outside the safe area - {}",
                member.display_name,
                now.format("%H:%M UTC")
            );
            Some(
                self.alerts
                    .create(family_id, GEOFENCE_ALERT_TYPE, &message, uid)?,
            )
        } else {
            None
        };

        Ok(RecordedLocation { ping, alert })
    }

    /// The member's most recent ping, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFamily`] if the family is absent.
    pub fn last_location(&self, family_id: &str, uid: &str) -> Result<Option<LocationPing>> {
        self.families.family(family_id)?;

        let query = Query::new()
            .filter("uid", uid)
            .order_by("createdAt", Direction::Descending)
            .limit(1);

        self.store
            .query(&locations_collection(family_id), &query)?
            .into_iter()
            .next()
            .map(|(id, document)| Ok(LocationPing::from_document(family_id, id, document)?))
            .transpose()
    }

    /// Decides whether a breach at `now_millis` warrants a new alert.
    ///
    /// Suppressed only while the latest geofence alert for the member is
    /// unacknowledged, younger than the cooldown window, and not followed
    /// by an inside-zone ping.
    fn should_alert(&self, family_id: &str, uid: &str, now_millis: i64) -> Result<bool> {
        let Some(latest) = self.alerts.latest_geofence(family_id, uid)? else {
            return Ok(true);
        };
        if latest.is_acknowledged() {
            return Ok(true);
        }
        if now_millis - latest.created_at >= self.policy.cooldown_millis() {
            return Ok(true);
        }

        // Returning inside the zone ends the episode; a newer inside ping
        // re-arms alerting even within the cooldown window.
        let query = Query::new()
            .filter("uid", uid)
            .filter("isOutsideSafeRadius", false)
            .order_by("createdAt", Direction::Descending)
            .limit(1);
        let last_inside = self
            .store
            .query(&locations_collection(family_id), &query)?
            .into_iter()
            .next()
            .map(|(id, document)| LocationPing::from_document(family_id, id, document))
            .transpose()?;

        Ok(last_inside.is_some_and(|ping| ping.created_at > latest.created_at))
    }

    fn ingest_lock(&self, family_id: &str, uid: &str) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .ingest_locks
            .lock()
            .map_err(|e| Error::StorageUnavailable(format!("ingest lock map poisoned: {e}")))?;
        Ok(Arc::clone(
            locks
                .entry((family_id.to_string(), uid.to_string()))
                .or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const HOME: (f64, f64) = (40.4168, -3.7038);

    struct Fixture {
        locations: LocationManager,
        family_id: String,
    }

    fn setup() -> Fixture {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let families = FamilyManager::new(Arc::clone(&store));
        let family = families
            .create_family("García", coord(HOME.0, HOME.1), 500.0, "uid-carmen", "Carmen")
            .unwrap();
        Fixture {
            locations: LocationManager::new(store),
            family_id: family.id,
        }
    }

    fn coord(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    /// ~700 m north of home.
    fn outside_point() -> Coordinates {
        coord(HOME.0 + 0.0063, HOME.1)
    }

    /// Millisecond timestamps order the dedup decision; keep sequential
    /// pings from landing in the same millisecond.
    fn tick() {
        std::thread::sleep(std::time::Duration::from_millis(5));
    }

    #[test]
    fn inside_ping_produces_no_alert() {
        let f = setup();
        let recorded = f
            .locations
            .record_location(&f.family_id, "uid-carmen", coord(HOME.0, HOME.1), None, None)
            .unwrap();

        assert!(!recorded.ping.is_outside_safe_radius);
        assert!(recorded.alert.is_none());
    }

    #[test]
    fn outside_ping_produces_geofence_alert() {
        let f = setup();
        let recorded = f
            .locations
            .record_location(&f.family_id, "uid-carmen", outside_point(), Some(10.0), None)
            .unwrap();

        assert!(recorded.ping.is_outside_safe_radius);
        let alert = recorded.alert.expect("breach should raise an alert");
        assert_eq!(alert.alert_type, GEOFENCE_ALERT_TYPE);
        assert_eq!(alert.related_uid, "uid-carmen");
        assert!(alert.message.contains("Carmen"));
    }

    #[test]
    fn second_breach_in_cooldown_is_suppressed() {
        let f = setup();
        let first = f
            .locations
            .record_location(&f.family_id, "uid-carmen", outside_point(), None, None)
            .unwrap();
        assert!(first.alert.is_some());

        let second = f
            .locations
            .record_location(&f.family_id, "uid-carmen", outside_point(), None, None)
            .unwrap();
        assert!(second.ping.is_outside_safe_radius);
        assert!(second.alert.is_none());
    }

    #[test]
    fn returning_inside_rearms_alerting() {
        let f = setup();
        let breach = f
            .locations
            .record_location(&f.family_id, "uid-carmen", outside_point(), None, None)
            .unwrap();
        assert!(breach.alert.is_some());

        tick();
        let back_home = f
            .locations
            .record_location(&f.family_id, "uid-carmen", coord(HOME.0, HOME.1), None, None)
            .unwrap();
        assert!(back_home.alert.is_none());

        tick();
        let second_breach = f
            .locations
            .record_location(&f.family_id, "uid-carmen", outside_point(), None, None)
            .unwrap();
        assert!(second_breach.alert.is_some());
    }

    #[test]
    fn acknowledged_alert_rearms_alerting() {
        let f = setup();
        let breach = f
            .locations
            .record_location(&f.family_id, "uid-carmen", outside_point(), None, None)
            .unwrap();
        let alert = breach.alert.unwrap();

        f.locations
            .alerts
            .acknowledge(&alert.id, "uid-luis")
            .unwrap();

        tick();
        let next = f
            .locations
            .record_location(&f.family_id, "uid-carmen", outside_point(), None, None)
            .unwrap();
        assert!(next.alert.is_some());
    }

    #[test]
    fn unknown_family_fails_before_any_write() {
        let f = setup();
        let result = f
            .locations
            .record_location("missing", "uid-carmen", outside_point(), None, None);
        assert!(matches!(result, Err(Error::InvalidFamily(_))));
    }

    #[test]
    fn unknown_member_fails_before_any_write() {
        let f = setup();
        let result = f
            .locations
            .record_location(&f.family_id, "stranger", outside_point(), None, None);
        assert!(matches!(result, Err(Error::InvalidMember(_))));
    }

    #[test]
    fn negative_accuracy_is_rejected() {
        let f = setup();
        let result = f.locations.record_location(
            &f.family_id,
            "uid-carmen",
            coord(HOME.0, HOME.1),
            Some(-1.0),
            None,
        );
        assert!(matches!(result, Err(Error::InvalidCoordinate(_))));
    }

    #[test]
    fn last_location_returns_newest_ping() {
        let f = setup();
        assert!(f
            .locations
            .last_location(&f.family_id, "uid-carmen")
            .unwrap()
            .is_none());

        f.locations
            .record_location(&f.family_id, "uid-carmen", coord(HOME.0, HOME.1), None, None)
            .unwrap();
        tick();
        let newest = f
            .locations
            .record_location(&f.family_id, "uid-carmen", outside_point(), None, None)
            .unwrap();

        let last = f
            .locations
            .last_location(&f.family_id, "uid-carmen")
            .unwrap()
            .expect("two pings recorded");
        assert_eq!(last.created_at, newest.ping.created_at);
        assert!(last.is_outside_safe_radius);
    }

    #[test]
    fn last_location_for_unknown_family_fails() {
        let f = setup();
        assert!(matches!(
            f.locations.last_location("missing", "uid-carmen"),
            Err(Error::InvalidFamily(_))
        ));
    }

    #[test]
    fn device_info_is_persisted() {
        let f = setup();
        let recorded = f
            .locations
            .record_location(
                &f.family_id,
                "uid-carmen",
                coord(HOME.0, HOME.1),
                None,
                Some("Mozilla/5.0"),
            )
            .unwrap();
        assert_eq!(recorded.ping.device_info.as_deref(), Some("Mozilla/5.0"));
    }
}
