//! Alert creation, listing, and acknowledgement.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::types::{Alert, ALERTS_COLLECTION, GEOFENCE_ALERT_TYPE};
use crate::error::{Error, Result};
use crate::store::{encode_document, Direction, DocumentStore, Query, UpdateOutcome};

/// High-level API for the alert store.
pub struct AlertManager {
    store: Arc<dyn DocumentStore>,
}

impl AlertManager {
    /// Creates a new alert manager over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Appends a new, unacknowledged alert.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] on backend failure.
    pub fn create(
        &self,
        family_id: &str,
        alert_type: &str,
        message: &str,
        related_uid: &str,
    ) -> Result<Alert> {
        let mut alert = Alert {
            id: String::new(),
            family_id: family_id.to_string(),
            alert_type: alert_type.to_string(),
            message: message.to_string(),
            related_uid: related_uid.to_string(),
            created_at: Utc::now().timestamp_millis(),
            acknowledged_by: Vec::new(),
        };
        alert.id = self
            .store
            .insert(ALERTS_COLLECTION, encode_document(&alert)?)?;
        Ok(alert)
    }

    /// Lists a family's alerts, newest first.
    ///
    /// With `since`, only alerts created at or after the bound are
    /// returned. An unknown family simply has no alerts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] on backend failure.
    pub fn list(&self, family_id: &str, since: Option<DateTime<Utc>>) -> Result<Vec<Alert>> {
        let query = Query::new()
            .filter("familyId", family_id)
            .order_by("createdAt", Direction::Descending);

        let mut alerts: Vec<Alert> = self
            .store
            .query(ALERTS_COLLECTION, &query)?
            .into_iter()
            .map(|(id, document)| Ok(Alert::from_document(id, document)?))
            .collect::<Result<_>>()?;

        // The store filters by equality only; the time bound is ours.
        if let Some(since) = since {
            let bound = since.timestamp_millis();
            alerts.retain(|alert| alert.created_at >= bound);
        }

        Ok(alerts)
    }

    /// Records that a member has seen an alert.
    ///
    /// Idempotent: acknowledging twice leaves the member listed once, and
    /// the acknowledgement set only ever grows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlertNotFound`] if no such alert exists.
    pub fn acknowledge(&self, alert_id: &str, member_id: &str) -> Result<Alert> {
        let member = member_id.to_string();
        let outcome = self.store.conditional_update(
            ALERTS_COLLECTION,
            alert_id,
            &|_| true,
            &|document| {
                let entry = document
                    .entry("acknowledgedBy".to_string())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(list) = entry {
                    let value = Value::String(member.clone());
                    if !list.contains(&value) {
                        list.push(value);
                    }
                }
            },
        )?;

        match outcome {
            UpdateOutcome::Missing => Err(Error::AlertNotFound(alert_id.to_string())),
            UpdateOutcome::Applied(document) | UpdateOutcome::Rejected(document) => {
                Ok(Alert::from_document(alert_id.to_string(), document)?)
            }
        }
    }

    /// The most recent geofence alert for a member, if any.
    pub(crate) fn latest_geofence(&self, family_id: &str, uid: &str) -> Result<Option<Alert>> {
        let query = Query::new()
            .filter("familyId", family_id)
            .filter("relatedUid", uid)
            .filter("type", GEOFENCE_ALERT_TYPE)
            .order_by("createdAt", Direction::Descending)
            .limit(1);

        self.store
            .query(ALERTS_COLLECTION, &query)?
            .into_iter()
            .next()
            .map(|(id, document)| Ok(Alert::from_document(id, document)?))
            .transpose()
    }
}
