//! Alert data types.

use serde::{Deserialize, Serialize};

use crate::store::{decode_document, Document, StoreResult};

/// Top-level collection holding alerts for every family.
///
/// Alerts are not nested under the family so an acknowledgement can
/// address an alert by its ID alone.
pub(crate) const ALERTS_COLLECTION: &str = "alerts";

/// Alert type recorded for a safe-zone breach.
pub const GEOFENCE_ALERT_TYPE: &str = "geofence";

/// A record of a notable event — a safe-zone breach — surfaced to family
/// members.
///
/// Append-only except for `acknowledged_by`, which grows monotonically
/// and lists each member at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Generated document ID (not stored inside the document).
    #[serde(skip)]
    pub id: String,
    /// Family the alert belongs to.
    pub family_id: String,
    /// Kind of event, e.g. [`GEOFENCE_ALERT_TYPE`].
    #[serde(rename = "type")]
    pub alert_type: String,
    /// Human-readable description with an embedded timestamp.
    pub message: String,
    /// Member whose activity triggered the alert.
    pub related_uid: String,
    /// Creation time, Unix milliseconds.
    pub created_at: i64,
    /// Members who have acknowledged the alert.
    pub acknowledged_by: Vec<String>,
}

impl Alert {
    /// Whether any member has acknowledged the alert.
    #[must_use]
    pub fn is_acknowledged(&self) -> bool {
        !self.acknowledged_by.is_empty()
    }

    pub(crate) fn from_document(id: String, document: Document) -> StoreResult<Self> {
        let mut alert: Self = decode_document(ALERTS_COLLECTION, document)?;
        alert.id = id;
        Ok(alert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert() -> Alert {
        Alert {
            id: "alert-1".to_string(),
            family_id: "fam-1".to_string(),
            alert_type: GEOFENCE_ALERT_TYPE.to_string(),
            message: "Carmen is outside the safe area - 14:32 UTC".to_string(),
            related_uid: "uid-carmen".to_string(),
            created_at: 1_000,
            acknowledged_by: Vec::new(),
        }
    }

    #[test]
    fn new_alert_is_unacknowledged() {
        assert!(!alert().is_acknowledged());
    }

    #[test]
    fn alert_with_acknowledger_is_acknowledged() {
        let mut a = alert();
        a.acknowledged_by.push("uid-luis".to_string());
        assert!(a.is_acknowledged());
    }

    #[test]
    fn alert_document_stores_type_under_type_key() {
        let json = serde_json::to_string(&alert()).unwrap();
        assert!(json.contains(r#""type":"geofence""#));
        assert!(json.contains("relatedUid"));
        assert!(json.contains("acknowledgedBy"));
    }

    #[test]
    fn alert_document_roundtrip() {
        let original = alert();
        let doc = crate::store::encode_document(&original).unwrap();
        let recovered = Alert::from_document("alert-1".to_string(), doc).unwrap();

        assert_eq!(recovered.alert_type, GEOFENCE_ALERT_TYPE);
        assert_eq!(recovered.related_uid, "uid-carmen");
        assert_eq!(recovered.family_id, "fam-1");
        assert!(recovered.acknowledged_by.is_empty());
    }
}
