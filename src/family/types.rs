//! Core types for family management.
//!
//! A family is the root aggregate: one tracked person's safe-zone
//! configuration plus the members (relatives, caregivers) watching over
//! them. Members carry caller-provided IDs — the external auth subject —
//! and a role that controls what the adapter lets them do.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;
use crate::store::{decode_document, Document, StoreResult};

/// Top-level collection holding one document per family.
pub(crate) const FAMILIES_COLLECTION: &str = "families";

/// Collection of a family's members, keyed by member UID.
pub(crate) fn members_collection(family_id: &str) -> String {
    format!("families/{family_id}/members")
}

/// Role of a member within a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Can manage the family: invite members, configure the safe zone.
    Admin,
    /// A monitoring relative; receives and acknowledges alerts.
    Familiar,
}

impl Role {
    /// Converts to string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Familiar => "familiar",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "familiar" => Some(Self::Familiar),
            _ => None,
        }
    }
}

/// A family: safe-zone configuration and root of the member/invite/ping/
/// alert aggregates.
///
/// `safe_radius_meters` is validated positive at creation; families are
/// never deleted by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Family {
    /// Generated document ID (not stored inside the document).
    #[serde(skip)]
    pub id: String,
    /// Display name, e.g. "Familia García".
    pub name: String,
    /// Center of the circular safe zone.
    pub home_location: Coordinates,
    /// Safe-zone radius in meters, always > 0.
    pub safe_radius_meters: f64,
    /// Creation time, Unix milliseconds.
    pub created_at: i64,
    /// Member ID of the owning admin.
    pub owner_id: String,
}

impl Family {
    pub(crate) fn from_document(id: String, document: Document) -> StoreResult<Self> {
        let mut family: Self = decode_document(FAMILIES_COLLECTION, document)?;
        family.id = id;
        Ok(family)
    }
}

/// A member of a family.
///
/// The ID is supplied by the caller (the adapter's authenticated subject),
/// never generated. A member belongs to exactly one family and is stored
/// under that family's member collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Caller-provided member ID (not stored inside the document).
    #[serde(skip)]
    pub id: String,
    /// Role within the family.
    pub role: Role,
    /// Display name shown to other members.
    pub display_name: String,
    /// Contact email, if known.
    pub email: Option<String>,
    /// Creation time, Unix milliseconds.
    pub created_at: i64,
    /// Opaque device tokens the adapter pushes notifications to.
    pub notification_targets: Vec<String>,
}

impl Member {
    pub(crate) fn from_document(
        family_id: &str,
        id: String,
        document: Document,
    ) -> StoreResult<Self> {
        let mut member: Self = decode_document(&members_collection(family_id), document)?;
        member.id = id;
        Ok(member)
    }
}
