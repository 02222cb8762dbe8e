//! Invite data types.

use serde::{Deserialize, Serialize};

use crate::family::Role;
use crate::store::{decode_document, Document, StoreResult};

/// Top-level collection holding invites for every family.
///
/// Invites live outside the family subtree because redemption looks a
/// code up without knowing which family issued it.
pub(crate) const INVITES_COLLECTION: &str = "invites";

/// Length of a join code.
pub const INVITE_CODE_LENGTH: usize = 8;

/// Hours an invite stays redeemable after creation.
pub const INVITE_TTL_HOURS: i64 = 24;

/// A time-limited, single-use code granting a role in a family.
///
/// `is_used` only ever transitions `false` → `true`; a redeemed or
/// expired invite is terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    /// Generated document ID (not stored inside the document).
    #[serde(skip)]
    pub id: String,
    /// Family the invite admits into.
    pub family_id: String,
    /// Uppercase alphanumeric join code, unique among redeemable invites.
    pub code: String,
    /// Role granted on redemption.
    pub role: Role,
    /// Member ID of the admin who issued the invite.
    pub created_by: String,
    /// Creation time, Unix milliseconds.
    pub created_at: i64,
    /// Expiry time, `created_at` + 24 h, Unix milliseconds.
    pub expires_at: i64,
    /// Whether the invite has been redeemed.
    pub is_used: bool,
}

impl Invite {
    /// Whether the invite's expiry has passed at the given instant.
    #[must_use]
    pub const fn is_expired_at(&self, now_millis: i64) -> bool {
        now_millis >= self.expires_at
    }

    /// Whether the invite can still be redeemed at the given instant.
    #[must_use]
    pub const fn is_redeemable_at(&self, now_millis: i64) -> bool {
        !self.is_used && !self.is_expired_at(now_millis)
    }

    pub(crate) fn from_document(id: String, document: Document) -> StoreResult<Self> {
        let mut invite: Self = decode_document(INVITES_COLLECTION, document)?;
        invite.id = id;
        Ok(invite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invite(created_at: i64, is_used: bool) -> Invite {
        Invite {
            id: "inv-1".to_string(),
            family_id: "fam-1".to_string(),
            code: "ABCD1234".to_string(),
            role: Role::Familiar,
            created_by: "uid-owner".to_string(),
            created_at,
            expires_at: created_at + INVITE_TTL_HOURS * 3_600_000,
            is_used,
        }
    }

    #[test]
    fn fresh_invite_is_redeemable() {
        let inv = invite(1_000, false);
        assert!(inv.is_redeemable_at(2_000));
    }

    #[test]
    fn used_invite_is_not_redeemable() {
        let inv = invite(1_000, true);
        assert!(!inv.is_redeemable_at(2_000));
    }

    #[test]
    fn invite_expires_exactly_at_expiry_instant() {
        let inv = invite(0, false);
        assert!(!inv.is_expired_at(inv.expires_at - 1));
        assert!(inv.is_expired_at(inv.expires_at));
        assert!(!inv.is_redeemable_at(inv.expires_at));
    }

    #[test]
    fn invite_document_uses_camel_case_fields() {
        let json = serde_json::to_string(&invite(1_000, false)).unwrap();
        assert!(json.contains("familyId"));
        assert!(json.contains("createdBy"));
        assert!(json.contains("expiresAt"));
        assert!(json.contains("isUsed"));
    }

    #[test]
    fn invite_document_roundtrip() {
        let original = invite(1_000, false);
        let doc = crate::store::encode_document(&original).unwrap();
        let recovered = Invite::from_document("inv-1".to_string(), doc).unwrap();

        assert_eq!(recovered.code, original.code);
        assert_eq!(recovered.family_id, original.family_id);
        assert_eq!(recovered.expires_at, original.expires_at);
        assert!(!recovered.is_used);
    }
}
