//! Invite issuance and redemption.
//!
//! Codes are short random tokens, so issuance checks the candidate
//! against currently redeemable invites and re-generates on collision.
//! Redemption is a single conditional update on the `isUsed` flag:
//! concurrent redemptions of one code linearize at the store and exactly
//! one succeeds.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;
use serde_json::{json, Value};

use super::types::{Invite, INVITES_COLLECTION, INVITE_CODE_LENGTH, INVITE_TTL_HOURS};
use crate::error::{Error, Result};
use crate::family::{Role, FAMILIES_COLLECTION};
use crate::store::{encode_document, Direction, DocumentStore, Query, UpdateOutcome};

/// Characters a join code is drawn from.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Upper bound on collision re-generation attempts. With a 36^8 code
/// space this is never reached against a sane store.
const MAX_CODE_ATTEMPTS: usize = 16;

/// High-level API for invite management.
pub struct InviteManager {
    store: Arc<dyn DocumentStore>,
}

impl InviteManager {
    /// Creates a new invite manager over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Issues a new invite for a family.
    ///
    /// `created_by` must be an admin of the family; the adapter enforces
    /// that after authentication, the core records it only for audit.
    /// The invite expires 24 hours after creation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFamily`] if the family does not exist, or
    /// [`Error::StorageUnavailable`] on backend failure.
    pub fn create_invite(&self, family_id: &str, role: Role, created_by: &str) -> Result<Invite> {
        if self.store.get(FAMILIES_COLLECTION, family_id)?.is_none() {
            return Err(Error::InvalidFamily(family_id.to_string()));
        }

        let now = Utc::now().timestamp_millis();
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_code();
            if self.redeemable_code_exists(&code, now)? {
                continue;
            }

            let mut invite = Invite {
                id: String::new(),
                family_id: family_id.to_string(),
                code,
                role,
                created_by: created_by.to_string(),
                created_at: now,
                expires_at: now + Duration::hours(INVITE_TTL_HOURS).num_milliseconds(),
                is_used: false,
            };
            invite.id = self
                .store
                .insert(INVITES_COLLECTION, encode_document(&invite)?)?;
            return Ok(invite);
        }

        // Only reachable when the store keeps reporting collisions, which
        // means it is returning degenerate data.
        Err(Error::StorageUnavailable(
            "could not allocate a unique invite code".to_string(),
        ))
    }

    /// Redeems an invite by code, marking it used.
    ///
    /// The existence, expiry, and used checks and the `isUsed` flip are
    /// evaluated as one atomic unit per invite; of two concurrent
    /// redemptions of the same code exactly one succeeds and the other
    /// observes [`Error::InviteAlreadyUsed`].
    ///
    /// # Errors
    ///
    /// [`Error::InviteNotFound`] if no invite carries the code,
    /// [`Error::InviteExpired`] if its expiry has passed, or
    /// [`Error::InviteAlreadyUsed`] if it was already redeemed.
    pub fn redeem_invite(&self, code: &str) -> Result<Invite> {
        let candidate = self.find_by_code(code)?;
        let now = Utc::now().timestamp_millis();

        let outcome = self.store.conditional_update(
            INVITES_COLLECTION,
            &candidate.id,
            &|document| {
                let used = document
                    .get("isUsed")
                    .and_then(Value::as_bool)
                    .unwrap_or(true);
                let expires_at = document
                    .get("expiresAt")
                    .and_then(Value::as_i64)
                    .unwrap_or(i64::MIN);
                !used && now < expires_at
            },
            &|document| {
                document.insert("isUsed".to_string(), json!(true));
            },
        )?;

        match outcome {
            UpdateOutcome::Missing => Err(Error::InviteNotFound(code.to_string())),
            UpdateOutcome::Applied(document) => {
                Ok(Invite::from_document(candidate.id, document)?)
            }
            UpdateOutcome::Rejected(document) => {
                let current = Invite::from_document(candidate.id, document)?;
                if current.is_used {
                    Err(Error::InviteAlreadyUsed(code.to_string()))
                } else {
                    Err(Error::InviteExpired(code.to_string()))
                }
            }
        }
    }

    /// Finds the most recently issued invite carrying a code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InviteNotFound`] if no invite carries the code.
    pub(crate) fn find_by_code(&self, code: &str) -> Result<Invite> {
        let query = Query::new()
            .filter("code", code)
            .order_by("createdAt", Direction::Descending)
            .limit(1);

        self.store
            .query(INVITES_COLLECTION, &query)?
            .into_iter()
            .next()
            .map(|(id, document)| Ok::<Invite, Error>(Invite::from_document(id, document)?))
            .transpose()?
            .ok_or_else(|| Error::InviteNotFound(code.to_string()))
    }

    /// Whether a redeemable invite already carries the code.
    fn redeemable_code_exists(&self, code: &str, now_millis: i64) -> Result<bool> {
        let query = Query::new().filter("code", code);
        for (id, document) in self.store.query(INVITES_COLLECTION, &query)? {
            let invite = Invite::from_document(id, document)?;
            if invite.is_redeemable_at(now_millis) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Generates an 8-character uppercase alphanumeric join code.
fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..INVITE_CODE_LENGTH)
        .map(|_| char::from(CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::FamilyManager;
    use crate::geo::Coordinates;
    use crate::store::{DocumentStore, MemoryStore};

    fn setup() -> (Arc<MemoryStore>, FamilyManager, InviteManager, String) {
        let store = Arc::new(MemoryStore::new());
        let families = FamilyManager::new(Arc::clone(&store) as Arc<dyn DocumentStore>);
        let invites = InviteManager::new(Arc::clone(&store) as Arc<dyn DocumentStore>);
        let family = families
            .create_family(
                "García",
                Coordinates::new(40.4168, -3.7038).unwrap(),
                500.0,
                "uid-owner",
                "Luis",
            )
            .unwrap();
        (store, families, invites, family.id)
    }

    #[test]
    fn generated_codes_are_uppercase_alphanumeric() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), INVITE_CODE_LENGTH);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn create_invite_for_unknown_family_fails() {
        let (_store, _families, invites, _family_id) = setup();
        let result = invites.create_invite("missing", Role::Familiar, "uid-owner");
        assert!(matches!(result, Err(Error::InvalidFamily(_))));
    }

    #[test]
    fn create_invite_sets_24h_expiry() {
        let (_store, _families, invites, family_id) = setup();
        let invite = invites
            .create_invite(&family_id, Role::Familiar, "uid-owner")
            .unwrap();

        assert_eq!(
            invite.expires_at - invite.created_at,
            INVITE_TTL_HOURS * 3_600_000
        );
        assert!(!invite.is_used);
        assert_eq!(invite.family_id, family_id);
    }

    #[test]
    fn redeem_marks_invite_used() {
        let (_store, _families, invites, family_id) = setup();
        let invite = invites
            .create_invite(&family_id, Role::Familiar, "uid-owner")
            .unwrap();

        let redeemed = invites.redeem_invite(&invite.code).unwrap();
        assert!(redeemed.is_used);
        assert_eq!(redeemed.family_id, family_id);
        assert_eq!(redeemed.role, Role::Familiar);
    }

    #[test]
    fn redeem_unknown_code_fails() {
        let (_store, _families, invites, _family_id) = setup();
        assert!(matches!(
            invites.redeem_invite("ZZZZ9999"),
            Err(Error::InviteNotFound(_))
        ));
    }

    #[test]
    fn second_redeem_fails_as_already_used() {
        let (_store, _families, invites, family_id) = setup();
        let invite = invites
            .create_invite(&family_id, Role::Familiar, "uid-owner")
            .unwrap();

        invites.redeem_invite(&invite.code).unwrap();
        assert!(matches!(
            invites.redeem_invite(&invite.code),
            Err(Error::InviteAlreadyUsed(_))
        ));
    }

    #[test]
    fn expired_invite_fails_even_when_unused() {
        let (store, _families, invites, family_id) = setup();

        // Plant an invite whose expiry is already in the past.
        let expired = Invite {
            id: String::new(),
            family_id,
            code: "OLDCODE1".to_string(),
            role: Role::Familiar,
            created_by: "uid-owner".to_string(),
            created_at: 1_000,
            expires_at: 2_000,
            is_used: false,
        };
        store
            .insert(INVITES_COLLECTION, encode_document(&expired).unwrap())
            .unwrap();

        assert!(matches!(
            invites.redeem_invite("OLDCODE1"),
            Err(Error::InviteExpired(_))
        ));
    }

    #[test]
    fn expired_code_can_be_reissued() {
        let (store, _families, invites, family_id) = setup();

        let expired = Invite {
            id: String::new(),
            family_id: family_id.clone(),
            code: "SAMECODE".to_string(),
            role: Role::Familiar,
            created_by: "uid-owner".to_string(),
            created_at: 1_000,
            expires_at: 2_000,
            is_used: false,
        };
        store
            .insert(INVITES_COLLECTION, encode_document(&expired).unwrap())
            .unwrap();

        // An expired invite no longer blocks its code.
        let now = Utc::now().timestamp_millis();
        assert!(!invites.redeemable_code_exists("SAMECODE", now).unwrap());
    }

    #[test]
    fn fresh_code_blocks_reuse() {
        let (_store, _families, invites, family_id) = setup();
        let invite = invites
            .create_invite(&family_id, Role::Familiar, "uid-owner")
            .unwrap();

        let now = Utc::now().timestamp_millis();
        assert!(invites.redeemable_code_exists(&invite.code, now).unwrap());
    }
}
