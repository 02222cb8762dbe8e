//! High-level family membership API.
//!
//! [`FamilyManager`] owns family creation and member admission. Identity
//! is always explicit: the caller supplies the authenticated member ID for
//! every operation.

use std::sync::Arc;

use chrono::Utc;

use super::types::{members_collection, Family, Member, Role, FAMILIES_COLLECTION};
use crate::error::{Error, Result};
use crate::geo::Coordinates;
use crate::invite::{Invite, InviteManager};
use crate::store::{encode_document, generate_document_id, Direction, DocumentStore, Query};

/// High-level API for family and membership management.
pub struct FamilyManager {
    store: Arc<dyn DocumentStore>,
    invites: InviteManager,
}

impl FamilyManager {
    /// Creates a new family manager over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let invites = InviteManager::new(Arc::clone(&store));
        Self { store, invites }
    }

    /// Creates a family together with its owning admin member.
    ///
    /// The two writes form one logical unit: the owner member document is
    /// written under a pre-allocated family ID before the family document,
    /// and every read path checks the family document first. A failure
    /// between the writes therefore never exposes a partially created
    /// family.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRadius`] unless the radius is finite and
    /// positive, or [`Error::StorageUnavailable`] on backend failure.
    /// Coordinates are validated at construction ([`Coordinates::new`]).
    pub fn create_family(
        &self,
        name: &str,
        home_location: Coordinates,
        safe_radius_meters: f64,
        owner_id: &str,
        owner_display_name: &str,
    ) -> Result<Family> {
        if !safe_radius_meters.is_finite() || safe_radius_meters <= 0.0 {
            return Err(Error::InvalidRadius(safe_radius_meters));
        }

        let now = Utc::now().timestamp_millis();
        let family_id = generate_document_id();

        let owner = Member {
            id: owner_id.to_string(),
            role: Role::Admin,
            display_name: owner_display_name.to_string(),
            email: None,
            created_at: now,
            notification_targets: Vec::new(),
        };
        self.store.create(
            &members_collection(&family_id),
            owner_id,
            encode_document(&owner)?,
        )?;

        let family = Family {
            id: family_id.clone(),
            name: name.to_string(),
            home_location,
            safe_radius_meters,
            created_at: now,
            owner_id: owner_id.to_string(),
        };
        let created =
            self.store
                .create(FAMILIES_COLLECTION, &family_id, encode_document(&family)?)?;
        if !created {
            // A generated-ID collision means the backend handed out a
            // duplicate; nothing sensible can be committed on top of it.
            return Err(Error::StorageUnavailable(format!(
                "family ID collision: {family_id}"
            )));
        }

        Ok(family)
    }

    /// Adds a member admitted through a redeemed invite.
    ///
    /// The invite must have been redeemed (see
    /// [`InviteManager::redeem_invite`]) and must be scoped to
    /// `family_id`; the member receives the role the invite granted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFamily`] if the family is absent or the
    /// invite belongs to a different family, and [`Error::DuplicateMember`]
    /// if `member_id` already belongs to the family.
    pub fn add_member(
        &self,
        family_id: &str,
        invite: &Invite,
        member_id: &str,
        display_name: &str,
        email: Option<&str>,
    ) -> Result<Member> {
        if invite.family_id != family_id {
            return Err(Error::InvalidFamily(family_id.to_string()));
        }
        self.family(family_id)?;

        let member = Member {
            id: member_id.to_string(),
            role: invite.role,
            display_name: display_name.to_string(),
            email: email.map(ToString::to_string),
            created_at: Utc::now().timestamp_millis(),
            notification_targets: Vec::new(),
        };

        let created = self.store.create(
            &members_collection(family_id),
            member_id,
            encode_document(&member)?,
        )?;
        if !created {
            return Err(Error::DuplicateMember(member_id.to_string()));
        }

        Ok(member)
    }

    /// Redeems an invite code and joins the issuing family in one call.
    ///
    /// Family existence and duplicate membership are checked before the
    /// single-use code is burned, so an invalid join attempt does not
    /// consume the invite.
    ///
    /// # Errors
    ///
    /// Any error of [`InviteManager::redeem_invite`] or
    /// [`Self::add_member`].
    pub fn join_family(
        &self,
        code: &str,
        member_id: &str,
        display_name: &str,
        email: Option<&str>,
    ) -> Result<Member> {
        let pending = self.invites.find_by_code(code)?;
        self.family(&pending.family_id)?;
        if self.store.get(&members_collection(&pending.family_id), member_id)?.is_some() {
            return Err(Error::DuplicateMember(member_id.to_string()));
        }

        let invite = self.invites.redeem_invite(code)?;
        self.add_member(&invite.family_id, &invite, member_id, display_name, email)
    }

    /// Fetches a family by ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFamily`] if no such family exists.
    pub fn family(&self, family_id: &str) -> Result<Family> {
        let document = self
            .store
            .get(FAMILIES_COLLECTION, family_id)?
            .ok_or_else(|| Error::InvalidFamily(family_id.to_string()))?;
        Ok(Family::from_document(family_id.to_string(), document)?)
    }

    /// Fetches a member of a family.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMember`] if the member does not belong to
    /// the family.
    pub fn member(&self, family_id: &str, member_id: &str) -> Result<Member> {
        let document = self
            .store
            .get(&members_collection(family_id), member_id)?
            .ok_or_else(|| Error::InvalidMember(member_id.to_string()))?;
        Ok(Member::from_document(
            family_id,
            member_id.to_string(),
            document,
        )?)
    }

    /// Lists a family's members, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFamily`] if the family is absent.
    pub fn members(&self, family_id: &str) -> Result<Vec<Member>> {
        self.family(family_id)?;

        let query = Query::new().order_by("createdAt", Direction::Ascending);
        let documents = self.store.query(&members_collection(family_id), &query)?;

        documents
            .into_iter()
            .map(|(id, document)| Ok(Member::from_document(family_id, id, document)?))
            .collect()
    }
}
