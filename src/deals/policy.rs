use super::repo::Deal;
use crate::{
    auth::{Identity, Role},
    error::ApiError,
};

/// Target action for an authorization decision. Mutations on an existing deal
/// carry the loaded resource snapshot; the same snapshot is later persisted or
/// deleted, so there is no re-load between decision and write.
#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    Create,
    Read,
    List,
    ListMine,
    Update(&'a Deal),
    Delete(&'a Deal),
}

/// Pure decision function over (identity, action). `identity` is `None` for
/// unauthenticated callers.
pub fn authorize(identity: Option<&Identity>, action: Action<'_>) -> Result<(), ApiError> {
    match action {
        // Public read.
        Action::Read | Action::List => Ok(()),
        Action::ListMine => {
            identity
                .map(|_| ())
                .ok_or_else(|| ApiError::Unauthenticated("No token provided".into()))
        }
        Action::Create => match identity {
            Some(i) if i.role == Role::Owner => Ok(()),
            Some(_) => Err(ApiError::Forbidden("Only owners can add deals".into())),
            None => Err(ApiError::Unauthenticated("No token provided".into())),
        },
        Action::Update(deal) => owned(identity, deal, "You can only update your own deals"),
        Action::Delete(deal) => owned(identity, deal, "You can only delete your own deals"),
    }
}

// Ownership, not role: an owner-role user may not touch another owner's deal.
fn owned(identity: Option<&Identity>, deal: &Deal, denial: &str) -> Result<(), ApiError> {
    match identity {
        Some(i) if i.id == deal.owner_id => Ok(()),
        Some(_) => Err(ApiError::Forbidden(denial.into())),
        None => Err(ApiError::Unauthenticated("No token provided".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn identity(role: Role) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            name: "Test".into(),
            email: "test@example.com".into(),
            role,
        }
    }

    fn deal_owned_by(owner_id: Uuid) -> Deal {
        Deal {
            id: Uuid::new_v4(),
            title: "Half-price pizza".into(),
            description: "Every weekday".into(),
            discount: 50.0,
            location: "Lisbon".into(),
            start_date: date!(2026 - 01 - 01),
            end_date: date!(2026 - 02 - 01),
            image: "/uploads/default.png".into(),
            owner_id,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn create_requires_owner_role() {
        assert!(authorize(Some(&identity(Role::Owner)), Action::Create).is_ok());

        let err = authorize(Some(&identity(Role::Member)), Action::Create).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let err = authorize(None, Action::Create).unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }

    #[test]
    fn read_and_list_are_public() {
        assert!(authorize(None, Action::Read).is_ok());
        assert!(authorize(None, Action::List).is_ok());
        assert!(authorize(Some(&identity(Role::Member)), Action::List).is_ok());
    }

    #[test]
    fn list_mine_requires_authentication_only() {
        assert!(authorize(Some(&identity(Role::Member)), Action::ListMine).is_ok());
        let err = authorize(None, Action::ListMine).unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }

    #[test]
    fn update_requires_resource_ownership() {
        let caller = identity(Role::Owner);
        let own = deal_owned_by(caller.id);
        assert!(authorize(Some(&caller), Action::Update(&own)).is_ok());

        // Role is irrelevant here: another owner is still denied.
        let other = deal_owned_by(Uuid::new_v4());
        let err = authorize(Some(&caller), Action::Update(&other)).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn delete_requires_resource_ownership() {
        let caller = identity(Role::Member);
        let own = deal_owned_by(caller.id);
        assert!(authorize(Some(&caller), Action::Delete(&own)).is_ok());

        let other = deal_owned_by(Uuid::new_v4());
        let err = authorize(Some(&caller), Action::Delete(&other)).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }
}
