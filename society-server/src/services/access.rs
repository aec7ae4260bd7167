//! Checks shared by several services: who may write to the feed, which flats
//! a resident lives in, and who counts as a member of a flat.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use society_core::models::{AuthorModel, FlatDetails, Resident, Society};
use society_core::store::{Collections, Transaction};
use society_core::{Role, SocietyError, TenantContext};

pub const SOCIETY: &str = "Society";

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn forbidden(msg: impl Into<String>) -> anyhow::Error {
    SocietyError::forbidden(msg).into_anyhow()
}

/// The caller's resident document, if the caller is a resident of this
/// society.
pub fn caller_resident<'a>(c: &'a Collections, tenant: &TenantContext) -> Option<&'a Resident> {
    let actor = tenant.actor.as_ref()?;
    if actor.role != Role::Resident {
        return None;
    }
    c.residents
        .get(&actor.id)
        .filter(|r| r.society_id == tenant.society())
}

/// Same as [`caller_resident`], reading the staged view of a transaction.
pub fn staged_caller<'t>(tx: &'t Transaction<'_>, tenant: &TenantContext) -> Option<&'t Resident> {
    let actor = tenant.actor.as_ref()?;
    if actor.role != Role::Resident {
        return None;
    }
    tx.residents
        .get(&actor.id)
        .filter(|r| r.society_id == tenant.society())
}

/// Who a feed write is attributed to. Admins write as the society; residents
/// must be approved; guards have no feed access.
pub fn feed_author(tenant: &TenantContext, resident: Option<&Resident>) -> Result<(String, AuthorModel)> {
    let actor = tenant.actor()?;
    match actor.role {
        Role::Admin => Ok((tenant.society().to_string(), AuthorModel::Society)),
        Role::Resident => match resident {
            Some(r) if r.is_approved() && r.id == actor.id => Ok((r.id.clone(), AuthorModel::Resident)),
            _ => Err(forbidden("Only approved residents may use the community feed")),
        },
        Role::Guard => Err(forbidden("Guards may not use the community feed")),
    }
}

/// Flats the tree lists `resident_id` in.
pub fn placements(society: Option<&Society>, resident_id: &str) -> Vec<FlatDetails> {
    society
        .map(|s| s.apartment_structure.locate(resident_id))
        .unwrap_or_default()
}

/// Block, floor and flat all have to match; flat numbers may repeat across
/// floors.
pub fn lives_in(placements: &[FlatDetails], flat: &FlatDetails) -> bool {
    placements.iter().any(|p| p.same_flat(flat))
}

#[cfg(test)]
mod tests {
    use society_core::models::ResidentStatus;
    use society_core::Actor;

    use super::*;

    fn resident(status: ResidentStatus) -> Resident {
        let now = Utc::now();
        Resident {
            id: "res:1".into(),
            society_id: "soc-1".into(),
            name: "Asha".into(),
            email: "asha@example.com".into(),
            phone: None,
            flat_details: FlatDetails::new("A", 1, "101"),
            status,
            blocked_users: vec![],
            created_at: now,
            updated_at: now,
            approved_at: None,
        }
    }

    fn tenant(role: Role, id: &str) -> TenantContext {
        TenantContext::new("soc-1").with_actor(Actor { id: id.into(), role })
    }

    #[test]
    fn only_approved_residents_and_admins_write_to_the_feed() {
        let pending = resident(ResidentStatus::Pending);
        let approved = resident(ResidentStatus::Approved);

        let err = feed_author(&tenant(Role::Resident, "res:1"), Some(&pending)).unwrap_err();
        assert_eq!(SocietyError::from_anyhow(&err).unwrap().code(), 403);

        let (id, model) = feed_author(&tenant(Role::Resident, "res:1"), Some(&approved)).unwrap();
        assert_eq!((id.as_str(), model), ("res:1", AuthorModel::Resident));

        let (id, model) = feed_author(&tenant(Role::Admin, "soc-1"), None).unwrap();
        assert_eq!((id.as_str(), model), ("soc-1", AuthorModel::Society));

        assert!(feed_author(&tenant(Role::Guard, "g-1"), None).is_err());
    }

    #[test]
    fn lives_in_matches_the_floor_too() {
        let p = vec![FlatDetails::new("A", 1, "101")];
        assert!(lives_in(&p, &FlatDetails::new("A", 1, "101")));
        assert!(!lives_in(&p, &FlatDetails::new("A", 1, "102")));
        assert!(!lives_in(&p, &FlatDetails::new("A", 2, "101")));
    }
}
