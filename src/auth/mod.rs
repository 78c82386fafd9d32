//! Who is calling, and what they may do.
//!
//! An [`Actor`] is resolved once per request (see
//! `services::authorization`) and checked against the right codes an
//! operation requires with [`check_permissions`].

use std::collections::BTreeSet;

use crate::config::PermissionConfig;
use crate::errors::{CoreError, CoreResult};

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Actor {
    pub user_id: Option<i32>,
    rights: BTreeSet<String>,
}

impl Actor {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: i32) -> Self {
        Self {
            user_id: Some(user_id),
            rights: BTreeSet::new(),
        }
    }

    pub fn with_right(mut self, right: impl Into<String>) -> Self {
        self.rights.insert(right.into());
        self
    }

    pub fn with_rights<I, S>(mut self, rights: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rights.extend(rights.into_iter().map(Into::into));
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }

    pub fn has_right(&self, right: &str) -> bool {
        self.rights.contains(right)
    }

    /// True when every code in `rights` is held.
    pub fn has_rights(&self, rights: &[String]) -> bool {
        rights.iter().all(|right| self.has_right(right))
    }
}

/// Rejects anonymous actors and actors missing any of `perms`.
pub fn check_permissions(actor: &Actor, perms: &[String]) -> CoreResult<()> {
    if actor.is_anonymous() || !actor.has_rights(perms) {
        tracing::debug!(user_id = ?actor.user_id, ?perms, "permission check failed");
        return Err(CoreError::unauthorized());
    }
    Ok(())
}

/// Operations guarded by a right code.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    IndividualSearch,
    IndividualCreate,
    IndividualUpdate,
    IndividualDelete,
    GroupSearch,
    GroupCreate,
    GroupUpdate,
    GroupDelete,
}

impl PermissionConfig {
    pub fn required(&self, operation: Operation) -> &[String] {
        match operation {
            Operation::IndividualSearch => &self.individual_search,
            Operation::IndividualCreate => &self.individual_create,
            Operation::IndividualUpdate => &self.individual_update,
            Operation::IndividualDelete => &self.individual_delete,
            Operation::GroupSearch => &self.group_search,
            Operation::GroupCreate => &self.group_create,
            Operation::GroupUpdate => &self.group_update,
            Operation::GroupDelete => &self.group_delete,
        }
    }

    pub fn check(&self, actor: &Actor, operation: Operation) -> CoreResult<()> {
        check_permissions(actor, self.required(operation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CoreErrorKind;

    fn perms(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_anonymous_actor_is_rejected() {
        let err = check_permissions(&Actor::anonymous(), &[]).unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Unauthorized);
        assert_eq!(err.message(), "Unauthorized");
    }

    #[test]
    fn test_all_rights_are_required() {
        let actor = Actor::user(7).with_right("159001");
        assert!(check_permissions(&actor, &perms(&["159001"])).is_ok());
        assert!(check_permissions(&actor, &perms(&["159001", "159002"])).is_err());
    }

    #[test]
    fn test_operation_lookup_uses_configured_codes() {
        let config = PermissionConfig::default();
        let actor = Actor::user(1).with_rights(["180001"]);
        assert!(config.check(&actor, Operation::GroupSearch).is_ok());
        assert!(config.check(&actor, Operation::IndividualSearch).is_err());
    }
}
