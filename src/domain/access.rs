//! Access-control policy.
//!
//! Decides whose data a request operates on. An admin may act on behalf of
//! another user by naming them; everyone else is confined to their own data.
//! Records are always checked against the resolved target after loading, so
//! an admin targets a user, never an arbitrary record.

use crate::errors::{AppError, AppResult};

use super::user::UserRole;

/// The authenticated identity performing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub username: String,
    pub role: UserRole,
}

/// The user whose data an operation is confined to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    /// Effective target username
    pub target: String,
    /// True when an admin operates on someone else's data
    pub elevated: bool,
}

/// What a profile update touches, for authorization purposes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileChange {
    pub changes_role: bool,
}

impl Actor {
    pub fn new(username: impl Into<String>, role: UserRole) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Resolve the effective target for a request.
    ///
    /// A blank requested target counts as absent. Non-admins naming another
    /// user are rejected.
    pub fn scope(&self, requested: Option<&str>) -> AppResult<Scope> {
        let requested = requested.map(str::trim).filter(|name| !name.is_empty());

        match requested {
            None => Ok(self.own_scope()),
            Some(target) if target == self.username => Ok(self.own_scope()),
            Some(target) if self.is_admin() => Ok(Scope {
                target: target.to_string(),
                elevated: true,
            }),
            Some(target) => {
                tracing::warn!(
                    actor = %self.username,
                    target = %target,
                    "Non-admin attempted to act on another user's data"
                );
                Err(AppError::Forbidden)
            }
        }
    }

    fn own_scope(&self) -> Scope {
        Scope {
            target: self.username.clone(),
            elevated: false,
        }
    }

    /// Authorize a profile update of `target`.
    ///
    /// Users may edit their own phone and password; role changes and edits of
    /// other profiles require admin.
    pub fn authorize_profile_change(&self, target: &str, change: ProfileChange) -> AppResult<()> {
        if self.is_admin() {
            return Ok(());
        }
        if change.changes_role || target != self.username {
            return Err(AppError::Forbidden);
        }
        Ok(())
    }

    /// Require admin role.
    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

impl Scope {
    /// Verify that a loaded record belongs to the effective target.
    pub fn ensure_owner(&self, owner: &str) -> AppResult<()> {
        if owner == self.target {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> Actor {
        Actor::new(name, UserRole::User)
    }

    fn admin(name: &str) -> Actor {
        Actor::new(name, UserRole::Admin)
    }

    #[test]
    fn test_admin_with_target_is_elevated() {
        let scope = admin("root@x.com").scope(Some("b@x.com")).unwrap();
        assert_eq!(scope.target, "b@x.com");
        assert!(scope.elevated);
    }

    #[test]
    fn test_admin_without_target_uses_own_data() {
        let scope = admin("root@x.com").scope(None).unwrap();
        assert_eq!(scope.target, "root@x.com");
        assert!(!scope.elevated);
    }

    #[test]
    fn test_blank_target_counts_as_absent() {
        let scope = user("a@x.com").scope(Some("  ")).unwrap();
        assert_eq!(scope.target, "a@x.com");
    }

    #[test]
    fn test_user_naming_self_is_allowed() {
        let scope = user("a@x.com").scope(Some("a@x.com")).unwrap();
        assert!(!scope.elevated);
    }

    #[test]
    fn test_user_naming_other_is_rejected() {
        assert!(matches!(
            user("a@x.com").scope(Some("b@x.com")),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn test_ownership_checked_even_when_elevated() {
        let scope = admin("root@x.com").scope(Some("b@x.com")).unwrap();
        assert!(scope.ensure_owner("b@x.com").is_ok());
        assert!(matches!(scope.ensure_owner("c@x.com"), Err(AppError::Forbidden)));
    }

    #[test]
    fn test_profile_changes() {
        let alice = user("a@x.com");
        assert!(alice
            .authorize_profile_change("a@x.com", ProfileChange::default())
            .is_ok());
        assert!(alice
            .authorize_profile_change("a@x.com", ProfileChange { changes_role: true })
            .is_err());
        assert!(alice
            .authorize_profile_change("b@x.com", ProfileChange::default())
            .is_err());
        assert!(admin("root@x.com")
            .authorize_profile_change("b@x.com", ProfileChange { changes_role: true })
            .is_ok());
    }
}
