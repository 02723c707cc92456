//! Capability check for acting on behalf of another manager.
//!
//! An authenticated [`Caller`] may always act for themselves. Acting for a
//! different user requires [`Role::Admin`] in addition to whatever role the
//! operation names, so a `required` role of [`Role::Manager`] never opens up
//! another manager's games.

use super::models::{AccessTokenClaims, UserId};
use serde::{Deserialize, Serialize};

/// Roles a caller can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Owns and runs their own games
    Manager,
    /// May act as any manager
    Admin,
}

/// Outcome of a capability check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Permit,
    Deny,
}

impl Permission {
    pub fn is_permitted(self) -> bool {
        self == Permission::Permit
    }
}

/// Identity of an authenticated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub username: String,
    pub is_admin: bool,
}

impl Caller {
    /// Whether the caller holds `role`
    pub fn has_role(&self, role: Role) -> bool {
        match role {
            Role::Manager => true,
            Role::Admin => self.is_admin,
        }
    }
}

impl From<AccessTokenClaims> for Caller {
    fn from(claims: AccessTokenClaims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            is_admin: claims.is_admin,
        }
    }
}

/// Decide whether `caller` may act as `target` in an operation that
/// requires `required` to act for someone else. Callers always act for
/// themselves.
pub fn check(caller: &Caller, target: UserId, required: Role) -> Permission {
    let permitted = caller.user_id == target
        || (caller.has_role(Role::Admin) && caller.has_role(required));

    if permitted {
        Permission::Permit
    } else {
        Permission::Deny
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(user_id: UserId, is_admin: bool) -> Caller {
        Caller {
            user_id,
            username: format!("user_{user_id}"),
            is_admin,
        }
    }

    #[test]
    fn test_self_is_always_permitted() {
        assert_eq!(check(&caller(1, false), 1, Role::Admin), Permission::Permit);
    }

    #[test]
    fn test_manager_cannot_act_for_others() {
        assert_eq!(check(&caller(1, false), 2, Role::Admin), Permission::Deny);
    }

    #[test]
    fn test_manager_role_does_not_grant_access_to_others() {
        assert_eq!(check(&caller(1, false), 2, Role::Manager), Permission::Deny);
        assert_eq!(check(&caller(1, false), 1, Role::Manager), Permission::Permit);
        assert_eq!(check(&caller(1, true), 2, Role::Manager), Permission::Permit);
    }

    #[test]
    fn test_admin_can_act_for_others() {
        assert!(check(&caller(1, true), 2, Role::Admin).is_permitted());
    }

    #[test]
    fn test_caller_from_claims() {
        let claims = AccessTokenClaims {
            sub: 9,
            username: "pool_admin".to_string(),
            is_admin: true,
            exp: 0,
            iat: 0,
        };
        let caller = Caller::from(claims);
        assert_eq!(caller.user_id, 9);
        assert!(caller.has_role(Role::Admin));
        assert!(caller.has_role(Role::Manager));
    }
}
