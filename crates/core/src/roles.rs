//! Roles and the authorization predicate.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::errors::UnknownVariant;

/// A user's role.
///
/// Newly registered users start as [`Role::Unknown`] and wait for an administrator to approve
/// them as members. [`Role::Banned`] users are refused everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Registered but not yet approved.
    #[default]
    Unknown,

    /// May build carts and join orders.
    Member,

    /// May open and manage delivery orders.
    Delivery,

    /// May manage the catalog and approve users.
    Admin,

    /// May do anything, including appointing administrators.
    SuperAdmin,

    /// Refused all access.
    Banned,
}

/// Roles allowed to build carts and attach them to orders.
pub const ORDERING_ROLES: &[Role] = &[Role::Member, Role::Delivery, Role::Admin, Role::SuperAdmin];

/// Roles allowed to open, progress and summarise delivery orders.
pub const ORDER_MANAGERS: &[Role] = &[Role::Delivery, Role::Admin, Role::SuperAdmin];

/// Roles allowed to mutate the catalog.
pub const CATALOG_MANAGERS: &[Role] = &[Role::Admin, Role::SuperAdmin];

/// Roles allowed to list users and change their roles.
pub const ROLE_MANAGERS: &[Role] = &[Role::Admin, Role::SuperAdmin];

impl Role {
    /// Every role, in ascending order of privilege with `Banned` last.
    pub const ALL: [Role; 6] = [
        Role::Unknown,
        Role::Member,
        Role::Delivery,
        Role::Admin,
        Role::SuperAdmin,
        Role::Banned,
    ];

    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Unknown => "unknown",
            Role::Member => "member",
            Role::Delivery => "delivery",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
            Role::Banned => "banned",
        }
    }

    /// Administrators and super administrators.
    pub const fn is_privileged(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }

    /// Whether the user has been approved and not banned.
    pub const fn is_active(self) -> bool {
        !matches!(self, Role::Unknown | Role::Banned)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| UnknownVariant::new("role", value))
    }
}

/// Whether `role` is one of `required`.
pub fn role_allows(role: Role, required: &[Role]) -> bool {
    required.contains(&role)
}

/// Whether `actor` may change a user currently holding `target_current` to `new_role`.
///
/// Super administrators may assign anything. Administrators may assign non-privileged roles to
/// non-privileged users only, so they can neither create peers nor demote them.
pub fn can_assign_role(actor: Role, target_current: Role, new_role: Role) -> bool {
    match actor {
        Role::SuperAdmin => true,
        Role::Admin => !target_current.is_privileged() && !new_role.is_privileged(),
        Role::Unknown | Role::Member | Role::Delivery | Role::Banned => false,
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn role_allows_checks_membership() {
        assert!(role_allows(Role::Member, ORDERING_ROLES));
        assert!(role_allows(Role::Delivery, ORDER_MANAGERS));
        assert!(!role_allows(Role::Member, ORDER_MANAGERS));
        assert!(!role_allows(Role::Delivery, CATALOG_MANAGERS));
        assert!(!role_allows(Role::Banned, ORDERING_ROLES));
        assert!(!role_allows(Role::Unknown, ORDERING_ROLES));
        assert!(!role_allows(Role::SuperAdmin, &[]));
    }

    #[test]
    fn admin_cannot_create_or_touch_privileged_users() {
        assert!(!can_assign_role(Role::Admin, Role::Member, Role::SuperAdmin));
        assert!(!can_assign_role(Role::Admin, Role::Member, Role::Admin));
        assert!(!can_assign_role(Role::Admin, Role::Admin, Role::Banned));
        assert!(!can_assign_role(Role::Admin, Role::SuperAdmin, Role::Member));
    }

    #[test]
    fn admin_can_approve_ban_and_promote_to_delivery() {
        assert!(can_assign_role(Role::Admin, Role::Unknown, Role::Member));
        assert!(can_assign_role(Role::Admin, Role::Member, Role::Banned));
        assert!(can_assign_role(Role::Admin, Role::Member, Role::Delivery));
    }

    #[test]
    fn super_admin_can_assign_anything() {
        for current in Role::ALL {
            for next in Role::ALL {
                assert!(
                    can_assign_role(Role::SuperAdmin, current, next),
                    "super admin should assign {next} over {current}"
                );
            }
        }
    }

    #[test]
    fn other_roles_cannot_assign() {
        for actor in [Role::Unknown, Role::Member, Role::Delivery, Role::Banned] {
            assert!(
                !can_assign_role(actor, Role::Unknown, Role::Member),
                "{actor} should not assign roles"
            );
        }
    }

    #[test]
    fn roles_parse_from_storage_form() -> TestResult {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>()?, role);
        }

        assert!("owner".parse::<Role>().is_err());

        Ok(())
    }

    #[test]
    fn activity_excludes_pending_and_banned() {
        assert!(!Role::Unknown.is_active());
        assert!(!Role::Banned.is_active());
        assert!(Role::Member.is_active());
        assert!(Role::SuperAdmin.is_active());
    }
}
