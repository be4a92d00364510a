//! Access gate for role/permission gated actions.
//!
//! Every gated action names an [`AccessRule`] and runs it through
//! [`decide`] before touching storage. The rule carries an "any of"
//! list of role names and an "any of" list of permission names;
//! matching is first-match-wins OR: a role match grants access before
//! permissions are ever consulted.

use serde::{Deserialize, Serialize};

use crate::model::User;

/// A gate requirement: the acting user must belong to at least one of
/// `roles`, or failing that, hold at least one of `permissions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRule {
    /// Role names, any one of which grants access.
    pub roles: Vec<String>,
    /// Permission names, any one of which grants access when no role
    /// matched.
    pub permissions: Vec<String>,
}

impl AccessRule {
    /// A rule satisfied by any of the given roles.
    #[must_use]
    pub fn roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
            permissions: Vec::new(),
        }
    }

    /// A rule satisfied by any of the given permissions.
    #[must_use]
    pub fn permissions<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: Vec::new(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Extend a rule with permissions, builder style.
    #[must_use]
    pub fn or_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }
}

/// Outcome of evaluating an [`AccessRule`] against a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The action may proceed.
    Allow,
    /// No authenticated user; send them to the login page.
    RedirectToLogin,
    /// Authenticated but not authorized; send them to the
    /// access-denied page.
    RedirectToAccessDenied,
}

impl Decision {
    /// Check if the decision permits the action.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Evaluate a rule against the current user, if any.
///
/// Unauthenticated requests are always redirected to login. Otherwise
/// the roles list is consulted first and a match grants access on its
/// own; the permissions list is only reached when no role matched.
#[must_use]
pub fn decide(user: Option<&User>, rule: &AccessRule) -> Decision {
    let Some(user) = user else {
        return Decision::RedirectToLogin;
    };

    if rule.roles.iter().any(|role| user.has_role(role)) {
        return Decision::Allow;
    }

    if rule.permissions.iter().any(|perm| user.has_permission(perm)) {
        return Decision::Allow;
    }

    Decision::RedirectToAccessDenied
}
