//! Readonly projections returned across the web/API boundary.
//!
//! Wire field names (`Id`, `Email`, `FullName`, `Roles`, `Name`) are kept
//! exactly as existing clients consume them.

use crate::model::role::{Role, RoleId};
use crate::model::user::{User, UserId};
use serde::{Deserialize, Serialize};

/// Reference/name pair for one role held by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RoleViewModel {
    pub id: RoleId,
    pub name: String,
}

/// User projection for list/detail screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserViewModel {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    pub roles: Vec<RoleViewModel>,
}

impl From<&Role> for RoleViewModel {
    fn from(role: &Role) -> Self {
        Self {
            id: role.id,
            name: role.name.clone(),
        }
    }
}

impl From<&User> for UserViewModel {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            roles: user.roles.iter().map(RoleViewModel::from).collect(),
        }
    }
}
