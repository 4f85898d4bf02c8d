//! User directory use-case service.
//!
//! # Responsibility
//! - Register, rename and delete users; create roles and manage membership.
//! - Project users into `UserViewModel` for the web boundary.
//!
//! # Invariants
//! - Every mutating call ends at the commit boundary (`save_changes`); a
//!   failed commit discards the unit of work.
//! - Email addresses are unique per directory after `normalize_email`;
//!   the `ux_users_email` index enforces it for every writer.
//! - Deleting a user or revoking a role is idempotent.

use crate::context::{predicate, DbContext};
use crate::model::role::{Role, RoleId, UserRole};
use crate::model::user::{normalize_email, User, UserId};
use crate::model::view::{RoleViewModel, UserViewModel};
use crate::repo::base_repository::BaseRepository;
use crate::repo::entity_repository::EntityRepository;
use crate::repo::error::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type UserServiceResult<T> = Result<T, UserServiceError>;

/// Errors from user directory operations.
#[derive(Debug)]
pub enum UserServiceError {
    /// Another user already uses this email address.
    EmailTaken(String),
    UserNotFound(UserId),
    RoleNotFound(RoleId),
    Repo(RepoError),
}

impl Display for UserServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmailTaken(email) => write!(f, "email already registered: {email}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::RoleNotFound(id) => write!(f, "role not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UserServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for UserServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// User directory service over one persistence context.
pub struct UserService<'ctx> {
    context: &'ctx DbContext<'ctx>,
    users: EntityRepository<'ctx, User>,
    roles: EntityRepository<'ctx, Role>,
    memberships: EntityRepository<'ctx, UserRole>,
}

impl<'ctx> UserService<'ctx> {
    pub fn new(context: &'ctx DbContext<'ctx>) -> Self {
        Self {
            context,
            users: EntityRepository::new(context),
            roles: EntityRepository::new(context),
            memberships: EntityRepository::new(context),
        }
    }

    /// Creates a user and commits it.
    ///
    /// # Errors
    /// - `EmailTaken` when the address is already registered.
    /// - `Repo(Validation)` for a malformed email or blank name.
    pub fn register_user(&self, email: &str, full_name: &str) -> UserServiceResult<UserViewModel> {
        let email = normalize_email(email);
        let taken = self.users.any(|user| user.email == email)?;
        if taken {
            return Err(UserServiceError::EmailTaken(email));
        }

        let mut user = User::new(email, full_name.trim());
        self.users.add(&mut user)?;
        self.commit()?;
        info!("event=user_registered module=service status=ok");
        Ok(UserViewModel::from(&user))
    }

    /// Creates a role and commits it.
    pub fn create_role(&self, name: &str) -> UserServiceResult<RoleViewModel> {
        let mut role = Role::new(name.trim());
        self.roles.add(&mut role)?;
        self.commit()?;
        Ok(RoleViewModel::from(&role))
    }

    /// Grants `role_id` to `user_id`; granting an existing membership is a no-op.
    pub fn assign_role(&self, user_id: UserId, role_id: RoleId) -> UserServiceResult<()> {
        if self.users.find_by_id(&user_id)?.is_none() {
            return Err(UserServiceError::UserNotFound(user_id));
        }
        if self.roles.find_by_id(&role_id)?.is_none() {
            return Err(UserServiceError::RoleNotFound(role_id));
        }
        if self.memberships.find_by_id(&(user_id, role_id))?.is_some() {
            return Ok(());
        }

        let mut membership = UserRole::new(user_id, role_id);
        self.memberships.add(&mut membership)?;
        self.commit()
    }

    /// Withdraws `role_id` from `user_id`; missing memberships are ignored.
    pub fn revoke_role(&self, user_id: UserId, role_id: RoleId) -> UserServiceResult<()> {
        self.memberships.remove_by_id(&(user_id, role_id))?;
        self.commit()
    }

    /// Replaces a user's display name.
    pub fn rename_user(&self, user_id: UserId, full_name: &str) -> UserServiceResult<UserViewModel> {
        let mut user = self
            .users
            .find_by_id(&user_id)?
            .ok_or(UserServiceError::UserNotFound(user_id))?;
        user.full_name = full_name.trim().to_string();
        self.users.update(&mut user)?;
        self.commit()?;
        self.get_user(user_id)?
            .ok_or(UserServiceError::UserNotFound(user_id))
    }

    /// Deletes a user and its role memberships; unknown ids are ignored.
    pub fn delete_user(&self, user_id: UserId) -> UserServiceResult<()> {
        let memberships = self
            .memberships
            .filter([predicate(move |membership: &UserRole| {
                membership.user_id == user_id
            })])
            .to_vec()?;
        self.memberships.remove_range(&memberships)?;
        self.users.remove_by_id(&user_id)?;
        self.commit()
    }

    /// One user with roles, or `None`.
    pub fn get_user(&self, user_id: UserId) -> UserServiceResult<Option<UserViewModel>> {
        let Some(mut user) = self.users.find_by_id(&user_id)? else {
            return Ok(None);
        };
        User::roles().apply(self.context, std::slice::from_mut(&mut user))?;
        Ok(Some(UserViewModel::from(&user)))
    }

    /// Lookup by email, compared after `normalize_email`.
    pub fn find_by_email(&self, email: &str) -> UserServiceResult<Option<UserViewModel>> {
        let email = normalize_email(email);
        let Some(mut user) = self.users.first_or_default_where(|user| user.email == email)? else {
            return Ok(None);
        };
        User::roles().apply(self.context, std::slice::from_mut(&mut user))?;
        Ok(Some(UserViewModel::from(&user)))
    }

    /// All users with their roles, ordered by email.
    pub fn list_users(&self) -> UserServiceResult<Vec<UserViewModel>> {
        let mut users = self.users.all_including(&[User::roles()]).to_vec()?;
        users.sort_by(|left, right| left.email.cmp(&right.email));
        Ok(users.iter().map(UserViewModel::from).collect())
    }

    fn commit(&self) -> UserServiceResult<()> {
        if let Err(err) = self.context.save_changes() {
            self.context.discard_changes();
            return Err(err.into());
        }
        Ok(())
    }
}
