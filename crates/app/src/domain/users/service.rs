//! Users service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use platter::{
    Role,
    roles::{ROLE_MANAGERS, can_assign_role},
    validation::normalize_phone,
};
use tracing::{Span, info};

use crate::{
    database::Db,
    domain::{
        access::require_role,
        users::{
            data::{ContactDetails, NewUser},
            errors::UsersServiceError,
            records::{Registration, UserRecord, UserUuid},
            repository::PgUsersRepository,
        },
    },
    notifications::{Notification, Notifier, fan_out},
};

#[derive(Clone)]
pub struct PgUsersService {
    db: Db,
    repository: PgUsersRepository,
    notifier: Arc<dyn Notifier>,
}

impl PgUsersService {
    #[must_use]
    pub fn new(db: Db, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            db,
            repository: PgUsersRepository::new(),
            notifier,
        }
    }
}

#[async_trait]
impl UsersService for PgUsersService {
    #[tracing::instrument(
        name = "users.service.register_user",
        skip(self, user),
        fields(platform_id = user.platform_id, is_new = tracing::field::Empty),
        err
    )]
    async fn register_user(&self, user: NewUser) -> Result<Registration, UsersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let registration = self.repository.upsert_user(&mut tx, &user).await?;

        let admins = if registration.is_new {
            self.repository
                .list_active_users(&mut tx, ROLE_MANAGERS, &[registration.user.uuid])
                .await?
        } else {
            Vec::new()
        };

        tx.commit().await?;

        Span::current().record("is_new", registration.is_new);

        if registration.is_new {
            info!(user = %registration.user.uuid, "registered new user");

            let notification = Notification::UserAwaitingApproval {
                user: registration.user.uuid,
                display_name: registration.user.display_name(),
                platform_id: registration.user.platform_id,
            };

            fan_out(self.notifier.as_ref(), &admins, &notification).await;
        }

        Ok(registration)
    }

    async fn get_user(&self, user: UserUuid) -> Result<UserRecord, UsersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let user = self.repository.get_user(&mut tx, user).await?;

        tx.commit().await?;

        Ok(user)
    }

    async fn get_user_by_platform_id(
        &self,
        platform_id: i64,
    ) -> Result<UserRecord, UsersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let user = self
            .repository
            .get_user_by_platform_id(&mut tx, platform_id)
            .await?;

        tx.commit().await?;

        Ok(user)
    }

    async fn list_users_by_role(
        &self,
        caller: UserUuid,
        role: Role,
    ) -> Result<Vec<UserRecord>, UsersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        require_role(&self.repository, &mut tx, caller, ROLE_MANAGERS).await?;

        let users = self.repository.list_users_by_role(&mut tx, role).await?;

        tx.commit().await?;

        Ok(users)
    }

    #[tracing::instrument(
        name = "users.service.assign_role",
        skip(self),
        fields(caller = %caller, target = %target, role = %role),
        err
    )]
    async fn assign_role(
        &self,
        caller: UserUuid,
        target: UserUuid,
        role: Role,
    ) -> Result<UserRecord, UsersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let actor = require_role(&self.repository, &mut tx, caller, ROLE_MANAGERS).await?;

        let updated = self.assign(&mut tx, actor.role, target, role).await?;

        tx.commit().await?;

        info!("role assigned");

        Ok(updated)
    }

    #[tracing::instrument(
        name = "users.service.assign_roles",
        skip(self, targets),
        fields(caller = %caller, role = %role, target_count = targets.len()),
        err
    )]
    async fn assign_roles(
        &self,
        caller: UserUuid,
        targets: Vec<UserUuid>,
        role: Role,
    ) -> Result<Vec<UserRecord>, UsersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let actor = require_role(&self.repository, &mut tx, caller, ROLE_MANAGERS).await?;

        let mut updated = Vec::with_capacity(targets.len());

        for target in targets {
            updated.push(self.assign(&mut tx, actor.role, target, role).await?);
        }

        tx.commit().await?;

        info!(updated_count = updated.len(), "roles assigned");

        Ok(updated)
    }

    async fn update_contact(
        &self,
        caller: UserUuid,
        contact: ContactDetails,
    ) -> Result<UserRecord, UsersServiceError> {
        let phone_number = normalize_phone(&contact.phone_number)?;

        let mut tx = self.db.begin_transaction().await?;

        let user = self
            .repository
            .update_contact(&mut tx, caller, &phone_number, contact.payment_method)
            .await?;

        tx.commit().await?;

        Ok(user)
    }

    async fn update_locale(
        &self,
        caller: UserUuid,
        locale: String,
    ) -> Result<UserRecord, UsersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let user = self
            .repository
            .update_locale(&mut tx, caller, locale.trim())
            .await?;

        tx.commit().await?;

        Ok(user)
    }

    #[tracing::instrument(
        name = "users.service.bootstrap_super_admin",
        skip(self, user),
        fields(platform_id = user.platform_id),
        err
    )]
    async fn bootstrap_super_admin(&self, user: NewUser) -> Result<UserRecord, UsersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let admin = self.repository.upsert_super_admin(&mut tx, &user).await?;

        tx.commit().await?;

        info!(user = %admin.uuid, "super administrator ready");

        Ok(admin)
    }
}

impl PgUsersService {
    async fn assign(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        actor: Role,
        target: UserUuid,
        role: Role,
    ) -> Result<UserRecord, UsersServiceError> {
        let current = self.repository.get_user_for_update(tx, target).await?;

        if !can_assign_role(actor, current.role, role) {
            return Err(UsersServiceError::Forbidden);
        }

        Ok(self.repository.update_role(tx, target, role).await?)
    }
}

#[automock]
#[async_trait]
pub trait UsersService: Send + Sync {
    /// Create or refresh a user from their platform profile. The role is never changed.
    async fn register_user(&self, user: NewUser) -> Result<Registration, UsersServiceError>;

    /// Retrieve a single user.
    async fn get_user(&self, user: UserUuid) -> Result<UserRecord, UsersServiceError>;

    /// Retrieve a user by platform identity.
    async fn get_user_by_platform_id(
        &self,
        platform_id: i64,
    ) -> Result<UserRecord, UsersServiceError>;

    /// Users holding `role`, oldest first. `Role::Unknown` lists pending approvals.
    async fn list_users_by_role(
        &self,
        caller: UserUuid,
        role: Role,
    ) -> Result<Vec<UserRecord>, UsersServiceError>;

    /// Change one user's role.
    async fn assign_role(
        &self,
        caller: UserUuid,
        target: UserUuid,
        role: Role,
    ) -> Result<UserRecord, UsersServiceError>;

    /// Change several users' roles; either all change or none do.
    async fn assign_roles(
        &self,
        caller: UserUuid,
        targets: Vec<UserUuid>,
        role: Role,
    ) -> Result<Vec<UserRecord>, UsersServiceError>;

    /// Set the caller's phone number and preferred payment method.
    async fn update_contact(
        &self,
        caller: UserUuid,
        contact: ContactDetails,
    ) -> Result<UserRecord, UsersServiceError>;

    /// Set the caller's interface language.
    async fn update_locale(
        &self,
        caller: UserUuid,
        locale: String,
    ) -> Result<UserRecord, UsersServiceError>;

    /// Create the first super administrator, or promote an existing user to one.
    async fn bootstrap_super_admin(&self, user: NewUser) -> Result<UserRecord, UsersServiceError>;
}
