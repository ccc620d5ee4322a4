//! Role gate
//!
//! Every service operation names the calling user. The caller's role is read inside the
//! operation's own transaction, so a role change takes effect on the very next call.

use platter::{Role, roles::role_allows};
use sqlx::{Postgres, Transaction};
use thiserror::Error;
use tracing::debug;

use crate::domain::users::{
    records::{UserRecord, UserUuid},
    repository::PgUsersRepository,
};

#[derive(Debug, Error)]
pub(crate) enum AccessError {
    #[error("caller is not a registered user")]
    UnknownCaller,

    #[error("role {role} is not permitted")]
    Forbidden { role: Role },

    #[error("storage error")]
    Sql(#[source] sqlx::Error),
}

/// Load the caller and check their role is one of `allowed`.
pub(crate) async fn require_role(
    users: &PgUsersRepository,
    tx: &mut Transaction<'_, Postgres>,
    caller: UserUuid,
    allowed: &[Role],
) -> Result<UserRecord, AccessError> {
    let user = users.get_user(tx, caller).await.map_err(|error| match error {
        sqlx::Error::RowNotFound => AccessError::UnknownCaller,
        error => AccessError::Sql(error),
    })?;

    if !user.is_active || !role_allows(user.role, allowed) {
        debug!(caller = %caller, role = %user.role, "access denied");

        return Err(AccessError::Forbidden { role: user.role });
    }

    Ok(user)
}
