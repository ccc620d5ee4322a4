//! Users Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use platter::{PaymentMethod, Role};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::{
    database::{try_get_parsed, try_get_parsed_opt},
    domain::users::{
        data::NewUser,
        records::{Registration, UserRecord, UserUuid},
    },
};

const GET_USER_SQL: &str = include_str!("sql/get_user.sql");
const GET_USER_FOR_UPDATE_SQL: &str = include_str!("sql/get_user_for_update.sql");
const GET_USER_BY_PLATFORM_ID_SQL: &str = include_str!("sql/get_user_by_platform_id.sql");
const UPSERT_USER_SQL: &str = include_str!("sql/upsert_user.sql");
const UPSERT_SUPER_ADMIN_SQL: &str = include_str!("sql/upsert_super_admin.sql");
const LIST_USERS_BY_ROLE_SQL: &str = include_str!("sql/list_users_by_role.sql");
const LIST_ACTIVE_USERS_SQL: &str = include_str!("sql/list_active_users.sql");
const UPDATE_USER_ROLE_SQL: &str = include_str!("sql/update_user_role.sql");
const UPDATE_USER_CONTACT_SQL: &str = include_str!("sql/update_user_contact.sql");
const UPDATE_USER_LOCALE_SQL: &str = include_str!("sql/update_user_locale.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgUsersRepository;

impl PgUsersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<UserRecord, sqlx::Error> {
        query_as::<Postgres, UserRecord>(GET_USER_SQL)
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_user_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<UserRecord, sqlx::Error> {
        query_as::<Postgres, UserRecord>(GET_USER_FOR_UPDATE_SQL)
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_user_by_platform_id(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        platform_id: i64,
    ) -> Result<UserRecord, sqlx::Error> {
        query_as::<Postgres, UserRecord>(GET_USER_BY_PLATFORM_ID_SQL)
            .bind(platform_id)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn upsert_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: &NewUser,
    ) -> Result<Registration, sqlx::Error> {
        let row = query(UPSERT_USER_SQL)
            .bind(user.uuid.into_uuid())
            .bind(user.platform_id)
            .bind(user.username.as_deref())
            .bind(user.first_name.as_deref())
            .bind(user.last_name.as_deref())
            .bind(user.locale.as_deref())
            .fetch_one(&mut **tx)
            .await?;

        Ok(Registration {
            user: UserRecord::from_row(&row)?,
            is_new: row.try_get("inserted")?,
        })
    }

    pub(crate) async fn upsert_super_admin(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: &NewUser,
    ) -> Result<UserRecord, sqlx::Error> {
        query_as::<Postgres, UserRecord>(UPSERT_SUPER_ADMIN_SQL)
            .bind(user.uuid.into_uuid())
            .bind(user.platform_id)
            .bind(user.username.as_deref())
            .bind(user.first_name.as_deref())
            .bind(user.last_name.as_deref())
            .bind(user.locale.as_deref())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_users_by_role(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        role: Role,
    ) -> Result<Vec<UserRecord>, sqlx::Error> {
        query_as::<Postgres, UserRecord>(LIST_USERS_BY_ROLE_SQL)
            .bind(role.as_str())
            .fetch_all(&mut **tx)
            .await
    }

    /// Active users holding one of `roles`, minus `exclude`.
    #[tracing::instrument(
        name = "users.repository.list_active_users",
        skip(self, tx, roles, exclude),
        fields(recipient_count = tracing::field::Empty),
        err
    )]
    pub(crate) async fn list_active_users(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        roles: &[Role],
        exclude: &[UserUuid],
    ) -> Result<Vec<UserRecord>, sqlx::Error> {
        let roles: Vec<&str> = roles.iter().map(|role| role.as_str()).collect();
        let exclude: Vec<Uuid> = exclude.iter().map(|user| user.into_uuid()).collect();

        let users = query_as::<Postgres, UserRecord>(LIST_ACTIVE_USERS_SQL)
            .bind(roles)
            .bind(exclude)
            .fetch_all(&mut **tx)
            .await?;

        tracing::Span::current().record("recipient_count", users.len());

        Ok(users)
    }

    pub(crate) async fn update_role(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        role: Role,
    ) -> Result<UserRecord, sqlx::Error> {
        query_as::<Postgres, UserRecord>(UPDATE_USER_ROLE_SQL)
            .bind(user.into_uuid())
            .bind(role.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_contact(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        phone_number: &str,
        payment_method: PaymentMethod,
    ) -> Result<UserRecord, sqlx::Error> {
        query_as::<Postgres, UserRecord>(UPDATE_USER_CONTACT_SQL)
            .bind(user.into_uuid())
            .bind(phone_number)
            .bind(payment_method.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_locale(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        locale: &str,
    ) -> Result<UserRecord, sqlx::Error> {
        query_as::<Postgres, UserRecord>(UPDATE_USER_LOCALE_SQL)
            .bind(user.into_uuid())
            .bind(locale)
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for UserRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: UserUuid::from_uuid(row.try_get("uuid")?),
            platform_id: row.try_get("platform_id")?,
            username: row.try_get("username")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            locale: row.try_get("locale")?,
            role: try_get_parsed(row, "role")?,
            phone_number: row.try_get("phone_number")?,
            payment_method: try_get_parsed_opt(row, "payment_method")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
