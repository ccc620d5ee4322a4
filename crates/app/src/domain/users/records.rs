//! User Records

use jiff::Timestamp;
use platter::{PaymentMethod, Role};

use crate::uuids::TypedUuid;

/// User UUID
pub type UserUuid = TypedUuid<UserRecord>;

/// User Record
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub uuid: UserUuid,

    /// Identity on the chat platform the bot runs on.
    pub platform_id: i64,

    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub locale: Option<String>,
    pub role: Role,

    /// Normalised to eleven digits starting with `8`.
    pub phone_number: Option<String>,

    pub payment_method: Option<PaymentMethod>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserRecord {
    /// Name shown to other users: full name, then `@username`, then the platform id.
    pub fn display_name(&self) -> String {
        let full_name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if !full_name.is_empty() {
            return full_name;
        }

        self.username
            .as_ref()
            .map_or_else(|| format!("#{}", self.platform_id), |username| format!("@{username}"))
    }
}

/// Result of registering a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub user: UserRecord,

    /// `false` when the platform identity was already known.
    pub is_new: bool,
}
