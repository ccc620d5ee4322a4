//! Users Data

use platter::PaymentMethod;

use crate::domain::users::records::UserUuid;

/// New User Data
///
/// Profile fields come from the chat platform and are refreshed on every registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub uuid: UserUuid,
    pub platform_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub locale: Option<String>,
}

impl NewUser {
    /// A user known only by platform identity.
    #[must_use]
    pub fn with_platform_id(platform_id: i64) -> Self {
        Self {
            uuid: UserUuid::new(),
            platform_id,
            username: None,
            first_name: None,
            last_name: None,
            locale: None,
        }
    }
}

/// Contact details a user shares with deliverers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDetails {
    /// Raw phone number as typed; normalised before storage.
    pub phone_number: String,
    pub payment_method: PaymentMethod,
}
