//! Outbound notifications
//!
//! Services emit notifications after their transaction commits. Delivery is best effort: a
//! failed notification is logged and never fails the operation that triggered it.

use async_trait::async_trait;
use mockall::automock;
use platter::{PaymentMethod, money::format_amount, summary::ConsolidatedSummary};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{
    orders::records::OrderUuid,
    users::records::{UserRecord, UserUuid},
};

/// Who a notification is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub user: UserUuid,
    pub platform_id: i64,
    pub locale: Option<String>,
}

impl From<&UserRecord> for Recipient {
    fn from(user: &UserRecord) -> Self {
        Self {
            user: user.uuid,
            platform_id: user.platform_id,
            locale: user.locale.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A deliverer opened an order that members can join.
    OrderOpened {
        order: OrderUuid,
        restaurant: String,
        deliverer: String,
        phone_number: Option<String>,
        payment_method: Option<PaymentMethod>,
        notes: Option<String>,
    },

    /// Collection closed; the deliverer receives the purchase list.
    OrderCollected {
        order: OrderUuid,
        restaurant: String,
        total_amount: Decimal,
        summary: ConsolidatedSummary,
    },

    /// A newly registered user waits for an administrator.
    UserAwaitingApproval {
        user: UserUuid,
        display_name: String,
        platform_id: i64,
    },
}

impl Notification {
    /// Short machine-readable name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OrderOpened { .. } => "order_opened",
            Self::OrderCollected { .. } => "order_collected",
            Self::UserAwaitingApproval { .. } => "user_awaiting_approval",
        }
    }

    /// Plain-text body for adapters without their own templates.
    pub fn render(&self) -> String {
        match self {
            Self::OrderOpened {
                restaurant,
                deliverer,
                phone_number,
                payment_method,
                notes,
                ..
            } => {
                let mut body = format!("{deliverer} is collecting an order from {restaurant}.");

                if let Some(phone_number) = phone_number {
                    body.push_str(&format!("\nPhone: {phone_number}"));
                }

                if let Some(payment_method) = payment_method {
                    body.push_str(&format!("\nPayment: {payment_method}"));
                }

                if let Some(notes) = notes {
                    body.push_str(&format!("\nNotes: {notes}"));
                }

                body
            }
            Self::OrderCollected {
                restaurant,
                total_amount,
                summary,
                ..
            } => format!(
                "Order from {restaurant} is collected ({}).\n\n{summary}",
                format_amount(*total_amount)
            ),
            Self::UserAwaitingApproval {
                display_name,
                platform_id,
                ..
            } => format!("{display_name} ({platform_id}) is waiting for approval."),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("recipient cannot be reached")]
    Unreachable,

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Delivers notifications to users.
#[automock]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send one notification to one recipient.
    async fn notify(
        &self,
        recipient: &Recipient,
        notification: &Notification,
    ) -> Result<(), NotifierError>;
}

/// Notifier that writes notifications to the log.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(
        &self,
        recipient: &Recipient,
        notification: &Notification,
    ) -> Result<(), NotifierError> {
        info!(
            recipient = %recipient.user,
            platform_id = recipient.platform_id,
            kind = notification.kind(),
            body = %notification.render(),
            "notification"
        );

        Ok(())
    }
}

/// Outcome of sending one notification to many recipients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FanOut {
    pub sent: usize,
    pub failed: usize,
}

/// Send `notification` to each recipient in turn.
pub(crate) async fn fan_out(
    notifier: &dyn Notifier,
    recipients: &[UserRecord],
    notification: &Notification,
) -> FanOut {
    let mut outcome = FanOut::default();

    for user in recipients {
        match notifier.notify(&Recipient::from(user), notification).await {
            Ok(()) => outcome.sent += 1,
            Err(error) => {
                outcome.failed += 1;

                warn!(
                    recipient = %user.uuid,
                    kind = notification.kind(),
                    error = %error,
                    "notification failed"
                );
            }
        }
    }

    info!(
        kind = notification.kind(),
        sent = outcome.sent,
        failed = outcome.failed,
        "notifications sent"
    );

    outcome
}
