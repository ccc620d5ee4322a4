//! Payment methods

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::errors::UnknownVariant;

/// How members reimburse the deliverer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Sber bank transfer.
    Sber,

    /// Tinkoff bank transfer.
    Tinkoff,

    /// Alfa bank transfer.
    Alfa,

    /// Cash on hand-over.
    Cash,

    /// Anything else, described in the order notes.
    Other,
}

impl PaymentMethod {
    /// Every payment method.
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Sber,
        PaymentMethod::Tinkoff,
        PaymentMethod::Alfa,
        PaymentMethod::Cash,
        PaymentMethod::Other,
    ];

    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Sber => "sber",
            PaymentMethod::Tinkoff => "tinkoff",
            PaymentMethod::Alfa => "alfa",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Other => "other",
        }
    }

    /// Human readable label.
    pub const fn label(self) -> &'static str {
        match self {
            PaymentMethod::Sber => "Sber",
            PaymentMethod::Tinkoff => "Tinkoff",
            PaymentMethod::Alfa => "Alfa",
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Other => "Other",
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| UnknownVariant::new("payment method", value))
    }
}
