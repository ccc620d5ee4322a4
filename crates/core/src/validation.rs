//! Input validation and normalisation.

use std::{str::FromStr, sync::LazyLock};

use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::money::PRICE_SCALE;

/// Longest restaurant, category or dish name.
pub const MAX_NAME_CHARS: usize = 255;

/// Longest free-text note on a cart.
pub const MAX_CART_NOTE_CHARS: usize = 300;

/// Longest free-text notes on a delivery order.
pub const MAX_ORDER_NOTES_CHARS: usize = 255;

/// Largest amount of a single dish in one cart.
pub const MAX_ITEM_AMOUNT: u32 = 999;

#[expect(clippy::expect_used, reason = "literal pattern covered by unit tests")]
static PHONE_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-()]").expect("phone noise pattern"));

#[expect(clippy::expect_used, reason = "literal pattern covered by unit tests")]
static PRICE_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:[.,]\d+)?$").expect("price format pattern"));

/// Rejected user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("name must be at most {max} characters")]
    NameTooLong { max: usize },

    #[error("price must be a positive decimal number")]
    MalformedPrice,

    #[error("price must be greater than zero")]
    NonPositivePrice,

    #[error("price must have at most two decimal places")]
    PriceTooPrecise,

    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    #[error("amount must not be negative")]
    NegativeAmount,

    #[error("amount must be at most {max}")]
    AmountTooLarge { max: u32 },

    #[error("text must be at most {max} characters")]
    TextTooLong { max: usize },

    #[error("phone number is not a valid Russian number")]
    InvalidPhone,

    #[error("expected `name | price`")]
    MissingSeparator,
}

/// Trims a display name and checks its length.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyName`] for blank names and
/// [`ValidationError::NameTooLong`] beyond [`MAX_NAME_CHARS`].
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }

    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(ValidationError::NameTooLong {
            max: MAX_NAME_CHARS,
        });
    }

    Ok(trimmed.to_owned())
}

/// Checks a price is positive with at most two fractional digits.
///
/// # Errors
///
/// Returns [`ValidationError::NonPositivePrice`] or [`ValidationError::PriceTooPrecise`].
pub fn validate_price(price: Decimal) -> Result<Decimal, ValidationError> {
    if price <= Decimal::ZERO {
        return Err(ValidationError::NonPositivePrice);
    }

    if price.normalize().scale() > PRICE_SCALE {
        return Err(ValidationError::PriceTooPrecise);
    }

    Ok(price)
}

/// Parses a user-typed price such as `12`, `12.5` or `12,50`.
///
/// # Errors
///
/// Returns [`ValidationError::MalformedPrice`] for anything that is not a plain decimal, and
/// the [`validate_price`] errors otherwise.
pub fn parse_price(input: &str) -> Result<Decimal, ValidationError> {
    let trimmed = input.trim();

    if !PRICE_FORMAT.is_match(trimmed) {
        return Err(ValidationError::MalformedPrice);
    }

    let price = Decimal::from_str(&trimmed.replace(',', "."))
        .map_err(|_error| ValidationError::MalformedPrice)?;

    validate_price(price)
}

/// Checks an amount being added to a cart.
///
/// # Errors
///
/// Returns [`ValidationError::NonPositiveAmount`] for zero and
/// [`ValidationError::AmountTooLarge`] beyond [`MAX_ITEM_AMOUNT`].
pub fn validate_amount(amount: u32) -> Result<u32, ValidationError> {
    if amount == 0 {
        return Err(ValidationError::NonPositiveAmount);
    }

    if amount > MAX_ITEM_AMOUNT {
        return Err(ValidationError::AmountTooLarge {
            max: MAX_ITEM_AMOUNT,
        });
    }

    Ok(amount)
}

/// Converts a requested amount where zero means "remove".
///
/// # Errors
///
/// Returns [`ValidationError::NegativeAmount`] or [`ValidationError::AmountTooLarge`].
pub fn amount_or_removal(amount: i64) -> Result<Option<u32>, ValidationError> {
    if amount < 0 {
        return Err(ValidationError::NegativeAmount);
    }

    if amount == 0 {
        return Ok(None);
    }

    let amount = u32::try_from(amount).map_err(|_error| ValidationError::AmountTooLarge {
        max: MAX_ITEM_AMOUNT,
    })?;

    validate_amount(amount).map(Some)
}

/// Trims optional free text; blank text becomes `None`.
///
/// # Errors
///
/// Returns [`ValidationError::TextTooLong`] beyond `max` characters.
pub fn validate_text(text: Option<&str>, max: usize) -> Result<Option<String>, ValidationError> {
    let Some(trimmed) = text.map(str::trim).filter(|text| !text.is_empty()) else {
        return Ok(None);
    };

    if trimmed.chars().count() > max {
        return Err(ValidationError::TextTooLong { max });
    }

    Ok(Some(trimmed.to_owned()))
}

/// Normalises a Russian phone number to eleven digits starting with `8`.
///
/// Spaces, dashes and parentheses are ignored. Accepted shapes are `9161234567`,
/// `89161234567`, `79161234567` and `+79161234567`.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidPhone`] for anything else.
pub fn normalize_phone(input: &str) -> Result<String, ValidationError> {
    let cleaned = PHONE_NOISE.replace_all(input.trim(), "");
    let digits = cleaned.strip_prefix("+7").map_or_else(
        || cleaned.to_string(),
        |rest| format!("8{rest}"),
    );

    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ValidationError::InvalidPhone);
    }

    let mut chars = digits.chars();

    match (digits.len(), chars.next()) {
        (10, Some('9' | '4')) => Ok(format!("8{digits}")),
        (11, Some('7' | '8')) => Ok(format!("8{}", chars.as_str())),
        _ => Err(ValidationError::InvalidPhone),
    }
}
