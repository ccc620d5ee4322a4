//! Bulk dish import parsing.

use rust_decimal::Decimal;

use crate::validation::{ValidationError, parse_price, validate_name};

/// One raw `name | price` entry from an import text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportLine {
    /// 1-based line number in the source text.
    pub line: usize,

    /// Raw name text.
    pub name: String,

    /// Raw price text; `None` when the line had no separator.
    pub price: Option<String>,
}

impl ImportLine {
    /// Validates the entry into a dish name and price.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn validate(&self) -> Result<(String, Decimal), ValidationError> {
        let price = self.price.as_deref().ok_or(ValidationError::MissingSeparator)?;

        Ok((validate_name(&self.name)?, parse_price(price)?))
    }
}

/// Splits import text into one entry per non-blank line.
///
/// Lines are `name | price`; only the first `|` separates. Lines without a separator are kept
/// so they can be reported back as failures.
pub fn parse_import_lines(text: &str) -> Vec<ImportLine> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            let (name, price) = match line.split_once('|') {
                Some((name, price)) => (name, Some(price.trim().to_owned())),
                None => (line, None),
            };

            ImportLine {
                line: index + 1,
                name: name.trim().to_owned(),
                price,
            }
        })
        .collect()
}
