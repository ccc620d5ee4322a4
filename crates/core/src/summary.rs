//! Consolidated order summary
//!
//! Collapses the line items of every cart in a delivery order into one shopping list the
//! deliverer can purchase from: one row per dish, grouped by category.

use std::{
    cmp::Ordering,
    fmt::{Display, Formatter, Result as FmtResult},
    io,
};

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::Serialize;
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Style,
        object::{Columns, Rows},
    },
};
use uuid::Uuid;

use crate::money::{format_amount, line_total};

/// Label used for dishes that no longer belong to a category.
pub const UNCATEGORISED_LABEL: &str = "Uncategorised";

/// The category a dish was listed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRef {
    pub uuid: Uuid,
    pub name: String,
    pub display_order: i32,
}

/// One cart line as read from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLine {
    pub dish: Uuid,
    pub dish_name: String,

    /// `None` once the dish has been removed from the catalog.
    pub category: Option<CategoryRef>,

    pub amount: u32,

    /// Price snapshot taken when the line was added.
    pub unit_price: Decimal,
}

/// All lines for one dish across every cart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DishSummary {
    pub dish: Uuid,
    pub name: String,
    pub total_amount: u64,

    /// `Σ amount × unit_price` over the merged lines.
    pub total_price: Decimal,

    /// Distinct snapshot prices, ascending. More than one when the dish was repriced while the
    /// order was collecting.
    pub unit_prices: SmallVec<[Decimal; 2]>,
}

impl DishSummary {
    /// Whether members paid different prices for this dish.
    pub fn has_mixed_prices(&self) -> bool {
        self.unit_prices.len() > 1
    }
}

/// Dishes of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: Option<CategoryRef>,
    pub dishes: Vec<DishSummary>,
    pub total_amount: u64,
    pub total_price: Decimal,
}

impl CategorySummary {
    /// Display name of the category.
    pub fn name(&self) -> &str {
        self.category
            .as_ref()
            .map_or(UNCATEGORISED_LABEL, |category| category.name.as_str())
    }
}

/// The purchase list for a delivery order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ConsolidatedSummary {
    /// Ordered by display order then name; uncategorised dishes last.
    pub categories: Vec<CategorySummary>,
    pub total_amount: u64,
    pub total_price: Decimal,
}

#[derive(Debug)]
struct DishAccumulator {
    name: String,
    category: Option<CategoryRef>,
    total_amount: u64,
    total_price: Decimal,
    unit_prices: SmallVec<[Decimal; 2]>,
}

impl ConsolidatedSummary {
    /// Groups lines by dish, then buckets the dishes by category.
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = SummaryLine>,
    {
        let mut by_dish: FxHashMap<Uuid, DishAccumulator> = FxHashMap::default();

        for line in lines {
            let entry = by_dish
                .entry(line.dish)
                .or_insert_with(|| DishAccumulator {
                    name: line.dish_name,
                    category: line.category,
                    total_amount: 0,
                    total_price: Decimal::ZERO,
                    unit_prices: SmallVec::new(),
                });

            entry.total_amount += u64::from(line.amount);
            entry.total_price += line_total(line.amount, line.unit_price);

            if !entry.unit_prices.contains(&line.unit_price) {
                entry.unit_prices.push(line.unit_price);
            }
        }

        let mut by_category: FxHashMap<Option<Uuid>, CategorySummary> = FxHashMap::default();

        for (dish, mut acc) in by_dish {
            acc.unit_prices.sort_unstable();

            let bucket = by_category
                .entry(acc.category.as_ref().map(|category| category.uuid))
                .or_insert_with(|| CategorySummary {
                    category: acc.category.clone(),
                    dishes: Vec::new(),
                    total_amount: 0,
                    total_price: Decimal::ZERO,
                });

            bucket.total_amount += acc.total_amount;
            bucket.total_price += acc.total_price;
            bucket.dishes.push(DishSummary {
                dish,
                name: acc.name,
                total_amount: acc.total_amount,
                total_price: acc.total_price,
                unit_prices: acc.unit_prices,
            });
        }

        let mut categories: Vec<CategorySummary> = by_category.into_values().collect();

        for category in &mut categories {
            category
                .dishes
                .sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.dish.cmp(&b.dish)));
        }

        categories.sort_by(|a, b| compare_categories(a.category.as_ref(), b.category.as_ref()));

        Self {
            total_amount: categories.iter().map(|category| category.total_amount).sum(),
            total_price: categories.iter().map(|category| category.total_price).sum(),
            categories,
        }
    }

    /// Whether the order has no lines at all.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Looks up a dish across all categories.
    pub fn dish(&self, dish: Uuid) -> Option<&DishSummary> {
        self.categories
            .iter()
            .flat_map(|category| category.dishes.iter())
            .find(|summary| summary.dish == dish)
    }

    /// Writes the summary as a table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `out` fails.
    pub fn write_table(&self, mut out: impl io::Write) -> io::Result<()> {
        let mut builder = Builder::default();

        builder.push_record(["Dish", "Qty", "Unit price", "Total"]);

        for category in &self.categories {
            builder.push_record([category.name().to_owned(), String::new(), String::new(), String::new()]);

            for dish in &category.dishes {
                builder.push_record([
                    format!("  {}", dish.name),
                    dish.total_amount.to_string(),
                    format_unit_prices(&dish.unit_prices),
                    format_amount(dish.total_price),
                ]);
            }

            builder.push_record([
                String::new(),
                category.total_amount.to_string(),
                String::new(),
                format_amount(category.total_price),
            ]);
        }

        builder.push_record([
            "Total".to_owned(),
            self.total_amount.to_string(),
            String::new(),
            format_amount(self.total_price),
        ]);

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Columns::new(1..4), Alignment::right());
        table.modify(Rows::first(), Alignment::center());

        writeln!(out, "{table}")
    }
}

impl Display for ConsolidatedSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for category in &self.categories {
            writeln!(f, "{}", category.name())?;

            for dish in &category.dishes {
                writeln!(
                    f,
                    "  {} x{} ({}) = {}",
                    dish.name,
                    dish.total_amount,
                    format_unit_prices(&dish.unit_prices),
                    format_amount(dish.total_price)
                )?;
            }

            writeln!(
                f,
                "  subtotal: {} items, {}",
                category.total_amount,
                format_amount(category.total_price)
            )?;
        }

        write!(
            f,
            "Total: {} items, {}",
            self.total_amount,
            format_amount(self.total_price)
        )
    }
}

fn compare_categories(a: Option<&CategoryRef>, b: Option<&CategoryRef>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a
            .display_order
            .cmp(&b.display_order)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.uuid.cmp(&b.uuid)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn format_unit_prices(prices: &[Decimal]) -> String {
    prices
        .iter()
        .map(|price| format_amount(*price))
        .collect::<Vec<_>>()
        .join(" / ")
}
