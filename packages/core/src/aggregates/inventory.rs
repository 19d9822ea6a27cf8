//! Inventory aggregates

use crate::models::InventoryItem;

/// Total value of the stock (`quantity × unit_value` summed)
pub fn stock_value<'a, I>(items: I) -> f64
where
    I: IntoIterator<Item = &'a InventoryItem>,
{
    items.into_iter().map(InventoryItem::value).sum()
}

pub fn low_stock_count<'a, I>(items: I) -> usize
where
    I: IntoIterator<Item = &'a InventoryItem>,
{
    items.into_iter().filter(|item| item.is_low_stock()).count()
}

/// Items whose name contains `term`, case-insensitive; a blank term matches everything
pub fn search<'a, I>(items: I, term: &str) -> Vec<&'a InventoryItem>
where
    I: IntoIterator<Item = &'a InventoryItem>,
{
    let needle = term.trim().to_lowercase();
    items
        .into_iter()
        .filter(|item| needle.is_empty() || item.name.to_lowercase().contains(&needle))
        .collect()
}
