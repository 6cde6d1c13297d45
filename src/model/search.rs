//! model::search
//!
//! Tray search over the resident part of a warehouse.
//!
//! A [`SearchQuery`] filters trays by category, weight, comment text and
//! picking area, then orders the matches. Only loaded trays are searched;
//! load the tree down to [`Level::Tray`] first for a full search.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::node::NodeKey;
use super::tree::WarehouseTree;
use super::ModelError;
use crate::core::fields::TrayFields;
use crate::core::types::{CategoryId, Level};

/// Which categories match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    /// No filtering.
    #[default]
    Any,
    /// Trays with some category.
    Set,
    /// Trays without a category.
    Unset,
    /// Trays whose category is one of these.
    OneOf(BTreeSet<CategoryId>),
}

/// Which weights match.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum WeightFilter {
    /// No filtering.
    #[default]
    Any,
    /// Trays with a weight.
    Set,
    /// Trays without a weight.
    Unset,
    /// Weights in `from..=to` kilograms.
    Between { from: f64, to: f64 },
}

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Display order (zone, bay, shelf, column, tray).
    #[default]
    None,
    /// Expiry start; "never" after every dated expiry.
    Expiry,
    /// Category name.
    Category,
    Weight,
    /// Zone, bay and shelf names.
    Location,
}

/// A tray search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub categories: CategoryFilter,
    pub weight: WeightFilter,
    /// Case-insensitive comment substring.
    pub comment: Option<String>,
    /// Skip trays on picking-area shelves.
    pub exclude_picking_area: bool,
    pub sort: SortKey,
    pub ascending: bool,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            categories: CategoryFilter::Any,
            weight: WeightFilter::Any,
            comment: None,
            exclude_picking_area: true,
            sort: SortKey::None,
            ascending: true,
        }
    }
}

impl CategoryFilter {
    fn matches(&self, category: Option<&CategoryId>) -> bool {
        match self {
            CategoryFilter::Any => true,
            CategoryFilter::Set => category.is_some(),
            CategoryFilter::Unset => category.is_none(),
            CategoryFilter::OneOf(ids) => category.is_some_and(|id| ids.contains(id)),
        }
    }
}

impl WeightFilter {
    fn matches(&self, weight: Option<f64>) -> bool {
        match *self {
            WeightFilter::Any => true,
            WeightFilter::Set => weight.is_some(),
            WeightFilter::Unset => weight.is_none(),
            WeightFilter::Between { from, to } => weight.is_some_and(|w| w >= from && w <= to),
        }
    }
}

/// Missing values go last whichever way the rest is ordered.
fn missing_last<T>(
    a: Option<T>,
    b: Option<T>,
    ascending: bool,
    cmp: impl Fn(T, T) -> Ordering,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if ascending => cmp(a, b),
        (Some(a), Some(b)) => cmp(b, a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl WarehouseTree {
    /// Resident trays matching `query`, ordered by its sort key.
    ///
    /// Ties keep display order.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<NodeKey>, ModelError> {
        let needle = query.comment.as_deref().map(str::to_lowercase);

        let mut matches = Vec::new();
        for key in self.nodes_at(self.root(), Level::Tray) {
            let tray = self.tray(key)?;
            if !query.categories.matches(tray.category_id.as_ref())
                || !query.weight.matches(tray.weight)
            {
                continue;
            }
            if let Some(needle) = &needle {
                let found = tray
                    .comment
                    .as_deref()
                    .is_some_and(|c| c.to_lowercase().contains(needle.as_str()));
                if !found {
                    continue;
                }
            }
            if query.exclude_picking_area && self.in_picking_area(key)? {
                continue;
            }
            matches.push(key);
        }

        if query.sort == SortKey::None {
            if !query.ascending {
                matches.reverse();
            }
            return Ok(matches);
        }

        let mut keyed = Vec::with_capacity(matches.len());
        for key in matches {
            keyed.push((key, self.sort_value(key, query.sort)?));
        }
        keyed.sort_by(|(_, a), (_, b)| a.compare(b, query.ascending));
        Ok(keyed.into_iter().map(|(key, _)| key).collect())
    }

    fn in_picking_area(&self, tray: NodeKey) -> Result<bool, ModelError> {
        match self.ancestor(tray, Level::Shelf) {
            Some(shelf) => Ok(self.shelf(shelf)?.is_picking_area),
            None => Ok(false),
        }
    }

    fn sort_value(&self, key: NodeKey, sort: SortKey) -> Result<SortValue, ModelError> {
        let tray: &TrayFields = self.tray(key)?;
        Ok(match sort {
            SortKey::None => SortValue::Position,
            SortKey::Expiry => {
                SortValue::Expiry(tray.expiry.as_ref().map(|e| e.from.unwrap_or(i64::MAX)))
            }
            SortKey::Category => {
                SortValue::Text(self.category_of(key)?.map(|c| c.name.to_lowercase()))
            }
            SortKey::Weight => SortValue::Weight(tray.weight),
            SortKey::Location => SortValue::Text(Some(self.location_name(key)?.to_lowercase())),
        })
    }
}

/// The field a result list is ordered by.
enum SortValue {
    Position,
    Expiry(Option<i64>),
    Text(Option<String>),
    Weight(Option<f64>),
}

impl SortValue {
    fn compare(&self, other: &Self, ascending: bool) -> Ordering {
        match (self, other) {
            (SortValue::Expiry(a), SortValue::Expiry(b)) => {
                missing_last(*a, *b, ascending, |a, b| a.cmp(&b))
            }
            (SortValue::Text(a), SortValue::Text(b)) => {
                missing_last(a.as_ref(), b.as_ref(), ascending, |a, b| a.cmp(b))
            }
            (SortValue::Weight(a), SortValue::Weight(b)) => {
                missing_last(*a, *b, ascending, |a, b| a.total_cmp(&b))
            }
            _ => Ordering::Equal,
        }
    }
}
