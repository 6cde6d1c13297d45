//! model::demo
//!
//! Demo warehouse generator.
//!
//! Builds a realistic layout in memory: four aisle zones of 5 bays with 5
//! shelves each, two end zones of 2 bays with 4 shelves, 4 columns per
//! shelf and 3 trays per column, plus the standard category and tray-size
//! catalogue. Tray contents are random but reproducible for a seed;
//! document ids are always fresh.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::node::NodeKey;
use super::tree::WarehouseTree;
use super::ModelError;
use crate::core::expiry::ExpiryRange;
use crate::core::fields::{
    BayFields, Category, ColumnFields, LayerFields, ShelfFields, TrayFields, ZoneFields,
};
use crate::core::types::{CategoryId, TraySize};

const AISLE_ZONES: [(&str, &str); 4] = [
    ("White", "#ffffff"),
    ("Yellow", "#f0e68c"),
    ("Green", "#4caf50"),
    ("Blue", "#2196f3"),
];

const END_ZONES: [(&str, &str); 2] = [("Red", "#f44336"), ("Pink", "#ff69b4")];

const CATEGORIES: [&str; 36] = [
    "Baby Care",
    "Baby Food",
    "Nappies",
    "Beans",
    "Biscuits",
    "Cereal",
    "Choc/Sweet",
    "Coffee",
    "Cleaning",
    "Custard",
    "Feminine Hygiene",
    "Fish",
    "Fruit",
    "Fruit Juice",
    "Hot Choc",
    "Instant Meals",
    "Jam",
    "Meat",
    "Milk",
    "Misc",
    "Pasta",
    "Pasta Sauce",
    "Pet Food",
    "Potatoes",
    "Rice",
    "Rice Pud.",
    "Savoury Treats",
    "Soup",
    "Spaghetti",
    "Sponge Pud.",
    "Sugar",
    "Tea Bags",
    "Toiletries",
    "Tomatoes",
    "Vegetables",
    "Christmas",
];

const COLUMNS_PER_SHELF: usize = 4;
const TRAYS_PER_COLUMN: usize = 3;
const DEMO_BLAME: &str = "demo";

/// Node counts produced by [`populate_demo`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemoSummary {
    pub zones: usize,
    pub bays: usize,
    pub shelves: usize,
    pub columns: usize,
    pub trays: usize,
}

/// Tray sizes offered by a fresh warehouse.
pub fn default_tray_sizes() -> Vec<TraySize> {
    vec![
        TraySize::new("small", 0.5),
        TraySize::new("standard", 1.0),
        TraySize::new("big", 1.5),
    ]
}

/// The standard category catalogue, with stable ids `cat00`..`cat35`.
pub fn default_categories() -> Vec<Category> {
    CATEGORIES
        .iter()
        .enumerate()
        .filter_map(|(i, name)| {
            let id = CategoryId::new(format!("cat{:02}", i)).ok()?;
            Some(Category {
                id,
                ..Category::new(*name)
            })
        })
        .collect()
}

fn demo_expiries() -> Vec<ExpiryRange> {
    let mut expiries = vec![ExpiryRange::indefinite()];
    expiries.extend(ExpiryRange::month(2020, 3));
    expiries.extend(ExpiryRange::month(2020, 2));
    expiries.extend(ExpiryRange::quarter(2020, 1));
    expiries.extend(ExpiryRange::quarter(2020, 2));
    expiries.extend((2020..2032).filter_map(|year| ExpiryRange::year(year).ok()));
    expiries
}

struct Generator {
    rng: StdRng,
    categories: Vec<CategoryId>,
    sizes: Vec<TraySize>,
    expiries: Vec<ExpiryRange>,
    summary: DemoSummary,
}

impl Generator {
    fn pick<T: Clone>(&mut self, items: &[T]) -> Option<T> {
        if items.is_empty() {
            return None;
        }
        Some(items[self.rng.random_range(0..items.len())].clone())
    }

    fn zone(
        &mut self,
        tree: &mut WarehouseTree,
        (name, color): (&str, &str),
        bays: usize,
        shelves: usize,
        aisle: bool,
    ) -> Result<(), ModelError> {
        let zone = tree.insert_child(
            tree.root(),
            LayerFields::Zone(ZoneFields {
                index: 0,
                name: name.to_string(),
                color: color.to_string(),
            }),
        )?;
        self.summary.zones += 1;

        for b in 0..bays {
            let bay = tree.insert_child(
                zone,
                LayerFields::Bay(BayFields {
                    index: 0,
                    name: char::from(b'A' + b as u8).to_string(),
                }),
            )?;
            self.summary.bays += 1;

            for s in 0..shelves {
                let shelf = tree.insert_child(
                    bay,
                    LayerFields::Shelf(ShelfFields {
                        index: 0,
                        name: (s + 1).to_string(),
                        is_picking_area: aisle && s == 1,
                    }),
                )?;
                self.summary.shelves += 1;

                for _ in 0..COLUMNS_PER_SHELF {
                    self.column(tree, shelf, s)?;
                }
            }
        }
        Ok(())
    }

    fn column(
        &mut self,
        tree: &mut WarehouseTree,
        shelf: NodeKey,
        shelf_index: usize,
    ) -> Result<(), ModelError> {
        let sizes = self.sizes.clone();
        let max_height = if shelf_index % 2 == 0 {
            self.rng.random_range(3..10)
        } else if self.rng.random_bool(0.5) {
            3
        } else {
            10
        };
        let column = tree.insert_child(
            shelf,
            LayerFields::Column(ColumnFields {
                index: 0,
                size: self.pick(&sizes),
                max_height: Some(max_height),
            }),
        )?;
        self.summary.columns += 1;

        for _ in 0..TRAYS_PER_COLUMN {
            let tray = self.tray();
            tree.insert_child(column, LayerFields::Tray(tray))?;
            self.summary.trays += 1;
        }
        Ok(())
    }

    fn tray(&mut self) -> TrayFields {
        let categories = self.categories.clone();
        let expiries = self.expiries.clone();

        let mut tray = TrayFields::empty(0);
        if self.rng.random_bool(0.75) {
            tray.category_id = self.pick(&categories);
        }
        if self.rng.random_bool(0.75) {
            tray.expiry = self.pick(&expiries);
        }
        if self.rng.random_bool(0.75) {
            let weight: f64 = self.rng.random_range(0.0..15.0);
            tray.weight = Some((weight * 100.0).round() / 100.0);
        }
        if self.rng.random_bool(0.1) {
            tray.comment = Some("This is a custom comment, it might be very long".to_string());
        }
        tray.touch(DEMO_BLAME);
        tray
    }
}

/// Fill an empty, loaded warehouse with the demo layout.
///
/// Categories and tray sizes are added to the warehouse when it has none.
/// Nothing is staged.
///
/// # Errors
///
/// `InvalidState` if the warehouse's zones are not loaded or it already
/// has zones.
pub fn populate_demo(tree: &mut WarehouseTree, seed: u64) -> Result<DemoSummary, ModelError> {
    if !tree.children(tree.root())?.is_empty() {
        return Err(ModelError::InvalidState(
            "demo layout needs an empty warehouse".into(),
        ));
    }

    let warehouse = tree.warehouse_mut()?;
    if warehouse.categories.is_empty() {
        warehouse.categories = default_categories();
    }
    if warehouse.tray_sizes.is_empty() {
        warehouse.tray_sizes = default_tray_sizes();
    }

    let mut generator = Generator {
        rng: StdRng::seed_from_u64(seed),
        categories: warehouse.categories.iter().map(|c| c.id.clone()).collect(),
        sizes: warehouse.tray_sizes.clone(),
        expiries: demo_expiries(),
        summary: DemoSummary::default(),
    };

    for zone in AISLE_ZONES {
        generator.zone(tree, zone, 5, 5, true)?;
    }
    for zone in END_ZONES {
        generator.zone(tree, zone, 2, 4, false)?;
    }
    Ok(generator.summary)
}
