//! Integration tests for the `sw` binary.
//!
//! Each test gets its own home directory, config location and store file,
//! so nothing leaks between tests or from the machine running them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use shelfwork::core::fields::{
    BayFields, Category, ColumnFields, LayerFields, ShelfFields, TrayFields, WarehouseFields,
    ZoneFields,
};
use shelfwork::core::types::Level;
use shelfwork::model::registry::SessionSettings;
use shelfwork::model::{StageOptions, WarehouseRegistry, WarehouseTree};
use shelfwork::store::{DocumentStore, FileStore};

// =============================================================================
// Test Fixtures
// =============================================================================

/// An isolated environment for running `sw`.
struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn store_path(&self) -> PathBuf {
        self.dir.path().join("data/store.json")
    }

    fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    /// `sw` with the store and config pointed into the temp dir.
    fn sw(&self) -> Command {
        let mut cmd = Command::cargo_bin("sw").expect("binary should build");
        cmd.env("HOME", self.dir.path())
            .env("XDG_CONFIG_HOME", self.dir.path().join("xdg"))
            .env("SHELFWORK_CONFIG", self.config_path())
            .env("USER", "tester")
            .env_remove("SHELFWORK_LOG")
            .arg("--store")
            .arg(self.store_path());
        cmd
    }

    /// Commit a small warehouse straight through the library:
    ///
    /// Durham (categories Beans, Soup)
    ///   Red / A / 1
    ///     column 0, uncapped: [Beans, empty]
    ///     column 1, max 2:    [Soup, Soup]
    fn seed_durham(&self) {
        let path = self.store_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(seed(&path));
    }

    fn open(&self, name: &str, depth: Level) -> WarehouseTree {
        let store: Arc<dyn DocumentStore> = Arc::new(FileStore::new(self.store_path()));
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let mut registry = WarehouseRegistry::new(
                Arc::clone(&store),
                SessionSettings {
                    open_depth: depth,
                    user: "test".into(),
                },
            );
            registry.load_warehouses().await.unwrap();
            let id = registry.find(name).expect("warehouse listed").id.clone();
            WarehouseTree::open(store, id, depth).await.unwrap()
        })
    }
}

async fn seed(path: &Path) {
    let store: Arc<dyn DocumentStore> = Arc::new(FileStore::new(path));
    let mut tree = WarehouseTree::create(
        store,
        WarehouseFields {
            name: "Durham".into(),
            categories: vec![Category::new("Beans"), Category::new("Soup")],
            tray_sizes: Vec::new(),
        },
    );
    let beans = tree.category_by_name("Beans").unwrap().id.clone();
    let soup = tree.category_by_name("Soup").unwrap().id.clone();

    let root = tree.root();
    let zone = tree
        .insert_child(
            root,
            LayerFields::Zone(ZoneFields {
                index: 0,
                name: "Red".into(),
                color: "#f44336".into(),
            }),
        )
        .unwrap();
    let bay = tree
        .insert_child(
            zone,
            LayerFields::Bay(BayFields {
                index: 0,
                name: "A".into(),
            }),
        )
        .unwrap();
    let shelf = tree
        .insert_child(
            bay,
            LayerFields::Shelf(ShelfFields {
                index: 0,
                name: "1".into(),
                is_picking_area: false,
            }),
        )
        .unwrap();

    let open = tree
        .insert_child(
            shelf,
            LayerFields::Column(ColumnFields {
                index: 0,
                size: None,
                max_height: None,
            }),
        )
        .unwrap();
    let mut tray = TrayFields::empty(0);
    tray.category_id = Some(beans);
    tree.insert_child(open, LayerFields::Tray(tray)).unwrap();
    tree.insert_child(open, LayerFields::Tray(TrayFields::empty(0)))
        .unwrap();

    let full = tree
        .insert_child(
            shelf,
            LayerFields::Column(ColumnFields {
                index: 0,
                size: None,
                max_height: Some(2),
            }),
        )
        .unwrap();
    for _ in 0..2 {
        let mut tray = TrayFields::empty(0);
        tray.category_id = Some(soup.clone());
        tree.insert_child(full, LayerFields::Tray(tray)).unwrap();
    }

    tree.stage(root, StageOptions::committing()).await.unwrap();
}

// =============================================================================
// Basics
// =============================================================================

#[test]
fn help_describes_the_tool() {
    let env = TestEnv::new();
    env.sw()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("warehouse"));
}

#[test]
fn empty_store_lists_nothing() {
    let env = TestEnv::new();
    env.sw()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No warehouses yet"));
}

#[test]
fn init_creates_and_lists() {
    let env = TestEnv::new();
    env.sw()
        .args(["init", "Durham"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created warehouse 'Durham'"));
    assert!(env.store_path().exists());

    env.sw()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Durham"));
}

#[test]
fn init_rejects_duplicate_names() {
    let env = TestEnv::new();
    env.sw().args(["init", "Durham"]).assert().success();
    env.sw()
        .args(["init", "durham"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn quiet_init_prints_only_the_id() {
    let env = TestEnv::new();
    let output = env.sw().args(["-q", "init", "Durham"]).output().unwrap();
    assert!(output.status.success());
    let id = String::from_utf8(output.stdout).unwrap();
    assert_eq!(id.lines().count(), 1);

    env.sw()
        .args(["-q", "list"])
        .assert()
        .success()
        .stdout(predicate::str::diff(id));
}

#[test]
fn demo_layout_is_browsable() {
    let env = TestEnv::new();
    env.sw()
        .args(["init", "Demo", "--demo", "--seed", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("6 zones, 24 bays, 116 shelves"));

    env.sw()
        .args(["tree", "Demo", "--depth", "zone"])
        .assert()
        .success()
        .stdout(predicate::str::contains("White (#ffffff)"))
        .stdout(predicate::str::contains("Pink (#ff69b4)"))
        .stdout(predicate::str::contains("Bay A").not());

    env.sw()
        .args(["category", "list", "Demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- Baby Care"));
}

#[test]
fn unknown_warehouse_fails() {
    let env = TestEnv::new();
    env.sw()
        .args(["tree", "Nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No warehouse 'Nowhere'"));
}

// =============================================================================
// Trays
// =============================================================================

#[test]
fn tree_shows_trays_with_locations() {
    let env = TestEnv::new();
    env.seed_durham();
    env.sw()
        .args(["tree", "Durham", "--depth", "tray"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tray 0  Red A1  Beans"))
        .stdout(predicate::str::contains("Tray 1  Red A1  (empty)"))
        .stdout(predicate::str::contains("Column 1  -  2/2"));
}

#[test]
fn tray_add_appends_to_column() {
    let env = TestEnv::new();
    env.seed_durham();
    env.sw()
        .args([
            "tray", "add", "Durham", "Red/A/1", "0", "--category", "soup", "--expiry", "Q3 2025",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added Red A1 tray 2"));

    let tree = env.open("Durham", Level::Tray);
    let trays = tree.nodes_at(tree.root(), Level::Tray);
    assert_eq!(trays.len(), 5);
    let added = trays
        .iter()
        .map(|&k| tree.tray(k).unwrap())
        .find(|t| t.expiry.is_some())
        .expect("added tray persisted");
    assert_eq!(added.index, 2);
    assert_eq!(added.location_name, "Red A1");
    assert_eq!(added.blame, "tester");
    assert_eq!(added.expiry.as_ref().unwrap().label, "Q3 2025");
}

#[test]
fn tray_add_refuses_full_column() {
    let env = TestEnv::new();
    env.seed_durham();
    env.sw()
        .args(["tray", "add", "Durham", "Red/A/1", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is full"));
}

#[test]
fn tray_edit_changes_and_clears_fields() {
    let env = TestEnv::new();
    env.seed_durham();
    env.sw()
        .args([
            "tray", "edit", "Durham", "Red/A/1", "0", "0", "--category", "Soup", "--weight", "3.5",
            "--comment", "dented",
        ])
        .assert()
        .success();
    env.sw()
        .args(["tree", "Durham", "--depth", "tray"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tray 0  Red A1  Soup  3.5kg  \"dented\""));

    env.sw()
        .args(["tray", "edit", "Durham", "Red/A/1", "0", "0", "--clear-comment"])
        .assert()
        .success();
    env.sw()
        .args(["tree", "Durham", "--depth", "tray"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dented").not());
}

#[test]
fn tray_remove_keeps_indices_dense() {
    let env = TestEnv::new();
    env.seed_durham();
    env.sw()
        .args(["tray", "remove", "Durham", "Red/A/1", "0", "0"])
        .assert()
        .success();

    let tree = env.open("Durham", Level::Tray);
    let shelf = tree.nodes_at(tree.root(), Level::Shelf)[0];
    let column = tree.children(shelf).unwrap()[0];
    let trays = tree.children(column).unwrap();
    assert_eq!(trays.len(), 1);
    let tray = tree.tray(trays[0]).unwrap();
    assert_eq!(tray.index, 0);
    assert_eq!(tray.category_id, None);
}

#[test]
fn missing_tray_is_reported() {
    let env = TestEnv::new();
    env.seed_durham();
    env.sw()
        .args(["tray", "remove", "Durham", "Red/A/1", "0", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No tray 9"));
    env.sw()
        .args(["tray", "remove", "Durham", "Red/Z/1", "0", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No 'Z'"));
}

#[test]
fn search_filters_and_sorts_trays() {
    let env = TestEnv::new();
    env.seed_durham();
    env.sw()
        .args(["search", "Durham", "--category", "soup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tray 0  Red A1  Soup"))
        .stdout(predicate::str::contains("Beans").not())
        .stdout(predicate::str::contains("2 trays found"));

    env.sw()
        .args(["search", "Durham", "--no-category"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(empty)"))
        .stdout(predicate::str::contains("1 tray found"));

    env.sw()
        .args(["-q", "search", "Durham", "--any-category", "--sort", "category", "--desc"])
        .assert()
        .success()
        .stdout("0_0_0_1_0\n0_0_0_1_1\n0_0_0_0_0\n");

    env.sw()
        .args(["search", "Durham", "--min-weight", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No trays match"));
}

// =============================================================================
// Grid
// =============================================================================

#[test]
fn grid_pads_and_selects_a_range() {
    let env = TestEnv::new();
    env.seed_durham();
    env.sw()
        .args(["grid", "Durham", "Red/A/1", "--range", "0:1", "0:0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("*Beans"))
        .stdout(predicate::str::contains("*(empty)"))
        .stdout(predicate::str::contains("2 selected (multi-select)"));
}

#[test]
fn grid_click_selects_one() {
    let env = TestEnv::new();
    env.seed_durham();
    env.sw()
        .args(["grid", "Durham", "Red/A/1", "--click", "0:0", "--click", "1:1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("*Soup"))
        .stdout(predicate::str::contains("*Beans").not())
        .stdout(predicate::str::contains("1 selected"));
}

// =============================================================================
// Categories, config, removal
// =============================================================================

#[test]
fn category_add_and_rename() {
    let env = TestEnv::new();
    env.seed_durham();
    env.sw()
        .args(["category", "add", "Durham", "Tinned Fruit", "--short-name", "T.Fruit"])
        .assert()
        .success();
    env.sw()
        .args(["category", "add", "Durham", "beans"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    env.sw()
        .args(["category", "rename", "Durham", "Beans", "Baked Beans"])
        .assert()
        .success();

    env.sw()
        .args(["category", "list", "Durham"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- Tinned Fruit [T.Fruit]"))
        .stdout(predicate::str::contains("- Baked Beans"));
    env.sw()
        .args(["tree", "Durham", "--depth", "tray"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tray 0  Red A1  Baked Beans"));
}

#[test]
fn config_set_then_get() {
    let env = TestEnv::new();
    env.sw()
        .args(["config", "set", "view.default_padding", "3"])
        .assert()
        .success();
    assert!(env.config_path().exists());

    env.sw()
        .args(["config", "get", "view.default_padding"])
        .assert()
        .success()
        .stdout("3\n");
    env.sw()
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("view.long_press_ms = 300 (default)"));
}

#[test]
fn config_rejects_bad_values() {
    let env = TestEnv::new();
    env.sw()
        .args(["config", "set", "no.such.key", "1"])
        .assert()
        .failure();
    env.sw()
        .args(["config", "set", "load.open_depth", "attic"])
        .assert()
        .failure();
}

#[test]
fn remove_deletes_everything() {
    let env = TestEnv::new();
    env.seed_durham();
    env.sw()
        .args(["remove", "Durham"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(10 documents deleted)"));
    env.sw()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No warehouses yet"));
}
