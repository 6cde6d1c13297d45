//! Integration tests for editing a shelf end to end.
//!
//! A shelf is loaded lazily from an in-memory store, shown as a padded
//! grid, selected with a long-press drag, edited and staged. Store
//! failures are injected to check that loading and committing degrade
//! the way callers expect.

use std::sync::Arc;
use std::time::Duration;

use shelfwork::core::fields::{
    BayFields, ColumnFields, LayerFields, ShelfFields, TrayFields, WarehouseFields, ZoneFields,
};
use shelfwork::core::types::{DocId, Level};
use shelfwork::model::registry::SessionSettings;
use shelfwork::model::{
    LoadScope, ModelError, NodeKey, StageOptions, WarehouseRegistry, WarehouseTree,
};
use shelfwork::store::memory::{FailOn, MockOperation};
use shelfwork::store::{MemoryStore, StoreError};
use shelfwork::view::{Cell, GestureState, PaddingCache, SelectionController, ShelfGrid, TokioTimer};

// =============================================================================
// Fixtures
// =============================================================================

/// Commit Durham > Green > {A, B} > shelf 1 > two columns (max 3) with
/// two trays each, and return the warehouse id.
async fn seed(store: &MemoryStore) -> DocId {
    let mut tree = WarehouseTree::create(
        Arc::new(store.clone()),
        WarehouseFields {
            name: "Durham".into(),
            categories: Vec::new(),
            tray_sizes: Vec::new(),
        },
    );
    let root = tree.root();
    let zone = tree
        .insert_child(
            root,
            LayerFields::Zone(ZoneFields {
                index: 0,
                name: "Green".into(),
                color: "#4caf50".into(),
            }),
        )
        .unwrap();
    for bay_name in ["A", "B"] {
        let bay = tree
            .insert_child(
                zone,
                LayerFields::Bay(BayFields {
                    index: 0,
                    name: bay_name.into(),
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
        for _ in 0..2 {
            let column = tree
                .insert_child(
                    shelf,
                    LayerFields::Column(ColumnFields {
                        index: 0,
                        size: None,
                        max_height: Some(3),
                    }),
                )
                .unwrap();
            for _ in 0..2 {
                tree.insert_child(column, LayerFields::Tray(TrayFields::empty(0)))
                    .unwrap();
            }
        }
    }
    tree.stage(root, StageOptions::committing()).await.unwrap();
    tree.id(root).unwrap().clone()
}

fn settings() -> SessionSettings {
    SessionSettings {
        open_depth: Level::Shelf,
        user: "tester".into(),
    }
}

/// Shelf `Green/{bay}/1` of an open tree, with its columns and trays loaded.
async fn load_shelf(tree: &mut WarehouseTree, bay: &str) -> NodeKey {
    let zone = tree.find_child(tree.root(), "Green").unwrap().unwrap();
    let bay = tree.find_child(zone, bay).unwrap().unwrap();
    let shelf = tree.find_child(bay, "1").unwrap().unwrap();
    tree.load_children(shelf, LoadScope::Deep(Level::Tray))
        .await
        .unwrap();
    shelf
}

// =============================================================================
// Shelf editing
// =============================================================================

#[tokio::test(start_paused = true)]
async fn drag_select_then_delete_selected_trays() {
    let store = MemoryStore::new();
    let id = seed(&store).await;
    let mut registry = WarehouseRegistry::new(Arc::new(store.clone()), settings());
    let tree = registry.open(&id).await.unwrap();
    let shelf = load_shelf(tree, "A").await;

    let mut cache = PaddingCache::new();
    let grid = ShelfGrid::build(tree, shelf, &mut cache, 1).unwrap();
    assert_eq!(grid.columns().len(), 2);
    assert!(grid.columns().iter().all(|c| c.len() == 3));

    // Walk order: [s0, t1, t0] of column 0, then [s1, t3, t2] of column 1.
    let walk: Vec<Cell> = grid.walk_order().collect();
    assert!(walk[0].is_space() && walk[3].is_space());

    let (timer, mut fired) = TokioTimer::new();
    let mut controller = SelectionController::new(timer, Duration::from_millis(300));
    controller.pointer_down(walk[2]);
    let token = fired.recv().await.unwrap();
    assert!(controller.timer_elapsed(token, &grid));
    controller.pointer_enter(walk[5], &grid);
    controller.pointer_up(walk[5]);
    assert_eq!(controller.state(), GestureState::Idle);
    assert!(controller.multi_select());
    assert_eq!(controller.selection().selected_count(), 4);

    let selected: Vec<NodeKey> = controller
        .selection()
        .selected()
        .filter_map(|c| c.tray())
        .collect();
    assert_eq!(selected.len(), 3);
    for tray in selected {
        tree.delete(tray, false).await.unwrap();
    }
    let report = tree.stage(shelf, StageOptions::committing()).await.unwrap();
    let commit = report.commit.unwrap();
    assert_eq!(commit.deletes, 3);
    assert_eq!(commit.writes, 1);

    // Column 0 lost its bottom tray, so the one above moved down.
    let columns = tree.children(shelf).unwrap().to_vec();
    let left = tree.children(columns[0]).unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(tree.tray(left[0]).unwrap().index, 0);
    assert!(tree.children(columns[1]).unwrap().is_empty());

    // Surviving spaces keep their identity.
    let grid = ShelfGrid::build(tree, shelf, &mut cache, 1).unwrap();
    assert!(grid.columns()[0].contains(&walk[0]));
    assert!(grid.columns()[1].iter().all(|c| c.is_space()));
    assert!(grid.columns()[1].contains(&walk[3]));
}

#[tokio::test]
async fn failing_bay_does_not_block_its_sibling() {
    let store = MemoryStore::new();
    let id = seed(&store).await;

    let layout = WarehouseTree::open(Arc::new(store.clone()), id.clone(), Level::Bay)
        .await
        .unwrap();
    let zone = layout.children(layout.root()).unwrap()[0];
    let bay_a = layout.find_child(zone, "A").unwrap().unwrap();
    let shelves_of_a = layout
        .path(bay_a)
        .unwrap()
        .sub_collection(Level::Shelf.collection_name());

    store.inject(FailOn::LoadCollectionAt {
        path: shelves_of_a,
        error: StoreError::Unavailable("bay A offline".into()),
    });
    let mut registry = WarehouseRegistry::new(Arc::new(store.clone()), settings());
    let result = registry.open(&id).await;
    assert!(matches!(
        result,
        Err(ModelError::Store(StoreError::Unavailable(_)))
    ));

    let tree = registry.get_mut(&id).expect("tree kept open");
    let zone = tree.children(tree.root()).unwrap()[0];
    let a = tree.find_child(zone, "A").unwrap().unwrap();
    let b = tree.find_child(zone, "B").unwrap().unwrap();
    assert!(!tree.node(a).unwrap().children.is_loaded());
    assert!(tree.node(b).unwrap().children.is_loaded());

    store.clear_fail_on();
    tree.load_children(a, LoadScope::Flat).await.unwrap();
    assert_eq!(tree.children(a).unwrap().len(), 1);
}

#[tokio::test]
async fn reopening_retries_the_failed_part() {
    let store = MemoryStore::new();
    let id = seed(&store).await;

    let layout = WarehouseTree::open(Arc::new(store.clone()), id.clone(), Level::Bay)
        .await
        .unwrap();
    let zone = layout.children(layout.root()).unwrap()[0];
    let bay_a = layout.find_child(zone, "A").unwrap().unwrap();
    store.inject(FailOn::LoadCollectionAt {
        path: layout
            .path(bay_a)
            .unwrap()
            .sub_collection(Level::Shelf.collection_name()),
        error: StoreError::Unavailable("bay A offline".into()),
    });

    let mut registry = WarehouseRegistry::new(Arc::new(store.clone()), settings());
    assert!(registry.open(&id).await.is_err());
    store.clear_fail_on();
    store.clear_operations();

    let tree = registry.open(&id).await.unwrap();
    let zone = tree.children(tree.root()).unwrap()[0];
    let a = tree.find_child(zone, "A").unwrap().unwrap();
    assert!(tree.is_deep(a).unwrap());
    assert_eq!(tree.children(a).unwrap().len(), 1);

    // Only the missing collection was fetched again.
    let loads: Vec<_> = store
        .operations()
        .into_iter()
        .filter(|op| matches!(op, MockOperation::LoadCollection { .. }))
        .collect();
    assert_eq!(loads.len(), 1);

    // A fully loaded tree reopens without touching the store.
    store.clear_operations();
    registry.open(&id).await.unwrap();
    assert!(store.operations().is_empty());
}

#[tokio::test]
async fn failed_commit_leaves_edits_for_retry() {
    let store = MemoryStore::new();
    let id = seed(&store).await;
    let mut registry = WarehouseRegistry::new(Arc::new(store.clone()), settings());
    let tree = registry.open(&id).await.unwrap();
    let shelf = load_shelf(tree, "B").await;

    let column = tree.children(shelf).unwrap()[0];
    let tray = tree.children(column).unwrap()[1];
    tree.edit_tray(tray, "tester", |t| t.weight = Some(12.0))
        .unwrap();
    let added = tree
        .insert_child_at(column, 0, LayerFields::Tray(TrayFields::empty(0)))
        .unwrap();

    store.inject(FailOn::Commit(StoreError::Rejected("quota".into())));
    store.clear_operations();
    let result = tree.stage(shelf, StageOptions::committing()).await;
    assert!(matches!(result, Err(ModelError::StageConflict(_))));
    assert!(tree.is_dirty(tray).unwrap());
    assert!(tree.is_dirty(added).unwrap());
    assert_eq!(tree.tray(tray).unwrap().index, 1);

    store.clear_fail_on();
    let report = tree.stage(shelf, StageOptions::committing()).await.unwrap();
    assert_eq!(report.commit.unwrap().writes, 3);
    assert_eq!(tree.tray(tray).unwrap().index, 2);
    assert!(!tree.is_dirty(tray).unwrap());
    let commits: Vec<_> = store
        .operations()
        .into_iter()
        .filter(|op| matches!(op, MockOperation::Commit { .. }))
        .collect();
    assert_eq!(
        commits,
        vec![
            MockOperation::Commit {
                writes: 3,
                deletes: 0
            };
            2
        ]
    );

    let report = registry.sign_out();
    assert_eq!(report.closed, 1);
    assert!(report.uncommitted.is_empty());
}
