//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--store <path>`: Use this store file instead of the configured one
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//!
//! # Addressing
//!
//! Warehouses are named by id or by name. Shelves are addressed as
//! `ZONE/BAY/SHELF` using display names (`Red/A/1`), and columns and trays
//! by their zero-based index within the parent.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::types::Level;

/// Shelfwork - warehouse storage hierarchy manager
#[derive(Parser, Debug)]
#[command(name = "sw")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Use this store file instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a warehouse
    #[command(
        name = "init",
        long_about = "Create a new, empty warehouse and commit it to the store.\n\n\
            With --demo the warehouse is filled with a generated layout: six zones, \
            their bays and shelves, four columns per shelf and three trays per column, \
            together with the standard category catalogue and tray sizes. Tray contents \
            are random but the same for a given seed.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Start an empty warehouse
    sw init Durham

    # Start with a full demo layout to try things out
    sw init Demo --demo

    # Reproduce a particular demo layout
    sw init Demo --demo --seed 42"
    )]
    Init {
        /// Warehouse name
        name: String,

        /// Fill the warehouse with a generated demo layout
        #[arg(long)]
        demo: bool,

        /// Seed for the demo tray contents [default: 1]
        #[arg(long, requires = "demo")]
        seed: Option<u64>,
    },

    /// List warehouses in the store
    #[command(
        name = "list",
        after_help = "\
WORKFLOW EXAMPLES:
    # See what is in the store
    sw list

    # Ids only, for scripting
    sw list -q"
    )]
    List,

    /// Delete a warehouse and everything in it
    #[command(
        name = "remove",
        long_about = "Delete a warehouse with all of its zones, bays, shelves, columns \
            and trays in a single commit. If the commit fails nothing is deleted.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Remove by name
    sw remove Demo

    # Remove by id (see 'sw list')
    sw remove 0f9c2c6e-..."
    )]
    Remove {
        /// Warehouse id or name
        warehouse: String,
    },

    /// Show the layout of a warehouse
    #[command(
        name = "tree",
        long_about = "Print a warehouse's layout as an indented tree.\n\n\
            Levels are loaded from the store down to --depth (the configured \
            load.open_depth by default). Columns show their size and capacity, trays \
            their location, category and expiry.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Zones, bays and shelves
    sw tree Durham

    # Everything, down to individual trays
    sw tree Durham --depth tray

    # Just the zones
    sw tree Durham --depth zone"
    )]
    Tree {
        /// Warehouse id or name
        warehouse: String,

        /// Deepest level to show (zone, bay, shelf, column, tray)
        #[arg(long)]
        depth: Option<Level>,
    },

    /// Show one shelf as a grid of trays and empty spaces
    #[command(
        name = "grid",
        long_about = "Show a shelf as a grid: one column per shelf column, trays from the \
            bottom up, with empty spaces padding each column up to its height.\n\n\
            Cells are addressed as COLUMN:ROW, both counted from zero, with row 0 at \
            the bottom. --click toggles cells the way a tap does; --range selects a \
            contiguous run the way a long-press drag does. Selected cells are marked \
            with '*'.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Look at a shelf
    sw grid Durham Red/A/1

    # Select every cell from the top of column 0 to the bottom of column 1
    sw grid Durham Red/A/1 --range 0:2 1:0

    # Toggle two single cells
    sw grid Durham Red/A/1 --click 0:0 --click 2:1"
    )]
    Grid {
        /// Warehouse id or name
        warehouse: String,

        /// Shelf as ZONE/BAY/SHELF
        shelf: String,

        /// Select a contiguous run from one cell to another
        #[arg(long, num_args = 2, value_names = ["FROM", "TO"])]
        range: Option<Vec<String>>,

        /// Toggle a single cell (repeatable)
        #[arg(long, value_name = "CELL")]
        click: Vec<String>,
    },

    /// Find trays by category, weight or comment
    #[command(
        name = "search",
        long_about = "Find trays in a warehouse.\n\n\
            Every tray is loaded and filtered by category, weight and comment text. \
            Trays on picking-area shelves are left out unless --include-picking is \
            given. Results are in display order unless --sort names a field; trays \
            missing that field come last.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Every tray of beans or soup
    sw search Durham --category Beans --category Soup

    # Trays nobody has filled in yet
    sw search Durham --no-category

    # Heavy trays, heaviest first
    sw search Durham --min-weight 10 --sort weight --desc

    # Soonest expiry first, picking area included
    sw search Durham --any-category --sort expiry --include-picking"
    )]
    Search {
        /// Warehouse id or name
        warehouse: String,

        #[command(flatten)]
        query: SearchArgs,
    },

    /// Manage a warehouse's categories
    #[command(
        name = "category",
        after_help = "\
WORKFLOW EXAMPLES:
    # See the catalogue
    sw category list Durham

    # Add a category with a short label for tight displays
    sw category add Durham \"Tinned Fruit\" --short-name \"T.Fruit\"

    # Rename one
    sw category rename Durham \"Tinned Fruit\" \"Fruit (tinned)\""
    )]
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },

    /// Add, edit or remove trays
    #[command(
        name = "tray",
        long_about = "Add, edit or remove trays.\n\n\
            Every change is staged from the shelf down and committed in one batch, \
            so sibling indices and tray location names stay consistent in the store. \
            Edits record the configured session.user as the tray's blame.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Put a tray of beans on top of column 0
    sw tray add Durham Red/A/1 0 --category Beans --expiry 2025

    # Change what is in the bottom tray of column 2
    sw tray edit Durham Red/A/1 2 0 --category Soup --expiry \"Q3 2025\" --weight 7.5

    # Clear a field
    sw tray edit Durham Red/A/1 2 0 --clear-comment

    # Take a tray out; the trays above move down
    sw tray remove Durham Red/A/1 2 0

EXPIRY FORMATS:
    never | 2025 | Q3 2025 | Mar 2025"
    )]
    Tray {
        #[command(subcommand)]
        action: TrayAction,
    },

    /// Get, set or list configuration values
    #[command(
        name = "config",
        long_about = "Get, set, or list configuration values.\n\n\
            Configuration lives in $SHELFWORK_CONFIG, \
            $XDG_CONFIG_HOME/shelfwork/config.toml or ~/.shelfwork/config.toml, \
            whichever is found first.",
        after_help = "\
WORKFLOW EXAMPLES:
    # See the effective configuration
    sw config list

    # Keep the store somewhere shared
    sw config set store.path /srv/shelfwork/store.json

    # Open warehouses down to columns
    sw config set load.open_depth column

KEYS:
    store.path, view.long_press_ms, view.default_padding,
    load.open_depth, session.user"
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Category subcommands.
#[derive(Subcommand, Debug)]
pub enum CategoryAction {
    /// List categories
    List {
        /// Warehouse id or name
        warehouse: String,
    },
    /// Add a category
    Add {
        /// Warehouse id or name
        warehouse: String,
        /// Category name
        name: String,
        /// Short label
        #[arg(long)]
        short_name: Option<String>,
        /// Group label
        #[arg(long)]
        group: Option<String>,
        /// Expiry suggested for new trays of this category
        #[arg(long)]
        default_expiry: Option<String>,
    },
    /// Rename a category
    Rename {
        /// Warehouse id or name
        warehouse: String,
        /// Current name
        from: String,
        /// New name
        to: String,
    },
}

/// Tray search filters.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct SearchArgs {
    /// Category name (repeatable)
    #[arg(long = "category", value_name = "NAME")]
    pub categories: Vec<String>,
    /// Only trays with a category
    #[arg(long, conflicts_with_all = ["categories", "no_category"])]
    pub any_category: bool,
    /// Only trays without a category
    #[arg(long, conflicts_with = "categories")]
    pub no_category: bool,
    /// Lightest weight in kilograms
    #[arg(long)]
    pub min_weight: Option<f64>,
    /// Heaviest weight in kilograms
    #[arg(long)]
    pub max_weight: Option<f64>,
    /// Only trays with a weight
    #[arg(long, conflicts_with_all = ["min_weight", "max_weight", "no_weight"])]
    pub any_weight: bool,
    /// Only trays without a weight
    #[arg(long, conflicts_with_all = ["min_weight", "max_weight"])]
    pub no_weight: bool,
    /// Text the comment contains, ignoring case
    #[arg(long)]
    pub comment: Option<String>,
    /// Include trays on picking-area shelves
    #[arg(long)]
    pub include_picking: bool,
    /// Order results by this field
    #[arg(long, value_enum, default_value_t = SortArg::None)]
    pub sort: SortArg,
    /// Reverse the order
    #[arg(long)]
    pub desc: bool,
}

/// Search result ordering
#[derive(clap::ValueEnum, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SortArg {
    /// Display order
    #[default]
    None,
    /// Expiry, soonest first
    Expiry,
    /// Category name
    Category,
    /// Weight, lightest first
    Weight,
    /// Zone, bay and shelf
    Location,
}

/// Tray fields settable from the command line.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct TrayArgs {
    /// Category name
    #[arg(long)]
    pub category: Option<String>,
    /// Expiry (never, 2025, Q3 2025, Mar 2025)
    #[arg(long)]
    pub expiry: Option<String>,
    /// Weight in kilograms
    #[arg(long)]
    pub weight: Option<f64>,
    /// Free-text comment
    #[arg(long)]
    pub comment: Option<String>,
}

/// Tray subcommands.
#[derive(Subcommand, Debug)]
pub enum TrayAction {
    /// Add a tray on top of a column
    Add {
        /// Warehouse id or name
        warehouse: String,
        /// Shelf as ZONE/BAY/SHELF
        shelf: String,
        /// Column index
        column: usize,
        #[command(flatten)]
        fields: TrayArgs,
    },
    /// Edit a tray
    Edit {
        /// Warehouse id or name
        warehouse: String,
        /// Shelf as ZONE/BAY/SHELF
        shelf: String,
        /// Column index
        column: usize,
        /// Tray index, 0 at the bottom
        tray: usize,
        #[command(flatten)]
        fields: TrayArgs,
        /// Remove the category
        #[arg(long, conflicts_with = "category")]
        clear_category: bool,
        /// Remove the expiry
        #[arg(long, conflicts_with = "expiry")]
        clear_expiry: bool,
        /// Remove the weight
        #[arg(long, conflicts_with = "weight")]
        clear_weight: bool,
        /// Remove the comment
        #[arg(long, conflicts_with = "comment")]
        clear_comment: bool,
    },
    /// Remove a tray
    Remove {
        /// Warehouse id or name
        warehouse: String,
        /// Shelf as ZONE/BAY/SHELF
        shelf: String,
        /// Column index
        column: usize,
        /// Tray index, 0 at the bottom
        tray: usize,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set
        value: String,
    },
    /// List all configuration values
    List,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["sw", "list", "--store", "/tmp/s.json", "-q"]).unwrap();
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/s.json")));
        assert!(cli.quiet);
        assert!(matches!(cli.command, Command::List));
    }

    #[test]
    fn parses_tree_depth() {
        let cli = Cli::try_parse_from(["sw", "tree", "Durham", "--depth", "tray"]).unwrap();
        match cli.command {
            Command::Tree { warehouse, depth } => {
                assert_eq!(warehouse, "Durham");
                assert_eq!(depth, Some(Level::Tray));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parses_grid_range() {
        let cli =
            Cli::try_parse_from(["sw", "grid", "D", "Red/A/1", "--range", "0:2", "1:0"]).unwrap();
        match cli.command {
            Command::Grid { range, click, .. } => {
                assert_eq!(range, Some(vec!["0:2".to_string(), "1:0".to_string()]));
                assert!(click.is_empty());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parses_search_filters() {
        let cli = Cli::try_parse_from([
            "sw", "search", "D", "--category", "Beans", "--category", "Soup", "--min-weight", "2",
            "--sort", "expiry", "--desc",
        ])
        .unwrap();
        match cli.command {
            Command::Search { query, .. } => {
                assert_eq!(query.categories, vec!["Beans", "Soup"]);
                assert_eq!(query.min_weight, Some(2.0));
                assert_eq!(query.sort, SortArg::Expiry);
                assert!(query.desc);
                assert!(!query.include_picking);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(
            Cli::try_parse_from(["sw", "search", "D", "--no-weight", "--min-weight", "1"]).is_err()
        );
        assert!(
            Cli::try_parse_from(["sw", "search", "D", "--any-category", "--category", "X"]).is_err()
        );
    }

    #[test]
    fn seed_requires_demo() {
        assert!(Cli::try_parse_from(["sw", "init", "D", "--seed", "3"]).is_err());
        assert!(Cli::try_parse_from(["sw", "init", "D", "--demo", "--seed", "3"]).is_ok());
    }

    #[test]
    fn clear_conflicts_with_value() {
        let result = Cli::try_parse_from([
            "sw",
            "tray",
            "edit",
            "D",
            "Red/A/1",
            "0",
            "0",
            "--comment",
            "x",
            "--clear-comment",
        ]);
        assert!(result.is_err());
    }
}
