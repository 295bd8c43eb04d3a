//! Command-line argument definitions.

use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;
use uuid::Uuid;

/// Org tree maintenance: units, members, and tree views.
#[derive(Parser, Debug)]
#[command(name = "orgtree")]
#[command(author, version = orgtree_core::core_version(), about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// SQLite database file (overrides ORGTREE_DB_PATH)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub db: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error (overrides ORGTREE_LOG_LEVEL)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Absolute directory for rolling logs (overrides ORGTREE_LOG_DIR)
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage organizational units
    Unit {
        #[command(subcommand)]
        command: UnitCommands,
    },

    /// Manage members of a unit
    Member {
        #[command(subcommand)]
        command: MemberCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum UnitCommands {
    /// Create a unit, optionally under a parent
    Create {
        name: String,
        #[arg(long)]
        parent: Option<Uuid>,
    },
    /// Show one unit
    Get { id: Uuid },
    /// Rename a unit within its current parent
    Rename { id: Uuid, name: String },
    /// Move a unit under a new parent
    Move {
        id: Uuid,
        #[arg(long)]
        parent: Uuid,
    },
    /// Rename and/or move in one step
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        parent: Option<Uuid>,
    },
    /// Delete a unit and its subtree
    Delete {
        id: Uuid,
        /// cascade|reassign
        #[arg(long)]
        mode: String,
        /// Unit receiving the subtree's members (reassign mode)
        #[arg(long)]
        reassign_to: Option<Uuid>,
    },
    /// Print a bounded-depth tree view
    Tree {
        id: Uuid,
        /// Levels below the unit, clamped to 1..=5
        #[arg(long, default_value_t = 1)]
        depth: u8,
        /// Leave members out of the view
        #[arg(long)]
        no_members: bool,
    },
    /// List direct children, or roots when no parent is given
    Children {
        #[arg(long)]
        parent: Option<Uuid>,
    },
}

#[derive(Subcommand, Debug)]
pub enum MemberCommands {
    /// Add a member to a unit
    Create {
        unit: Uuid,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        position: String,
        /// Hire date, YYYY-MM-DD
        #[arg(long)]
        hired_at: Option<String>,
    },
    /// Show one member
    Get { id: Uuid },
    /// List members of a unit, oldest first
    List { unit: Uuid },
    /// Change member fields
    Update(MemberUpdateArgs),
    /// Remove a member
    Delete { id: Uuid },
}

#[derive(Args, Debug)]
pub struct MemberUpdateArgs {
    pub id: Uuid,
    #[arg(long)]
    pub full_name: Option<String>,
    #[arg(long)]
    pub position: Option<String>,
    /// Hire date, YYYY-MM-DD
    #[arg(long, conflicts_with = "clear_hired_at")]
    pub hired_at: Option<String>,
    /// Remove the stored hire date
    #[arg(long)]
    pub clear_hired_at: bool,
}
