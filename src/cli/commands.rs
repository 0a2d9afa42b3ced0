use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::plan::{DropPosition, ItemRef};

#[derive(Parser)]
#[command(name = "plandrag", about = concat!("plandrag v", env!("CARGO_PKG_VERSION"), " - reorder workout plans like a drag would"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Plan file to read (and write back for mutating commands)
    #[arg(short, long, global = true, default_value = "plan.json")]
    pub plan: PathBuf,

    /// Geometry config (default: plandrag.toml next to the plan)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the plan's top-level sequence with group members
    Show,
    /// Validate plan consistency
    Check(CheckArgs),
    /// Move an item before or after another in the same container
    Mv(MvArgs),
    /// Move an exercise into a group, or out with `none`
    Group(GroupArgs),
    /// Renumber every container 0..n
    Reindex(WriteArgs),
    /// Resolve the drop target for a pointer position
    Resolve(ResolveArgs),
    /// Replay a recorded drag gesture
    Replay(ReplayArgs),
}

#[derive(Args)]
pub struct WriteArgs {
    /// Print the result without writing the plan
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Training method table (JSON)
    #[arg(long)]
    pub methods: Option<PathBuf>,
}

#[derive(Args)]
pub struct MvArgs {
    /// Item to move: e:<instanceId> or g:<groupId>
    pub item: ItemRef,
    /// before or after
    pub position: DropPosition,
    /// Item to land next to
    pub target: ItemRef,
    #[command(flatten)]
    pub write: WriteArgs,
}

/// Group argument: a group id or `none`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupArg {
    Group(u32),
    None,
}

impl std::str::FromStr for GroupArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "none" {
            return Ok(GroupArg::None);
        }
        s.trim_start_matches("g:")
            .parse()
            .map(GroupArg::Group)
            .map_err(|_| format!("expected a group id or 'none', got '{}'", s))
    }
}

impl From<GroupArg> for Option<u32> {
    fn from(arg: GroupArg) -> Self {
        match arg {
            GroupArg::Group(id) => Some(id),
            GroupArg::None => None,
        }
    }
}

#[derive(Args)]
pub struct GroupArgs {
    /// Exercise instance id
    pub instance_id: String,
    /// Destination group id, or `none` for the top level
    pub group: GroupArg,
    /// Training method table (JSON); without it groups have no capacity
    #[arg(long)]
    pub methods: Option<PathBuf>,
    #[command(flatten)]
    pub write: WriteArgs,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Measured layouts (JSON)
    #[arg(long)]
    pub layouts: PathBuf,
    /// Dragged item: e:<instanceId> or g:<groupId>
    pub item: ItemRef,
    /// Pointer x
    #[arg(allow_negative_numbers = true)]
    pub x: f64,
    /// Pointer y
    #[arg(allow_negative_numbers = true)]
    pub y: f64,
}

#[derive(Args)]
pub struct ReplayArgs {
    /// Gesture script (JSON)
    pub script: PathBuf,
    /// Training method table (JSON)
    #[arg(long)]
    pub methods: Option<PathBuf>,
    /// Write the committed plan back
    #[arg(long)]
    pub write: bool,
}
