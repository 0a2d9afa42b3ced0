use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::drag::{DragController, DragError};
use crate::io::{config_io, plan_io};
use crate::model::config::DragConfig;
use crate::model::layout::{FixedLayouts, Point};
use crate::model::method::TrainingMethod;
use crate::model::plan::{Container, ItemRef, Plan};
use crate::ops::check::check_plan;
use crate::ops::reorder::{
    reindex_all_orders, reorder_exercises, reorder_plan_items, update_exercise_group,
};
use crate::ops::resolve::{resolve, ResolveMode};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Flags shared by every command
struct Context {
    plan_path: PathBuf,
    config_path: PathBuf,
    json: bool,
}

impl Context {
    fn load_plan(&self) -> Result<Plan, plan_io::PlanError> {
        plan_io::load_plan(&self.plan_path)
    }

    fn load_config(&self) -> Result<DragConfig, config_io::ConfigError> {
        config_io::read_config(&self.config_path)
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let ctx = Context {
        config_path: config_io::config_path_for(&cli.plan, cli.config.as_deref()),
        plan_path: cli.plan,
        json: cli.json,
    };

    match cli.command {
        // Read commands
        Commands::Show => cmd_show(&ctx),
        Commands::Check(args) => cmd_check(&ctx, args),
        Commands::Resolve(args) => cmd_resolve(&ctx, args),

        // Write commands
        Commands::Mv(args) => cmd_mv(&ctx, args),
        Commands::Group(args) => cmd_group(&ctx, args),
        Commands::Reindex(args) => cmd_reindex(&ctx, args),
        Commands::Replay(args) => cmd_replay(&ctx, args),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Method table from `path`; none given means no group has a capacity
fn load_methods(path: Option<&Path>) -> Result<HashMap<String, TrainingMethod>, plan_io::PlanError> {
    match path {
        Some(p) => plan_io::load_methods(p),
        None => Ok(HashMap::new()),
    }
}

/// Print the resulting plan and write it back unless this is a dry run.
fn finish_write(ctx: &Context, plan: &Plan, dry_run: bool) -> CmdResult {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(plan)?);
    } else {
        print!("{}", render_plan(plan));
    }
    if dry_run {
        debug!(path = %ctx.plan_path.display(), "dry run, plan not written");
        return Ok(());
    }
    plan_io::save_plan(&ctx.plan_path, plan)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_show(ctx: &Context) -> CmdResult {
    let plan = ctx.load_plan()?;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print!("{}", render_plan(&plan));
    }
    Ok(())
}

fn cmd_check(ctx: &Context, args: CheckArgs) -> CmdResult {
    let plan = ctx.load_plan()?;
    let methods = load_methods(args.methods.as_deref())?;
    let result = check_plan(&plan, &methods);

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", format_check(&result));
    }

    if !result.valid {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_resolve(ctx: &Context, args: ResolveArgs) -> CmdResult {
    let plan = ctx.load_plan()?;
    let config = ctx.load_config()?;
    let layouts = plan_io::load_layouts(&args.layouts)?;
    if !plan.contains(&args.item) {
        return Err(DragError::NotFound(args.item).into());
    }

    let point = Point::new(args.x, args.y);
    let resolution = resolve(point, &args.item, &plan, &layouts, &config, ResolveMode::Commit);
    debug!(item = %args.item, ?resolution, "resolved");

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&ResolutionJson::from(&resolution))?);
    } else {
        println!("{}", format_resolution(&resolution));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_mv(ctx: &Context, args: MvArgs) -> CmdResult {
    let plan = ctx.load_plan()?;

    // Same routing as a committed drop: grouped exercises reorder inside
    // their group, everything else at the top level
    let grouped = matches!(plan.container_of(&args.item), Some(Container::Group(_)));
    let next = match (&args.item, &args.target) {
        (ItemRef::Exercise(dragged), ItemRef::Exercise(target)) if grouped => {
            reorder_exercises(&plan, dragged, target, args.position)?
        }
        _ => reorder_plan_items(&plan, &args.item, &args.target, args.position)?,
    };

    finish_write(ctx, &reindex_all_orders(&next), args.write.dry_run)
}

fn cmd_group(ctx: &Context, args: GroupArgs) -> CmdResult {
    let plan = ctx.load_plan()?;
    let methods = load_methods(args.methods.as_deref())?;
    let next = update_exercise_group(&plan, &args.instance_id, args.group.into(), &methods)?;
    finish_write(ctx, &reindex_all_orders(&next), args.write.dry_run)
}

fn cmd_reindex(ctx: &Context, args: WriteArgs) -> CmdResult {
    let plan = ctx.load_plan()?;
    finish_write(ctx, &reindex_all_orders(&plan), args.dry_run)
}

fn cmd_replay(ctx: &Context, args: ReplayArgs) -> CmdResult {
    let plan = ctx.load_plan()?;
    let config = ctx.load_config()?;
    let methods = load_methods(args.methods.as_deref())?;
    let script = plan_io::load_script(&args.script)?;

    let mut controller = DragController::new(config, FixedLayouts(script.layouts), methods);
    controller.on_drag_start(&plan, script.dragged)?;

    let mut ticks = Vec::new();
    for (tick, point) in script.moves.into_iter().enumerate() {
        let offsets = controller.on_drag_move(&plan, point);
        if !ctx.json {
            println!("tick {}: {}", tick, format_offsets(offsets));
        }
        ticks.push(TickJson {
            tick,
            offsets: offsets_json(offsets),
        });
    }

    let (result, warning, committed) = match script.drop {
        Some(point) => {
            let outcome = controller.on_drop(&plan, point);
            let changed = outcome.result.changed_plan();
            (
                format_drop_result(&outcome.result),
                outcome.result.warning(),
                changed.then_some(outcome.plan),
            )
        }
        None => {
            controller.cancel();
            ("cancelled; plan unchanged".to_string(), None, None)
        }
    };

    let final_plan = committed.as_ref().unwrap_or(&plan);
    if ctx.json {
        let out = ReplayJson {
            ticks,
            result,
            warning,
            plan: final_plan.clone(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", result);
        if let Some(w) = &warning {
            eprintln!("warning: {}", w);
        }
        print!("{}", render_plan(final_plan));
    }

    if args.write
        && let Some(next) = &committed
    {
        plan_io::save_plan(&ctx.plan_path, next)?;
    }
    Ok(())
}
