//! Command dispatch onto core services.

use crate::args::{Cli, Commands, MemberCommands, MemberUpdateArgs, UnitCommands};
use crate::error::CliResult;
use log::debug;
use orgtree_core::{
    parse_hire_date, DeleteMode, HierarchyService, MemberService, MemberUpdate, NewMember,
    ProjectionOptions, UnitUpdate,
};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;

/// Runs the parsed command against an open, migrated connection.
pub fn execute_command(cli: &Cli, conn: &Connection) -> CliResult<()> {
    match &cli.command {
        Commands::Unit { command } => execute_unit(command, conn),
        Commands::Member { command } => execute_member(command, conn),
    }
}

fn execute_unit(command: &UnitCommands, conn: &Connection) -> CliResult<()> {
    let service = HierarchyService::try_new(conn)?;
    match command {
        UnitCommands::Create { name, parent } => print_json(&service.create_unit(name, *parent)?),
        UnitCommands::Get { id } => print_json(&service.get_unit(*id)?),
        UnitCommands::Rename { id, name } => print_json(&service.rename_unit(*id, name)?),
        UnitCommands::Move { id, parent } => print_json(&service.move_unit(*id, *parent)?),
        UnitCommands::Update { id, name, parent } => {
            let update = UnitUpdate {
                name: name.clone(),
                parent_uuid: *parent,
            };
            print_json(&service.update_unit(*id, &update)?)
        }
        UnitCommands::Delete {
            id,
            mode,
            reassign_to,
        } => {
            let mode: DeleteMode = mode.parse()?;
            let summary = service.delete_unit(*id, mode, *reassign_to)?;
            print_json(&json!({
                "unit_uuid": id,
                "mode": mode.as_str(),
                "summary": summary,
            }))
        }
        UnitCommands::Tree {
            id,
            depth,
            no_members,
        } => {
            let options = ProjectionOptions::new(*depth, !*no_members);
            print_json(&service.project_unit(*id, options)?)
        }
        UnitCommands::Children { parent } => print_json(&service.list_children(*parent)?),
    }
}

fn execute_member(command: &MemberCommands, conn: &Connection) -> CliResult<()> {
    let service = MemberService::try_new(conn)?;
    match command {
        MemberCommands::Create {
            unit,
            full_name,
            position,
            hired_at,
        } => {
            let mut member = NewMember::new(full_name.as_str(), position.as_str());
            if let Some(hired_at) = hired_at {
                member = member.hired_at(parse_hire_date(hired_at)?);
            }
            print_json(&service.create_member(*unit, &member)?)
        }
        MemberCommands::Get { id } => print_json(&service.get_member(*id)?),
        MemberCommands::List { unit } => print_json(&service.list_members(*unit)?),
        MemberCommands::Update(args) => {
            let update = member_update(args)?;
            print_json(&service.update_member(args.id, &update)?)
        }
        MemberCommands::Delete { id } => {
            service.delete_member(*id)?;
            print_json(&json!({ "member_uuid": id, "deleted": true }))
        }
    }
}

fn member_update(args: &MemberUpdateArgs) -> CliResult<MemberUpdate> {
    let hired_at = if args.clear_hired_at {
        Some(None)
    } else {
        args.hired_at
            .as_deref()
            .map(parse_hire_date)
            .transpose()?
            .map(Some)
    };
    Ok(MemberUpdate {
        full_name: args.full_name.clone(),
        position: args.position.clone(),
        hired_at,
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    debug!("event=cli_output module=cli status=ok bytes={}", rendered.len());
    println!("{rendered}");
    Ok(())
}
