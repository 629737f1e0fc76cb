use crate::commands::{print_json, require_contact, Context};
use crate::error::{invalid_input, not_found};
use crate::util::{now_utc, parse_date, today_local};
use anyhow::Result;
use clap::{Args, Subcommand};
use tether_core::domain::LogEntry;
use tether_core::rules::window;
use tether_store::repo::LogUpdate;

#[derive(Debug, Subcommand)]
pub enum LogCommand {
    /// Record an interaction
    Add(AddLogArgs),
    /// Record an interaction with nothing to say about it
    Empty(EmptyLogArgs),
    /// Print a contact's history
    Ls(ListLogsArgs),
    Edit(EditLogArgs),
    Rm(RemoveLogArgs),
}

#[derive(Debug, Args)]
pub struct AddLogArgs {
    pub name: String,
    pub text: String,
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<String>,
}

#[derive(Debug, Args)]
pub struct EmptyLogArgs {
    pub name: String,
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListLogsArgs {
    pub name: String,
    /// Keep only the most recent entries that fit this many bytes
    #[arg(long)]
    pub budget: Option<usize>,
}

#[derive(Debug, Args)]
pub struct EditLogArgs {
    pub name: String,
    /// The entry's number as shown by `log ls`
    pub seq: i64,
    #[arg(long)]
    pub text: Option<String>,
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<String>,
}

#[derive(Debug, Args)]
pub struct RemoveLogArgs {
    pub name: String,
    pub seq: i64,
}

pub fn add_log(ctx: &Context<'_>, args: AddLogArgs) -> Result<()> {
    let contact = require_contact(ctx, &args.name)?;
    let date = match args.date {
        Some(raw) => parse_date(&raw)?,
        None => today_local(),
    };

    let entry = ctx
        .store
        .logs()
        .add(now_utc(), contact.id, date, &args.text)?;
    if ctx.json {
        print_json(&entry)?;
    } else {
        println!("logged #{} for {} on {}", entry.seq, contact.name, entry.date);
    }
    Ok(())
}

pub fn add_empty_log(ctx: &Context<'_>, args: EmptyLogArgs) -> Result<()> {
    let contact = require_contact(ctx, &args.name)?;
    let date = match args.date {
        Some(raw) => parse_date(&raw)?,
        None => today_local(),
    };

    let entry = ctx.store.logs().add_empty(now_utc(), contact.id, date)?;
    if ctx.json {
        print_json(&entry)?;
    } else {
        println!("logged #{} for {} on {}", entry.seq, contact.name, entry.date);
    }
    Ok(())
}

pub fn list_logs(ctx: &Context<'_>, args: ListLogsArgs) -> Result<()> {
    let contact = require_contact(ctx, &args.name)?;
    let entries = ctx.store.logs().list_for_contact(contact.id)?;

    if ctx.json {
        return print_json(&entries);
    }

    if entries.is_empty() {
        println!("no logs for {}", contact.name);
        return Ok(());
    }

    let lines = history_lines(&entries);
    let text = match args.budget {
        Some(budget) => window(&lines, budget),
        None => {
            let full = lines.join("\n");
            full.strip_prefix('\n').unwrap_or(&full).to_string()
        }
    };
    println!("logs for {}:", contact.name);
    println!("{text}");
    Ok(())
}

pub fn edit_log(ctx: &Context<'_>, args: EditLogArgs) -> Result<()> {
    if args.text.is_none() && args.date.is_none() {
        return Err(invalid_input("no updates provided"));
    }

    let contact = require_contact(ctx, &args.name)?;
    let entry = ctx
        .store
        .logs()
        .get_by_seq(contact.id, args.seq)?
        .ok_or_else(|| not_found(format!("no log #{} for {}", args.seq, contact.name)))?;

    let date = match args.date {
        Some(raw) => Some(parse_date(&raw)?),
        None => None,
    };
    let updated = ctx.store.logs().update(
        entry.id,
        LogUpdate {
            text: args.text,
            date,
        },
    )?;

    if ctx.json {
        print_json(&updated)?;
    } else {
        println!("updated #{} for {}", updated.seq, contact.name);
    }
    Ok(())
}

pub fn remove_log(ctx: &Context<'_>, args: RemoveLogArgs) -> Result<()> {
    let contact = require_contact(ctx, &args.name)?;
    let entry = ctx
        .store
        .logs()
        .get_by_seq(contact.id, args.seq)?
        .ok_or_else(|| not_found(format!("no log #{} for {}", args.seq, contact.name)))?;

    ctx.store.logs().delete(entry.id)?;
    println!("removed #{} for {}", entry.seq, contact.name);
    Ok(())
}

/// Flattens a date-ordered history into display lines: a blank-prefixed
/// date header per day, one numbered line per entry. The same shape the
/// windowing algorithm consumes on the bot side.
pub fn history_lines(entries: &[LogEntry]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_date = None;
    for entry in entries {
        if current_date != Some(entry.date) {
            current_date = Some(entry.date);
            lines.push(format!("\n{}:", entry.date));
        }
        let text = if entry.is_empty_marker() {
            "(nothing recorded)"
        } else {
            entry.text.as_str()
        };
        lines.push(format!("— {}: {}", entry.seq, text));
    }
    lines
}
