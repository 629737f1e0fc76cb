use crate::commands::{print_json, Context};
use anyhow::Result;
use chrono::Days;
use clap::Args;
use tether_core::rules::{bucket_activity, ReportLine};

use crate::util::today_local;

#[derive(Debug, Args)]
pub struct StatsArgs {}

#[derive(Debug, Args)]
pub struct RecentArgs {
    #[arg(long)]
    pub days: Option<i64>,
}

pub fn activity_report(ctx: &Context<'_>, _args: StatsArgs) -> Result<()> {
    let records = ctx.store.stats().days_since_last_log(today_local())?;

    if ctx.json {
        return print_json(&records);
    }

    if records.is_empty() {
        println!("no logged interactions yet");
        return Ok(());
    }

    for line in bucket_activity(&records) {
        match line {
            ReportLine::TierHeader(tier) => println!("{}:", tier.label()),
            ReportLine::Entry { name, day_count } => {
                let telegram = ctx
                    .store
                    .contacts()
                    .get_by_name(&name)?
                    .and_then(|contact| contact.telegram);
                match telegram {
                    Some(handle) => println!("  {day_count} days: {name} ({handle})"),
                    None => println!("  {day_count} days: {name}"),
                }
            }
        }
    }
    Ok(())
}

pub fn recent_logs(ctx: &Context<'_>, args: RecentArgs) -> Result<()> {
    let days = args.days.unwrap_or(ctx.config.recent_days).max(0) as u64;
    let since = today_local()
        .checked_sub_days(Days::new(days))
        .unwrap_or(today_local());
    let entries = ctx.store.logs().list_since(since)?;

    if ctx.json {
        return print_json(&entries);
    }

    if entries.is_empty() {
        println!("no logs since {since}");
        return Ok(());
    }

    let mut current_name: Option<&str> = None;
    for (name, entry) in &entries {
        if current_name != Some(name.as_str()) {
            current_name = Some(name.as_str());
            println!("{name}:");
        }
        if !entry.is_empty_marker() {
            println!("  — {}", entry.text);
        }
    }
    Ok(())
}
