use crate::error::not_found;
use anyhow::Result;
use serde::Serialize;
use std::io::{self, Write};
use tether_config::AppConfig;
use tether_core::domain::Contact;
use tether_core::rules::resolve;
use tether_store::Store;

pub mod contacts;
pub mod logs;
pub mod stats;

pub struct Context<'a> {
    pub store: &'a Store,
    pub json: bool,
    pub config: &'a AppConfig,
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// Exact name lookup, falling back to fuzzy suggestions in the error when
/// nothing matches verbatim.
pub fn require_contact(ctx: &Context<'_>, name: &str) -> Result<Contact> {
    if let Some(contact) = ctx.store.contacts().get_by_name(name)? {
        return Ok(contact);
    }

    let names = ctx.store.contacts().list_names()?;
    let suggestions = resolve(name, &names, ctx.config.match_limit);
    if suggestions.is_empty() {
        Err(not_found(format!("no contact named {name}")))
    } else {
        let close: Vec<&str> = suggestions.iter().map(|m| m.name.as_str()).collect();
        Err(not_found(format!(
            "no contact named {name} (did you mean: {}?)",
            close.join(", ")
        )))
    }
}
