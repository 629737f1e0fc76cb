use crate::commands::{print_json, require_contact, Context};
use crate::error::invalid_input;
use crate::util::{normalize_optional_value, now_utc, parse_date};
use anyhow::Result;
use clap::Args;
use tether_core::domain::Contact;
use tether_core::rules::resolve;
use tether_store::repo::{ContactNew, ContactUpdate};

#[derive(Debug, Args)]
pub struct AddContactArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub telegram: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub birthday: Option<String>,
}

#[derive(Debug, Args)]
pub struct EditContactArgs {
    pub name: String,
    #[arg(long = "name", value_name = "NAME")]
    pub new_name: Option<String>,
    #[arg(long)]
    pub telegram: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub birthday: Option<String>,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    pub name: String,
}

#[derive(Debug, Args)]
pub struct ListArgs {}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub name: String,
}

#[derive(Debug, Args)]
pub struct FindArgs {
    pub query: String,
    #[arg(long)]
    pub limit: Option<usize>,
}

pub fn add_contact(ctx: &Context<'_>, args: AddContactArgs) -> Result<()> {
    let birthday = match args.birthday {
        Some(raw) => Some(parse_date(&raw)?),
        None => None,
    };

    let contact = ctx.store.contacts().create(
        now_utc(),
        ContactNew {
            name: args.name,
            telegram: args.telegram,
            phone: args.phone,
            birthday,
        },
    )?;

    if ctx.json {
        print_json(&contact)?;
    } else {
        println!("created {} {}", contact.id, contact.name);
    }
    Ok(())
}

pub fn edit_contact(ctx: &Context<'_>, args: EditContactArgs) -> Result<()> {
    let contact = require_contact(ctx, &args.name)?;

    let mut update = ContactUpdate::default();
    if let Some(name) = args.new_name {
        update.name = Some(name);
    }
    if let Some(telegram) = args.telegram {
        update.telegram = Some(normalize_optional_value(telegram));
    }
    if let Some(phone) = args.phone {
        update.phone = Some(normalize_optional_value(phone));
    }
    if let Some(raw) = args.birthday {
        update.birthday = match normalize_optional_value(raw) {
            Some(value) => Some(Some(parse_date(&value)?)),
            None => Some(None),
        };
    }

    if update.is_empty() {
        return Err(invalid_input("no updates provided"));
    }

    let updated = ctx.store.contacts().update(now_utc(), contact.id, update)?;
    if ctx.json {
        print_json(&updated)?;
    } else {
        println!("updated {} {}", updated.id, updated.name);
    }
    Ok(())
}

pub fn show_contact(ctx: &Context<'_>, args: ShowArgs) -> Result<()> {
    let contact = require_contact(ctx, &args.name)?;

    if ctx.json {
        return print_json(&contact);
    }

    print_card(&contact);
    Ok(())
}

pub fn list_contacts(ctx: &Context<'_>, _args: ListArgs) -> Result<()> {
    let contacts = ctx.store.contacts().list_all()?;

    if ctx.json {
        return print_json(&contacts);
    }

    if contacts.is_empty() {
        println!("no contacts");
        return Ok(());
    }
    for contact in &contacts {
        match contact.telegram.as_deref() {
            Some(telegram) => println!("{}  ({})", contact.name, telegram),
            None => println!("{}", contact.name),
        }
    }
    Ok(())
}

pub fn delete_contact(ctx: &Context<'_>, args: DeleteArgs) -> Result<()> {
    let contact = match ctx.store.contacts().get_by_name(&args.name)? {
        Some(contact) => contact,
        None => {
            // idempotent: nothing to do is not a failure
            println!("no contact named {}", args.name);
            return Ok(());
        }
    };

    ctx.store.contacts().delete(contact.id)?;
    println!("deleted {} {}", contact.id, contact.name);
    Ok(())
}

pub fn find_contacts(ctx: &Context<'_>, args: FindArgs) -> Result<()> {
    let names = ctx.store.contacts().list_names()?;
    let limit = args.limit.unwrap_or(ctx.config.match_limit);
    let matches = resolve(&args.query, &names, limit);

    if ctx.json {
        let found: Vec<&str> = matches.iter().map(|m| m.name.as_str()).collect();
        return print_json(&found);
    }

    if matches.is_empty() {
        println!("no matches");
        return Ok(());
    }
    for m in &matches {
        println!("{}", m.name);
    }
    Ok(())
}

fn print_card(contact: &Contact) {
    println!("{}", contact.name);
    if let Some(telegram) = &contact.telegram {
        println!("  telegram: {telegram}");
    }
    if let Some(phone) = &contact.phone {
        println!("  phone: {phone}");
    }
    if let Some(birthday) = &contact.birthday {
        println!("  birthday: {birthday}");
    }
}
