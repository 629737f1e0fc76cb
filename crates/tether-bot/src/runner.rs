use crate::api::{ApiError, Messenger};
use crate::escape::escape_markdown;
use crate::fault::Fault;
use crate::render;
use chrono::{Days, Local, NaiveDate, Utc};
use std::time::Duration;
use tether_config::AppConfig;
use tether_core::domain::Contact;
use tether_core::rules::resolve;
use tether_store::repo::{ContactNew, ContactUpdate, LogUpdate};
use tether_store::Store;
use tracing::{info, warn};

const POLL_RETRY_SECS: u64 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    AddContact { name: String },
    ShowContact { name: String },
    EditContact { name: String, field: String, value: String },
    DeleteContact { name: String },
    ListContacts,
    Find { query: String },
    AddLog { name: String, text: String },
    EmptyLog { name: String },
    ShowLogs { name: String },
    EditLog { name: String, seq: i64, text: String },
    MoveLog { name: String, seq: i64, date: String },
    DeleteLog { name: String, seq: i64 },
    Stats,
    Recent,
}

pub fn run<M: Messenger>(store: &Store, config: &AppConfig, messenger: &mut M) -> Result<(), ApiError> {
    info!("bot started");
    loop {
        let batch = match messenger.poll() {
            Ok(batch) => batch,
            Err(err) => {
                warn!(error = %err, "poll failed");
                std::thread::sleep(Duration::from_secs(POLL_RETRY_SECS));
                continue;
            }
        };
        for incoming in batch {
            let reply = reply_for(store, config, &incoming.text);
            if let Err(err) = messenger.send(incoming.chat_id, &reply) {
                warn!(error = %err, chat_id = incoming.chat_id, "send failed");
            }
        }
    }
}

/// The whole request pipeline for one message: parse, execute, render.
/// Faults become plain escaped text; successes are already MarkdownV2.
pub fn reply_for(store: &Store, config: &AppConfig, text: &str) -> String {
    match parse_command(text) {
        Err(usage) => escape_markdown(&usage),
        Ok(command) => match handle(store, config, command) {
            Ok(reply) => reply,
            Err(fault) => escape_markdown(&fault.user_message()),
        },
    }
}

/// Commands are one-liners; where an argument may contain spaces it is
/// separated from the rest by a colon, `/log Ann: had coffee`.
pub fn parse_command(text: &str) -> Result<Command, String> {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Err("commands start with /, try /help".to_string());
    };
    let (keyword, args) = match rest.split_once(char::is_whitespace) {
        Some((keyword, args)) => (keyword, args.trim()),
        None => (rest, ""),
    };

    match keyword {
        "help" | "start" => Ok(Command::Help),
        "add" => require_arg(args, "/add NAME").map(|name| Command::AddContact { name }),
        "show" => require_arg(args, "/show NAME").map(|name| Command::ShowContact { name }),
        "edit" => {
            let (name, tail) = split_name(args, "/edit NAME: FIELD VALUE")?;
            let (field, value) = tail
                .split_once(char::is_whitespace)
                .ok_or("usage: /edit NAME: FIELD VALUE")?;
            Ok(Command::EditContact {
                name,
                field: field.to_lowercase(),
                value: value.trim().to_string(),
            })
        }
        "delete" => require_arg(args, "/delete NAME").map(|name| Command::DeleteContact { name }),
        "all" => Ok(Command::ListContacts),
        "find" => require_arg(args, "/find NAME").map(|query| Command::Find { query }),
        "log" => {
            let (name, text) = split_name(args, "/log NAME: TEXT")?;
            Ok(Command::AddLog { name, text })
        }
        "empty" => require_arg(args, "/empty NAME").map(|name| Command::EmptyLog { name }),
        "logs" => require_arg(args, "/logs NAME").map(|name| Command::ShowLogs { name }),
        "editlog" => {
            let (name, tail) = split_name(args, "/editlog NAME: NUMBER TEXT")?;
            let (seq, text) = split_seq(&tail, "/editlog NAME: NUMBER TEXT")?;
            Ok(Command::EditLog { name, seq, text })
        }
        "movelog" => {
            let (name, tail) = split_name(args, "/movelog NAME: NUMBER YYYY-MM-DD")?;
            let (seq, date) = split_seq(&tail, "/movelog NAME: NUMBER YYYY-MM-DD")?;
            Ok(Command::MoveLog { name, seq, date })
        }
        "dellog" => {
            let (name, tail) = split_name(args, "/dellog NAME: NUMBER")?;
            let seq = tail
                .parse::<i64>()
                .map_err(|_| "usage: /dellog NAME: NUMBER".to_string())?;
            Ok(Command::DeleteLog { name, seq })
        }
        "stats" => Ok(Command::Stats),
        "recent" => Ok(Command::Recent),
        _ => Err("unknown command, try /help".to_string()),
    }
}

fn require_arg(args: &str, usage: &str) -> Result<String, String> {
    if args.is_empty() {
        Err(format!("usage: {usage}"))
    } else {
        Ok(args.to_string())
    }
}

fn split_name(args: &str, usage: &str) -> Result<(String, String), String> {
    let (name, tail) = args.split_once(':').ok_or_else(|| format!("usage: {usage}"))?;
    let name = name.trim();
    let tail = tail.trim();
    if name.is_empty() || tail.is_empty() {
        return Err(format!("usage: {usage}"));
    }
    Ok((name.to_string(), tail.to_string()))
}

fn split_seq(tail: &str, usage: &str) -> Result<(i64, String), String> {
    let (seq, rest) = tail
        .split_once(char::is_whitespace)
        .ok_or_else(|| format!("usage: {usage}"))?;
    let seq = seq.parse::<i64>().map_err(|_| format!("usage: {usage}"))?;
    Ok((seq, rest.trim().to_string()))
}

pub fn handle(store: &Store, config: &AppConfig, command: Command) -> Result<String, Fault> {
    match command {
        Command::Help => Ok(help_text()),
        Command::AddContact { name } => {
            let contact = store.contacts().create(
                now_utc(),
                ContactNew {
                    name,
                    telegram: None,
                    phone: None,
                    birthday: None,
                },
            )?;
            Ok(format!("Added *{}*", escape_markdown(&contact.name)))
        }
        Command::ShowContact { name } => {
            let contact = resolve_contact(store, config, &name)?;
            Ok(render::contact_card(&contact))
        }
        Command::EditContact { name, field, value } => {
            let contact = resolve_contact(store, config, &name)?;
            let cleared = value == "-";
            let stored = (!cleared).then(|| value.clone());
            let mut update = ContactUpdate::default();
            let old = match field.as_str() {
                "name" => {
                    if cleared {
                        return Err(Fault::UnprocessableInput(
                            "a contact cannot lose its name".to_string(),
                        ));
                    }
                    update.name = Some(value.clone());
                    Some(contact.name.clone())
                }
                "telegram" => {
                    update.telegram = Some(stored);
                    contact.telegram.clone()
                }
                "phone" => {
                    update.phone = Some(stored);
                    contact.phone.clone()
                }
                "birthday" => {
                    update.birthday = Some(if cleared {
                        None
                    } else {
                        Some(parse_date(&value)?)
                    });
                    contact.birthday.map(|date| date.to_string())
                }
                other => {
                    return Err(Fault::UnprocessableInput(format!(
                        "unknown field {other}, expected name, telegram, phone or birthday"
                    )))
                }
            };
            store.contacts().update(now_utc(), contact.id, update)?;
            Ok(format!(
                "{}: {} → {}",
                escape_markdown(&capitalize(&field)),
                escape_markdown(old.as_deref().unwrap_or("—")),
                escape_markdown(if cleared { "—" } else { &value })
            ))
        }
        Command::DeleteContact { name } => match store.contacts().get_by_name(&name)? {
            Some(contact) => {
                store.contacts().delete(contact.id)?;
                Ok(format!(
                    "Deleted *{}* and all their logs",
                    escape_markdown(&contact.name)
                ))
            }
            None => Ok(format!(
                "Nothing to delete: no contact named {}",
                escape_markdown(&name)
            )),
        },
        Command::ListContacts => {
            let contacts = store.contacts().list_all()?;
            if contacts.is_empty() {
                Ok("No contacts yet".to_string())
            } else {
                Ok(render::roster(&contacts))
            }
        }
        Command::Find { query } => {
            let names = store.contacts().list_names()?;
            let matches = resolve(&query, &names, config.match_limit);
            if matches.is_empty() {
                Ok(format!("No one close to {}", escape_markdown(&query)))
            } else {
                let rows: Vec<String> = matches
                    .iter()
                    .map(|m| format!("— {}", escape_markdown(&m.name)))
                    .collect();
                Ok(rows.join("\n"))
            }
        }
        Command::AddLog { name, text } => {
            let contact = resolve_contact(store, config, &name)?;
            let entry = store
                .logs()
                .add(now_utc(), contact.id, today_local(), &text)?;
            Ok(format!(
                "Logged \\#{} for *{}*",
                entry.seq,
                escape_markdown(&contact.name)
            ))
        }
        Command::EmptyLog { name } => {
            let contact = resolve_contact(store, config, &name)?;
            let entry = store
                .logs()
                .add_empty(now_utc(), contact.id, today_local())?;
            Ok(format!(
                "Logged \\#{} \\(nothing recorded\\) for *{}*",
                entry.seq,
                escape_markdown(&contact.name)
            ))
        }
        Command::ShowLogs { name } => {
            let contact = resolve_contact(store, config, &name)?;
            let entries = store.logs().list_for_contact(contact.id)?;
            Ok(render::logs_message(
                &contact.name,
                &entries,
                config.message_budget,
            ))
        }
        Command::EditLog { name, seq, text } => {
            let contact = resolve_contact(store, config, &name)?;
            let entry = require_log(store, &contact, seq)?;
            store.logs().update(
                entry.id,
                LogUpdate {
                    text: Some(text),
                    date: None,
                },
            )?;
            Ok(format!(
                "Updated \\#{} for *{}*",
                seq,
                escape_markdown(&contact.name)
            ))
        }
        Command::MoveLog { name, seq, date } => {
            let contact = resolve_contact(store, config, &name)?;
            let entry = require_log(store, &contact, seq)?;
            let date = parse_date(&date)?;
            store.logs().update(
                entry.id,
                LogUpdate {
                    text: None,
                    date: Some(date),
                },
            )?;
            Ok(format!(
                "Moved \\#{} for *{}* to {}",
                seq,
                escape_markdown(&contact.name),
                escape_markdown(&date.to_string())
            ))
        }
        Command::DeleteLog { name, seq } => {
            let contact = resolve_contact(store, config, &name)?;
            let entry = require_log(store, &contact, seq)?;
            store.logs().delete(entry.id)?;
            Ok(format!(
                "Removed \\#{} for *{}*",
                seq,
                escape_markdown(&contact.name)
            ))
        }
        Command::Stats => {
            let records = store.stats().days_since_last_log(today_local())?;
            if records.is_empty() {
                return Ok("No logged interactions yet".to_string());
            }
            let contacts = store.contacts();
            let mut lookup_error = None;
            let report = render::activity_report(&records, |name| {
                match contacts.get_by_name(name) {
                    Ok(found) => found.and_then(|contact| contact.telegram),
                    Err(err) => {
                        lookup_error.get_or_insert(err);
                        None
                    }
                }
            });
            if let Some(err) = lookup_error {
                return Err(err.into());
            }
            Ok(report)
        }
        Command::Recent => {
            let days = config.recent_days.max(0) as u64;
            let since = today_local()
                .checked_sub_days(Days::new(days))
                .unwrap_or_else(today_local);
            let pairs = store.logs().list_since(since)?;
            if pairs.is_empty() {
                Ok("Nothing logged recently".to_string())
            } else {
                Ok(render::recent_digest(&pairs))
            }
        }
    }
}

/// Exact lookup first; a miss turns into a NotFound fault that carries the
/// closest known names.
fn resolve_contact(store: &Store, config: &AppConfig, name: &str) -> Result<Contact, Fault> {
    if let Some(contact) = store.contacts().get_by_name(name)? {
        return Ok(contact);
    }
    let names = store.contacts().list_names()?;
    let close = resolve(name, &names, config.match_limit);
    if close.is_empty() {
        Err(Fault::NotFound(name.to_string()))
    } else {
        let suggestions: Vec<&str> = close.iter().map(|m| m.name.as_str()).collect();
        Err(Fault::NotFound(format!(
            "{name} (closest: {})",
            suggestions.join(", ")
        )))
    }
}

fn require_log(
    store: &Store,
    contact: &Contact,
    seq: i64,
) -> Result<tether_core::domain::LogEntry, Fault> {
    store
        .logs()
        .get_by_seq(contact.id, seq)?
        .ok_or_else(|| Fault::NotFound(format!("log #{seq} for {}", contact.name)))
}

fn parse_date(raw: &str) -> Result<NaiveDate, Fault> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        Fault::UnprocessableInput(format!("{raw} is not a date, expected YYYY-MM-DD"))
    })
}

fn help_text() -> String {
    escape_markdown(
        "/add NAME — remember someone\n\
         /show NAME — their card\n\
         /edit NAME: FIELD VALUE — change name, telegram, phone or birthday (- clears)\n\
         /delete NAME — forget them and their logs\n\
         /all — everyone\n\
         /find NAME — closest names\n\
         /log NAME: TEXT — record an interaction\n\
         /empty NAME — record one with nothing to say\n\
         /logs NAME — their history\n\
         /editlog NAME: NUMBER TEXT — rewrite an entry\n\
         /movelog NAME: NUMBER YYYY-MM-DD — redate an entry\n\
         /dellog NAME: NUMBER — drop an entry\n\
         /stats — who you are losing touch with\n\
         /recent — what you logged lately",
    )
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn now_utc() -> i64 {
    Utc::now().timestamp()
}

fn today_local() -> NaiveDate {
    Local::now().date_naive()
}
