use crate::escape::{escape_markdown, spoiler};
use tether_core::domain::{Contact, LogEntry};
use tether_core::rules::{bucket_activity, window, ActivityRecord, ReportLine};

/// Bold name plus whichever detail lines the contact has.
pub fn contact_card(contact: &Contact) -> String {
    let mut lines = vec![format!("*{}*", escape_markdown(&contact.name)), String::new()];
    if let Some(telegram) = &contact.telegram {
        lines.push(format!("✈️ Telegram: {}", escape_markdown(telegram)));
    }
    if let Some(phone) = &contact.phone {
        lines.push(format!("📞 Phone: {}", escape_markdown(phone)));
    }
    if let Some(birthday) = &contact.birthday {
        lines.push(format!("🎉 Birthday: {}", escape_markdown(&birthday.to_string())));
    }
    lines.join("\n")
}

/// One line per contact, `— name (telegram)`, in roster order.
pub fn roster(contacts: &[Contact]) -> String {
    let mut rows: Vec<String> = contacts
        .iter()
        .map(|contact| {
            let name = escape_markdown(&contact.name);
            match contact.telegram.as_deref() {
                Some(telegram) => format!("— {} \\({}\\)", name, escape_markdown(telegram)),
                None => format!("— {name}"),
            }
        })
        .collect();
    rows.sort();
    rows.join("\n")
}

/// Flattens a date-ordered history into lines: a date header per day (the
/// header line carries its own leading newline so days read as blocks), one
/// `— seq: text` line per entry, everything escaped for MarkdownV2.
pub fn history_lines(entries: &[LogEntry]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_date = None;
    for entry in entries {
        if current_date != Some(entry.date) {
            current_date = Some(entry.date);
            lines.push(format!(
                "\n*{}:*",
                escape_markdown(&entry.date.to_string())
            ));
        }
        lines.push(format!(
            "— {}: {}",
            entry.seq,
            escape_markdown(&entry.text)
        ));
    }
    lines
}

/// The full logs reply: a header naming the contact, then the windowed tail
/// of the history inside a spoiler. `budget` bounds only the spoiler body;
/// it is the transport's per-message allowance minus headroom for the
/// wrapping, which the configured default already accounts for.
pub fn logs_message(name: &str, entries: &[LogEntry], budget: usize) -> String {
    let body = window(&history_lines(entries), budget);
    format!(
        "📋 Logs for *{}*:\n\n{}",
        escape_markdown(name),
        spoiler(&body)
    )
}

/// The activity report: tier headers interleaved by the bucketer, one
/// `— N days: name (telegram)` line per contact. `lookup` fetches the
/// contact-channel handle and is the caller's collaborator, typically a
/// closure over the contacts repo.
pub fn activity_report<F>(records: &[ActivityRecord], mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = Vec::new();
    for line in bucket_activity(records) {
        match line {
            ReportLine::TierHeader(tier) => {
                out.push(String::new());
                out.push(format!("*{}:*", tier.label()));
            }
            ReportLine::Entry { name, day_count } => {
                let row = match lookup(&name) {
                    Some(telegram) => format!(
                        "— {} days: {} \\({}\\)",
                        day_count,
                        escape_markdown(&name),
                        escape_markdown(&telegram)
                    ),
                    None => format!("— {} days: {}", day_count, escape_markdown(&name)),
                };
                out.push(row);
            }
        }
    }
    let text = out.join("\n");
    text.strip_prefix('\n').unwrap_or(&text).to_string()
}

/// Everything logged in the recent window, grouped per contact, spoilered.
pub fn recent_digest(pairs: &[(String, LogEntry)]) -> String {
    let mut lines = Vec::new();
    let mut current_name: Option<&str> = None;
    for (name, entry) in pairs {
        if current_name != Some(name.as_str()) {
            current_name = Some(name.as_str());
            lines.push(format!("\n*{}:*", escape_markdown(name)));
        }
        if !entry.is_empty_marker() {
            lines.push(format!("— {}", escape_markdown(&entry.text)));
        }
    }
    let text = lines.join("\n");
    spoiler(text.strip_prefix('\n').unwrap_or(&text))
}

#[cfg(test)]
mod tests {
    use super::{activity_report, contact_card, history_lines, logs_message, roster};
    use chrono::NaiveDate;
    use tether_core::domain::{Contact, ContactId, LogEntry, LogId};
    use tether_core::rules::ActivityRecord;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn contact(name: &str, telegram: Option<&str>) -> Contact {
        Contact {
            id: ContactId::new(),
            name: name.to_string(),
            telegram: telegram.map(str::to_string),
            phone: None,
            birthday: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn entry(date: NaiveDate, seq: i64, text: &str) -> LogEntry {
        LogEntry {
            id: LogId::new(),
            contact_id: ContactId::new(),
            date,
            text: text.to_string(),
            seq,
            created_at: 0,
        }
    }

    #[test]
    fn card_escapes_and_skips_absent_fields() {
        let mut c = contact("Ann (work)", Some("@ann_dev"));
        c.phone = None;
        let card = contact_card(&c);
        assert!(card.starts_with("*Ann \\(work\\)*"));
        assert!(card.contains("✈️ Telegram: @ann\\_dev"));
        assert!(!card.contains("Phone"));
        assert!(!card.contains("Birthday"));
    }

    #[test]
    fn roster_is_sorted() {
        let contacts = vec![contact("Zoe", None), contact("Ann", Some("@ann"))];
        let text = roster(&contacts);
        let first = text.lines().next().unwrap();
        assert!(first.contains("Ann"));
        assert!(text.contains("\\(@ann\\)"));
    }

    #[test]
    fn history_groups_by_date() {
        let entries = vec![
            entry(day(2024, 1, 1), 1, "coffee"),
            entry(day(2024, 1, 1), 2, "call"),
            entry(day(2024, 1, 2), 3, "walk"),
        ];
        let lines = history_lines(&entries);
        assert_eq!(
            lines,
            vec![
                "\n*2024\\-01\\-01:*",
                "— 1: coffee",
                "— 2: call",
                "\n*2024\\-01\\-02:*",
                "— 3: walk",
            ]
        );
    }

    #[test]
    fn logs_message_is_spoilered_and_windowed() {
        let entries: Vec<LogEntry> = (0..50)
            .map(|i| entry(day(2024, 1, 1 + (i / 10) as u32), i + 1, &"x".repeat(40)))
            .collect();
        let message = logs_message("Ann", &entries, 200);
        assert!(message.starts_with("📋 Logs for *Ann*:\n\n||"));
        assert!(message.ends_with("||"));
        // the spoiler body respects the budget
        let body = message
            .split("||")
            .nth(1)
            .expect("spoiler body");
        assert!(body.len() <= 200);
        // and keeps the newest entry
        assert!(body.contains("— 50:"));
    }

    #[test]
    fn empty_history_renders_an_empty_spoiler() {
        let message = logs_message("Ann", &[], 100);
        assert!(message.ends_with("||||"));
    }

    #[test]
    fn report_interleaves_headers_and_handles() {
        let records = vec![
            ActivityRecord {
                name: "Ann".to_string(),
                day_count: 3,
            },
            ActivityRecord {
                name: "Carol".to_string(),
                day_count: 40,
            },
        ];
        let text = activity_report(&records, |name| {
            (name == "Ann").then(|| "@ann".to_string())
        });
        let expected = "*Long:*\n— 40 days: Carol\n\n*Recent:*\n— 3 days: Ann \\(@ann\\)";
        assert_eq!(text, expected);
    }
}
