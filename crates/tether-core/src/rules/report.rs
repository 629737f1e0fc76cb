use serde::{Deserialize, Serialize};

pub const RECENT_MAX_DAYS: i64 = 7;
pub const AVERAGE_MAX_DAYS: i64 = 30;

/// Days since a contact's last logged interaction. Derived on demand from
/// log dates, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub name: String,
    pub day_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityTier {
    Recent,
    Average,
    Long,
}

impl ActivityTier {
    pub fn for_day_count(day_count: i64) -> Self {
        if day_count < RECENT_MAX_DAYS {
            ActivityTier::Recent
        } else if day_count < AVERAGE_MAX_DAYS {
            ActivityTier::Average
        } else {
            ActivityTier::Long
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivityTier::Recent => "Recent",
            ActivityTier::Average => "Average",
            ActivityTier::Long => "Long",
        }
    }

    fn index(&self) -> usize {
        match self {
            ActivityTier::Recent => 0,
            ActivityTier::Average => 1,
            ActivityTier::Long => 2,
        }
    }
}

/// One line of the activity report, ready for a renderer to format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLine {
    TierHeader(ActivityTier),
    Entry { name: String, day_count: i64 },
}

/// Sorts records by day count descending (stable on ties) and interleaves a
/// tier header before the first record of each tier.
///
/// Emission is tracked per tier across the whole pass, so a header can never
/// repeat even if the tier sequence were to oscillate. With the descending
/// sort tiers are in fact visited Long → Average → Recent, each at most once.
pub fn bucket_activity(records: &[ActivityRecord]) -> Vec<ReportLine> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| b.day_count.cmp(&a.day_count));

    let mut emitted = [false; 3];
    let mut lines = Vec::with_capacity(sorted.len() + 3);
    for record in sorted {
        let tier = ActivityTier::for_day_count(record.day_count);
        if !emitted[tier.index()] {
            emitted[tier.index()] = true;
            lines.push(ReportLine::TierHeader(tier));
        }
        lines.push(ReportLine::Entry {
            name: record.name,
            day_count: record.day_count,
        });
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::{bucket_activity, ActivityRecord, ActivityTier, ReportLine};

    fn record(name: &str, day_count: i64) -> ActivityRecord {
        ActivityRecord {
            name: name.to_string(),
            day_count,
        }
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(ActivityTier::for_day_count(0), ActivityTier::Recent);
        assert_eq!(ActivityTier::for_day_count(6), ActivityTier::Recent);
        assert_eq!(ActivityTier::for_day_count(7), ActivityTier::Average);
        assert_eq!(ActivityTier::for_day_count(29), ActivityTier::Average);
        assert_eq!(ActivityTier::for_day_count(30), ActivityTier::Long);
    }

    #[test]
    fn sorts_descending_and_interleaves_headers() {
        let records = vec![
            record("A", 3),
            record("B", 10),
            record("C", 40),
            record("D", 6),
        ];
        let lines = bucket_activity(&records);
        let expected = vec![
            ReportLine::TierHeader(ActivityTier::Long),
            ReportLine::Entry {
                name: "C".to_string(),
                day_count: 40,
            },
            ReportLine::TierHeader(ActivityTier::Average),
            ReportLine::Entry {
                name: "B".to_string(),
                day_count: 10,
            },
            ReportLine::TierHeader(ActivityTier::Recent),
            ReportLine::Entry {
                name: "D".to_string(),
                day_count: 6,
            },
            ReportLine::Entry {
                name: "A".to_string(),
                day_count: 3,
            },
        ];
        assert_eq!(lines, expected);
    }

    #[test]
    fn headers_never_repeat() {
        // Many records per tier, deliberately shuffled on input.
        let records = vec![
            record("a", 2),
            record("b", 35),
            record("c", 8),
            record("d", 1),
            record("e", 99),
            record("f", 29),
        ];
        let lines = bucket_activity(&records);
        let headers = lines
            .iter()
            .filter(|line| matches!(line, ReportLine::TierHeader(_)))
            .count();
        assert_eq!(headers, 3);
    }

    #[test]
    fn ties_keep_input_order() {
        let records = vec![record("x", 5), record("y", 5)];
        let lines = bucket_activity(&records);
        assert_eq!(
            lines,
            vec![
                ReportLine::TierHeader(ActivityTier::Recent),
                ReportLine::Entry {
                    name: "x".to_string(),
                    day_count: 5,
                },
                ReportLine::Entry {
                    name: "y".to_string(),
                    day_count: 5,
                },
            ]
        );
    }

    #[test]
    fn empty_input_gives_empty_report() {
        assert!(bucket_activity(&[]).is_empty());
    }
}
