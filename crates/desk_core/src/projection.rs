use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::{Job, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    ByTicker,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
            SortOrder::ByTicker => "by-ticker",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "by-ticker" | "ticker" => Ok(SortOrder::ByTicker),
            _ => Err(ValidationError::UnknownSort(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryQuery {
    /// Case-insensitive substring matched against request text and ticker.
    pub search: String,
    pub sort: SortOrder,
}

/// Filters and orders `jobs` for display without touching them.
pub fn project<'a>(jobs: &'a [Job], query: &HistoryQuery) -> Vec<&'a Job> {
    let needle = query.search.trim().to_lowercase();
    let mut rows: Vec<&Job> = jobs
        .iter()
        .filter(|job| needle.is_empty() || matches_search(job, &needle))
        .collect();

    match query.sort {
        SortOrder::Newest => rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        }),
        SortOrder::Oldest => rows.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        }),
        // Stable sort keeps list order among equal tickers.
        SortOrder::ByTicker => rows.sort_by(|a, b| compare_tickers(a, b)),
    }
    rows
}

fn matches_search(job: &Job, needle: &str) -> bool {
    job.request_text.to_lowercase().contains(needle)
        || job
            .ticker
            .as_deref()
            .is_some_and(|ticker| ticker.to_lowercase().contains(needle))
}

fn compare_tickers(a: &Job, b: &Job) -> Ordering {
    let a = a.ticker.as_deref().filter(|t| !t.is_empty());
    let b = b.ticker.as_deref().filter(|t| !t.is_empty());
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JobKind;
    use chrono::{TimeZone, Utc};

    fn job(id: u64, minute: i64, ticker: Option<&str>, text: &str) -> Job {
        Job::pending(
            id,
            text,
            if ticker.is_some() {
                JobKind::Analyze
            } else {
                JobKind::General
            },
            ticker.map(str::to_string),
            Utc.timestamp_opt(minute * 60, 0).unwrap(),
        )
    }

    fn sample() -> Vec<Job> {
        vec![
            job(3, 30, Some("MSFT"), "cloud growth?"),
            job(2, 20, None, "What is RSI?"),
            job(1, 10, Some("AAPL"), "buy or sell"),
        ]
    }

    fn ids(rows: &[&Job]) -> Vec<u64> {
        rows.iter().map(|job| job.id).collect()
    }

    #[test]
    fn newest_and_oldest_order_by_creation_time() {
        let jobs = sample();
        let newest = project(&jobs, &HistoryQuery::default());
        assert_eq!(ids(&newest), vec![3, 2, 1]);

        let oldest = project(
            &jobs,
            &HistoryQuery {
                sort: SortOrder::Oldest,
                ..HistoryQuery::default()
            },
        );
        assert_eq!(ids(&oldest), vec![1, 2, 3]);
    }

    #[test]
    fn ticker_order_puts_missing_tickers_last() {
        let jobs = sample();
        let rows = project(
            &jobs,
            &HistoryQuery {
                sort: SortOrder::ByTicker,
                ..HistoryQuery::default()
            },
        );
        assert_eq!(ids(&rows), vec![1, 3, 2]);
    }

    #[test]
    fn search_matches_text_and_ticker_case_insensitively() {
        let jobs = sample();
        let by_text = project(
            &jobs,
            &HistoryQuery {
                search: "rsi".into(),
                ..HistoryQuery::default()
            },
        );
        assert_eq!(ids(&by_text), vec![2]);

        let by_ticker = project(
            &jobs,
            &HistoryQuery {
                search: " aapl ".into(),
                ..HistoryQuery::default()
            },
        );
        assert_eq!(ids(&by_ticker), vec![1]);
    }

    #[test]
    fn sort_names_parse() {
        assert_eq!("by-ticker".parse::<SortOrder>().unwrap(), SortOrder::ByTicker);
        assert_eq!("Oldest".parse::<SortOrder>().unwrap(), SortOrder::Oldest);
        assert!("random".parse::<SortOrder>().is_err());
    }
}
