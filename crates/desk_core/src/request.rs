use crate::{JobKind, ValidationError};

/// Longest request text the analysis backend accepts.
pub const MAX_REQUEST_CHARS: usize = 5000;
pub const MIN_COMPARISON_TICKERS: usize = 2;
pub const MAX_COMPARISON_TICKERS: usize = 5;
pub const DEFAULT_COMPARISON_PERIOD: &str = "6mo";

/// Raw submission input as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDraft {
    pub request_text: String,
    pub kind: JobKind,
    pub ticker: Option<String>,
}

impl JobDraft {
    pub fn new(request_text: impl Into<String>, kind: JobKind, ticker: Option<String>) -> Self {
        Self {
            request_text: request_text.into(),
            kind,
            ticker,
        }
    }

    pub fn general(request_text: impl Into<String>) -> Self {
        Self::new(request_text, JobKind::General, None)
    }

    pub fn validate(&self) -> Result<AnalysisRequest, ValidationError> {
        let request_text = self.request_text.trim();
        if request_text.is_empty() {
            return Err(ValidationError::EmptyRequest);
        }
        if request_text.chars().count() > MAX_REQUEST_CHARS {
            return Err(ValidationError::RequestTooLong {
                max: MAX_REQUEST_CHARS,
            });
        }

        let ticker = self.ticker.as_deref().and_then(normalize_ticker);
        if self.kind.requires_ticker() && ticker.is_none() {
            return Err(ValidationError::MissingTicker { kind: self.kind });
        }

        Ok(AnalysisRequest {
            request_text: request_text.to_string(),
            kind: self.kind,
            ticker,
        })
    }
}

/// A submission that passed local validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    request_text: String,
    kind: JobKind,
    ticker: Option<String>,
}

impl AnalysisRequest {
    pub fn request_text(&self) -> &str {
        &self.request_text
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn ticker(&self) -> Option<&str> {
        self.ticker.as_deref()
    }
}

/// Raw comparison input: a list of symbols and an optional period.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComparisonDraft {
    pub tickers: Vec<String>,
    pub period: Option<String>,
}

impl ComparisonDraft {
    pub fn new<I, S>(tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tickers: tickers.into_iter().map(Into::into).collect(),
            period: None,
        }
    }

    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        self.period = Some(period.into());
        self
    }

    pub fn validate(&self) -> Result<ComparisonRequest, ValidationError> {
        let mut tickers: Vec<String> = Vec::with_capacity(self.tickers.len());
        for ticker in self.tickers.iter().filter_map(|raw| normalize_ticker(raw)) {
            if !tickers.contains(&ticker) {
                tickers.push(ticker);
            }
        }
        if !(MIN_COMPARISON_TICKERS..=MAX_COMPARISON_TICKERS).contains(&tickers.len()) {
            return Err(ValidationError::ComparisonTickerCount {
                count: tickers.len(),
                min: MIN_COMPARISON_TICKERS,
                max: MAX_COMPARISON_TICKERS,
            });
        }

        let period = self
            .period
            .as_deref()
            .map(str::trim)
            .filter(|period| !period.is_empty())
            .unwrap_or(DEFAULT_COMPARISON_PERIOD)
            .to_string();

        Ok(ComparisonRequest { tickers, period })
    }
}

/// A comparison that passed local validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRequest {
    tickers: Vec<String>,
    period: String,
}

impl ComparisonRequest {
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn period(&self) -> &str {
        &self.period
    }
}

fn normalize_ticker(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_ascii_uppercase())
    }
}
