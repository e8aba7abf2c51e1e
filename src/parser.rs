//! Line-marker parser for the search reply.
//!
//! The LLM is asked for products as loose `Title:` / `Price:` /
//! `Ratings:` / `URL:` lines. [`ResultParser`] scans those lines with a
//! two-state accumulator:
//!
//! | State            | Marker          | Next state       | Effect                          |
//! |------------------|-----------------|------------------|---------------------------------|
//! | `AwaitingTitle`  | Title           | `Collecting`     | new record                      |
//! | `Collecting(r)`  | Title           | `Collecting`     | `r` discarded, new record       |
//! | `Collecting(r)`  | Price / Ratings | `Collecting`     | field set                       |
//! | `AwaitingTitle`  | Price / Ratings | `AwaitingTitle`  | orphan field ignored            |
//! | `Collecting(r)`  | URL             | `AwaitingTitle`  | url synthesized, `r` appended   |
//! | `AwaitingTitle`  | URL             | `AwaitingTitle`  | record without title skipped    |
//!
//! Lines without a marker never change state. The URL line's own text is
//! never used: every link is a search URL built from the title.

use crate::types::{ProductRecord, SearchResults};
use tracing::{debug, warn};

/// Search URL prefix; the title follows with spaces replaced by `+`.
pub const SEARCH_URL_PREFIX: &str = "https://www.amazon.com/s?k=";

/// Field marker recognized in a reply line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Title,
    Price,
    Ratings,
    Url,
}

impl Marker {
    /// Markers in match priority order.
    pub const PRIORITY: [Marker; 4] = [Marker::Title, Marker::Price, Marker::Ratings, Marker::Url];

    pub fn token(&self) -> &'static str {
        match self {
            Marker::Title => "Title:",
            Marker::Price => "Price:",
            Marker::Ratings => "Ratings:",
            Marker::Url => "URL:",
        }
    }

    /// Find the highest-priority marker in `line` and return it with the
    /// line's value.
    ///
    /// The value is the line with the marker removed, trimmed of
    /// whitespace. A bold wrapper directly around the marker
    /// (`**Title:**`) goes with it; everything else on the line is kept.
    pub fn detect(line: &str) -> Option<(Marker, String)> {
        let marker = Self::PRIORITY
            .into_iter()
            .find(|m| line.contains(m.token()))?;
        let token = marker.token();
        let value = line
            .replace(&format!("**{}**", token), "")
            .replace(token, "")
            .trim()
            .to_string();
        Some((marker, value))
    }
}

/// Build the search link for a product title.
pub fn search_url(title: &str) -> String {
    format!("{}{}", SEARCH_URL_PREFIX, title.replace(' ', "+"))
}

/// Parser state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserState {
    /// No record is open.
    AwaitingTitle,
    /// A titled record is open and collecting fields.
    CollectingFields(ProductRecord),
}

/// What a parsed reply produced, plus what the parser had to drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseReport {
    /// Parsed records, or the placeholder when nothing was complete.
    pub results: SearchResults,
    /// Open records overwritten by a later `Title:` line.
    pub discarded: usize,
    /// `Price:` / `Ratings:` lines seen with no open record.
    pub orphan_fields: usize,
    /// `URL:` lines seen with no open record.
    pub skipped_urls: usize,
}

impl ParseReport {
    /// Records lost to malformed input.
    pub fn dropped(&self) -> usize {
        self.discarded + self.skipped_urls
    }
}

/// Accumulating scanner over reply lines.
#[derive(Debug)]
pub struct ResultParser {
    state: ParserState,
    records: Vec<ProductRecord>,
    discarded: usize,
    orphan_fields: usize,
    skipped_urls: usize,
}

impl Default for ResultParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::AwaitingTitle,
            records: Vec::new(),
            discarded: 0,
            orphan_fields: 0,
            skipped_urls: 0,
        }
    }

    pub fn state(&self) -> &ParserState {
        &self.state
    }

    /// Apply one line to the state machine.
    pub fn feed_line(&mut self, line: &str) {
        let Some((marker, value)) = Marker::detect(line) else {
            return;
        };

        let state = std::mem::replace(&mut self.state, ParserState::AwaitingTitle);
        self.state = match (state, marker) {
            (ParserState::CollectingFields(open), Marker::Title) => {
                warn!(title = ?open.title, "new title before URL line, dropping open record");
                self.discarded += 1;
                ParserState::CollectingFields(ProductRecord::titled(value))
            }
            (ParserState::AwaitingTitle, Marker::Title) => {
                ParserState::CollectingFields(ProductRecord::titled(value))
            }
            (ParserState::CollectingFields(mut open), Marker::Price) => {
                open.price = Some(value);
                ParserState::CollectingFields(open)
            }
            (ParserState::CollectingFields(mut open), Marker::Ratings) => {
                open.ratings = Some(value);
                ParserState::CollectingFields(open)
            }
            (ParserState::CollectingFields(mut open), Marker::Url) => {
                let title = open.title.as_deref().unwrap_or_default();
                open.url = Some(search_url(title));
                debug!(title = ?open.title, "record complete");
                self.records.push(open);
                ParserState::AwaitingTitle
            }
            (ParserState::AwaitingTitle, Marker::Price | Marker::Ratings) => {
                debug!(?marker, "field line with no open record, ignoring");
                self.orphan_fields += 1;
                ParserState::AwaitingTitle
            }
            (ParserState::AwaitingTitle, Marker::Url) => {
                warn!("URL line with no title, skipping record");
                self.skipped_urls += 1;
                ParserState::AwaitingTitle
            }
        };
    }

    /// Finish scanning. An open record with no `URL:` line is not kept.
    pub fn finish(self) -> ParseReport {
        if let ParserState::CollectingFields(open) = &self.state {
            debug!(title = ?open.title, "reply ended before URL line, record not kept");
        }
        ParseReport {
            results: SearchResults::from_records(self.records),
            discarded: self.discarded,
            orphan_fields: self.orphan_fields,
            skipped_urls: self.skipped_urls,
        }
    }
}

/// Parse a complete search reply.
pub fn parse_search_results(text: &str) -> ParseReport {
    let mut parser = ResultParser::new();
    for line in text.lines() {
        parser.feed_line(line);
    }
    parser.finish()
}
