use std::sync::LazyLock;

use ::scraper::{ElementRef, Html};
use chrono::NaiveDate;
use regex::{Captures, Regex};
use tracing::debug;

use crate::error::Result;
use crate::model::EventDetails;
use crate::scraper::tree::{self, Query};
use crate::validate::{FromRaw, RawRecord, DATE_FORMAT};

/// Phrase in the heading that opens the events section ("Events by date", "Events by month").
const EVENTS_HEADING_MARKER: &str = "events by";
/// Class of the per-event card element.
const EVENT_CARD_CLASS: &str = "event-card";
/// Prefix of the identifier of country-flag icons.
pub(crate) const FLAG_PREFIX: &str = "flag-";
/// Marker in result-page links.
pub(crate) const RESULTS_MARKER: &str = "results";

const CARD_DATE_FORMAT: &str = "%d %B %Y";

static CROSS_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(\d{1,2})\s+([A-Za-z]+)\s+(\d{4})\s*[-–]\s*(\d{1,2})\s+([A-Za-z]+)\s+(\d{4})\b",
    )
    .unwrap()
});
static CROSS_MONTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})\s+([A-Za-z]+)\s*[-–]\s*(\d{1,2})\s+([A-Za-z]+)\s+(\d{4})\b").unwrap()
});
static DUAL_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})\s*[-–]\s*(\d{1,2})\s+([A-Za-z]+)\s+(\d{4})\b").unwrap()
});
static SINGLE_DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})\s+([A-Za-z]+)\s+(\d{4})\b").unwrap());

/// Extract and validate every event card on an events-listing page, in document order.
pub fn extract_events(document: &Html) -> Result<Vec<EventDetails>> {
    let events = extract_raw_events(document)
        .iter()
        .map(EventDetails::from_raw)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    debug!(count = events.len(), "parsed events page");
    Ok(events)
}

/// Raw field dictionaries of every event card; empty when the events heading is missing.
pub fn extract_raw_events(document: &Html) -> Vec<RawRecord> {
    let Some(heading) = find_events_heading(document) else {
        debug!("no events heading on page");
        return vec![];
    };
    find_event_cards(heading).into_iter().map(raw_event).collect()
}

pub(crate) fn find_events_heading(document: &Html) -> Option<ElementRef<'_>> {
    tree::find_first(
        document.root_element(),
        &Query::headings().text_contains(EVENTS_HEADING_MARKER),
    )
}

/// Cards anywhere after the heading. Neighbouring events are rendered as siblings rather than
/// nested containers, so this is one flat list.
pub(crate) fn find_event_cards(heading: ElementRef) -> Vec<ElementRef> {
    tree::find_all_after(heading, &Query::any().class(EVENT_CARD_CLASS))
}

fn raw_event(card: ElementRef) -> RawRecord {
    let mut raw = RawRecord::new();
    raw.insert_opt_text("location", card_location(card));
    if let Some((start, end)) = card_date_range(card) {
        raw.insert_text("start_date", start.format(DATE_FORMAT).to_string());
        raw.insert_text("end_date", end.format(DATE_FORMAT).to_string());
    }
    raw.insert_opt_text("country", card_country(card));
    raw.insert_list("disciplines", card_disciplines(card));
    raw.insert_opt_text("event_url", card_event_url(card));
    raw.insert_opt_text("results_url", card_results_url(card));
    raw
}

fn card_line(card: ElementRef, index: usize) -> Option<String> {
    tree::children(card, &Query::tag("div"))
        .get(index)
        .map(tree::text_of)
        .filter(|t| !t.is_empty())
}

/// The second child division holds the location.
pub(crate) fn card_location(card: ElementRef) -> Option<String> {
    card_line(card, 1)
}

/// The first child division holds the printed date or date range.
pub(crate) fn card_date_range(card: ElementRef) -> Option<(NaiveDate, NaiveDate)> {
    card_line(card, 0).and_then(|text| parse_date_range(&text))
}

/// Parse `30 December 2024 - 2 January 2025`, `1 May - 2 June 2024`, `1 - 4 May 2024` or
/// `4 May 2024`, in that order of preference. A single date yields identical start and end;
/// a range that ends before it starts yields nothing.
pub fn parse_date_range(text: &str) -> Option<(NaiveDate, NaiveDate)> {
    let date = |caps: &Captures, day: usize, month: usize, year: usize| {
        let text = format!("{} {} {}", &caps[day], &caps[month], &caps[year]);
        NaiveDate::parse_from_str(&text, CARD_DATE_FORMAT).ok()
    };

    let (start, end) = if let Some(caps) = CROSS_YEAR_RE.captures(text) {
        (date(&caps, 1, 2, 3)?, date(&caps, 4, 5, 6)?)
    } else if let Some(caps) = CROSS_MONTH_RE.captures(text) {
        (date(&caps, 1, 2, 5)?, date(&caps, 3, 4, 5)?)
    } else if let Some(caps) = DUAL_DAY_RE.captures(text) {
        (date(&caps, 1, 3, 4)?, date(&caps, 2, 3, 4)?)
    } else {
        let caps = SINGLE_DAY_RE.captures(text)?;
        let day = date(&caps, 1, 2, 3)?;
        (day, day)
    };

    if end < start {
        debug!(text, "date range ends before it starts");
        return None;
    }
    Some((start, end))
}

/// The flag icon sits in the element right before the card.
pub(crate) fn card_country(card: ElementRef) -> Option<String> {
    let previous = tree::prev_sibling_element(card)?;
    let flag = tree::find_self_or_first(previous, &Query::any().attr_prefix("id", FLAG_PREFIX))?;
    flag.value()
        .attr("id")
        .and_then(|id| id.strip_prefix(FLAG_PREFIX))
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_owned)
}

/// Discipline icons sit in the element right after the card; their alt text names them.
pub(crate) fn card_disciplines(card: ElementRef) -> Vec<String> {
    let Some(next) = tree::next_sibling_element(card) else {
        return vec![];
    };
    tree::find_self_and_all(next, &Query::tag("img").has_attr("alt"))
        .iter()
        .filter_map(|icon| tree::attr_of(icon, "alt"))
        .collect()
}

/// Target of the link the card sits in, if any.
pub(crate) fn card_event_url(card: ElementRef) -> Option<String> {
    tree::enclosing(card, &Query::tag("a"))
        .and_then(|link| tree::attr_of(&link, "href"))
        .filter(|href| !href.is_empty())
}

/// First results link in the division following the card's parent.
pub(crate) fn card_results_url(card: ElementRef) -> Option<String> {
    let parent = tree::parent_element(card)?;
    let links = tree::next_sibling_matching(parent, &Query::tag("div"))?;
    let link = tree::find_first(links, &Query::tag("a").attr_contains("href", RESULTS_MARKER))?;
    tree::attr_of(&link, "href")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card_html(flag: &str, dates: &str, location: &str, disciplines: &str) -> String {
        format!(
            r#"
            <div class="event">
              <a href="/events/{location}">
                <div class="event-flag">{flag}</div>
                <div class="event-card"><div>{dates}</div><div>{location}</div></div>
                <div class="event-disciplines">{disciplines}</div>
              </a>
              <div class="event-links">
                <a href="/calendar">Info</a>
                <a href="/Results/{location}">Results</a>
              </div>
            </div>
            "#
        )
    }

    fn page(cards: &[String]) -> Html {
        Html::parse_document(&format!(
            "<html><body><h1>World Series</h1><h2>Events by date</h2>{}</body></html>",
            cards.concat()
        ))
    }

    #[test]
    fn test_single_card_without_dates() {
        let document = page(&[card_html(
            r#"<img id="flag-che" src="/flags/che.svg">"#,
            "Date TBC",
            "Crans-Montana",
            r#"<img alt="XCO" src="/xco.svg"><img alt="DHI" src="/dhi.svg">"#,
        )]);

        let events = extract_events(&document).unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.location.as_deref(), Some("Crans-Montana"));
        assert_eq!(event.country.as_deref(), Some("che"));
        assert_eq!(event.disciplines, ["XCO", "DHI"]);
        assert_eq!(event.start_date, None);
        assert_eq!(event.end_date, None);
        assert_eq!(event.event_url.as_deref(), Some("/events/Crans-Montana"));
        assert_eq!(event.results_url.as_deref(), Some("/Results/Crans-Montana"));
    }

    #[test]
    fn test_cards_in_document_order() {
        let document = page(&[
            card_html("", "1 - 4 May 2024", "Mairiporã", ""),
            card_html(
                r#"<span><img id="flag-cze"></span>"#,
                "24 May 2024",
                "Nove Mesto",
                r#"<img alt="XCC">"#,
            ),
        ]);

        let events = extract_events(&document).unwrap();
        assert_eq!(events.len(), 2);

        assert_eq!(events[0].location.as_deref(), Some("Mairiporã"));
        assert_eq!(events[0].start_date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(events[0].end_date, NaiveDate::from_ymd_opt(2024, 5, 4));
        assert_eq!(events[0].country, None);
        assert!(events[0].disciplines.is_empty());

        assert_eq!(events[1].country.as_deref(), Some("cze"));
        assert_eq!(events[1].start_date, events[1].end_date);
        assert_eq!(events[1].start_date, NaiveDate::from_ymd_opt(2024, 5, 24));
        assert_eq!(events[1].disciplines, ["XCC"]);
    }

    #[test]
    fn test_missing_heading_yields_no_events() {
        let html = format!(
            "<html><body><h2>Calendar</h2>{}</body></html>",
            card_html("", "4 May 2024", "Lenzerheide", "")
        );
        let document = Html::parse_document(&html);
        assert!(extract_events(&document).unwrap().is_empty());
    }

    #[test]
    fn test_cards_before_heading_are_ignored() {
        let html = format!(
            "<html><body>{}<h3>Events by month</h3>{}</body></html>",
            card_html("", "4 May 2024", "Before", ""),
            card_html("", "5 May 2024", "After", "")
        );
        let document = Html::parse_document(&html);
        let events = extract_events(&document).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].location.as_deref(), Some("After"));
    }

    #[test]
    fn test_bare_card_degrades_field_by_field() {
        let html = r#"<html><body><h2>Events by date</h2>
            <div class="event-card"><div>7 July 2024</div></div>
        </body></html>"#;
        let document = Html::parse_document(html);
        let events = extract_events(&document).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].location, None);
        assert_eq!(events[0].start_date, NaiveDate::from_ymd_opt(2024, 7, 7));
        assert_eq!(events[0].event_url, None);
        assert_eq!(events[0].results_url, None);
    }

    #[test]
    fn test_parse_date_range() {
        let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
        assert_eq!(parse_date_range("1 - 4 May 2024"), Some((d(5, 1), d(5, 4))));
        assert_eq!(parse_date_range("1–4 May 2024"), Some((d(5, 1), d(5, 4))));
        assert_eq!(parse_date_range("4 May 2024"), Some((d(5, 4), d(5, 4))));
        assert_eq!(parse_date_range("30 May - 2 June 2024"), Some((d(5, 30), d(6, 2))));
        assert_eq!(parse_date_range("Dates to be confirmed"), None);
        assert_eq!(parse_date_range("31 - 33 May 2024"), None);
        assert_eq!(parse_date_range("4 Smarch 2024"), None);
    }

    #[test]
    fn test_parse_date_range_across_years() {
        assert_eq!(
            parse_date_range("30 December 2024 - 2 January 2025"),
            Some((
                NaiveDate::from_ymd_opt(2024, 12, 30).unwrap(),
                NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()
            ))
        );
    }

    #[test]
    fn test_inverted_date_range_yields_no_dates() {
        assert_eq!(parse_date_range("9 - 2 May 2024"), None);
        assert_eq!(parse_date_range("2 June - 30 May 2024"), None);
        assert_eq!(parse_date_range("2 January 2025 - 30 December 2024"), None);
    }

    #[test]
    fn test_year_digits_are_not_read_as_a_day() {
        let document = page(&[
            card_html("", "30 December 2024 - 2 January 2025", "Year End", ""),
            card_html("", "4 May 2024", "Mairiporã", ""),
        ]);
        let events = extract_events(&document).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].start_date, NaiveDate::from_ymd_opt(2024, 12, 30));
        assert_eq!(events[0].end_date, NaiveDate::from_ymd_opt(2025, 1, 2));
        assert_eq!(events[1].start_date, NaiveDate::from_ymd_opt(2024, 5, 4));
    }
}
