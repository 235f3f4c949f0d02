use std::sync::LazyLock;

use ::scraper::Html;
use regex::Regex;
use tracing::debug;

use crate::error::Result;
use crate::model::RaceInfo;
use crate::scraper::events::RESULTS_MARKER;
use crate::scraper::pairing::{pair_aligned, PairingPolicy};
use crate::scraper::tree::{self, Query};
use crate::validate::{FromRaw, RawRecord};

static DISCIPLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"UCI\s+.+?\s+World\s+Cup|(?:E-)?Enduro\s+.+?\s+Racing").unwrap()
});
static CATEGORY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:Elite|U\d+|Junior|Youth|Masters\s+\d+\+)").unwrap()
});
static GENDER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(?:men|women)\b").unwrap());
static RACE_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:qualifiers?|semi-?finals?|finals?)\b").unwrap()
});

/// Extract and validate the races listed on an event page, each paired with its result link.
pub fn extract_races(document: &Html, policy: PairingPolicy) -> Result<Vec<RaceInfo>> {
    let races = extract_raw_races(document, policy)?
        .iter()
        .map(RaceInfo::from_raw)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    debug!(count = races.len(), "parsed races page");
    Ok(races)
}

/// Raw field dictionaries of every race heading, paired by position with the result links.
pub fn extract_raw_races(document: &Html, policy: PairingPolicy) -> Result<Vec<RawRecord>> {
    let urls = result_links(document);
    let names = race_headings(document);
    debug!(races = names.len(), links = urls.len(), "collected race headings and links");

    let races = pair_aligned(names, urls, policy, "race headings and result links")?
        .into_iter()
        .map(|(name, url)| {
            let mut raw = race_fields(&name);
            raw.insert_text("url", url);
            raw
        })
        .collect();
    Ok(races)
}

/// Targets of every link pointing at a results page, in document order.
pub(crate) fn result_links(document: &Html) -> Vec<String> {
    tree::find_all(
        document.root_element(),
        &Query::tag("a").attr_contains("href", RESULTS_MARKER),
    )
    .iter()
    .filter_map(|link| tree::attr_of(link, "href"))
    .collect()
}

/// Heading texts naming a race. Only headings with a colon ("Discipline: race") qualify.
pub(crate) fn race_headings(document: &Html) -> Vec<String> {
    tree::find_all(document.root_element(), &Query::headings())
        .iter()
        .map(tree::text_of)
        .filter(|text| text.contains(':'))
        .collect()
}

/// Discipline, category, gender and race type, each matched independently against the
/// whole race name.
pub fn race_fields(race_name: &str) -> RawRecord {
    let mut raw = RawRecord::new();
    raw.insert_text("race_name", race_name);
    raw.insert_opt_text("discipline", discipline(race_name));
    raw.insert_opt_text("category", category(race_name));
    raw.insert_opt_text("gender", gender(race_name));
    raw.insert_opt_text("race_type", race_type(race_name));
    raw
}

fn first_match(re: &Regex, text: &str) -> Option<String> {
    re.find(text).map(|m| tree::collapse_whitespace(m.as_str()))
}

pub(crate) fn discipline(race_name: &str) -> Option<String> {
    first_match(&DISCIPLINE_RE, race_name)
}

pub(crate) fn category(race_name: &str) -> Option<String> {
    first_match(&CATEGORY_RE, race_name)
}

pub(crate) fn gender(race_name: &str) -> Option<String> {
    first_match(&GENDER_RE, race_name)
}

/// The text after the last colon names the round, so it wins over a series name such as
/// `World Cup Finals`.
pub(crate) fn race_type(race_name: &str) -> Option<String> {
    race_name
        .rsplit_once(':')
        .and_then(|(_, round)| first_match(&RACE_TYPE_RE, round))
        .or_else(|| first_match(&RACE_TYPE_RE, race_name))
}
