use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::client::{DocumentFetcher, BASE_URL};
use crate::error::Result;
use crate::model::{EventDetails, EventRecord, RaceInfo, RaceRecord, RaceResult};
use crate::scraper::events::extract_raw_events;
use crate::scraper::pairing::PairingPolicy;
use crate::scraper::races::extract_raw_races;
use crate::scraper::results::extract_results;
use crate::scraper::{normalize_url, parse_document};
use crate::sink::Sink;
use crate::validate::{validate_each, FromRaw, RawRecord, ValidationError};

static LOCATION_SEPARATORS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-–]+").unwrap());
static NAME_SEPARATORS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+|-").unwrap());
static NON_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());

/// Knobs for a [`Harvester`] run.
#[derive(Debug, Clone)]
pub struct HarvestOptions {
    /// Site relative links are resolved against.
    pub base_url: String,
    /// Pairing of race headings with result links.
    pub pairing: PairingPolicy,
    /// Re-fetch races whose results are already stored.
    pub overwrite: bool,
    /// Pause before every request after the first.
    pub request_delay: Duration,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            pairing: PairingPolicy::default(),
            overwrite: false,
            request_delay: Duration::from_millis(100),
        }
    }
}

/// Counts of what a [`Harvester`] run did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HarvestSummary {
    pub events: usize,
    pub events_failed: usize,
    pub races_written: usize,
    pub races_skipped: usize,
    pub races_failed: usize,
}

/// Walks a season: the events calendar, every event's race listing and every race's
/// results, handing each canonical record to a [`Sink`].
pub struct Harvester<F, S> {
    fetcher: F,
    sink: S,
    options: HarvestOptions,
}

impl<F: DocumentFetcher, S: Sink> Harvester<F, S> {
    pub fn new(fetcher: F, sink: S, options: HarvestOptions) -> Self {
        Self {
            fetcher,
            sink,
            options,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Harvest every event of `year`. A failing calendar page, fetch or sink aborts the run;
    /// records and race pages that cannot be extracted are logged and counted.
    #[instrument(skip(self))]
    pub async fn run(&self, year: i32) -> Result<HarvestSummary> {
        let (events, rejected) = fetch_events(&self.fetcher, &self.options.base_url, year).await?;
        info!(year, count = events.len(), "found events");

        let mut summary = HarvestSummary {
            events: events.len(),
            events_failed: rejected.len(),
            ..Default::default()
        };
        let year_dir = PathBuf::from(year.to_string());

        for (i, event) in events.into_iter().enumerate() {
            let event_dir = year_dir.join(event_folder(i + 1, event.location.as_deref()));
            let races = self.harvest_races(&event, &mut summary).await?;
            let mut taken = HashSet::new();
            for race in &races {
                let destination = unique_race_destination(&event_dir, race, &mut taken);
                self.harvest_race(&event, race, destination, &mut summary)
                    .await?;
            }
            self.sink
                .store(&EventRecord { event, races }, &event_dir.join("event.json"))?;
        }

        info!(
            written = summary.races_written,
            skipped = summary.races_skipped,
            failed = summary.races_failed,
            "harvest finished"
        );
        Ok(summary)
    }

    async fn harvest_races(
        &self,
        event: &EventDetails,
        summary: &mut HarvestSummary,
    ) -> Result<Vec<RaceInfo>> {
        let Some(results_url) = event.results_url.as_deref() else {
            debug!(location = ?event.location, "event has no results link");
            return Ok(vec![]);
        };
        info!(location = ?event.location, "extracting race info");
        self.pause().await;
        match fetch_races(
            &self.fetcher,
            &self.options.base_url,
            results_url,
            self.options.pairing,
        )
        .await
        {
            Ok((races, rejected)) => {
                summary.races_failed += rejected.len();
                Ok(races)
            }
            Err(e) if e.is_extraction_error() => {
                warn!(results_url, error = %e, "skipping race listing");
                Ok(vec![])
            }
            Err(e) => Err(e),
        }
    }

    async fn harvest_race(
        &self,
        event: &EventDetails,
        race: &RaceInfo,
        destination: PathBuf,
        summary: &mut HarvestSummary,
    ) -> Result<()> {
        let Some(url) = race.url.as_deref() else {
            debug!(race = %race.race_name, "race has no results link");
            summary.races_skipped += 1;
            return Ok(());
        };

        if !self.options.overwrite && self.sink.exists(&destination) {
            debug!(destination = %destination.display(), "results already stored");
            summary.races_skipped += 1;
            return Ok(());
        }

        info!(race = %race.race_name, "extracting results");
        self.pause().await;
        match fetch_results(&self.fetcher, &self.options.base_url, url).await {
            Ok(results) => {
                let record = RaceRecord {
                    event: event.location.clone(),
                    race: race.clone(),
                    results,
                };
                self.sink.store(&record, &destination)?;
                summary.races_written += 1;
            }
            Err(e) if e.is_extraction_error() => {
                warn!(url, error = %e, "skipping race");
                summary.races_failed += 1;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    async fn pause(&self) {
        if !self.options.request_delay.is_zero() {
            tokio::time::sleep(self.options.request_delay).await;
        }
    }
}

/// Fetch and extract the events calendar of `year`. Cards that fail validation are logged
/// and handed back separately from the valid events.
pub async fn fetch_events<F: DocumentFetcher>(
    fetcher: &F,
    base_url: &str,
    year: i32,
) -> Result<(Vec<EventDetails>, Vec<ValidationError>)> {
    let url = normalize_url(base_url, "/calendar");
    let year = year.to_string();
    let markup = fetcher.fetch(&url, &[("year", year.as_str())]).await?;
    let raws = extract_raw_events(&parse_document(&markup));
    Ok(keep_valid(&raws, &url))
}

/// Fetch and extract the races listed at `results_url`. Races that fail validation are
/// logged and handed back separately from the valid ones.
pub async fn fetch_races<F: DocumentFetcher>(
    fetcher: &F,
    base_url: &str,
    results_url: &str,
    policy: PairingPolicy,
) -> Result<(Vec<RaceInfo>, Vec<ValidationError>)> {
    let url = normalize_url(base_url, results_url);
    let markup = fetcher.fetch(&url, &[]).await?;
    let raws = extract_raw_races(&parse_document(&markup), policy)?;
    Ok(keep_valid(&raws, &url))
}

fn keep_valid<T: FromRaw>(raws: &[RawRecord], url: &str) -> (Vec<T>, Vec<ValidationError>) {
    let (records, rejected) = validate_each::<T>(raws);
    for e in &rejected {
        warn!(url, error = %e, "skipping invalid record");
    }
    debug!(url, count = records.len(), rejected = rejected.len(), "validated records");
    (records, rejected)
}

/// Fetch and extract the results table at `race_url`.
pub async fn fetch_results<F: DocumentFetcher>(
    fetcher: &F,
    base_url: &str,
    race_url: &str,
) -> Result<Vec<RaceResult>> {
    let markup = fetcher.fetch(&normalize_url(base_url, race_url), &[]).await?;
    extract_results(&parse_document(&markup))
}

/// `NN_location` with `NN` the 1-based event number.
pub fn event_folder(number: usize, location: Option<&str>) -> String {
    let location = location.unwrap_or("unknown");
    let slug = LOCATION_SEPARATORS_RE
        .replace_all(location, "_")
        .replace(',', "")
        .to_lowercase();
    format!("{number:02}_{slug}")
}

fn name_slug(name: &str) -> String {
    NAME_SEPARATORS_RE.replace_all(name, "_").to_lowercase()
}

/// `discipline_gender_category_race-type` of the parts the race name carries.
pub fn race_file_stem(race: &RaceInfo) -> String {
    let gender = race.gender.map(|g| g.to_string());
    let race_type = race.race_type.to_string();
    let parts = [
        race.discipline.as_deref(),
        gender.as_deref(),
        race.category.as_deref(),
        Some(race_type.as_str()),
    ];
    name_slug(&parts.into_iter().flatten().collect::<Vec<_>>().join("_"))
}

/// `<event_dir>/results/<discipline>/<race>.json`
pub fn race_destination(event_dir: &Path, race: &RaceInfo) -> PathBuf {
    discipline_dir(event_dir, race).join(format!("{}.json", race_file_stem(race)))
}

fn discipline_dir(event_dir: &Path, race: &RaceInfo) -> PathBuf {
    let discipline = name_slug(race.discipline.as_deref().unwrap_or("other"));
    event_dir.join("results").join(discipline)
}

/// [`race_destination`] unless an earlier race of the event already `taken` it. Then the
/// slug of the full race name is used, with `_2`, `_3`, ... appended while that repeats too.
pub fn unique_race_destination(
    event_dir: &Path,
    race: &RaceInfo,
    taken: &mut HashSet<PathBuf>,
) -> PathBuf {
    let preferred = race_destination(event_dir, race);
    if taken.insert(preferred.clone()) {
        return preferred;
    }

    let dir = discipline_dir(event_dir, race);
    let stem = NON_WORD_RE
        .replace_all(&race.race_name, "_")
        .trim_matches('_')
        .to_lowercase();
    let mut candidate = dir.join(format!("{stem}.json"));
    let mut n = 2;
    while !taken.insert(candidate.clone()) {
        candidate = dir.join(format!("{stem}_{n}.json"));
        n += 1;
    }
    candidate
}
