use serde::Serialize;

use super::{EventDetails, RaceInfo, RaceResult};

/// An event together with the races listed for it, as written to `event.json`.
#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    #[serde(flatten)]
    pub event: EventDetails,
    pub races: Vec<RaceInfo>,
}

/// A race together with its results and the location of the event it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct RaceRecord {
    pub event: Option<String>,
    #[serde(flatten)]
    pub race: RaceInfo,
    pub results: Vec<RaceResult>,
}
