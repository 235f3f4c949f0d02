pub use crate::client::{DocumentFetcher, MtbClient};
pub use crate::error::{MtbError, Result};
pub use crate::harvest::{HarvestOptions, HarvestSummary, Harvester};
pub use crate::model::*;
pub use crate::scraper::events::{extract_events, extract_raw_events};
pub use crate::scraper::pairing::PairingPolicy;
pub use crate::scraper::races::{extract_races, extract_raw_races};
pub use crate::scraper::results::{extract_raw_results, extract_results, TableLayout};
pub use crate::scraper::{parse_document, Html};
pub use crate::sink::{JsonFileSink, MemorySink, Sink};
pub use crate::validate::{validate_each, FieldError, FromRaw, RawRecord, RawValue, ValidationError};

pub mod client;
pub mod error;
pub mod harvest;
pub mod model;
pub mod scraper;
pub mod sink;
pub mod validate;
