use chrono::NaiveDate;
use serde::Serialize;

use crate::validate::{FieldReader, FromRaw, RawRecord, ValidationError};

/// Summary of one event card on the events-listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDetails {
    pub location: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub country: Option<String>,
    pub disciplines: Vec<String>,
    pub event_url: Option<String>,
    pub results_url: Option<String>,
}

impl FromRaw for EventDetails {
    const RECORD: &'static str = "EventDetails";

    fn from_raw(raw: &RawRecord) -> Result<Self, ValidationError> {
        let mut fields = FieldReader::new(raw);
        let start_date = fields.optional_date("start_date");
        let end_date = fields.optional_date("end_date");

        match (raw.text("start_date"), raw.text("end_date")) {
            (Some(_), None) => fields.error("end_date", "start_date is set without end_date"),
            (None, Some(_)) => fields.error("start_date", "end_date is set without start_date"),
            _ => {}
        }
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                fields.error("end_date", format!("{end} is before start_date {start}"));
            }
        }

        let event = EventDetails {
            location: fields.optional_text("location"),
            start_date,
            end_date,
            country: fields.optional_text("country"),
            disciplines: fields.text_list("disciplines"),
            event_url: fields.optional_text("event_url"),
            results_url: fields.optional_text("results_url"),
        };
        fields.finish(Self::RECORD, event)
    }
}
