use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;
use itertools::Itertools;

/// The single textual date format extractors normalize calendar dates to.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Keys of a segment dictionary that all denote its section label.
const SECTION_ALIASES: [&str; 3] = ["lap", "split", "stage"];

/// A single value in a [`RawRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Text(String),
    List(Vec<String>),
    Records(Vec<RawRecord>),
}

/// An extracted, not yet validated record: field name to raw value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: BTreeMap<String, RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), RawValue::Text(value.into()));
    }

    /// Insert `value` only when present; absence stays absence.
    pub fn insert_opt_text(&mut self, key: impl Into<String>, value: Option<String>) {
        if let Some(value) = value {
            self.insert_text(key, value);
        }
    }

    pub fn insert_list(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.fields.insert(key.into(), RawValue::List(values));
    }

    pub fn insert_records(&mut self, key: impl Into<String>, records: Vec<RawRecord>) {
        self.fields.insert(key.into(), RawValue::Records(records));
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.fields.get(key)
    }

    /// The text stored under `key`, if it is a text value.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(RawValue::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Move the value under `from` to `to`, replacing whatever `to` held.
    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(value) = self.fields.remove(from) {
            self.fields.insert(to.to_owned(), value);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = RawRecord::new();
        for (key, value) in iter {
            record.insert_text(key, value);
        }
        record
    }
}

/// One offending field of a record that failed validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {reason}")]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

/// A record failed validation; lists every offending field.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {record}: {}", .errors.iter().join("; "))]
pub struct ValidationError {
    pub record: &'static str,
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Whether `field` is among the offending fields.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

/// Construction of a canonical record from a raw field dictionary.
pub trait FromRaw: Sized {
    /// Record type name used in validation errors.
    const RECORD: &'static str;

    fn from_raw(raw: &RawRecord) -> Result<Self, ValidationError>;
}

/// Validate every raw record on its own. Records that pass come first, in order, followed by
/// the failures of the ones that did not.
pub fn validate_each<T: FromRaw>(raws: &[RawRecord]) -> (Vec<T>, Vec<ValidationError>) {
    raws.iter().map(T::from_raw).partition_result()
}

/// Rename whichever of `lap`/`split`/`stage` a segment dictionary carries to `section`.
pub fn unify_section_alias(mut raw: RawRecord) -> RawRecord {
    if let Some(alias) = SECTION_ALIASES.iter().find(|a| raw.contains_key(a)) {
        raw.rename(alias, "section");
    }
    raw
}

/// Points are `0` whenever the text carries no digit at all (`-`, `—`, blank, `DNF`).
pub fn coerce_points(text: &str) -> Result<i64, String> {
    if !text.chars().any(|c| c.is_ascii_digit()) {
        return Ok(0);
    }
    text.trim()
        .parse()
        .map_err(|_| format!("'{text}' is not a valid integer"))
}

/// Reads typed fields out of a [`RawRecord`], collecting every failure instead of stopping
/// at the first one.
pub(crate) struct FieldReader<'r> {
    raw: &'r RawRecord,
    errors: Vec<FieldError>,
}

impl<'r> FieldReader<'r> {
    pub(crate) fn new(raw: &'r RawRecord) -> Self {
        Self {
            raw,
            errors: vec![],
        }
    }

    pub(crate) fn error(&mut self, field: &str, reason: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_owned(),
            reason: reason.into(),
        });
    }

    /// Text under `key`; absent or blank text is `None`.
    pub(crate) fn optional_text(&mut self, key: &str) -> Option<String> {
        match self.raw.get(key) {
            None => None,
            Some(RawValue::Text(text)) => {
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_owned())
            }
            Some(_) => {
                self.error(key, "expected text");
                None
            }
        }
    }

    pub(crate) fn required_text(&mut self, key: &str) -> String {
        let reported = self.errors.len();
        match self.optional_text(key) {
            Some(text) => text,
            None => {
                if self.errors.len() == reported {
                    self.error(key, "field required");
                }
                String::new()
            }
        }
    }

    pub(crate) fn text_list(&mut self, key: &str) -> Vec<String> {
        match self.raw.get(key) {
            None => vec![],
            Some(RawValue::List(values)) => values.clone(),
            Some(RawValue::Text(text)) if text.trim().is_empty() => vec![],
            Some(RawValue::Text(text)) => vec![text.trim().to_owned()],
            Some(RawValue::Records(_)) => {
                self.error(key, "expected a list of text");
                vec![]
            }
        }
    }

    pub(crate) fn points(&mut self, key: &str) -> i64 {
        let Some(text) = self.optional_text(key) else {
            return 0;
        };
        coerce_points(&text).unwrap_or_else(|reason| {
            self.error(key, reason);
            0
        })
    }

    /// Integer under `key`; text without any digit is `None`, a trailing `.` is tolerated.
    pub(crate) fn optional_int(&mut self, key: &str) -> Option<i64> {
        let text = self.optional_text(key)?;
        if !text.chars().any(|c| c.is_ascii_digit()) {
            return None;
        }
        match text.trim_end_matches('.').parse() {
            Ok(value) => Some(value),
            Err(_) => {
                self.error(key, format!("'{text}' is not a valid integer"));
                None
            }
        }
    }

    pub(crate) fn optional_date(&mut self, key: &str) -> Option<NaiveDate> {
        let text = self.optional_text(key)?;
        match NaiveDate::parse_from_str(&text, DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(e) => {
                self.error(key, format!("'{text}' is not a {DATE_FORMAT} date: {e}"));
                None
            }
        }
    }

    /// Text under `key` parsed with [`FromStr`]; unparseable text is a field error.
    pub(crate) fn parsed<T: FromStr>(&mut self, key: &str) -> Option<T> {
        let text = self.optional_text(key)?;
        match text.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                self.error(key, format!("unrecognised value '{text}'"));
                None
            }
        }
    }

    /// Nested records under `key`; their field errors are reported as `key[i].field`.
    pub(crate) fn records<T: FromRaw>(&mut self, key: &str) -> Vec<T> {
        let raws = match self.raw.get(key) {
            None => return vec![],
            Some(RawValue::Records(raws)) => raws,
            Some(_) => {
                self.error(key, "expected nested records");
                return vec![];
            }
        };

        let mut records = Vec::with_capacity(raws.len());
        for (i, raw) in raws.iter().enumerate() {
            match T::from_raw(raw) {
                Ok(record) => records.push(record),
                Err(e) => {
                    for inner in e.errors {
                        self.error(&format!("{key}[{i}].{}", inner.field), inner.reason);
                    }
                }
            }
        }
        records
    }

    /// Hand back `value` if no field failed, otherwise every collected failure.
    pub(crate) fn finish<T>(self, record: &'static str, value: T) -> Result<T, ValidationError> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(ValidationError {
                record,
                errors: self.errors,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_points() {
        assert_eq!(coerce_points("-"), Ok(0));
        assert_eq!(coerce_points("—"), Ok(0));
        assert_eq!(coerce_points(""), Ok(0));
        assert_eq!(coerce_points("DNF"), Ok(0));
        assert_eq!(coerce_points("120"), Ok(120));
        assert_eq!(coerce_points(" 45 "), Ok(45));
        assert!(coerce_points("12a").is_err());
    }

    #[test]
    fn test_unify_section_alias() {
        let lap: RawRecord = [("lap", "Lap 1"), ("time", "12:01")].into_iter().collect();
        let section: RawRecord = [("section", "Lap 1"), ("time", "12:01")]
            .into_iter()
            .collect();
        assert_eq!(unify_section_alias(lap), section);

        let stage: RawRecord = [("stage", "Stage 3")].into_iter().collect();
        assert_eq!(unify_section_alias(stage).text("section"), Some("Stage 3"));
    }

    #[test]
    fn test_reader_collects_every_error() {
        let raw: RawRecord = [("points", "1 2"), ("start_date", "04/05/2024")]
            .into_iter()
            .collect();
        let mut reader = FieldReader::new(&raw);
        reader.points("points");
        reader.optional_date("start_date");
        reader.required_text("race_name");
        let err = reader.finish("Test", ()).unwrap_err();

        assert_eq!(err.record, "Test");
        assert_eq!(err.errors.len(), 3);
        assert!(err.has_field("points"));
        assert!(err.has_field("start_date"));
        assert!(err.has_field("race_name"));
        assert!(err.to_string().starts_with("invalid Test: "));
    }

    #[test]
    fn test_reader_blank_text_is_none() {
        let raw: RawRecord = [("rider", "  "), ("team", "Trek")].into_iter().collect();
        let mut reader = FieldReader::new(&raw);
        assert_eq!(reader.optional_text("rider"), None);
        assert_eq!(reader.optional_text("team").as_deref(), Some("Trek"));
        assert_eq!(reader.optional_text("nation"), None);
        assert!(reader.finish("Test", ()).is_ok());
    }

    struct Named(String);

    impl FromRaw for Named {
        const RECORD: &'static str = "Named";

        fn from_raw(raw: &RawRecord) -> Result<Self, ValidationError> {
            let mut fields = FieldReader::new(raw);
            let name = fields.required_text("name");
            fields.finish(Self::RECORD, Named(name))
        }
    }

    #[test]
    fn test_validate_each_keeps_valid_records() {
        let raws: Vec<RawRecord> = vec![
            [("name", "Leogang")].into_iter().collect(),
            [("name", " ")].into_iter().collect(),
            [("name", "Andorra")].into_iter().collect(),
        ];
        let (named, rejected) = validate_each::<Named>(&raws);
        let names: Vec<_> = named.iter().map(|n| n.0.as_str()).collect();
        assert_eq!(names, ["Leogang", "Andorra"]);
        assert_eq!(rejected.len(), 1);
        assert!(rejected[0].has_field("name"));
    }

    #[test]
    fn test_optional_int() {
        let raw: RawRecord = [("a", "3."), ("b", "-"), ("c", "3rd")].into_iter().collect();
        let mut reader = FieldReader::new(&raw);
        assert_eq!(reader.optional_int("a"), Some(3));
        assert_eq!(reader.optional_int("b"), None);
        assert_eq!(reader.optional_int("c"), None);
        let err = reader.finish("Test", ()).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert!(err.has_field("c"));
    }
}
