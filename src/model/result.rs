use serde::Serialize;

use crate::validate::{unify_section_alias, FieldReader, FromRaw, RawRecord, ValidationError};

/// One athlete's line in a race's results table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaceResult {
    /// Kept as text: `DNF`, `DNS` and similar markers share the column with ranks.
    pub position: Option<String>,
    pub rider: Option<String>,
    pub nation: Option<String>,
    pub team: Option<String>,
    pub time: Option<String>,
    pub gap: Option<String>,
    pub points: i64,
    pub details: Vec<ResultDetails>,
}

/// A lap, split or stage entry of an athlete's detailed results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultDetails {
    pub section: Option<String>,
    pub time: Option<String>,
    pub gap: Option<String>,
    pub position: Option<i64>,
}

impl FromRaw for RaceResult {
    const RECORD: &'static str = "RaceResult";

    fn from_raw(raw: &RawRecord) -> Result<Self, ValidationError> {
        let mut fields = FieldReader::new(raw);
        let result = RaceResult {
            position: fields.optional_text("position"),
            rider: fields.optional_text("rider"),
            nation: fields.optional_text("nation"),
            team: fields.optional_text("team"),
            time: fields.optional_text("time"),
            gap: fields.optional_text("gap"),
            points: fields.points("points"),
            details: fields.records("details"),
        };
        fields.finish(Self::RECORD, result)
    }
}

impl FromRaw for ResultDetails {
    const RECORD: &'static str = "ResultDetails";

    fn from_raw(raw: &RawRecord) -> Result<Self, ValidationError> {
        let raw = unify_section_alias(raw.clone());
        let mut fields = FieldReader::new(&raw);
        let details = ResultDetails {
            section: fields.optional_text("section"),
            time: fields.optional_text("time"),
            gap: fields.optional_text("gap"),
            position: fields.optional_int("position"),
        };
        fields.finish(Self::RECORD, details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_coercion() {
        for (text, expected) in [("-", 0), ("—", 0), ("120", 120), ("DNF", 0)] {
            let raw: RawRecord = [("points", text)].into_iter().collect();
            assert_eq!(RaceResult::from_raw(&raw).unwrap().points, expected, "{text}");
        }
    }

    #[test]
    fn test_missing_points_default_to_zero() {
        let raw: RawRecord = [("position", "DNS"), ("rider", "Nino SCHURTER")]
            .into_iter()
            .collect();
        let result = RaceResult::from_raw(&raw).unwrap();
        assert_eq!(result.points, 0);
        assert_eq!(result.position.as_deref(), Some("DNS"));
        assert!(result.details.is_empty());
    }

    #[test]
    fn test_section_aliases_are_indistinguishable() {
        let lap: RawRecord = [("lap", "Lap 2"), ("time", "14:32"), ("position", "4")]
            .into_iter()
            .collect();
        let section: RawRecord = [("section", "Lap 2"), ("time", "14:32"), ("position", "4")]
            .into_iter()
            .collect();
        let split: RawRecord = [("split", "Lap 2"), ("time", "14:32"), ("position", "4")]
            .into_iter()
            .collect();

        let expected = ResultDetails::from_raw(&section).unwrap();
        assert_eq!(ResultDetails::from_raw(&lap).unwrap(), expected);
        assert_eq!(ResultDetails::from_raw(&split).unwrap(), expected);
        assert_eq!(expected.position, Some(4));
    }

    #[test]
    fn test_nested_detail_errors_name_the_field() {
        let mut raw: RawRecord = [("points", "1O0")].into_iter().collect();
        let bad: RawRecord = [("stage", "Stage 1"), ("position", "1st")]
            .into_iter()
            .collect();
        raw.insert_records("details", vec![RawRecord::new(), bad]);

        let err = RaceResult::from_raw(&raw).unwrap_err();
        assert_eq!(err.record, "RaceResult");
        assert!(err.has_field("points"));
        assert!(err.has_field("details[1].position"));
    }
}
