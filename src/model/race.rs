use serde::Serialize;
use strum_macros::EnumString;

use crate::validate::{FieldReader, FromRaw, RawRecord, ValidationError};

/// One race listed on an event's race-listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaceInfo {
    pub race_name: String,
    pub discipline: Option<String>,
    pub category: Option<String>,
    pub gender: Option<Gender>,
    pub race_type: RaceType,
    pub url: Option<String>,
}

/// Gender of a race field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumString, strum_macros::Display)]
#[strum(ascii_case_insensitive)]
pub enum Gender {
    Men,
    Women,
}

/// Round of a race. Races without a round marker are finals.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumString, strum_macros::Display,
)]
#[strum(ascii_case_insensitive)]
pub enum RaceType {
    #[strum(to_string = "Qualifier", serialize = "Qualifiers")]
    Qualifier,
    #[serde(rename = "Semi-Finals")]
    #[strum(
        to_string = "Semi-Finals",
        serialize = "Semi-Final",
        serialize = "Semifinals",
        serialize = "Semifinal"
    )]
    SemiFinals,
    #[default]
    #[strum(to_string = "Finals", serialize = "Final")]
    Finals,
}

impl FromRaw for RaceInfo {
    const RECORD: &'static str = "RaceInfo";

    fn from_raw(raw: &RawRecord) -> Result<Self, ValidationError> {
        let mut fields = FieldReader::new(raw);
        let race = RaceInfo {
            race_name: fields.required_text("race_name"),
            discipline: fields.optional_text("discipline"),
            category: fields.optional_text("category"),
            gender: fields.parsed("gender"),
            race_type: fields.parsed("race_type").unwrap_or_default(),
            url: fields.optional_text("url"),
        };
        fields.finish(Self::RECORD, race)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_race_type_parsing() {
        assert_eq!("qualifier".parse::<RaceType>().unwrap(), RaceType::Qualifier);
        assert_eq!("SEMI-FINALS".parse::<RaceType>().unwrap(), RaceType::SemiFinals);
        assert_eq!("Semi-final".parse::<RaceType>().unwrap(), RaceType::SemiFinals);
        assert_eq!("finals".parse::<RaceType>().unwrap(), RaceType::Finals);
        assert_eq!(RaceType::SemiFinals.to_string(), "Semi-Finals");
        assert_eq!(
            serde_json::to_value(RaceType::SemiFinals).unwrap(),
            "Semi-Finals"
        );
    }

    #[test]
    fn test_race_defaults_to_finals() {
        let raw: RawRecord = [("race_name", "Downhill: Timed Training")]
            .into_iter()
            .collect();
        let race = RaceInfo::from_raw(&raw).unwrap();
        assert_eq!(race.race_type, RaceType::Finals);
        assert_eq!(race.gender, None);
        assert_eq!(race.category, None);
        assert_eq!(race.discipline, None);
        assert_eq!(race.url, None);
    }

    #[test]
    fn test_race_requires_name_and_known_gender() {
        let raw: RawRecord = [("race_name", " "), ("gender", "Mixed")].into_iter().collect();
        let err = RaceInfo::from_raw(&raw).unwrap_err();
        assert_eq!(err.record, "RaceInfo");
        assert!(err.has_field("race_name"));
        assert!(err.has_field("gender"));
    }
}
