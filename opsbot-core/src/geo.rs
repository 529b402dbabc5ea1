//! Country → capital → timezone lookups.
//!
//! The directory is an explicit allow-list built once and then only read,
//! so it can be shared behind an `Arc` without locking.

use std::collections::HashMap;

use crate::{
    error::{Error, Result},
    model::{CapitalEntry, CountryCode},
};

#[derive(Debug, Clone, Default)]
pub struct GeoDirectory {
    capitals: HashMap<String, String>,
    timezones: HashMap<String, String>,
}

impl GeoDirectory {
    /// The stock set of supported countries.
    ///
    /// USA and AUS map to their largest city rather than the seat of
    /// government, matching what users usually mean by "the time in ...".
    pub fn builtin() -> Self {
        Self::builder()
            .country("GBR", "London")
            .country("FRA", "Paris")
            .country("USA", "New York")
            .country("JPN", "Tokyo")
            .country("AUS", "Sydney")
            .country("IND", "New Delhi")
            .timezone("London", "Europe/London")
            .timezone("Paris", "Europe/Paris")
            .timezone("New York", "America/New_York")
            .timezone("Tokyo", "Asia/Tokyo")
            .timezone("Sydney", "Australia/Sydney")
            .timezone("New Delhi", "Asia/Kolkata")
            .build()
    }

    pub fn builder() -> GeoDirectoryBuilder {
        GeoDirectoryBuilder::default()
    }

    /// Resolves only the city; callers that don't need a timezone use this.
    pub fn capital_of(&self, raw_code: &str) -> Result<(CountryCode, &str)> {
        let code = CountryCode::parse(raw_code)?;
        match self.capitals.get(code.as_str()) {
            Some(city) => Ok((code, city.as_str())),
            None => Err(Error::NotFound(raw_code.to_string())),
        }
    }

    pub fn resolve_capital(&self, raw_code: &str) -> Result<CapitalEntry> {
        let (country, city) = self.capital_of(raw_code)?;

        let timezone = self.timezones.get(city).ok_or_else(|| Error::ConfigurationInconsistency {
            capital: city.to_string(),
            detail: "no timezone mapping".to_string(),
        })?;

        Ok(CapitalEntry { country, city: city.to_string(), timezone: timezone.clone() })
    }

    /// Sorted, for stable tool descriptions.
    pub fn supported_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.capitals.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    pub fn len(&self) -> usize {
        self.capitals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capitals.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct GeoDirectoryBuilder {
    capitals: HashMap<String, String>,
    timezones: HashMap<String, String>,
}

impl GeoDirectoryBuilder {
    /// Codes are stored upper-cased so lookups stay case-insensitive.
    pub fn country(mut self, code: &str, capital: &str) -> Self {
        self.capitals.insert(code.trim().to_uppercase(), capital.to_string());
        self
    }

    pub fn timezone(mut self, capital: &str, timezone: &str) -> Self {
        self.timezones.insert(capital.to_string(), timezone.to_string());
        self
    }

    pub fn build(self) -> GeoDirectory {
        GeoDirectory { capitals: self.capitals, timezones: self.timezones }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn resolution_ignores_case_and_whitespace() {
        let dir = GeoDirectory::builtin();

        let a = dir.resolve_capital("gbr").unwrap();
        let b = dir.resolve_capital(" GBR ").unwrap();
        let c = dir.resolve_capital("GBR").unwrap();

        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.city, "London");
        assert_eq!(a.timezone, "Europe/London");
    }

    #[test]
    fn every_builtin_capital_has_a_timezone() {
        let dir = GeoDirectory::builtin();
        for code in dir.supported_codes() {
            let entry = dir.resolve_capital(code).expect("builtin entry must be complete");
            assert!(entry.timezone.parse::<chrono_tz::Tz>().is_ok(), "{}", entry.timezone);
        }
    }

    #[test]
    fn unknown_code_is_not_found_with_raw_input() {
        let dir = GeoDirectory::builtin();
        let err = dir.resolve_capital("xxx").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.user_message().contains("'xxx'"));
    }

    #[test]
    fn blank_code_is_invalid_not_missing() {
        let dir = GeoDirectory::builtin();
        let err = dir.resolve_capital("  ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn capital_without_timezone_is_inconsistency() {
        let dir = GeoDirectory::builder().country("ESP", "Madrid").build();

        let err = dir.resolve_capital("esp").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationInconsistency);

        // The city alone still resolves.
        let (code, city) = dir.capital_of("esp").unwrap();
        assert_eq!(code.as_str(), "ESP");
        assert_eq!(city, "Madrid");
    }

    #[test]
    fn independent_directories_do_not_share_state() {
        let small = GeoDirectory::builder()
            .country("deu", "Berlin")
            .timezone("Berlin", "Europe/Berlin")
            .build();

        assert_eq!(small.len(), 1);
        assert_eq!(small.resolve_capital("DEU").unwrap().city, "Berlin");
        assert!(GeoDirectory::builtin().resolve_capital("DEU").is_err());
    }

    #[test]
    fn supported_codes_are_sorted() {
        let dir = GeoDirectory::builtin();
        assert_eq!(dir.supported_codes(), vec!["AUS", "FRA", "GBR", "IND", "JPN", "USA"]);
    }
}
