//! Destination catalog and the values derived from a destination when
//! scheduling a trip reminder.

use std::path::Path;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

/// Geographic position of a destination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Format as `35.0116°N, 135.7681°E`.
    pub fn display(&self) -> String {
        format!(
            "{:.4}°{}, {:.4}°{}",
            self.latitude.abs(),
            if self.latitude >= 0.0 { "N" } else { "S" },
            self.longitude.abs(),
            if self.longitude >= 0.0 { "E" } else { "W" },
        )
    }
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub suggested_travel_dates: Vec<String>,
}

impl Destination {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            image: None,
            location: None,
            suggested_travel_dates: Vec::new(),
        }
    }

    /// Key used for the persisted event link: the stable id when present,
    /// otherwise the display name.
    pub fn key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }

    pub fn start_date(&self) -> Option<&str> {
        self.suggested_travel_dates.first().map(String::as_str)
    }

    pub fn end_date(&self) -> Option<&str> {
        self.suggested_travel_dates.get(1).map(String::as_str)
    }

    /// Both travel dates, or `None` when the trip cannot be scheduled.
    pub fn travel_dates(&self) -> Option<(&str, &str)> {
        Some((self.start_date()?, self.end_date()?))
    }

    pub fn event_title(&self, prefix: &str) -> String {
        format!("{} {}", prefix.trim_end(), self.name)
    }

    /// Location text for the calendar entry.
    pub fn location_string(&self, include_coordinates: bool) -> String {
        match self.location {
            Some(point) if include_coordinates => format!("{} ({})", self.name, point.display()),
            _ => self.name.clone(),
        }
    }

    /// Short label like `Apr 1 - Apr 10`.
    pub fn date_range_label(&self) -> Result<String, CalendarError> {
        let (start, end) = self
            .travel_dates()
            .ok_or_else(|| CalendarError::InvalidDate(format!("{} has no travel dates", self.name)))?;
        let start = parse_travel_date(start)
            .ok_or_else(|| CalendarError::InvalidDate(start.to_string()))?;
        let end =
            parse_travel_date(end).ok_or_else(|| CalendarError::InvalidDate(end.to_string()))?;
        Ok(format!("{} - {}", start.format("%b %-d"), end.format("%b %-d")))
    }
}

/// Parse an ISO-8601 date (`2025-04-01`) or RFC 3339 timestamp into a date.
pub fn parse_travel_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    destinations: Vec<Destination>,
}

/// Immutable list of destinations loaded from the catalog JSON.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    destinations: Vec<Destination>,
}

impl Catalog {
    pub fn new(destinations: Vec<Destination>) -> Self {
        Self { destinations }
    }

    pub fn from_json(json: &str) -> Result<Self, CalendarError> {
        let file: CatalogFile =
            serde_json::from_str(json).map_err(|e| CalendarError::Catalog(e.to_string()))?;
        Ok(Self::new(file.destinations))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CalendarError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| CalendarError::Catalog(format!("{}: {}", path.display(), e)))?;
        let catalog = Self::from_json(&json)?;
        tracing::debug!(
            "Loaded {} destinations from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Find by key first, then by case-insensitive name.
    pub fn find(&self, key_or_name: &str) -> Option<&Destination> {
        self.destinations
            .iter()
            .find(|d| d.key() == key_or_name)
            .or_else(|| {
                self.destinations
                    .iter()
                    .find(|d| d.name.eq_ignore_ascii_case(key_or_name))
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Destination> {
        self.destinations.iter()
    }

    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn kyoto() -> Destination {
        Destination {
            id: None,
            name: "Kyoto".to_string(),
            description: "Temples and tea houses".to_string(),
            image: None,
            location: Some(GeoPoint {
                latitude: 35.0116,
                longitude: 135.7681,
            }),
            suggested_travel_dates: vec!["2025-04-01".to_string(), "2025-04-10".to_string()],
        }
    }

    #[test]
    fn test_key_prefers_id() {
        let mut d = kyoto();
        assert_eq!(d.key(), "Kyoto");
        d.id = Some("jp-kyoto".to_string());
        assert_eq!(d.key(), "jp-kyoto");
    }

    #[test]
    fn test_location_string_with_coordinates() {
        assert_eq!(
            kyoto().location_string(true),
            "Kyoto (35.0116°N, 135.7681°E)"
        );
        assert_eq!(kyoto().location_string(false), "Kyoto");
    }

    #[test]
    fn test_southern_western_hemisphere() {
        let lima = GeoPoint {
            latitude: -12.0464,
            longitude: -77.0428,
        };
        assert_eq!(lima.display(), "12.0464°S, 77.0428°W");
    }

    #[test]
    fn test_event_title() {
        assert_eq!(kyoto().event_title("Travel to"), "Travel to Kyoto");
        assert_eq!(kyoto().event_title("Trip to "), "Trip to Kyoto");
    }

    #[test]
    fn test_date_range_label() {
        assert_eq!(kyoto().date_range_label().unwrap(), "Apr 1 - Apr 10");
    }

    #[test]
    fn test_missing_end_date_cannot_be_scheduled() {
        let mut d = kyoto();
        d.suggested_travel_dates.truncate(1);
        assert!(d.travel_dates().is_none());
        assert!(matches!(d.date_range_label(), Err(CalendarError::InvalidDate(_))));
    }

    #[test]
    fn test_parse_travel_date_accepts_rfc3339() {
        let date = parse_travel_date("2025-04-01T09:30:00Z").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
        assert!(parse_travel_date("next tuesday").is_none());
    }

    #[test]
    fn test_catalog_from_json() {
        let json = r#"{
            "destinations": [
                {
                    "name": "Oslo",
                    "description": "Fjords",
                    "image": "https://example.com/oslo.jpg",
                    "location": { "latitude": 59.9139, "longitude": 10.7522 },
                    "suggestedTravelDates": ["2025-06-01", "2025-06-07"]
                },
                { "id": "pe-lima", "name": "Lima" }
            ]
        }"#;

        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.find("oslo").unwrap().end_date(), Some("2025-06-07"));
        assert_eq!(catalog.find("pe-lima").unwrap().name, "Lima");
        assert!(catalog.find("Atlantis").is_none());
    }

    #[test]
    fn test_catalog_rejects_malformed_json() {
        assert!(matches!(
            Catalog::from_json("{ not json"),
            Err(CalendarError::Catalog(_))
        ));
    }
}
