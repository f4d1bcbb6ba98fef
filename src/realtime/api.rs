//! Realtime Trains location search payloads.
//!
//! Only the fields the service rows use are modelled; everything else in the
//! response is ignored.

use serde::Deserialize;

/// `GET /json/search/{crs}/{yyyy}/{mm}/{dd}` response
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    pub location: Option<SearchLocation>,
    /// `null` when nothing runs at the station that day
    #[serde(default)]
    pub services: Option<Vec<SearchService>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchLocation {
    pub name: Option<String>,
    pub crs: Option<String>,
    pub tiploc: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchService {
    #[serde(alias = "uid")]
    pub service_uid: Option<String>,
    pub run_date: Option<String>,
    pub train_identity: Option<String>,
    pub stp_indicator: Option<String>,
    pub atoc_code: Option<String>,
    pub service_type: Option<String>,
    pub is_passenger: Option<bool>,
    pub lead_class: Option<String>,
    pub vehicle_count: Option<u32>,
    pub origin: Vec<Endpoint>,
    pub destination: Vec<Endpoint>,
    pub location_detail: Option<LocationDetail>,
}

/// Timing of the service at the searched station.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationDetail {
    pub tiploc: Option<String>,
    pub crs: Option<String>,
    pub description: Option<String>,
    pub gbtt_booked_arrival: Option<String>,
    pub gbtt_booked_departure: Option<String>,
    pub wtt_booked_arrival: Option<String>,
    pub wtt_booked_departure: Option<String>,
    pub wtt_booked_pass: Option<String>,
    pub public_arrival: Option<String>,
    pub public_departure: Option<String>,
    pub public_pass: Option<String>,
    pub realtime_arrival: Option<String>,
    pub realtime_departure: Option<String>,
    pub realtime_pass: Option<String>,
    pub platform: Option<String>,
    pub display_as: Option<String>,
    pub origin: Vec<Endpoint>,
    pub destination: Vec<Endpoint>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Endpoint {
    pub tiploc: Option<String>,
    pub description: Option<String>,
    pub working_time: Option<String>,
    pub public_time: Option<String>,
}

impl SearchResponse {
    /// Services in the response, empty when the API returned `null`.
    #[must_use]
    pub fn into_services(self) -> Vec<SearchService> {
        self.services.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_services() {
        let json = r#"{"location": {"name": "Reading", "crs": "RDG", "tiploc": "RDNGSTN"}, "services": null}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.location.unwrap().crs.as_deref(), Some("RDG"));

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert!(response.into_services().is_empty());
    }

    #[test]
    fn test_uid_alias_and_unknown_fields() {
        let json = r#"{"uid": "C1", "leadClass": "800", "vehicleCount": 9, "somethingElse": [1, 2]}"#;
        let service: SearchService = serde_json::from_str(json).unwrap();
        assert_eq!(service.service_uid.as_deref(), Some("C1"));
        assert_eq!(service.lead_class.as_deref(), Some("800"));
        assert_eq!(service.vehicle_count, Some(9));
        assert!(service.location_detail.is_none());
    }
}
