//! Station-level service rows and delay arithmetic.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::api::{LocationDetail, SearchService};

/// Column order of a service row file.
pub const COLUMNS: [&str; 26] = [
    "stp_indicator",
    "transport_type",
    "schedule_uid",
    "run_date",
    "train_identity",
    "this_tiploc",
    "this_crs",
    "origin_tiploc",
    "origin_description",
    "destination_tiploc",
    "destination_description",
    "gbtt_arr",
    "gbtt_dep",
    "wtt_arr",
    "wtt_dep",
    "wtt_pass",
    "actual_arr",
    "actual_arr_delay_mins",
    "actual_dep",
    "actual_dep_delay_mins",
    "actual_pass",
    "actual_pass_delay_mins",
    "platform",
    "platform_actual",
    "lead_class",
    "num_vehicles",
];

const MINUTES_PER_DAY: i32 = 24 * 60;

/// One service calling at (or passing) the queried station.
///
/// Field order matches [`COLUMNS`]; the serde names are the column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub stp_indicator: Option<String>,
    pub transport_type: String,
    pub schedule_uid: Option<String>,
    pub run_date: String,
    pub train_identity: Option<String>,
    pub this_tiploc: Option<String>,
    pub this_crs: String,
    pub origin_tiploc: Option<String>,
    pub origin_description: Option<String>,
    pub destination_tiploc: Option<String>,
    pub destination_description: Option<String>,
    pub gbtt_arr: Option<String>,
    pub gbtt_dep: Option<String>,
    pub wtt_arr: Option<String>,
    pub wtt_dep: Option<String>,
    pub wtt_pass: Option<String>,
    pub actual_arr: Option<String>,
    pub actual_arr_delay_mins: Option<i32>,
    pub actual_dep: Option<String>,
    pub actual_dep_delay_mins: Option<i32>,
    pub actual_pass: Option<String>,
    pub actual_pass_delay_mins: Option<i32>,
    pub platform: Option<String>,
    pub platform_actual: Option<String>,
    pub lead_class: Option<String>,
    pub num_vehicles: Option<u32>,
}

impl ServiceRecord {
    /// Build the row for one search result at station `crs` on `run_date`.
    #[must_use]
    pub fn from_service(service: &SearchService, crs: &str, run_date: NaiveDate) -> Self {
        let detail = service.location_detail.clone().unwrap_or_default();
        let origin = first_non_empty(&service.origin, &detail.origin).first().cloned();
        let destination = first_non_empty(&service.destination, &detail.destination)
            .last()
            .cloned();

        let LocationDetail {
            tiploc,
            gbtt_booked_arrival,
            gbtt_booked_departure,
            wtt_booked_arrival,
            wtt_booked_departure,
            wtt_booked_pass,
            public_arrival,
            public_departure,
            public_pass,
            realtime_arrival,
            realtime_departure,
            realtime_pass,
            platform,
            ..
        } = detail;

        Self {
            stp_indicator: service.stp_indicator.clone(),
            transport_type: "T".to_string(),
            schedule_uid: service.service_uid.clone(),
            run_date: run_date.format("%Y-%m-%d").to_string(),
            train_identity: service.train_identity.clone(),
            this_tiploc: tiploc,
            this_crs: crs.to_string(),
            origin_tiploc: origin.as_ref().and_then(|o| o.tiploc.clone()),
            origin_description: origin.and_then(|o| o.description),
            destination_tiploc: destination.as_ref().and_then(|d| d.tiploc.clone()),
            destination_description: destination.and_then(|d| d.description),
            actual_arr_delay_mins: delay_minutes(realtime_arrival.as_deref(), gbtt_booked_arrival.as_deref()),
            actual_dep_delay_mins: delay_minutes(realtime_departure.as_deref(), gbtt_booked_departure.as_deref()),
            actual_pass_delay_mins: delay_minutes(realtime_pass.as_deref(), public_pass.as_deref()),
            gbtt_arr: gbtt_booked_arrival,
            gbtt_dep: gbtt_booked_departure,
            wtt_arr: wtt_booked_arrival.or(public_arrival),
            wtt_dep: wtt_booked_departure.or(public_departure),
            wtt_pass: wtt_booked_pass.or(public_pass),
            actual_arr: realtime_arrival,
            actual_dep: realtime_departure,
            actual_pass: realtime_pass,
            platform_actual: platform.clone(),
            platform,
            lead_class: service.lead_class.clone(),
            num_vehicles: service.vehicle_count,
        }
    }
}

fn first_non_empty<'a, T>(primary: &'a [T], fallback: &'a [T]) -> &'a [T] {
    if primary.is_empty() { fallback } else { primary }
}

/// Minutes past midnight of an `HHMM` (optionally `HHMMss`) time.
#[must_use]
pub fn minutes_of_day(time: &str) -> Option<i32> {
    let digits = time.get(..4)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    (hours < 24 && minutes < 60).then_some(hours * 60 + minutes)
}

/// `actual - planned` in minutes, wrapped across midnight.
#[must_use]
pub fn delay_minutes(actual: Option<&str>, planned: Option<&str>) -> Option<i32> {
    let diff = minutes_of_day(actual?)? - minutes_of_day(planned?)?;
    Some(if diff > MINUTES_PER_DAY / 2 {
        diff - MINUTES_PER_DAY
    } else if diff < -MINUTES_PER_DAY / 2 {
        diff + MINUTES_PER_DAY
    } else {
        diff
    })
}
