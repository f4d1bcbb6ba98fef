//! Realtime module
//!
//! Station searches against the Realtime Trains API, turned into one row per
//! service with booked, working and actual times plus delay minutes.

pub mod api;
pub mod client;
pub mod record;

pub use client::RealtimeClient;
pub use record::{COLUMNS, ServiceRecord, delay_minutes, minutes_of_day};
