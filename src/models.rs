//! Data models for the dispatch domain
//!
//! Defines the zones, hospitals, ambulances, symptoms and emergency requests
//! shared by the decision engine, the reservation shell and the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Planar coordinate, 1 unit ≈ 1 km
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Receiving hospital, owned by exactly one zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Hospital {
    #[validate(length(min = 1, message = "Hospital id must not be empty"))]
    pub id: String,

    #[validate(length(min = 1, message = "Hospital name must not be empty"))]
    pub name: String,

    pub location: Point,

    /// Total bed capacity
    #[validate(range(min = 1, message = "Hospital capacity must be positive"))]
    pub capacity: u32,

    /// Currently free beds, never above `capacity`
    pub available: u32,
}

impl Hospital {
    /// Share of free beds in `[0, 1]`; a zero-capacity hospital reports 0
    pub fn availability_ratio(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        f64::from(self.available) / f64::from(self.capacity)
    }

    pub fn has_free_bed(&self) -> bool {
        self.available > 0 && self.capacity > 0
    }
}

/// Fixed geographic partition of the service area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Zone {
    #[validate(length(min = 1, message = "Zone id must not be empty"))]
    pub id: String,

    pub name: String,

    /// Display color, e.g. `#FF5733`
    pub color: String,

    /// Ordered boundary polygon vertices
    #[validate(length(min = 4, message = "Zone boundary needs at least 4 vertices"))]
    pub boundary: Vec<Point>,

    #[serde(default)]
    pub hospitals: Vec<Hospital>,
}

impl Zone {
    pub fn hospital(&self, hospital_id: &str) -> Option<&Hospital> {
        self.hospitals.iter().find(|h| h.id == hospital_id)
    }
}

/// Ambulance lifecycle: available → dispatched → occupied → available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbulanceStatus {
    Available,
    Dispatched,
    Occupied,
}

impl fmt::Display for AmbulanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AmbulanceStatus::Available => "available",
            AmbulanceStatus::Dispatched => "dispatched",
            AmbulanceStatus::Occupied => "occupied",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Ambulance {
    #[validate(length(min = 1, message = "Ambulance id must not be empty"))]
    pub id: String,

    /// Home zone; grants a same-zone bonus but does not restrict dispatch
    pub zone_id: String,

    pub status: AmbulanceStatus,

    pub location: Point,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<u32>,
}

impl Ambulance {
    pub fn available(id: &str, zone_id: &str, location: Point) -> Self {
        Self {
            id: id.to_string(),
            zone_id: zone_id.to_string(),
            status: AmbulanceStatus::Available,
            location,
            hospital_id: None,
            eta: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == AmbulanceStatus::Available
    }

    /// Available units carry no binding; busy units carry both hospital and ETA
    pub fn binding_is_consistent(&self) -> bool {
        match self.status {
            AmbulanceStatus::Available => self.hospital_id.is_none() && self.eta.is_none(),
            AmbulanceStatus::Dispatched | AmbulanceStatus::Occupied => {
                self.hospital_id.is_some() && self.eta.is_some()
            }
        }
    }
}

/// Symptom reference data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Symptom {
    #[validate(length(min = 1, message = "Symptom id must not be empty"))]
    pub id: String,

    pub name: String,

    #[validate(range(min = 1, max = 10, message = "Severity weight must be between 1 and 10"))]
    pub severity_weight: u8,

    #[serde(default)]
    pub description: String,
}

/// Emergency request lifecycle, forward-only
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStatus {
    Pending,
    Dispatched,
    EnRoute,
    Arrived,
    Completed,
}

impl RequestStatus {
    pub fn next(self) -> Option<Self> {
        match self {
            RequestStatus::Pending => Some(RequestStatus::Dispatched),
            RequestStatus::Dispatched => Some(RequestStatus::EnRoute),
            RequestStatus::EnRoute => Some(RequestStatus::Arrived),
            RequestStatus::Arrived => Some(RequestStatus::Completed),
            RequestStatus::Completed => None,
        }
    }

    /// Requests still holding an ambulance
    pub fn is_active(self) -> bool {
        matches!(
            self,
            RequestStatus::Dispatched | RequestStatus::EnRoute | RequestStatus::Arrived
        )
    }

    /// Progress percentage shown by trackers
    pub fn progress(self) -> u8 {
        match self {
            RequestStatus::Pending => 0,
            RequestStatus::Dispatched => 25,
            RequestStatus::EnRoute => 50,
            RequestStatus::Arrived => 75,
            RequestStatus::Completed => 100,
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Dispatched => "dispatched",
            RequestStatus::EnRoute => "en-route",
            RequestStatus::Arrived => "arrived",
            RequestStatus::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// Recorded emergency; references ambulance and hospital by id only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyRequest {
    pub id: String,
    pub location: Point,
    pub symptoms: Vec<String>,
    pub severity_score: u8,
    pub timestamp: DateTime<Utc>,
    pub status: RequestStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ambulance_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hospital_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
}

impl EmergencyRequest {
    /// Create a pending request stamped with the current time
    pub fn new(location: Point, symptoms: Vec<String>, severity_score: u8) -> Self {
        Self {
            id: new_request_id(),
            location,
            symptoms,
            severity_score,
            timestamp: Utc::now(),
            status: RequestStatus::Pending,
            ambulance_id: None,
            hospital_id: None,
            eta: None,
            patient_name: None,
            contact_number: None,
        }
    }

    pub fn mark_dispatched(&mut self, ambulance_id: &str, hospital_id: &str, eta: u32) {
        self.status = RequestStatus::Dispatched;
        self.ambulance_id = Some(ambulance_id.to_string());
        self.hospital_id = Some(hospital_id.to_string());
        self.eta = Some(eta);
    }
}

/// Opaque request identifier, unique for the life of the process
pub fn new_request_id() -> String {
    format!("e-{}", Uuid::new_v4().simple())
}

/// Input DTO for booking an ambulance
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EmergencyInput {
    pub location: Option<Point>,

    #[serde(default)]
    #[validate(length(min = 1, message = "Please select at least one symptom"))]
    pub symptoms: Vec<String>,

    /// Caller-assessed score, overrides the symptom-based score
    #[validate(range(min = 1, max = 10, message = "Severity score must be between 1 and 10"))]
    pub severity_score: Option<u8>,

    #[validate(length(max = 120, message = "Patient name must be at most 120 characters"))]
    pub patient_name: Option<String>,

    #[validate(length(max = 32, message = "Contact number must be at most 32 characters"))]
    pub contact_number: Option<String>,
}

/// Free-bed view of a hospital for live clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HospitalAvailability {
    pub id: String,
    pub zone_id: String,
    pub available: u32,
    pub capacity: u32,
}

/// Point-in-time view of fleet and hospital state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetSnapshot {
    pub revision: u64,
    pub ambulances: Vec<Ambulance>,
    pub hospitals: Vec<HospitalAvailability>,
    pub active_emergencies: usize,
}

/// WebSocket message types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    /// Fleet or hospital state changed
    FleetUpdate(FleetSnapshot),
    /// Connection acknowledgment
    Connected { client_id: String },
    /// Error message
    Error { message: String },
    /// Heartbeat/ping
    Ping,
    /// Heartbeat/pong response
    Pong,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub active_emergencies: usize,
    pub available_ambulances: usize,
    pub total_dispatches: u64,
    pub connected_clients: usize,
}
