//! Dispatch decision engine
//!
//! Composes zone resolution, severity scoring, ambulance and hospital
//! selection and ETA estimation into one advisory decision. Nothing here
//! mutates fleet or hospital state; committing a decision is the job of
//! [`crate::state::AppState::reserve`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::eta::{eta, FREE_FLOW};
use crate::models::{Ambulance, Hospital, Point};
use crate::selection::{best_ambulance, best_hospital};
use crate::severity::{severity_score, MAX_SEVERITY, MIN_SEVERITY};
use crate::zones::{zone_for, Containment};

/// Reasons a dispatch cannot produce a full decision
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("{0}")]
    InputValidation(String),

    #[error("No zone covers location ({x}, {y})")]
    NoZoneForLocation { x: f64, y: f64 },

    #[error("No ambulances are available")]
    NoAmbulanceAvailable,

    #[error("No hospital with free beds in zone {zone_id}")]
    NoHospitalAvailable { zone_id: String },
}

impl DispatchError {
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::InputValidation(_) => "INPUT_VALIDATION",
            DispatchError::NoZoneForLocation { .. } => "NO_ZONE_FOR_LOCATION",
            DispatchError::NoAmbulanceAvailable => "NO_AMBULANCE_AVAILABLE",
            DispatchError::NoHospitalAvailable { .. } => "NO_HOSPITAL_AVAILABLE",
        }
    }
}

/// Engine input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub location: Option<Point>,
    #[serde(default)]
    pub symptoms: Vec<String>,
    /// Overrides the symptom-based score when present
    pub severity_score: Option<u8>,
}

/// Engine tuning that is not part of a request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchOptions {
    pub containment: Containment,
    pub traffic_factor: f64,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            containment: Containment::default(),
            traffic_factor: FREE_FLOW,
        }
    }
}

/// Selected ambulance and, when the zone has room, hospital and ETA.
///
/// `hospital` and `eta` are `None` together: the zone had no hospital with a
/// free bed. Callers must handle that partial outcome explicitly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchDecision {
    pub zone_id: String,
    pub severity_score: u8,
    pub ambulance: Ambulance,
    pub hospital: Option<Hospital>,
    pub eta: Option<u32>,
}

impl DispatchDecision {
    pub fn is_partial(&self) -> bool {
        self.hospital.is_none()
    }
}

/// Decide which ambulance and hospital serve `request`
pub fn dispatch(
    request: &DispatchRequest,
    catalog: &Catalog,
    fleet: &[Ambulance],
    options: &DispatchOptions,
) -> Result<DispatchDecision, DispatchError> {
    let location = request.location.ok_or_else(|| {
        DispatchError::InputValidation("Emergency location is required for dispatch".to_string())
    })?;

    if !location.is_finite() {
        return Err(DispatchError::InputValidation(format!(
            "Emergency location {} must have finite coordinates",
            location
        )));
    }

    if let Some(score) = request.severity_score {
        if !(MIN_SEVERITY..=MAX_SEVERITY).contains(&score) {
            return Err(DispatchError::InputValidation(format!(
                "Severity score {} must be between {} and {}",
                score, MIN_SEVERITY, MAX_SEVERITY
            )));
        }
    }

    if !options.traffic_factor.is_finite() || options.traffic_factor <= 0.0 {
        return Err(DispatchError::InputValidation(format!(
            "Traffic factor {} must be a positive finite number",
            options.traffic_factor
        )));
    }

    let zone = zone_for(&location, &catalog.zones, options.containment).ok_or_else(|| {
        warn!(%location, "No zone found for the emergency location");
        DispatchError::NoZoneForLocation {
            x: location.x,
            y: location.y,
        }
    })?;

    let severity = request
        .severity_score
        .unwrap_or_else(|| severity_score(&request.symptoms));

    let ambulance = best_ambulance(&location, zone, fleet).ok_or_else(|| {
        warn!(zone_id = %zone.id, "No available ambulances");
        DispatchError::NoAmbulanceAvailable
    })?;

    let hospital = best_hospital(&location, zone);
    let minutes = hospital.map(|_| eta(&ambulance.location, &location, options.traffic_factor));

    match hospital {
        Some(hospital) => debug!(
            zone_id = %zone.id,
            severity,
            ambulance_id = %ambulance.id,
            hospital_id = %hospital.id,
            eta = minutes,
            "Dispatch decision made"
        ),
        None => warn!(
            zone_id = %zone.id,
            severity,
            ambulance_id = %ambulance.id,
            "Partial dispatch: no hospital available in zone"
        ),
    }

    Ok(DispatchDecision {
        zone_id: zone.id.clone(),
        severity_score: severity,
        ambulance: ambulance.clone(),
        hospital: hospital.cloned(),
        eta: minutes,
    })
}

/// Wire form of a dispatch result: null fields plus a failure code
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchOutcome {
    pub ambulance: Option<Ambulance>,
    pub hospital: Option<Hospital>,
    pub eta: Option<u32>,
    pub severity_score: Option<u8>,
    pub zone_id: Option<String>,
    pub failure: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<Result<DispatchDecision, DispatchError>> for DispatchOutcome {
    fn from(result: Result<DispatchDecision, DispatchError>) -> Self {
        match result {
            Ok(decision) => {
                let partial = decision.is_partial().then(|| DispatchError::NoHospitalAvailable {
                    zone_id: decision.zone_id.clone(),
                });
                Self {
                    failure: partial.as_ref().map(DispatchError::code),
                    message: partial.map(|e| e.to_string()),
                    ambulance: Some(decision.ambulance),
                    hospital: decision.hospital,
                    eta: decision.eta,
                    severity_score: Some(decision.severity_score),
                    zone_id: Some(decision.zone_id),
                }
            }
            Err(err) => Self {
                ambulance: None,
                hospital: None,
                eta: None,
                severity_score: None,
                zone_id: None,
                failure: Some(err.code()),
                message: Some(err.to_string()),
            },
        }
    }
}
