//! Application state management
//!
//! Central state container holding the catalog, the live fleet and the
//! emergency log. It is shared as `Arc<RwLock<AppState>>`; every method that
//! takes `&mut self` runs under the write lock, so selecting an ambulance and
//! committing it happen in one exclusive section.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::dispatch::{dispatch, DispatchDecision, DispatchError, DispatchOptions, DispatchRequest};
use crate::error::{AppError, AppResult};
use crate::models::{
    Ambulance, AmbulanceStatus, EmergencyInput, EmergencyRequest, FleetSnapshot, Hospital,
    HospitalAvailability, RequestStatus,
};
use crate::zones::Containment;

/// Maximum number of emergency records to keep in memory
const MAX_REQUESTS: usize = 1000;

/// Committed dispatch: the recorded request and the decision behind it
#[derive(Debug, Clone, Serialize)]
pub struct Reservation {
    pub request: EmergencyRequest,
    pub decision: DispatchDecision,
}

/// Central application state
#[derive(Debug)]
pub struct AppState {
    catalog: Catalog,
    fleet: Vec<Ambulance>,
    /// Emergency log, oldest first
    requests: Vec<EmergencyRequest>,
    containment: Containment,
    traffic_simulation: bool,
    start_time: DateTime<Utc>,
    /// Bumped on every committed change
    revision: u64,
    total_dispatches: u64,
    connected_clients: Vec<String>,
}

impl AppState {
    /// Create new application state
    pub fn new(catalog: Catalog, fleet: Vec<Ambulance>, containment: Containment) -> Self {
        info!(
            zones = catalog.zones.len(),
            ambulances = fleet.len(),
            containment = %containment,
            "Initializing application state"
        );
        Self {
            catalog,
            fleet,
            requests: Vec::new(),
            containment,
            traffic_simulation: false,
            start_time: Utc::now(),
            revision: 0,
            total_dispatches: 0,
            connected_clients: Vec::new(),
        }
    }

    /// Use sampled congestion instead of free-flow for committed ETAs
    pub fn with_traffic_simulation(mut self, enabled: bool) -> Self {
        self.traffic_simulation = enabled;
        self
    }

    /// Seed the log with requests already in flight
    pub fn with_requests(mut self, requests: Vec<EmergencyRequest>) -> Self {
        self.requests = requests;
        self
    }

    pub fn traffic_simulation(&self) -> bool {
        self.traffic_simulation
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn fleet(&self) -> &[Ambulance] {
        &self.fleet
    }

    pub fn containment(&self) -> Containment {
        self.containment
    }

    pub fn ambulance(&self, ambulance_id: &str) -> Option<&Ambulance> {
        self.fleet.iter().find(|a| a.id == ambulance_id)
    }

    pub fn hospital(&self, hospital_id: &str) -> Option<&Hospital> {
        self.catalog.hospital(hospital_id)
    }

    pub fn request(&self, request_id: &str) -> Option<&EmergencyRequest> {
        self.requests.iter().find(|r| r.id == request_id)
    }

    /// Emergency records, most recent first
    pub fn requests_newest_first(&self) -> Vec<&EmergencyRequest> {
        self.requests.iter().rev().collect()
    }

    pub fn active_request_ids(&self) -> Vec<String> {
        self.requests
            .iter()
            .filter(|r| r.status.is_active())
            .map(|r| r.id.clone())
            .collect()
    }

    /// Run the engine against the current snapshot without committing
    pub fn preview(
        &self,
        request: &DispatchRequest,
        traffic_factor: f64,
    ) -> Result<DispatchDecision, DispatchError> {
        let options = DispatchOptions {
            containment: self.containment,
            traffic_factor,
        };
        dispatch(request, &self.catalog, &self.fleet, &options)
    }

    /// Decide and commit a dispatch atomically.
    ///
    /// On success the ambulance is `dispatched` and bound to the hospital,
    /// one bed is reserved and the request is recorded. Any failure leaves
    /// state untouched. A decision without a hospital is rejected.
    pub fn reserve(
        &mut self,
        input: EmergencyInput,
        traffic_factor: f64,
    ) -> AppResult<Reservation> {
        let request = DispatchRequest {
            location: input.location,
            symptoms: input.symptoms.clone(),
            severity_score: input.severity_score,
        };
        let decision = self.preview(&request, traffic_factor)?;

        let (Some(hospital), Some(eta)) = (decision.hospital.as_ref(), decision.eta) else {
            return Err(DispatchError::NoHospitalAvailable {
                zone_id: decision.zone_id.clone(),
            }
            .into());
        };
        let location = input.location.ok_or_else(|| {
            AppError::InternalError("Dispatch decided without a location".to_string())
        })?;

        let ambulance = self
            .fleet
            .iter_mut()
            .find(|a| a.id == decision.ambulance.id)
            .ok_or_else(|| {
                AppError::InternalError(format!("Ambulance {} vanished", decision.ambulance.id))
            })?;
        let bed = self.catalog.hospital_mut(&hospital.id).ok_or_else(|| {
            AppError::InternalError(format!("Hospital {} vanished", hospital.id))
        })?;
        let remaining = bed.available.checked_sub(1).ok_or_else(|| {
            AppError::InternalError(format!("Hospital {} has no bed to reserve", hospital.id))
        })?;

        bed.available = remaining;
        ambulance.status = AmbulanceStatus::Dispatched;
        ambulance.hospital_id = Some(hospital.id.clone());
        ambulance.eta = Some(eta);

        let mut emergency =
            EmergencyRequest::new(location, input.symptoms, decision.severity_score);
        emergency.patient_name = input.patient_name;
        emergency.contact_number = input.contact_number;
        emergency.mark_dispatched(&decision.ambulance.id, &hospital.id, eta);

        info!(
            request_id = %emergency.id,
            ambulance_id = %decision.ambulance.id,
            hospital_id = %hospital.id,
            eta,
            severity = decision.severity_score,
            beds_left = remaining,
            "Dispatch committed"
        );

        self.requests.push(emergency.clone());
        self.total_dispatches += 1;
        self.prune_history();
        self.bump();

        Ok(Reservation {
            request: emergency,
            decision,
        })
    }

    /// Move a request forward in its lifecycle.
    ///
    /// `arrived` marks the ambulance occupied; `completed` frees it at the
    /// hospital. Backward or same-status moves are rejected.
    pub fn advance_request(
        &mut self,
        request_id: &str,
        status: RequestStatus,
    ) -> AppResult<EmergencyRequest> {
        let index = self
            .requests
            .iter()
            .position(|r| r.id == request_id)
            .ok_or_else(|| AppError::NotFound(format!("Emergency {} not found", request_id)))?;

        let current = self.requests[index].status;
        if status <= current {
            return Err(AppError::InvalidTransition(format!(
                "Emergency {} cannot move from {} to {}",
                request_id, current, status
            )));
        }

        let ambulance_id = self.requests[index].ambulance_id.clone();
        let hospital_id = self.requests[index].hospital_id.clone();

        match status {
            RequestStatus::Arrived => {
                if let Some(ambulance) = ambulance_id
                    .as_deref()
                    .and_then(|id| self.fleet.iter_mut().find(|a| a.id == id))
                {
                    ambulance.status = AmbulanceStatus::Occupied;
                }
            }
            RequestStatus::Completed => {
                if let Some(id) = ambulance_id.as_deref() {
                    self.release_ambulance(id, hospital_id.as_deref(), true);
                }
            }
            _ => {}
        }

        let request = &mut self.requests[index];
        request.status = status;
        if status >= RequestStatus::Arrived {
            request.eta = None;
        }
        let updated = request.clone();

        info!(
            request_id = %request_id,
            from = %current,
            to = %status,
            "Emergency status advanced"
        );

        self.bump();
        Ok(updated)
    }

    /// Roll back a dispatch that has not yet left: free the ambulance,
    /// return the bed and drop the record
    pub fn abandon_request(&mut self, request_id: &str) -> AppResult<EmergencyRequest> {
        let index = self
            .requests
            .iter()
            .position(|r| r.id == request_id)
            .ok_or_else(|| AppError::NotFound(format!("Emergency {} not found", request_id)))?;

        let status = self.requests[index].status;
        if status != RequestStatus::Dispatched {
            return Err(AppError::InvalidTransition(format!(
                "Emergency {} is {} and can no longer be abandoned",
                request_id, status
            )));
        }

        let request = self.requests.remove(index);

        if let Some(ambulance_id) = request.ambulance_id.as_deref() {
            self.release_ambulance(ambulance_id, None, false);
        }
        if let Some(hospital) = request
            .hospital_id
            .as_deref()
            .and_then(|id| self.catalog.hospital_mut(id))
        {
            hospital.available = (hospital.available + 1).min(hospital.capacity);
        }

        warn!(request_id = %request_id, "Emergency abandoned, reservation rolled back");

        self.bump();
        Ok(request)
    }

    /// Free one bed after a patient leaves the hospital
    pub fn discharge(&mut self, hospital_id: &str) -> AppResult<Hospital> {
        let hospital = self
            .catalog
            .hospital_mut(hospital_id)
            .ok_or_else(|| AppError::NotFound(format!("Hospital {} not found", hospital_id)))?;

        if hospital.available >= hospital.capacity {
            return Err(AppError::InvalidTransition(format!(
                "Hospital {} already has all {} beds free",
                hospital_id, hospital.capacity
            )));
        }

        hospital.available += 1;
        let updated = hospital.clone();

        debug!(
            hospital_id = %hospital_id,
            available = updated.available,
            capacity = updated.capacity,
            "Patient discharged"
        );

        self.bump();
        Ok(updated)
    }

    fn release_ambulance(&mut self, ambulance_id: &str, arrived_at: Option<&str>, relocate: bool) {
        let destination = arrived_at
            .and_then(|id| self.catalog.hospital(id))
            .map(|h| h.location);

        let Some(ambulance) = self.fleet.iter_mut().find(|a| a.id == ambulance_id) else {
            warn!(ambulance_id = %ambulance_id, "Cannot release unknown ambulance");
            return;
        };

        ambulance.status = AmbulanceStatus::Available;
        ambulance.hospital_id = None;
        ambulance.eta = None;
        if relocate {
            if let Some(location) = destination {
                ambulance.location = location;
            }
        }

        debug!(
            ambulance_id = %ambulance_id,
            location = %ambulance.location,
            "Ambulance available again"
        );
    }

    /// Drop the oldest completed records once over capacity
    fn prune_history(&mut self) {
        let mut excess = self.requests.len().saturating_sub(MAX_REQUESTS);
        if excess == 0 {
            return;
        }
        self.requests.retain(|r| {
            if excess > 0 && r.status == RequestStatus::Completed {
                excess -= 1;
                false
            } else {
                true
            }
        });
    }

    fn bump(&mut self) {
        self.revision += 1;
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn total_dispatches(&self) -> u64 {
        self.total_dispatches
    }

    pub fn active_request_count(&self) -> usize {
        self.requests.iter().filter(|r| r.status.is_active()).count()
    }

    pub fn available_ambulance_count(&self) -> usize {
        self.fleet.iter().filter(|a| a.is_available()).count()
    }

    /// Current fleet and bed availability for live clients
    pub fn fleet_snapshot(&self) -> FleetSnapshot {
        FleetSnapshot {
            revision: self.revision,
            ambulances: self.fleet.clone(),
            hospitals: self
                .catalog
                .hospitals()
                .map(|(zone_id, h)| HospitalAvailability {
                    id: h.id.clone(),
                    zone_id: zone_id.to_string(),
                    available: h.available,
                    capacity: h.capacity,
                })
                .collect(),
            active_emergencies: self.active_request_count(),
        }
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        (Utc::now() - self.start_time).num_seconds() as u64
    }

    /// Register a new WebSocket client
    pub fn add_client(&mut self, client_id: String) {
        info!(client_id = %client_id, "WebSocket client connected");
        self.connected_clients.push(client_id);
    }

    /// Remove a WebSocket client
    pub fn remove_client(&mut self, client_id: &str) {
        info!(client_id = %client_id, "WebSocket client disconnected");
        self.connected_clients.retain(|id| id != client_id);
    }

    /// Get count of connected clients
    pub fn client_count(&self) -> usize {
        self.connected_clients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::eta::FREE_FLOW;
    use crate::models::Point;

    fn demo_state() -> AppState {
        let (catalog, fleet) = catalog::demo().into_parts();
        AppState::new(catalog, fleet, Containment::Polygon)
    }

    fn booking(x: f64, y: f64) -> EmergencyInput {
        EmergencyInput {
            location: Some(Point::new(x, y)),
            symptoms: vec!["s1".into(), "s2".into()],
            severity_score: None,
            patient_name: Some("John Doe".into()),
            contact_number: Some("555-1234".into()),
        }
    }

    #[test]
    fn test_app_state_creation() {
        let state = demo_state();
        assert_eq!(state.revision(), 0);
        assert_eq!(state.available_ambulance_count(), 6);
        assert_eq!(state.active_request_count(), 0);
        assert!(!state.traffic_simulation());
    }

    #[test]
    fn test_preview_does_not_mutate() {
        let state = demo_state();
        let request = DispatchRequest {
            location: Some(Point::new(22.0, 18.0)),
            symptoms: vec!["s1".into()],
            severity_score: None,
        };
        let decision = state.preview(&request, FREE_FLOW).unwrap();
        assert_eq!(decision.ambulance.id, "a1");
        assert!(state.ambulance("a1").unwrap().is_available());
        assert_eq!(state.hospital("h1").unwrap().available, 8);
        assert_eq!(state.revision(), 0);
    }

    #[test]
    fn test_reserve_commits_ambulance_and_bed() {
        let mut state = demo_state();
        let reservation = state.reserve(booking(22.0, 18.0), FREE_FLOW).unwrap();

        assert_eq!(reservation.request.status, RequestStatus::Dispatched);
        assert_eq!(reservation.request.ambulance_id.as_deref(), Some("a1"));
        assert_eq!(reservation.request.hospital_id.as_deref(), Some("h1"));
        assert_eq!(reservation.request.severity_score, 9);
        assert_eq!(reservation.request.patient_name.as_deref(), Some("John Doe"));

        let ambulance = state.ambulance("a1").unwrap();
        assert_eq!(ambulance.status, AmbulanceStatus::Dispatched);
        assert_eq!(ambulance.hospital_id.as_deref(), Some("h1"));
        assert_eq!(ambulance.eta, Some(5));
        assert!(ambulance.binding_is_consistent());

        assert_eq!(state.hospital("h1").unwrap().available, 7);
        assert_eq!(state.revision(), 1);
        assert_eq!(state.total_dispatches(), 1);
    }

    #[test]
    fn test_consecutive_reservations_never_share_an_ambulance() {
        let mut state = demo_state();
        let first = state.reserve(booking(22.0, 18.0), FREE_FLOW).unwrap();
        let second = state.reserve(booking(22.0, 18.0), FREE_FLOW).unwrap();
        assert_ne!(first.request.ambulance_id, second.request.ambulance_id);
        assert_eq!(state.hospital("h1").unwrap().available, 6);
    }

    #[test]
    fn test_reserve_until_fleet_exhausted() {
        let mut state = demo_state();
        for _ in 0..6 {
            state.reserve(booking(22.0, 18.0), FREE_FLOW).unwrap();
        }
        let err = state.reserve(booking(22.0, 18.0), FREE_FLOW).unwrap_err();
        assert!(matches!(err, AppError::NoAmbulanceAvailable(_)));
        assert_eq!(state.hospital("h1").unwrap().available, 2);
    }

    #[test]
    fn test_reserve_rejects_partial_decision() {
        let mut state = demo_state();
        state.catalog.hospital_mut("h1").unwrap().available = 0;
        let revision = state.revision();

        let err = state.reserve(booking(22.0, 18.0), FREE_FLOW).unwrap_err();
        assert!(matches!(err, AppError::NoHospitalAvailable(_)));
        assert!(state.ambulance("a1").unwrap().is_available());
        assert_eq!(state.revision(), revision);
        assert!(state.requests_newest_first().is_empty());
    }

    #[test]
    fn test_reserve_outside_zones() {
        let mut state = demo_state();
        let err = state.reserve(booking(100.0, 100.0), FREE_FLOW).unwrap_err();
        assert!(matches!(err, AppError::NoZoneForLocation(_)));
        assert_eq!(state.available_ambulance_count(), 6);
    }

    #[test]
    fn test_full_lifecycle() {
        let mut state = demo_state();
        let id = state.reserve(booking(22.0, 18.0), FREE_FLOW).unwrap().request.id;

        state.advance_request(&id, RequestStatus::EnRoute).unwrap();
        assert_eq!(state.ambulance("a1").unwrap().status, AmbulanceStatus::Dispatched);

        let arrived = state.advance_request(&id, RequestStatus::Arrived).unwrap();
        assert!(arrived.eta.is_none());
        assert_eq!(state.ambulance("a1").unwrap().status, AmbulanceStatus::Occupied);
        assert_eq!(state.active_request_count(), 1);

        state.advance_request(&id, RequestStatus::Completed).unwrap();
        let ambulance = state.ambulance("a1").unwrap();
        assert!(ambulance.is_available());
        assert!(ambulance.binding_is_consistent());
        assert_eq!(ambulance.location, Point::new(25.0, 25.0));
        assert_eq!(state.active_request_count(), 0);
        // The bed stays taken until discharge
        assert_eq!(state.hospital("h1").unwrap().available, 7);
    }

    #[test]
    fn test_status_never_regresses() {
        let mut state = demo_state();
        let id = state.reserve(booking(22.0, 18.0), FREE_FLOW).unwrap().request.id;
        state.advance_request(&id, RequestStatus::Arrived).unwrap();

        let err = state.advance_request(&id, RequestStatus::EnRoute).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
        let err = state.advance_request(&id, RequestStatus::Arrived).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
        assert_eq!(state.request(&id).unwrap().status, RequestStatus::Arrived);
    }

    #[test]
    fn test_advance_unknown_request() {
        let mut state = demo_state();
        let err = state.advance_request("e-missing", RequestStatus::EnRoute).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_abandon_rolls_back() {
        let mut state = demo_state();
        let id = state.reserve(booking(22.0, 18.0), FREE_FLOW).unwrap().request.id;

        let abandoned = state.abandon_request(&id).unwrap();
        assert_eq!(abandoned.id, id);
        assert!(state.request(&id).is_none());
        assert!(state.ambulance("a1").unwrap().is_available());
        assert_eq!(state.ambulance("a1").unwrap().location, Point::new(20.0, 15.0));
        assert_eq!(state.hospital("h1").unwrap().available, 8);
    }

    #[test]
    fn test_abandon_after_departure_rejected() {
        let mut state = demo_state();
        let id = state.reserve(booking(22.0, 18.0), FREE_FLOW).unwrap().request.id;
        state.advance_request(&id, RequestStatus::EnRoute).unwrap();

        let err = state.abandon_request(&id).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[test]
    fn test_discharge() {
        let mut state = demo_state();
        let hospital = state.discharge("h1").unwrap();
        assert_eq!(hospital.available, 9);
        state.discharge("h1").unwrap();

        let err = state.discharge("h1").unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
        assert!(matches!(state.discharge("h99"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_fleet_snapshot() {
        let mut state = demo_state();
        state.reserve(booking(22.0, 18.0), FREE_FLOW).unwrap();

        let snapshot = state.fleet_snapshot();
        assert_eq!(snapshot.revision, 1);
        assert_eq!(snapshot.ambulances.len(), 8);
        assert_eq!(snapshot.hospitals.len(), 4);
        assert_eq!(snapshot.hospitals[0].zone_id, "z1");
        assert_eq!(snapshot.hospitals[0].available, 7);
        assert_eq!(snapshot.active_emergencies, 1);
    }

    #[test]
    fn test_history_pruning_keeps_active_requests() {
        let mut state = demo_state();
        let mut completed = Vec::new();
        for _ in 0..MAX_REQUESTS {
            let mut request = EmergencyRequest::new(Point::new(22.0, 18.0), vec![], 5);
            request.status = RequestStatus::Completed;
            completed.push(request);
        }
        state = state.with_requests(completed);

        let id = state.reserve(booking(22.0, 18.0), FREE_FLOW).unwrap().request.id;
        assert_eq!(state.requests_newest_first().len(), MAX_REQUESTS);
        assert!(state.request(&id).is_some());
    }

    #[test]
    fn test_client_management() {
        let mut state = demo_state();

        state.add_client("client-1".to_string());
        state.add_client("client-2".to_string());

        assert_eq!(state.client_count(), 2);

        state.remove_client("client-1");

        assert_eq!(state.client_count(), 1);
    }
}
