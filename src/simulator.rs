//! Fleet simulator
//!
//! Plays the fleet-management collaborator for the demo: every tick it moves
//! active emergencies one lifecycle step forward and lets hospitals discharge
//! patients at random. It only touches state through the same `AppState`
//! operations the HTTP API uses, so every invariant the API keeps holds here.
//!
//! Replace this task with a real fleet feed (AVL positions, crew status
//! buttons) without changing the rest of the system.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Bernoulli, BernoulliError, Distribution};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Chance per tick that an active emergency advances one step
const ADVANCE_PROBABILITY: f64 = 0.2;

/// Chance per tick that an occupied bed frees up
const DISCHARGE_PROBABILITY: f64 = 0.05;

/// Changes applied in one tick
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub advanced: usize,
    pub discharged: usize,
}

pub struct FleetSimulator {
    /// Interval between ticks in milliseconds
    tick_ms: u64,
    advance: Bernoulli,
    discharge: Bernoulli,
}

impl FleetSimulator {
    pub fn new(tick_ms: u64) -> Result<Self, BernoulliError> {
        Self::with_probabilities(tick_ms, ADVANCE_PROBABILITY, DISCHARGE_PROBABILITY)
    }

    pub fn with_probabilities(
        tick_ms: u64,
        advance_probability: f64,
        discharge_probability: f64,
    ) -> Result<Self, BernoulliError> {
        info!(
            tick_ms,
            advance_probability, discharge_probability, "Initializing fleet simulator"
        );

        Ok(Self {
            tick_ms,
            advance: Bernoulli::new(advance_probability)?,
            discharge: Bernoulli::new(discharge_probability)?,
        })
    }

    /// Run the simulator continuously
    pub async fn run(self, state: Arc<RwLock<AppState>>) {
        info!("Starting fleet simulation loop");

        // interval() panics on a zero period
        let mut ticker = interval(Duration::from_millis(self.tick_ms.max(1)));
        let mut rng = StdRng::from_entropy();
        let mut tick_count: u64 = 0;

        loop {
            ticker.tick().await;
            tick_count += 1;

            let summary = {
                let mut app_state = state.write().await;
                self.step(&mut app_state, &mut rng)
            };

            if summary != TickSummary::default() {
                debug!(
                    tick = tick_count,
                    advanced = summary.advanced,
                    discharged = summary.discharged,
                    "Simulation tick applied"
                );
            }
        }
    }

    /// Apply one tick to `state`
    pub fn step<R: Rng + ?Sized>(&self, state: &mut AppState, rng: &mut R) -> TickSummary {
        let mut summary = TickSummary::default();

        for request_id in state.active_request_ids() {
            if !self.advance.sample(rng) {
                continue;
            }
            let Some(next) = state.request(&request_id).and_then(|r| r.status.next()) else {
                continue;
            };
            match state.advance_request(&request_id, next) {
                Ok(_) => summary.advanced += 1,
                Err(e) => warn!(request_id = %request_id, error = %e, "Simulated advance rejected"),
            }
        }

        let occupied: Vec<String> = state
            .catalog()
            .hospitals()
            .filter(|(_, h)| h.available < h.capacity)
            .map(|(_, h)| h.id.clone())
            .collect();

        for hospital_id in occupied {
            if self.discharge.sample(rng) && state.discharge(&hospital_id).is_ok() {
                summary.discharged += 1;
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::eta::FREE_FLOW;
    use crate::models::{EmergencyInput, Point, RequestStatus};
    use crate::zones::Containment;

    fn demo_state() -> AppState {
        let (catalog, fleet) = catalog::demo().into_parts();
        AppState::new(catalog, fleet, Containment::Polygon)
            .with_requests(catalog::demo_emergencies())
    }

    #[test]
    fn test_simulator_creation() {
        let simulator = FleetSimulator::new(1000).unwrap();
        assert_eq!(simulator.tick_ms, 1000);
        assert!(FleetSimulator::with_probabilities(1000, 1.5, 0.1).is_err());
    }

    #[test]
    fn test_certain_advance_walks_lifecycle() {
        let simulator = FleetSimulator::with_probabilities(10, 1.0, 0.0).unwrap();
        let mut state = demo_state();
        let mut rng = StdRng::seed_from_u64(42);

        // e2 is en-route, e3 has arrived
        let summary = simulator.step(&mut state, &mut rng);
        assert_eq!(summary, TickSummary { advanced: 2, discharged: 0 });
        assert_eq!(state.request("e2").unwrap().status, RequestStatus::Arrived);
        assert_eq!(state.request("e3").unwrap().status, RequestStatus::Completed);
        assert!(state.ambulance("a6").unwrap().is_available());

        simulator.step(&mut state, &mut rng);
        assert_eq!(state.request("e2").unwrap().status, RequestStatus::Completed);
        assert_eq!(state.available_ambulance_count(), 8);
        assert!(state.fleet().iter().all(|a| a.binding_is_consistent()));

        let idle = simulator.step(&mut state, &mut rng);
        assert_eq!(idle.advanced, 0);
    }

    #[test]
    fn test_certain_discharge_frees_beds() {
        let simulator = FleetSimulator::with_probabilities(10, 0.0, 1.0).unwrap();
        let mut state = demo_state();
        let mut rng = StdRng::seed_from_u64(7);

        let summary = simulator.step(&mut state, &mut rng);
        // Every demo hospital starts with occupied beds
        assert_eq!(summary.discharged, 4);
        assert_eq!(state.hospital("h1").unwrap().available, 9);

        for _ in 0..20 {
            simulator.step(&mut state, &mut rng);
        }
        for (_, hospital) in state.catalog().hospitals() {
            assert_eq!(hospital.available, hospital.capacity);
        }
    }

    #[tokio::test]
    async fn test_run_advances_reservations() {
        use tokio::time::timeout;

        let state = Arc::new(RwLock::new(demo_state()));
        let id = {
            let mut s = state.write().await;
            let input = EmergencyInput {
                location: Some(Point::new(22.0, 18.0)),
                symptoms: vec!["s1".into()],
                severity_score: None,
                patient_name: None,
                contact_number: None,
            };
            s.reserve(input, FREE_FLOW).unwrap().request.id
        };

        let simulator = FleetSimulator::with_probabilities(20, 1.0, 0.0).unwrap();
        let state_clone = state.clone();
        let handle = tokio::spawn(async move {
            simulator.run(state_clone).await;
        });

        timeout(std::time::Duration::from_secs(2), async {
            loop {
                {
                    let s = state.read().await;
                    if s.request(&id).map(|r| r.status) == Some(RequestStatus::Completed) {
                        break;
                    }
                }
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("Timeout waiting for simulated completion");

        let s = state.read().await;
        assert!(s.ambulance("a1").unwrap().is_available());

        handle.abort();
    }

    #[tokio::test]
    async fn test_zero_tick_keeps_running() {
        use tokio::time::timeout;

        let state = Arc::new(RwLock::new(demo_state()));
        let simulator = FleetSimulator::with_probabilities(0, 1.0, 0.0).unwrap();
        let state_clone = state.clone();
        let handle = tokio::spawn(async move {
            simulator.run(state_clone).await;
        });

        timeout(std::time::Duration::from_secs(2), async {
            loop {
                if state.read().await.active_request_count() == 0 {
                    break;
                }
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("Simulator stopped ticking");

        assert!(!handle.is_finished());
        handle.abort();
    }
}
