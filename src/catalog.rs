//! Reference catalogs
//!
//! Zones (with their hospitals), the symptom table and the initial fleet are
//! loaded once at startup and handed explicitly to every engine call.

use anyhow::Context;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{
    Ambulance, AmbulanceStatus, EmergencyRequest, Hospital, Point, RequestStatus, Symptom, Zone,
};
use crate::validation::validate_model;

/// Symptom lookup table keyed by id, iteration in catalog order
#[derive(Debug, Clone, Default)]
pub struct SymptomCatalog {
    symptoms: Vec<Symptom>,
    index: HashMap<String, usize>,
}

impl SymptomCatalog {
    pub fn new(symptoms: Vec<Symptom>) -> Self {
        let index = symptoms
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();
        Self { symptoms, index }
    }

    pub fn get(&self, id: &str) -> Option<&Symptom> {
        self.index.get(id).map(|&i| &self.symptoms[i])
    }

    pub fn all(&self) -> &[Symptom] {
        &self.symptoms
    }
}

/// Zones and symptoms the engine reads
#[derive(Debug, Clone)]
pub struct Catalog {
    pub zones: Vec<Zone>,
    pub symptoms: SymptomCatalog,
}

impl Catalog {
    pub fn hospital(&self, hospital_id: &str) -> Option<&Hospital> {
        self.zones.iter().find_map(|z| z.hospital(hospital_id))
    }

    pub fn hospital_mut(&mut self, hospital_id: &str) -> Option<&mut Hospital> {
        self.zones
            .iter_mut()
            .flat_map(|z| z.hospitals.iter_mut())
            .find(|h| h.id == hospital_id)
    }

    /// Hospitals paired with the id of the zone owning them
    pub fn hospitals(&self) -> impl Iterator<Item = (&str, &Hospital)> {
        self.zones
            .iter()
            .flat_map(|z| z.hospitals.iter().map(move |h| (z.id.as_str(), h)))
    }
}

/// On-disk catalog layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSource {
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub symptoms: Vec<Symptom>,
    #[serde(default)]
    pub fleet: Vec<Ambulance>,
}

impl CatalogSource {
    pub fn into_parts(self) -> (Catalog, Vec<Ambulance>) {
        let catalog = Catalog {
            zones: self.zones,
            symptoms: SymptomCatalog::new(self.symptoms),
        };
        (catalog, self.fleet)
    }
}

/// Load and validate a catalog file (TOML, JSON or YAML by extension)
pub fn load_catalog(path: impl AsRef<Path>) -> anyhow::Result<CatalogSource> {
    let path = path.as_ref();

    let source: CatalogSource = config::Config::builder()
        .add_source(config::File::from(path).required(true))
        .build()
        .with_context(|| format!("Failed to read catalog from {}", path.display()))?
        .try_deserialize()
        .with_context(|| format!("Catalog {} has an unexpected layout", path.display()))?;

    validate_catalog(&source)
        .with_context(|| format!("Catalog {} failed validation", path.display()))?;

    info!(
        path = %path.display(),
        zones = source.zones.len(),
        symptoms = source.symptoms.len(),
        ambulances = source.fleet.len(),
        "Catalog loaded"
    );

    Ok(source)
}

/// Check catalog invariants before the engine ever sees it
pub fn validate_catalog(source: &CatalogSource) -> AppResult<()> {
    if source.zones.is_empty() {
        return Err(AppError::ValidationError(
            "Catalog must define at least one zone".to_string(),
        ));
    }

    let mut zone_ids = HashSet::new();
    let mut hospital_ids = HashSet::new();

    for zone in &source.zones {
        validate_model(zone)?;

        if !zone_ids.insert(zone.id.as_str()) {
            return Err(AppError::ValidationError(format!(
                "Duplicate zone id: {}",
                zone.id
            )));
        }

        if !zone.boundary.iter().all(Point::is_finite) {
            return Err(AppError::ValidationError(format!(
                "Zone {} has a non-finite boundary vertex",
                zone.id
            )));
        }

        for hospital in &zone.hospitals {
            validate_model(hospital)?;

            if !hospital_ids.insert(hospital.id.as_str()) {
                return Err(AppError::ValidationError(format!(
                    "Duplicate hospital id: {}",
                    hospital.id
                )));
            }

            if hospital.available > hospital.capacity {
                return Err(AppError::ValidationError(format!(
                    "Hospital {} has {} available beds but capacity {}",
                    hospital.id, hospital.available, hospital.capacity
                )));
            }

            if !hospital.location.is_finite() {
                return Err(AppError::ValidationError(format!(
                    "Hospital {} has a non-finite location",
                    hospital.id
                )));
            }
        }
    }

    let mut symptom_ids = HashSet::new();
    for symptom in &source.symptoms {
        validate_model(symptom)?;
        if !symptom_ids.insert(symptom.id.as_str()) {
            return Err(AppError::ValidationError(format!(
                "Duplicate symptom id: {}",
                symptom.id
            )));
        }
    }

    let mut ambulance_ids = HashSet::new();
    for ambulance in &source.fleet {
        validate_model(ambulance)?;

        if !ambulance_ids.insert(ambulance.id.as_str()) {
            return Err(AppError::ValidationError(format!(
                "Duplicate ambulance id: {}",
                ambulance.id
            )));
        }

        if !ambulance.location.is_finite() {
            return Err(AppError::ValidationError(format!(
                "Ambulance {} has a non-finite location",
                ambulance.id
            )));
        }

        if !ambulance.binding_is_consistent() {
            return Err(AppError::ValidationError(format!(
                "Ambulance {} is {} but its hospital/ETA binding does not match",
                ambulance.id, ambulance.status
            )));
        }

        if let Some(hospital_id) = &ambulance.hospital_id {
            if !hospital_ids.contains(hospital_id.as_str()) {
                return Err(AppError::ValidationError(format!(
                    "Ambulance {} is bound to unknown hospital {}",
                    ambulance.id, hospital_id
                )));
            }
        }

        if !zone_ids.contains(ambulance.zone_id.as_str()) {
            warn!(
                ambulance_id = %ambulance.id,
                zone_id = %ambulance.zone_id,
                "Ambulance home zone is not in the catalog; it will never get a same-zone bonus"
            );
        }
    }

    Ok(())
}

fn rectangle(min: (f64, f64), max: (f64, f64)) -> Vec<Point> {
    vec![
        Point::new(min.0, min.1),
        Point::new(max.0, min.1),
        Point::new(max.0, max.1),
        Point::new(min.0, max.1),
    ]
}

fn hospital(id: &str, name: &str, location: (f64, f64), capacity: u32, available: u32) -> Hospital {
    Hospital {
        id: id.to_string(),
        name: name.to_string(),
        location: Point::new(location.0, location.1),
        capacity,
        available,
    }
}

fn symptom(id: &str, name: &str, severity_weight: u8, description: &str) -> Symptom {
    Symptom {
        id: id.to_string(),
        name: name.to_string(),
        severity_weight,
        description: description.to_string(),
    }
}

fn busy(
    id: &str,
    zone_id: &str,
    status: AmbulanceStatus,
    location: (f64, f64),
    hospital_id: &str,
    eta: u32,
) -> Ambulance {
    Ambulance {
        id: id.to_string(),
        zone_id: zone_id.to_string(),
        status,
        location: Point::new(location.0, location.1),
        hospital_id: Some(hospital_id.to_string()),
        eta: Some(eta),
    }
}

/// Built-in demo city: four districts on a 60×60 grid
pub fn demo() -> CatalogSource {
    let zones = vec![
        Zone {
            id: "z1".into(),
            name: "North District".into(),
            color: "#FF5733".into(),
            boundary: rectangle((10.0, 10.0), (40.0, 40.0)),
            hospitals: vec![hospital("h1", "North General Hospital", (25.0, 25.0), 10, 8)],
        },
        Zone {
            id: "z2".into(),
            name: "East District".into(),
            color: "#33FF57".into(),
            boundary: rectangle((40.0, 10.0), (70.0, 40.0)),
            hospitals: vec![hospital("h2", "East Medical Center", (55.0, 25.0), 12, 5)],
        },
        Zone {
            id: "z3".into(),
            name: "South District".into(),
            color: "#3357FF".into(),
            boundary: rectangle((10.0, 40.0), (40.0, 70.0)),
            hospitals: vec![hospital("h3", "South Community Hospital", (25.0, 55.0), 8, 4)],
        },
        Zone {
            id: "z4".into(),
            name: "West District".into(),
            color: "#F3FF33".into(),
            boundary: rectangle((40.0, 40.0), (70.0, 70.0)),
            hospitals: vec![hospital("h4", "West Emergency Center", (55.0, 55.0), 15, 10)],
        },
    ];

    let symptoms = vec![
        symptom("s1", "Chest Pain", 9, "Pain or discomfort in the chest"),
        symptom("s2", "Difficulty Breathing", 9, "Shortness of breath or breathing problems"),
        symptom("s3", "Unconscious", 10, "Not responsive or unconscious"),
        symptom("s4", "Severe Bleeding", 8, "Heavy blood loss from wound"),
        symptom("s5", "Head Injury", 8, "Trauma to the head"),
        symptom("s6", "Fracture", 6, "Broken or fractured bone"),
        symptom("s7", "Burn", 7, "Skin burn from heat, chemicals, or electricity"),
        symptom("s8", "Stroke Symptoms", 9, "Face drooping, arm weakness, speech difficulty"),
        symptom("s9", "Seizure", 7, "Convulsions or fits"),
        symptom(
            "s10",
            "Allergic Reaction",
            8,
            "Severe allergic reaction with swelling or breathing issues",
        ),
        symptom("s11", "Abdominal Pain", 6, "Severe pain in the abdomen"),
        symptom("s12", "Heart Palpitations", 7, "Irregular or racing heartbeat"),
    ];

    let fleet = vec![
        Ambulance::available("a1", "z1", Point::new(20.0, 15.0)),
        Ambulance::available("a2", "z1", Point::new(30.0, 30.0)),
        Ambulance::available("a3", "z2", Point::new(50.0, 15.0)),
        busy("a4", "z2", AmbulanceStatus::Dispatched, (60.0, 25.0), "h2", 6),
        Ambulance::available("a5", "z3", Point::new(20.0, 50.0)),
        busy("a6", "z3", AmbulanceStatus::Occupied, (30.0, 60.0), "h3", 4),
        Ambulance::available("a7", "z4", Point::new(50.0, 50.0)),
        Ambulance::available("a8", "z4", Point::new(60.0, 65.0)),
    ];

    CatalogSource {
        zones,
        symptoms,
        fleet,
    }
}

/// Requests already in flight for the demo fleet's busy units (a4, a6)
pub fn demo_emergencies() -> Vec<EmergencyRequest> {
    let now = Utc::now();

    let mut en_route =
        EmergencyRequest::new(Point::new(52.0, 28.0), vec!["s6".into(), "s7".into()], 7);
    en_route.id = "e2".into();
    en_route.timestamp = now - Duration::minutes(3);
    en_route.mark_dispatched("a4", "h2", 6);
    en_route.status = RequestStatus::EnRoute;
    en_route.patient_name = Some("Jane Smith".into());
    en_route.contact_number = Some("555-5678".into());

    let mut arrived = EmergencyRequest::new(Point::new(25.0, 58.0), vec!["s3".into()], 10);
    arrived.id = "e3".into();
    arrived.timestamp = now - Duration::minutes(5);
    arrived.mark_dispatched("a6", "h3", 4);
    arrived.status = RequestStatus::Arrived;
    arrived.eta = None;
    arrived.patient_name = Some("Mike Johnson".into());
    arrived.contact_number = Some("555-9012".into());

    vec![en_route, arrived]
}
