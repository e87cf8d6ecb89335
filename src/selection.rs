//! Hospital and ambulance ranking
//!
//! Both selectors score candidates, sort descending with a stable sort so
//! that input order breaks ties, and return the top entry.

use std::cmp::Ordering;

use crate::geometry::{distance, proximity};
use crate::models::{Ambulance, Hospital, Point, Zone};

const HOSPITAL_AVAILABILITY_WEIGHT: f64 = 0.7;
const HOSPITAL_PROXIMITY_WEIGHT: f64 = 0.3;

const AMBULANCE_PROXIMITY_WEIGHT: f64 = 0.7;
const SAME_ZONE_BONUS: f64 = 0.3;

/// `0.7 × free-bed ratio + 0.3 × 1/distance`
pub fn hospital_score(location: &Point, hospital: &Hospital) -> f64 {
    HOSPITAL_AVAILABILITY_WEIGHT * hospital.availability_ratio()
        + HOSPITAL_PROXIMITY_WEIGHT * proximity(distance(location, &hospital.location))
}

/// `0.7 × 1/distance + 0.3` when the unit belongs to the requesting zone
pub fn ambulance_score(location: &Point, zone: &Zone, ambulance: &Ambulance) -> f64 {
    let bonus = if ambulance.zone_id == zone.id {
        SAME_ZONE_BONUS
    } else {
        0.0
    };
    AMBULANCE_PROXIMITY_WEIGHT * proximity(distance(location, &ambulance.location)) + bonus
}

fn by_score_desc<T>(a: &(T, f64), b: &(T, f64)) -> Ordering {
    b.1.total_cmp(&a.1)
}

/// Hospitals of `zone` with a free bed, best first
pub fn rank_hospitals<'a>(location: &Point, zone: &'a Zone) -> Vec<(&'a Hospital, f64)> {
    let mut ranked: Vec<_> = zone
        .hospitals
        .iter()
        .filter(|h| h.has_free_bed())
        .map(|h| (h, hospital_score(location, h)))
        .collect();
    ranked.sort_by(by_score_desc);
    ranked
}

/// Best receiving hospital inside `zone`; there is no cross-zone fallback
pub fn best_hospital<'a>(location: &Point, zone: &'a Zone) -> Option<&'a Hospital> {
    rank_hospitals(location, zone).into_iter().next().map(|(h, _)| h)
}

/// Available ambulances from the whole fleet, best first
pub fn rank_ambulances<'a>(
    location: &Point,
    zone: &Zone,
    fleet: &'a [Ambulance],
) -> Vec<(&'a Ambulance, f64)> {
    let mut ranked: Vec<_> = fleet
        .iter()
        .filter(|a| a.is_available())
        .map(|a| (a, ambulance_score(location, zone, a)))
        .collect();
    ranked.sort_by(by_score_desc);
    ranked
}

/// Best available ambulance for an emergency in `zone`
pub fn best_ambulance<'a>(
    location: &Point,
    zone: &Zone,
    fleet: &'a [Ambulance],
) -> Option<&'a Ambulance> {
    rank_ambulances(location, zone, fleet)
        .into_iter()
        .next()
        .map(|(a, _)| a)
}
