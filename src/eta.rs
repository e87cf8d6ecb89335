//! Travel time estimation

use rand::Rng;

use crate::geometry::distance;
use crate::models::Point;

/// Average ambulance speed in distance units per minute (40 km/h)
pub const AVERAGE_SPEED_PER_MINUTE: f64 = 0.67;

/// Traffic multiplier for free-flowing roads
pub const FREE_FLOW: f64 = 1.0;

/// Whole-minute travel time, never below one minute
pub fn eta(from: &Point, to: &Point, traffic_factor: f64) -> u32 {
    let minutes = distance(from, to) / AVERAGE_SPEED_PER_MINUTE * traffic_factor;
    // float → int casts saturate; NaN becomes 0 and is lifted to the floor
    (minutes.round() as u32).max(1)
}

/// Stand-in for live traffic data: a congestion multiplier in `[1.0, 1.5)`
pub fn sample_traffic_factor<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen_range(1.0..1.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_eta_from_distance() {
        // 3.606 units / 0.67 = 5.38 minutes
        let minutes = eta(&Point::new(20.0, 15.0), &Point::new(22.0, 18.0), FREE_FLOW);
        assert_eq!(minutes, 5);
    }

    #[test]
    fn test_eta_floor_is_one_minute() {
        let p = Point::new(25.0, 25.0);
        assert_eq!(eta(&p, &p, FREE_FLOW), 1);
        assert_eq!(eta(&p, &Point::new(25.1, 25.0), FREE_FLOW), 1);
    }

    #[test]
    fn test_eta_monotonic_in_distance() {
        let origin = Point::new(0.0, 0.0);
        let mut previous = 0;
        for step in 0..200 {
            let minutes = eta(&origin, &Point::new(step as f64 * 0.37, 0.0), FREE_FLOW);
            assert!(minutes >= previous);
            assert!(minutes >= 1);
            previous = minutes;
        }
    }

    #[test]
    fn test_eta_monotonic_in_traffic() {
        let from = Point::new(20.0, 15.0);
        let to = Point::new(55.0, 55.0);
        let mut previous = 0;
        for step in 0..50 {
            let factor = 1.0 + step as f64 * 0.1;
            let minutes = eta(&from, &to, factor);
            assert!(minutes >= previous);
            previous = minutes;
        }
        assert!(eta(&from, &to, 1.5) > eta(&from, &to, FREE_FLOW));
    }

    #[test]
    fn test_sampled_traffic_factor_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let factor = sample_traffic_factor(&mut rng);
            assert!((1.0..1.5).contains(&factor));
        }
    }
}
