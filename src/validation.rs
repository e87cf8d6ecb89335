//! Input validation module
//!
//! Boundary checks for dispatch requests, coordinates and API parameters.
//! Everything here fails fast so no NaN or out-of-range value reaches the
//! decision engine.

use crate::error::{AppError, AppResult};
use crate::models::{EmergencyInput, Point};
use tracing::{debug, warn};
use validator::{Validate, ValidationErrors};

/// Dispatch input constraints
pub struct DispatchConstraints;

impl DispatchConstraints {
    /// Traffic multiplier range; 1.0 is free-flow
    pub const TRAFFIC_MIN: f64 = 0.1;
    pub const TRAFFIC_MAX: f64 = 10.0;

    /// Severity score range
    pub const SEVERITY_MIN: u8 = 1;
    pub const SEVERITY_MAX: u8 = 10;

    /// Upper bound on symptoms reported in one request
    pub const MAX_SYMPTOMS: usize = 32;
}

/// Run derive-based validation and flatten the messages
pub fn validate_model<T: Validate>(model: &T) -> AppResult<()> {
    model.validate().map_err(|errors| {
        let message = flatten_errors(&errors);
        warn!(errors = %message, "Model validation failed");
        AppError::ValidationError(message)
    })
}

fn flatten_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let msgs: Vec<&str> = errors
                .iter()
                .filter_map(|e| e.message.as_ref().map(|c| c.as_ref()))
                .collect();
            format!("{}: {}", field, msgs.join(", "))
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

/// Validate an ambulance booking
pub fn validate_emergency_input(input: &EmergencyInput) -> AppResult<()> {
    let location = input.location.as_ref().ok_or_else(|| {
        AppError::ValidationError("Please select a location on the map".to_string())
    })?;
    validate_point(location)?;

    validate_model(input)?;
    validate_symptom_ids(&input.symptoms)?;

    debug!("Emergency input validation passed");
    Ok(())
}

/// Validate a coordinate pair
pub fn validate_point(point: &Point) -> AppResult<()> {
    if !point.is_finite() {
        return Err(AppError::ValidationError(format!(
            "Location {} must have finite coordinates",
            point
        )));
    }
    Ok(())
}

/// Validate reported symptom identifiers
pub fn validate_symptom_ids(symptoms: &[String]) -> AppResult<()> {
    if symptoms.len() > DispatchConstraints::MAX_SYMPTOMS {
        return Err(AppError::ValidationError(format!(
            "At most {} symptoms may be reported",
            DispatchConstraints::MAX_SYMPTOMS
        )));
    }

    if symptoms.iter().any(|id| id.trim().is_empty()) {
        return Err(AppError::ValidationError(
            "Symptom identifiers must not be blank".to_string(),
        ));
    }

    Ok(())
}

/// Validate a caller-supplied severity score
pub fn validate_severity_score(score: u8) -> AppResult<()> {
    if !(DispatchConstraints::SEVERITY_MIN..=DispatchConstraints::SEVERITY_MAX).contains(&score) {
        return Err(AppError::ValidationError(format!(
            "Severity score {} out of valid range [{}, {}]",
            score,
            DispatchConstraints::SEVERITY_MIN,
            DispatchConstraints::SEVERITY_MAX
        )));
    }
    Ok(())
}

/// Validate a traffic multiplier
pub fn validate_traffic_factor(value: f64) -> AppResult<()> {
    if !value.is_finite() {
        return Err(AppError::ValidationError(
            "Traffic factor must be a finite number".to_string(),
        ));
    }

    if value < DispatchConstraints::TRAFFIC_MIN || value > DispatchConstraints::TRAFFIC_MAX {
        return Err(AppError::ValidationError(format!(
            "Traffic factor {} out of valid range [{}, {}]",
            value,
            DispatchConstraints::TRAFFIC_MIN,
            DispatchConstraints::TRAFFIC_MAX
        )));
    }

    Ok(())
}

/// Validate pagination parameters
pub fn validate_pagination(page: Option<u32>, limit: Option<u32>) -> AppResult<(u32, u32)> {
    let page = page.unwrap_or(1);
    let limit = limit.unwrap_or(100);

    if page == 0 {
        return Err(AppError::ValidationError(
            "Page number must be greater than 0".to_string(),
        ));
    }

    if limit == 0 || limit > 1000 {
        return Err(AppError::ValidationError(
            "Limit must be between 1 and 1000".to_string(),
        ));
    }

    Ok((page, limit))
}
