use std::str::FromStr;

use bson::oid::ObjectId;
use serde::Serialize;

use crate::config::SearchDefaults;
use crate::search::PageRequest;

/// One offending request field with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Accumulates field errors so a response can enumerate every problem at
/// once instead of failing on the first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_fields(self) -> Vec<FieldError> {
        self.0
    }

    /// Err with everything collected so far, or Ok when the request is clean.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.0.iter().map(|e| e.field).collect();
        write!(f, "invalid request fields: {}", fields.join(", "))
    }
}

pub fn parse_f64(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: Option<&str>,
) -> Option<f64> {
    let raw = raw?;
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            errors.push(field, format!("{field} must be a number"));
            None
        }
    }
}

pub fn parse_f64_in(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: Option<&str>,
    min: f64,
    max: f64,
) -> Option<f64> {
    let value = parse_f64(errors, field, raw)?;
    if value < min || value > max {
        errors.push(field, format!("{field} must be between {min} and {max}"));
        return None;
    }
    Some(value)
}

pub fn parse_i32(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: Option<&str>,
) -> Option<i32> {
    let raw = raw?;
    match raw.trim().parse::<i32>() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.push(field, format!("{field} must be an integer"));
            None
        }
    }
}

pub fn parse_bool(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: Option<&str>,
) -> Option<bool> {
    let raw = raw?;
    match raw.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => {
            errors.push(field, format!("{field} must be true or false"));
            None
        }
    }
}

pub fn parse_object_id(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: Option<&str>,
) -> Option<ObjectId> {
    let raw = raw?;
    match ObjectId::parse_str(raw.trim()) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.push(field, format!("{field} must be a valid id"));
            None
        }
    }
}

/// Parses a keyword parameter into its enum. Unknown values are an error,
/// use [`parse_keyword_lenient`] where unknowns should fall back silently.
pub fn parse_keyword<T: FromStr>(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: Option<&str>,
    expected: &str,
) -> Option<T> {
    let raw = raw?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.push(field, format!("{field} must be one of: {expected}"));
            None
        }
    }
}

/// Unknown keywords mean "use the default" rather than an error. Sort keys
/// work this way so stale client builds keep functioning.
pub fn parse_keyword_lenient<T: FromStr>(raw: Option<&str>) -> Option<T> {
    raw.and_then(|value| value.trim().parse::<T>().ok())
}

/// Validated geo search parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius_m: f64,
}

/// Coordinates come as a pair or not at all. The radius falls back to the
/// configured default and is clamped to the configured ceiling.
pub fn parse_geo(
    errors: &mut ValidationErrors,
    lat: Option<&str>,
    lng: Option<&str>,
    radius: Option<&str>,
    defaults: &SearchDefaults,
) -> Option<GeoQuery> {
    match (lat, lng) {
        (None, None) => {
            if radius.is_some() {
                errors.push("radius", "radius requires lat and lng");
            }
            None
        }
        (Some(_), None) => {
            errors.push("lng", "lng is required when lat is given");
            None
        }
        (None, Some(_)) => {
            errors.push("lat", "lat is required when lng is given");
            None
        }
        (Some(lat_raw), Some(lng_raw)) => {
            let lat = parse_f64_in(errors, "lat", Some(lat_raw), -90.0, 90.0);
            let lng = parse_f64_in(errors, "lng", Some(lng_raw), -180.0, 180.0);
            let radius_m = match parse_f64(errors, "radius", radius) {
                Some(value) if value <= 0.0 => {
                    errors.push("radius", "radius must be positive");
                    return None;
                }
                Some(value) => value.min(defaults.max_radius_m),
                None => defaults.default_radius_m,
            };
            Some(GeoQuery {
                lat: lat?,
                lng: lng?,
                radius_m,
            })
        }
    }
}

/// Page starts at 1, limit is clamped into `[1, max_page_size]`.
pub fn parse_page(
    errors: &mut ValidationErrors,
    page: Option<&str>,
    limit: Option<&str>,
    defaults: &SearchDefaults,
) -> PageRequest {
    let page = match page {
        None => 1,
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(value) if value >= 1 => value,
            _ => {
                errors.push("page", "page must be a positive integer");
                1
            }
        },
    };
    let limit = match limit {
        None => defaults.default_page_size,
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(value) if value >= 1 => value.min(defaults.max_page_size),
            _ => {
                errors.push("limit", "limit must be a positive integer");
                defaults.default_page_size
            }
        },
    };
    PageRequest { page, limit }
}

/// Flags an inverted numeric range. Bounds themselves were parsed already.
pub fn check_range_order(
    errors: &mut ValidationErrors,
    min_field: &'static str,
    max_field: &'static str,
    min: Option<f64>,
    max: Option<f64>,
) {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            errors.push(
                min_field,
                format!("{min_field} must not exceed {max_field}"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> SearchDefaults {
        SearchDefaults {
            default_radius_m: 5_000.0,
            max_radius_m: 50_000.0,
            default_page_size: 20,
            max_page_size: 100,
        }
    }

    #[test]
    fn collects_every_offending_field() {
        let mut errors = ValidationErrors::default();
        parse_f64(&mut errors, "minRating", Some("abc"));
        parse_f64(&mut errors, "maxRating", Some("xyz"));
        parse_object_id(&mut errors, "cityId", Some("not-an-id"));
        let fields: Vec<&str> = errors.into_fields().iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["minRating", "maxRating", "cityId"]);
    }

    #[test]
    fn lat_without_lng_is_an_error() {
        let mut errors = ValidationErrors::default();
        let geo = parse_geo(&mut errors, Some("25.2"), None, None, &defaults());
        assert!(geo.is_none());
        assert_eq!(errors.into_fields()[0].field, "lng");
    }

    #[test]
    fn out_of_range_coordinates_are_errors() {
        let mut errors = ValidationErrors::default();
        let geo = parse_geo(&mut errors, Some("91.0"), Some("55.3"), None, &defaults());
        assert!(geo.is_none());
        assert_eq!(errors.into_fields()[0].field, "lat");
    }

    #[test]
    fn radius_defaults_and_clamps() {
        let mut errors = ValidationErrors::default();
        let geo = parse_geo(&mut errors, Some("25.2"), Some("55.3"), None, &defaults()).unwrap();
        assert_eq!(geo.radius_m, 5_000.0);

        let geo = parse_geo(
            &mut errors,
            Some("25.2"),
            Some("55.3"),
            Some("999999"),
            &defaults(),
        )
        .unwrap();
        assert_eq!(geo.radius_m, 50_000.0);
        assert!(errors.is_empty());
    }

    #[test]
    fn radius_without_coordinates_is_an_error() {
        let mut errors = ValidationErrors::default();
        let geo = parse_geo(&mut errors, None, None, Some("2000"), &defaults());
        assert!(geo.is_none());
        assert_eq!(errors.into_fields()[0].field, "radius");
    }

    #[test]
    fn page_and_limit_fall_back_and_clamp() {
        let mut errors = ValidationErrors::default();
        let page = parse_page(&mut errors, None, None, &defaults());
        assert_eq!(page, PageRequest { page: 1, limit: 20 });

        let page = parse_page(&mut errors, Some("3"), Some("500"), &defaults());
        assert_eq!(page, PageRequest { page: 3, limit: 100 });
        assert!(errors.is_empty());
    }

    #[test]
    fn zero_page_is_an_error() {
        let mut errors = ValidationErrors::default();
        parse_page(&mut errors, Some("0"), None, &defaults());
        assert_eq!(errors.into_fields()[0].field, "page");
    }

    #[test]
    fn inverted_range_is_an_error() {
        let mut errors = ValidationErrors::default();
        check_range_order(&mut errors, "minPrice", "maxPrice", Some(100.0), Some(50.0));
        assert_eq!(errors.into_fields()[0].field, "minPrice");
    }

    #[test]
    fn unknown_sort_keys_fall_back_silently() {
        use crate::search::SortKey;
        let parsed: Option<SortKey> = parse_keyword_lenient(Some("trending"));
        assert!(parsed.is_none());
        let parsed: Option<SortKey> = parse_keyword_lenient(Some("rating"));
        assert_eq!(parsed, Some(SortKey::Rating));
    }
}
