use geo::{GeodesicDistance, Point};

use crate::config::DistanceMethod;
use crate::models::columns::RESIDENCE_COLUMNS;
use crate::models::{Coordinates, Row};
use crate::services::geocoder::Geocoder;

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Geodesic distance on the WGS84 ellipsoid in kilometers (Karney's method)
#[inline]
pub fn geodesic_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let a = Point::new(lon1, lat1);
    let b = Point::new(lon2, lat2);
    a.geodesic_distance(&b) / 1000.0
}

/// Distance in kilometers with the configured method
pub fn distance_km(method: DistanceMethod, a: Coordinates, b: Coordinates) -> f64 {
    match method {
        DistanceMethod::Geodesic => {
            geodesic_distance(a.latitude, a.longitude, b.latitude, b.longitude)
        }
        DistanceMethod::Haversine => {
            haversine_distance(a.latitude, a.longitude, b.latitude, b.longitude)
        }
    }
}

/// Residence of a candidate as "city, province, region, country", skipping blanks
pub fn residence_location(row: &Row<'_>) -> Option<String> {
    let parts: Vec<&str> = RESIDENCE_COLUMNS
        .iter()
        .filter_map(|c| row.get(c))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// Measures how far candidates live from headquarters
pub struct HqDistance<G: Geocoder> {
    geocoder: G,
    hq: Coordinates,
    method: DistanceMethod,
}

impl<G: Geocoder> HqDistance<G> {
    pub fn new(geocoder: G, hq: Coordinates, method: DistanceMethod) -> Self {
        Self { geocoder, hq, method }
    }

    /// Distance from the row's residence to HQ, `None` when it cannot be located
    pub fn distance_for_row(&self, row: &Row<'_>) -> Option<f64> {
        let location = residence_location(row)?;
        let coords = self.geocoder.locate(&location)?;
        Some(distance_km(self.method, coords, self.hq))
    }
}
