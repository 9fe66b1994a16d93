use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::models::location::Coordinates;
use crate::services::cache::{CacheKey, CacheStats, LruStore};

/// Errors that can occur while building a gazetteer
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid gazetteer row {line}: {reason}")]
    InvalidRow { line: usize, reason: String },
}

/// Resolves free-text locations to coordinates
pub trait Geocoder {
    fn locate(&self, location: &str) -> Option<Coordinates>;
}

/// Major Italian places used when no gazetteer file is configured
const BUILTIN_PLACES: &[(&str, f64, f64)] = &[
    ("italy", 41.8719, 12.5674),
    ("bologna", 44.4949, 11.3426),
    ("emilia-romagna", 44.5968, 11.2186),
    ("modena", 44.6471, 10.9252),
    ("parma", 44.8015, 10.3279),
    ("reggio emilia", 44.6983, 10.6312),
    ("ferrara", 44.8381, 11.6198),
    ("ravenna", 44.4184, 12.2035),
    ("rimini", 44.0678, 12.5695),
    ("milan", 45.4642, 9.1900),
    ("milano", 45.4642, 9.1900),
    ("lombardy", 45.4791, 9.8452),
    ("lombardia", 45.4791, 9.8452),
    ("turin", 45.0703, 7.6869),
    ("torino", 45.0703, 7.6869),
    ("piedmont", 45.0522, 7.5154),
    ("venice", 45.4408, 12.3155),
    ("venezia", 45.4408, 12.3155),
    ("padova", 45.4064, 11.8768),
    ("verona", 45.4384, 10.9916),
    ("veneto", 45.4415, 12.3155),
    ("florence", 43.7696, 11.2558),
    ("firenze", 43.7696, 11.2558),
    ("tuscany", 43.7711, 11.2486),
    ("toscana", 43.7711, 11.2486),
    ("rome", 41.9028, 12.4964),
    ("roma", 41.9028, 12.4964),
    ("lazio", 41.6552, 12.9897),
    ("naples", 40.8518, 14.2681),
    ("napoli", 40.8518, 14.2681),
    ("campania", 40.8399, 14.2529),
    ("bari", 41.1171, 16.8719),
    ("puglia", 40.7928, 17.1012),
    ("palermo", 38.1157, 13.3615),
    ("sicily", 37.5999, 14.0154),
    ("sicilia", 37.5999, 14.0154),
    ("genoa", 44.4056, 8.9463),
    ("genova", 44.4056, 8.9463),
    ("liguria", 44.3168, 8.3965),
    ("ancona", 43.6158, 13.5189),
    ("marche", 43.3068, 13.0786),
    ("pescara", 42.4618, 14.2161),
    ("cagliari", 39.2238, 9.1217),
    ("trento", 46.0748, 11.1217),
    ("trieste", 45.6495, 13.7768),
];

/// Offline geocoder backed by a name → coordinates table
///
/// A query like "Imola, BO, Emilia-Romagna, Italy" is tried as a whole, then
/// component by component from the most specific one, until a known place is
/// found.
/// Results, including failures, are cached per normalized query.
pub struct GazetteerGeocoder {
    places: HashMap<String, Coordinates>,
    cache: LruStore<String, Option<Coordinates>>,
}

impl GazetteerGeocoder {
    pub fn new(places: HashMap<String, Coordinates>, cache_size: usize) -> Self {
        let places = places
            .into_iter()
            .map(|(name, coords)| (CacheKey::location(&name), coords))
            .collect();
        Self {
            places,
            cache: LruStore::new(cache_size),
        }
    }

    /// Geocoder over the built-in table of Italian cities and regions
    pub fn with_builtin_places(cache_size: usize) -> Self {
        let places = BUILTIN_PLACES
            .iter()
            .map(|(name, lat, lon)| (name.to_string(), Coordinates::new(*lat, *lon)))
            .collect();
        Self::new(places, cache_size)
    }

    /// Load a `location,latitude,longitude` CSV, layered over the built-in places
    pub fn from_csv<P: AsRef<Path>>(path: P, cache_size: usize) -> Result<Self, GeocodeError> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path.as_ref())?;
        let mut places: HashMap<String, Coordinates> = BUILTIN_PLACES
            .iter()
            .map(|(name, lat, lon)| (name.to_string(), Coordinates::new(*lat, *lon)))
            .collect();

        for (i, record) in reader.records().enumerate() {
            let record = record?;
            // header is line 1
            let line = i + 2;
            let (name, lat, lon) = match (record.get(0), record.get(1), record.get(2)) {
                (Some(n), Some(la), Some(lo)) => (n, la, lo),
                _ => {
                    return Err(GeocodeError::InvalidRow {
                        line,
                        reason: "expected 3 fields".to_string(),
                    })
                }
            };
            let parse = |v: &str| {
                v.trim().parse::<f64>().map_err(|e| GeocodeError::InvalidRow {
                    line,
                    reason: format!("'{}': {}", v, e),
                })
            };
            let coords = Coordinates::new(parse(lat)?, parse(lon)?);
            if !coords.is_valid() {
                return Err(GeocodeError::InvalidRow {
                    line,
                    reason: "coordinates out of range".to_string(),
                });
            }
            places.insert(name.to_string(), coords);
        }

        tracing::info!("Gazetteer loaded with {} places", places.len());
        Ok(Self::new(places, cache_size))
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn lookup(&self, key: &str) -> Option<Coordinates> {
        if let Some(coords) = self.places.get(key) {
            return Some(*coords);
        }
        key.split(", ").find_map(|part| self.places.get(part).copied())
    }
}

impl Geocoder for GazetteerGeocoder {
    fn locate(&self, location: &str) -> Option<Coordinates> {
        let key = CacheKey::location(location);
        if key.is_empty() {
            return None;
        }

        let found = self.cache.get_or_insert_with(key.clone(), || self.lookup(&key));
        if found.is_none() {
            tracing::debug!("Could not geocode '{}'", location);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_locate_falls_back_to_broader_place() {
        let geocoder = GazetteerGeocoder::with_builtin_places(16);

        let exact = geocoder.locate("Bologna").unwrap();
        assert!((exact.latitude - 44.4949).abs() < 1e-9);

        // Unknown town resolves to its region
        let region = geocoder.locate("Imola, BO, Emilia-Romagna, Italy").unwrap();
        assert!((region.latitude - 44.5968).abs() < 1e-9);

        // Unknown everything
        assert!(geocoder.locate("Atlantis").is_none());
        assert!(geocoder.locate("  ").is_none());
    }

    #[test]
    fn test_failures_are_cached() {
        let geocoder = GazetteerGeocoder::with_builtin_places(16);
        assert!(geocoder.locate("Nowhere").is_none());
        assert!(geocoder.locate("nowhere ").is_none());

        let stats = geocoder.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
    }

    #[test]
    fn test_from_csv_overrides_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("places.csv");
        fs::write(&good, "location,latitude,longitude\nImola,44.3533,11.7141\n").unwrap();

        let geocoder = GazetteerGeocoder::from_csv(&good, 16).unwrap();
        let imola = geocoder.locate("Imola, BO").unwrap();
        assert!((imola.longitude - 11.7141).abs() < 1e-9);
        assert!(geocoder.locate("Milano").is_some());

        let bad = dir.path().join("bad.csv");
        fs::write(&bad, "location,latitude,longitude\nX,abc,1\n").unwrap();
        assert!(matches!(
            GazetteerGeocoder::from_csv(&bad, 16),
            Err(GeocodeError::InvalidRow { line: 2, .. })
        ));
    }
}
