// Service exports
pub mod cache;
pub mod geocoder;
pub mod storage;

pub use cache::{CacheKey, CacheStats, LruStore};
pub use geocoder::{GazetteerGeocoder, GeocodeError, Geocoder};
pub use storage::{load_dataset, load_results, save_dataset, save_results, save_summary, StorageError};
