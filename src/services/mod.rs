// Service exports
pub mod cache;
pub mod geocoder;
pub mod postgres;
pub mod scores;

pub use cache::{CacheError, CacheKey, CacheManager};
pub use geocoder::{GeocodeError, Geocoder};
pub use postgres::{PostgresClient, StoreError};
pub use scores::{RefreshOutcome, ScoreService};
