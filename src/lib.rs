pub mod config;
pub mod coordinates;
pub mod debounce;
pub mod geolocate;
pub mod search;

pub use search::{SearchCriteria, SearchOutcome, Searcher};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
