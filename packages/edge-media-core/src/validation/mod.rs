pub mod key;
pub mod params;

pub use key::{key_from_path, validate_key};
pub use params::validate_params;
