pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, ConfigError, ConfigFormat};
pub use schema::{PatchConfig, ValidationError, ValidationIssue, DEFAULT_CONFIG_PATH};
