pub mod loader;
pub mod model;

pub use loader::{ConfigLoader, load_file};
pub use model::{AppConfig, DatabaseConfig, MigrationsConfig};
