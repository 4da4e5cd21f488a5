pub mod credentials;
pub mod loader;
pub mod schema;

pub use credentials::ServiceAccountKey;
pub use loader::ConfigLoader;
pub use schema::{Endpoints, OutputConfig, RunConfig, SourceConfig};
