pub mod artifact;
pub mod audit;
pub mod catalog;
pub mod config;
pub mod discovery;
pub mod executor;
pub mod extract;
pub mod model;
pub mod pipeline;
pub mod sandbox;
pub mod traits;
pub mod units;

// Re-export common types for convenience
pub use artifact::{ArtifactTarget, Compression};
pub use catalog::{Catalog, CatalogError, Family};
pub use config::{PipelineConfig, ToolConfig};
pub use executor::*;
pub use model::*;
pub use pipeline::{UnitError, UnitPipeline};
pub use traits::*;
pub use units::{select_units, skip_existing, UnitRequest};
