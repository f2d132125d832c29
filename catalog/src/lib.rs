pub mod config;
pub mod looker;
pub mod provider;
pub mod types;

pub use config::LookerConfig;
pub use looker::LookerClient;
pub use provider::{
    BranchCatalog, CatalogError, CatalogProvider, CatalogResult, EditableCatalogSession,
};
pub use types::{ExploreDefinition, ExploreFields, FieldDescriptor, FieldKind};

pub mod prelude {
    pub use crate::config::*;
    pub use crate::looker::*;
    pub use crate::provider::*;
    pub use crate::types::*;
}
