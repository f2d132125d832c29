use crate::types::FieldDescriptor;
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {message}")]
    Authentication { message: String },
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Supplies the field catalog of one explore.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn fetch_catalog(
        &self,
        project: &str,
        model: &str,
        explore: &str,
    ) -> CatalogResult<Vec<FieldDescriptor>>;

    fn provider_name(&self) -> &'static str;
}

/// A remote session that can be switched onto a development branch before
/// explores are read from it.
#[async_trait]
pub trait EditableCatalogSession: Send + Sync {
    async fn enter_dev_branch(&self, project: &str, branch: &str) -> CatalogResult<()>;

    async fn fetch_explore(&self, model: &str, explore: &str)
        -> CatalogResult<Vec<FieldDescriptor>>;

    fn session_name(&self) -> &'static str;
}

/// Reads explores from a session pinned to one branch.
///
/// The branch is checked out for the requested project on every fetch, since
/// consecutive tests may target different projects.
pub struct BranchCatalog<S> {
    session: S,
    branch: String,
}

impl<S: EditableCatalogSession> BranchCatalog<S> {
    pub fn new(session: S, branch: impl Into<String>) -> Self {
        Self {
            session,
            branch: branch.into(),
        }
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn session(&self) -> &S {
        &self.session
    }
}

#[async_trait]
impl<S: EditableCatalogSession> CatalogProvider for BranchCatalog<S> {
    async fn fetch_catalog(
        &self,
        project: &str,
        model: &str,
        explore: &str,
    ) -> CatalogResult<Vec<FieldDescriptor>> {
        debug!(
            "Switching {} to branch {} for project {}",
            self.session.session_name(),
            self.branch,
            project
        );
        self.session.enter_dev_branch(project, &self.branch).await?;
        self.session.fetch_explore(model, explore).await
    }

    fn provider_name(&self) -> &'static str {
        self.session.session_name()
    }
}
