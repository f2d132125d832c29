//! Runs against a real Looker instance configured through `LOOKERSDK_*`
//! variables. `LOOKER_TEST_PROJECT`, `LOOKER_TEST_MODEL`, `LOOKER_TEST_EXPLORE`
//! and `LOOKER_TEST_BRANCH` pick the explore to read.

use catalog::{BranchCatalog, CatalogProvider, EditableCatalogSession, LookerClient, LookerConfig};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(120);

fn make_client() -> LookerClient {
    let config = LookerConfig::from_env()
        .expect("LOOKERSDK_BASE_URL, LOOKERSDK_CLIENT_ID and LOOKERSDK_CLIENT_SECRET must be set")
        .with_timeout(TIMEOUT);
    LookerClient::new(config).expect("client creation")
}

fn target(var: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| panic!("{} must be set", var))
}

#[tokio::test]
#[ignore]
async fn test_fetch_explore_production() {
    let client = make_client();

    let fields = tokio::time::timeout(
        TIMEOUT,
        client.fetch_explore(&target("LOOKER_TEST_MODEL"), &target("LOOKER_TEST_EXPLORE")),
    )
    .await
    .expect("fetch timed out")
    .expect("fetch failed");

    assert!(!fields.is_empty(), "explore must expose dimensions");
    assert!(
        fields.iter().all(|f| f.name.contains('.')),
        "dimension names must be view-qualified: {:?}",
        fields.iter().map(|f| &f.name).collect::<Vec<_>>()
    );
}

#[tokio::test]
#[ignore]
async fn test_fetch_explore_on_branch() {
    let catalog = BranchCatalog::new(make_client(), target("LOOKER_TEST_BRANCH"));

    let fields = tokio::time::timeout(
        TIMEOUT,
        catalog.fetch_catalog(
            &target("LOOKER_TEST_PROJECT"),
            &target("LOOKER_TEST_MODEL"),
            &target("LOOKER_TEST_EXPLORE"),
        ),
    )
    .await
    .expect("fetch timed out")
    .expect("fetch failed");

    assert!(!fields.is_empty(), "explore must expose dimensions");
}
