use crate::shell::error::ShellError;
use crate::shell::registry::Resource;
use async_trait::async_trait;

/// Fetches one resource of a module.
///
/// Fetching a script is what eventually makes the module register itself in
/// the shared registry; that registration may land some time after `fetch`
/// returns, which is why the loader polls for readiness separately.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, app: &str, resource: &Resource) -> Result<(), ShellError>;
}
