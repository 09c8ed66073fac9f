//! Registry existence check for a single candidate.

use anyhow::Result;
use log::debug;

use crate::backend::{Backend, RegistryError};

/// Ask the registry whether `candidate` is a published package.
///
/// Returns `Ok(false)` when the registry answers "not found"; every other
/// failure is returned unchanged.
#[tracing::instrument(skip(backend))]
pub async fn probe<B: Backend + ?Sized>(backend: &B, candidate: &str) -> Result<bool> {
    backend.load().await?;

    match backend.view(candidate).await {
        Ok(info) => {
            debug!("{} found in registry (latest: {:?})", candidate, info.latest());
            Ok(true)
        }
        Err(e) if matches!(e.downcast_ref::<RegistryError>(), Some(RegistryError::NotFound(_))) => {
            debug!("{} is not a registry package", candidate);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockBackend, PackageInfo};
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_probe_found() {
        let mut backend = MockBackend::new();
        backend.expect_load().times(1).returning(|| Ok(()));
        backend
            .expect_view()
            .with(eq("left-pad"))
            .returning(|id| {
                Ok(PackageInfo {
                    name: id.to_string(),
                    ..Default::default()
                })
            });

        assert!(probe(&backend, "left-pad").await.unwrap());
    }

    #[tokio::test]
    async fn test_probe_not_found_is_negative() {
        let mut backend = MockBackend::new();
        backend.expect_load().returning(|| Ok(()));
        backend
            .expect_view()
            .returning(|id| Err(RegistryError::NotFound(id.to_string()).into()));

        assert!(!probe(&backend, "not-a-real-pkg-xyz").await.unwrap());
    }

    #[tokio::test]
    async fn test_probe_registry_error_propagates() {
        let mut backend = MockBackend::new();
        backend.expect_load().returning(|| Ok(()));
        backend
            .expect_view()
            .returning(|_| Err(anyhow::anyhow!("connection reset by peer")));

        let err = probe(&backend, "left-pad").await.unwrap_err();
        assert_eq!(err.to_string(), "connection reset by peer");
    }

    #[tokio::test]
    async fn test_probe_404_text_alone_is_not_not_found() {
        // Only the typed variant counts as "not found".
        let mut backend = MockBackend::new();
        backend.expect_load().returning(|| Ok(()));
        backend
            .expect_view()
            .returning(|id| Err(anyhow::anyhow!("404 Not Found: {}", id)));

        assert!(probe(&backend, "left-pad").await.is_err());
    }

    #[tokio::test]
    async fn test_probe_load_error_skips_view() {
        let mut backend = MockBackend::new();
        backend
            .expect_load()
            .returning(|| Err(anyhow::anyhow!("npm not available")));
        backend.expect_view().never();

        let err = probe(&backend, "left-pad").await.unwrap_err();
        assert_eq!(err.to_string(), "npm not available");
    }
}
