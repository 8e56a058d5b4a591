//! Data directory helpers.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::Result;

/// Creates `parent/base`, or `parent/base-2`, `parent/base-3`, ... when the
/// name is taken, and returns the created path. Each candidate is claimed with
/// a non-recursive create, so concurrent callers never get the same directory.
pub async fn claim_node_dir(
    base: &str,
    parent: &Path,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(parent).await?;
    let mut n = 1;
    loop {
        let name = if n == 1 { base.to_string() } else { format!("{}-{}", base, n) };
        let dir = parent.join(name);
        match tokio::fs::create_dir(&dir).await {
            Ok(()) => {
                info!(dir = %dir.display(), "created node data dir");
                return Ok(dir);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Recursively deletes `dir`. A directory that is already gone counts as deleted.
pub async fn delete_disk(dir: &Path) -> Result<bool> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(dir = %dir.display(), "node data dir already removed");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_claim_and_delete_node_dir() {
        let root = std::env::temp_dir().join(format!("nodeherd-fs-{}", uuid::Uuid::new_v4()));
        let dir = claim_node_dir("geth-1700000000", &root).await.unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir, root.join("geth-1700000000"));

        assert!(delete_disk(&dir).await.unwrap());
        assert!(!dir.exists());
        assert!(!delete_disk(&dir).await.unwrap());

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_claim_node_dir_skips_taken_names() {
        let root = std::env::temp_dir().join(format!("nodeherd-fs-{}", uuid::Uuid::new_v4()));
        assert_eq!(claim_node_dir("geth-1", &root).await.unwrap(), root.join("geth-1"));
        assert_eq!(claim_node_dir("geth-1", &root).await.unwrap(), root.join("geth-1-2"));
        assert_eq!(claim_node_dir("geth-1", &root).await.unwrap(), root.join("geth-1-3"));

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_get_distinct_dirs() {
        let root = std::env::temp_dir().join(format!("nodeherd-fs-{}", uuid::Uuid::new_v4()));
        let claims = (0..8).map(|_| {
            let root = root.clone();
            tokio::spawn(async move { claim_node_dir("geth-1", &root).await })
        });
        let mut dirs = Vec::new();
        for claim in claims.collect::<Vec<_>>() {
            dirs.push(claim.await.unwrap().unwrap());
        }
        dirs.sort();
        dirs.dedup();
        assert_eq!(dirs.len(), 8);

        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
