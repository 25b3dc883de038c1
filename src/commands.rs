//! Subcommand implementations.
//!
//! Each command returns the value to print; `main` owns output.

use crate::cli::{CleanupArgs, InvalidateArgs, ResolveArgs};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use trellis_cache::{
    CacheKey, CacheStore, CleanupPolicy, CleanupStats, EntryScope, Invalidation, Maintainer, RouteMapping,
};
use trellis_config::Config;
use trellis_hierarchy::{HierarchyBuilder, HierarchyItem, Resolver};
use trellis_provider::ProviderHandle;
use trellis_provider::backend::LocalProvider;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deleted {
    pub deleted_count: u64,
}

/// Pick the single target clap enforces; anything else is a usage error.
pub fn invalidation(args: InvalidateArgs) -> Result<Invalidation> {
    let criteria = match args {
        InvalidateArgs {
            key: Some(key),
            folder: None,
            route_type: None,
            route_subtype: None,
        } => Invalidation::Key(CacheKey::from(key)),
        InvalidateArgs {
            key: None,
            folder: Some(folder),
            route_type: None,
            route_subtype: None,
        } => Invalidation::Folder(folder),
        InvalidateArgs {
            key: None,
            folder: None,
            route_type: Some(route_type),
            route_subtype: Some(route_subtype),
        } => Invalidation::Route {
            route_type,
            route_subtype,
        },
        InvalidateArgs {
            key: None,
            folder: None,
            route_type: Some(route_type),
            route_subtype: None,
        } => Invalidation::RouteType(route_type),
        _ => exn::bail!(ErrorKind::Command("invalidate")),
    };
    Ok(criteria)
}

#[instrument(skip_all)]
pub async fn invalidate(store: &CacheStore, args: InvalidateArgs) -> Result<Deleted> {
    let criteria = invalidation(args)?;
    let deleted_count = store.invalidate(&criteria).await.or_raise(|| ErrorKind::Command("invalidate"))?;
    Ok(Deleted { deleted_count })
}

/// Command line values override the configured policy field by field.
pub fn cleanup_policy(config: &Config, args: &CleanupArgs) -> CleanupPolicy {
    let configured = config.policy();
    CleanupPolicy {
        max_age_days: args.max_age_days.unwrap_or(configured.max_age_days),
        low_usage_threshold: args.low_usage_threshold.unwrap_or(configured.low_usage_threshold),
        low_usage_age_days: args.low_usage_age_days.unwrap_or(configured.low_usage_age_days),
    }
}

pub async fn cleanup(maintainer: &Maintainer, policy: &CleanupPolicy) -> Result<CleanupStats> {
    maintainer.run_cleanup(policy).await.or_raise(|| ErrorKind::Command("cleanup"))
}

pub async fn add_mapping(
    store: &CacheStore,
    route_type: &str,
    route_subtype: &str,
    folder_id: &str,
) -> Result<RouteMapping> {
    store
        .register_mapping(route_type, route_subtype, folder_id)
        .await
        .or_raise(|| ErrorKind::Command("mapping add"))
}

#[instrument(skip_all, fields(root_id = %args.root_id, dir = %args.dir.display()))]
pub async fn resolve(config: &Config, store: &CacheStore, args: ResolveArgs) -> Result<HierarchyItem> {
    // The provider is named after its directory so trees from different
    // directories never share a cache key.
    let dir = std::fs::canonicalize(&args.dir).or_raise(|| ErrorKind::Provider)?;
    let name = dir.display().to_string();
    let provider: ProviderHandle = Arc::new(LocalProvider::new(name, dir).or_raise(|| ErrorKind::Provider)?);
    let mut options = config.build_options();
    if let Some(max_depth) = args.max_depth {
        options.max_depth = max_depth;
    }
    let resolver = Resolver::new(HierarchyBuilder::new(provider, options), store.clone(), config.timeout());
    let scope = EntryScope::default();
    let resolved = match args.refresh {
        true => resolver.refresh(&args.root_id, &scope).await,
        false => resolver.resolve(&args.root_id, &scope).await,
    }
    .or_raise(|| ErrorKind::Command("resolve"))?;
    tracing::info!(source = ?resolved.source, items = resolved.item.count(), "Resolved hierarchy");
    Ok(resolved.item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use trellis_cache::Database;

    fn targets(key: Option<&str>, folder: Option<&str>, route_type: Option<&str>, subtype: Option<&str>) -> InvalidateArgs {
        InvalidateArgs {
            key: key.map(str::to_string),
            folder: folder.map(str::to_string),
            route_type: route_type.map(str::to_string),
            route_subtype: subtype.map(str::to_string),
        }
    }

    #[rstest]
    #[case(targets(Some("x"), None, None, None), Invalidation::Key(CacheKey::from("x")))]
    #[case(targets(None, Some("f1"), None, None), Invalidation::Folder("f1".to_string()))]
    #[case(targets(None, None, Some("posters"), None), Invalidation::RouteType("posters".to_string()))]
    #[case(
        targets(None, None, Some("posters"), Some("es")),
        Invalidation::Route { route_type: "posters".to_string(), route_subtype: "es".to_string() }
    )]
    fn test_invalidation_target(#[case] args: InvalidateArgs, #[case] expected: Invalidation) {
        assert_eq!(invalidation(args).unwrap(), expected);
    }

    #[rstest]
    #[case(targets(None, None, None, None))]
    #[case(targets(None, None, None, Some("es")))]
    #[case(targets(Some("x"), Some("f1"), None, None))]
    #[case(targets(None, Some("f1"), None, Some("es")))]
    fn test_invalidation_without_single_target(#[case] args: InvalidateArgs) {
        let err = invalidation(args).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Command("invalidate")));
    }

    #[test]
    fn test_cleanup_policy_overrides() {
        let args = CleanupArgs {
            max_age_days: Some(30),
            low_usage_threshold: None,
            low_usage_age_days: Some(1),
        };
        let policy = cleanup_policy(&Config::default(), &args);
        assert_eq!(
            policy,
            CleanupPolicy {
                max_age_days: 30,
                low_usage_threshold: 3,
                low_usage_age_days: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_invalidate_unknown_route_fails() {
        let db = Database::connect_in_memory().await.unwrap();
        let store = CacheStore::from(&db);
        let err = invalidate(&store, targets(None, None, Some("posters"), Some("es"))).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Command("invalidate")));

        let deleted = invalidate(&store, targets(None, None, Some("posters"), None)).await.unwrap();
        assert_eq!(deleted.deleted_count, 0);
    }

    #[tokio::test]
    async fn test_resolve_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("01_Resources")).unwrap();
        fs::write(dir.path().join("01_Resources/0005_poster.pdf"), b"%PDF").unwrap();
        fs::write(dir.path().join("notes.txt"), b"hello").unwrap();

        let db = Database::connect_in_memory().await.unwrap();
        let store = CacheStore::from(&db);
        let args = || ResolveArgs {
            root_id: ".".to_string(),
            dir: PathBuf::from(dir.path()),
            max_depth: None,
            refresh: false,
        };
        let item = resolve(&Config::default(), &store, args()).await.unwrap();
        assert_eq!(item.count(), 4);
        let poster = item.find(&["Resources", "poster.pdf"]).unwrap();
        assert_eq!(poster.order, Some(5));
        assert_eq!(store.count().await.unwrap(), 1);

        let cached = resolve(&Config::default(), &store, args()).await.unwrap();
        assert_eq!(cached, item);
    }

    #[tokio::test]
    async fn test_resolve_directories_share_one_store() {
        let alpha = TempDir::new().unwrap();
        fs::write(alpha.path().join("alpha.pdf"), b"%PDF").unwrap();
        let beta = TempDir::new().unwrap();
        fs::write(beta.path().join("beta.pdf"), b"%PDF").unwrap();
        fs::write(beta.path().join("gamma.pdf"), b"%PDF").unwrap();

        let db = Database::connect_in_memory().await.unwrap();
        let store = CacheStore::from(&db);
        let args = |dir: &TempDir| ResolveArgs {
            root_id: ".".to_string(),
            dir: PathBuf::from(dir.path()),
            max_depth: None,
            refresh: false,
        };
        let names = |item: &HierarchyItem| -> Vec<String> {
            item.children.iter().map(|child| child.display_name.clone()).collect()
        };

        let first = resolve(&Config::default(), &store, args(&alpha)).await.unwrap();
        let second = resolve(&Config::default(), &store, args(&beta)).await.unwrap();
        assert_eq!(names(&first), ["alpha.pdf"]);
        assert_eq!(names(&second), ["beta.pdf", "gamma.pdf"]);
        assert_eq!(store.count().await.unwrap(), 2);

        let again = resolve(&Config::default(), &store, args(&alpha)).await.unwrap();
        assert_eq!(again, first);
    }

    #[tokio::test]
    async fn test_resolve_missing_directory() {
        let db = Database::connect_in_memory().await.unwrap();
        let store = CacheStore::from(&db);
        let args = ResolveArgs {
            root_id: ".".to_string(),
            dir: PathBuf::from("/definitely/not/here"),
            max_depth: None,
            refresh: false,
        };
        let err = resolve(&Config::default(), &store, args).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Provider));
    }
}
