mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{MINIONS_URL, MOUNTS_URL, MemoryLoader, card_config, resources_dir, seed_assets};
use futures_util::future::join_all;
use xivcard_backend::AppError;
use xivcard_backend::features::card::AssetCache;

#[tokio::test]
async fn concurrent_callers_share_a_single_load() {
    let loader = Arc::new(MemoryLoader::with_delay(Duration::from_millis(20)));
    seed_assets(&loader);
    let cache = AssetCache::new(loader.clone(), Arc::new(card_config()));

    let results = join_all((0..16).map(|_| cache.ensure_init())).await;

    for result in &results {
        let bundle = result.as_ref().expect("init");
        assert_eq!(bundle.mount_total, 400);
        assert_eq!(bundle.minion_total, 500);
        assert_eq!(bundle.job_icons.len(), 42);
        assert_eq!(bundle.job_backgrounds.len(), 42);
    }
    assert_eq!(loader.hits(MOUNTS_URL), 1);
    assert_eq!(loader.hits(MINIONS_URL), 1);

    // 已就绪后不再触发加载
    cache.ensure_init().await.expect("cached");
    assert_eq!(loader.hits(MOUNTS_URL), 1);
    assert!(cache.get().is_some());
}

#[tokio::test]
async fn failed_load_is_not_cached() {
    let loader = Arc::new(MemoryLoader::default());
    seed_assets(&loader);
    let missing = resources_dir().join("shadow.png");
    loader.remove_file(&missing);
    let cache = AssetCache::new(loader.clone(), Arc::new(card_config()));

    let err = cache.ensure_init().await.expect_err("missing shadow image");
    assert!(matches!(err, AppError::Init(_)), "unexpected error: {err:?}");
    assert!(cache.get().is_none());

    loader.put_file(missing, common::tiny_png([0, 0, 0, 255]));
    let bundle = cache.ensure_init().await.expect("retry succeeds");
    assert_eq!(bundle.mount_total, 400);
}

#[tokio::test]
async fn upstream_count_failure_surfaces_as_init_error() {
    let loader = Arc::new(MemoryLoader::default());
    seed_assets(&loader);
    loader.respond(MINIONS_URL, 500, "boom");
    let cache = AssetCache::new(loader.clone(), Arc::new(card_config()));

    let err = cache.ensure_init().await.expect_err("minion count fails");
    assert!(matches!(err, AppError::Init(_)));
}

#[tokio::test]
async fn exception_ids_merge_static_and_remote_lists() {
    let loader = Arc::new(MemoryLoader::default());
    seed_assets(&loader);
    loader.respond(
        "http://collect.test/exceptions.json",
        200,
        "[111, 222]",
    );
    let mut config = card_config();
    config.exception_ids_url = Some("http://collect.test/exceptions.json".to_string());
    config.exception_item_ids = vec![222, 333];
    let cache = AssetCache::new(loader, Arc::new(config));

    let bundle = cache.ensure_init().await.expect("init");
    let mut ids: Vec<u32> = bundle.exception_ids.iter().copied().collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![111, 222, 333]);
}
