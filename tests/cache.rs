//! TTL behavior of the in-memory cache in real time.

use catalog_dispatch::{Cache, MemoryCache};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_entry_expires_after_ttl() {
    let cache = MemoryCache::new();
    cache.set("detail:USD:C1", b"{}".to_vec(), Duration::from_millis(100));
    assert_eq!(cache.get("detail:USD:C1"), Some(b"{}".to_vec()));

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(cache.get("detail:USD:C1"), None);
    assert_eq!(cache.purge_expired(), 1);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_overwrite_refreshes_ttl() {
    let cache = MemoryCache::new();
    cache.set("k", b"old".to_vec(), Duration::from_millis(50));
    cache.set("k", b"new".to_vec(), Duration::from_secs(60));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(cache.get("k"), Some(b"new".to_vec()));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_clear_drops_everything() {
    let cache = MemoryCache::new();
    for i in 0..10 {
        cache.set(&format!("k{}", i), vec![i as u8], Duration::from_secs(60));
    }
    assert_eq!(cache.len(), 10);

    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.get("k3"), None);
}

#[test]
fn test_parallel_writers_and_readers() {
    let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
    let mut handles = vec![];

    for t in 0..8 {
        let cache = Arc::clone(&cache);
        handles.push(std::thread::spawn(move || {
            for i in 0..200 {
                let key = format!("t{}:{}", t, i);
                cache.set(&key, key.clone().into_bytes(), Duration::from_secs(60));
                assert_eq!(cache.get(&key), Some(key.into_bytes()));
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(cache.get("t7:199"), Some(b"t7:199".to_vec()));
}
