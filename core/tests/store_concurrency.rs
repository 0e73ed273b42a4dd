use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use catalog_core::{
    CatalogQuery, CatalogStore, Entry, FileBackend, InMemoryBackend, StorageBackend,
};
use tempfile::TempDir;

fn catalog(prefix: &str, count: usize) -> Vec<Entry> {
    (0..count)
        .map(|i| Entry::new(format!("{prefix}-{i:03}")).with_category(prefix))
        .collect()
}

fn sorted_names(entries: &[Entry]) -> Vec<String> {
    let mut names: Vec<_> = entries.iter().map(|entry| entry.name.clone()).collect();
    names.sort();
    names
}

#[test]
fn queries_observe_whole_catalogs_during_reloads() {
    let old = catalog("old", 40);
    let new = catalog("new", 25);
    let old_names = sorted_names(&old);
    let new_names = sorted_names(&new);

    let store = Arc::new(CatalogStore::open(
        InMemoryBackend::with_entries(&old).expect("seed"),
    ));
    let done = Arc::new(AtomicBool::new(false));

    let loader = {
        let store = Arc::clone(&store);
        let done = Arc::clone(&done);
        let (old, new) = (old.clone(), new.clone());
        thread::spawn(move || {
            for round in 0..200 {
                let next = if round % 2 == 0 { &new } else { &old };
                store.backend().store(next).expect("swap document");
                store.load().expect("reload");
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            let (old_names, new_names) = (old_names.clone(), new_names.clone());
            thread::spawn(move || {
                let mut observations = 0usize;
                while !done.load(Ordering::SeqCst) || observations == 0 {
                    let seen = sorted_names(&store.query(&CatalogQuery::new()).expect("query"));
                    assert!(
                        seen == old_names || seen == new_names,
                        "observed a mixed catalog of {} entries",
                        seen.len()
                    );
                    observations += 1;
                }
            })
        })
        .collect();

    loader.join().expect("loader thread panicked");
    for reader in readers {
        reader.join().expect("reader thread panicked");
    }
}

#[test]
fn concurrent_inserts_are_all_kept() {
    let temp_dir = TempDir::new().expect("temporary directory");
    let path = temp_dir.path().join("sites.json");
    let store = Arc::new(CatalogStore::new(FileBackend::new(&path)));

    let writers: Vec<_> = (0..8)
        .map(|writer| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..25 {
                    let durability = store
                        .insert(Entry::new(format!("writer{writer}-entry{i}")))
                        .expect("insert");
                    assert!(durability.is_persisted());
                }
            })
        })
        .collect();

    for handle in writers {
        handle.join().expect("writer thread panicked");
    }

    let in_memory = store.snapshot().expect("snapshot");
    assert_eq!(in_memory.len(), 200);

    let on_disk = FileBackend::new(&path).load().expect("read back");
    assert_eq!(sorted_names(&on_disk), sorted_names(&in_memory));
    assert_eq!(store.generation(), 200);
}

#[test]
fn writers_and_deleters_interleave_without_lost_updates() {
    let seed = catalog("seed", 50);
    let store = Arc::new(CatalogStore::open(
        InMemoryBackend::with_entries(&seed).expect("seed"),
    ));

    let deleter = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..50 {
                store.delete(&format!("seed-{i:03}")).expect("delete seed");
            }
        })
    };
    let inserter = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..30 {
                store.insert(Entry::new(format!("fresh-{i:03}"))).expect("insert");
            }
        })
    };

    deleter.join().expect("deleter thread panicked");
    inserter.join().expect("inserter thread panicked");

    let names = sorted_names(&store.snapshot().expect("snapshot"));
    let expected: Vec<_> = (0..30).map(|i| format!("fresh-{i:03}")).collect();
    assert_eq!(names, expected);
    assert_eq!(sorted_names(&store.backend().load().expect("persisted")), expected);
}
