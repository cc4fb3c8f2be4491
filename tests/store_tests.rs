use std::collections::HashSet;
use std::sync::Arc;

use pretty_assertions::assert_eq;

use prgrader::grader::Verdict;
use prgrader::store::{MemoryStore, SqliteStore, VerdictSink};

fn wrong_answer() -> Verdict {
    Verdict {
        user: "Star Brilliant".to_string(),
        url: "https://github.com/m13253/solution/tree/0123abcd".to_string(),
        error: Some("Wrong answer"),
        stdout: "15\n".to_string(),
        stderr: String::new(),
    }
}

fn correct() -> Verdict {
    Verdict {
        user: "James Swineson".to_string(),
        url: "https://github.com/Jamesits/solution/tree/4567cdef".to_string(),
        error: None,
        stdout: "14\n".to_string(),
        stderr: "make: warning\n".to_string(),
    }
}

#[tokio::test]
async fn test_sqlite_store_appends_and_lists_in_order() {
    let store = SqliteStore::connect(None).await.unwrap();

    let first = store.record(&wrong_answer()).await.unwrap();
    let second = store.record(&correct()).await.unwrap();
    assert_eq!(first, 1);
    assert_eq!(second, 2);

    let records = store.list().await.unwrap();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].id, 1);
    assert_eq!(records[0].user, "Star Brilliant");
    assert_eq!(records[0].error, Some("Wrong answer".to_string()));
    assert_eq!(records[0].stdout, "15\n");

    assert_eq!(records[1].id, 2);
    assert_eq!(records[1].error, None);
    assert_eq!(records[1].stderr, "make: warning\n");
    assert!(!records[1].created_time.is_empty());
}

#[tokio::test]
async fn test_sqlite_store_persists_across_reconnects() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("verdicts.sqlite3");
    let db_path = db_path.to_str().unwrap();

    {
        let store = SqliteStore::connect(Some(db_path)).await.unwrap();
        store.record(&wrong_answer()).await.unwrap();
    }

    let store = SqliteStore::connect(Some(db_path)).await.unwrap();
    let id = store.record(&correct()).await.unwrap();
    assert_eq!(id, 2);

    let records = store.list().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].error, Some("Wrong answer".to_string()));
    assert_eq!(records[1].error, None);
}

#[tokio::test]
async fn test_memory_store_matches_sqlite_semantics() {
    let sqlite = SqliteStore::connect(None).await.unwrap();
    let memory = MemoryStore::new();

    for verdict in [wrong_answer(), correct()] {
        sqlite.record(&verdict).await.unwrap();
        memory.record(&verdict).await.unwrap();
    }

    let from_sqlite = sqlite.list().await.unwrap();
    let from_memory = memory.list().await.unwrap();
    assert_eq!(from_sqlite.len(), from_memory.len());

    for (a, b) in from_sqlite.iter().zip(from_memory.iter()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.user, b.user);
        assert_eq!(a.url, b.url);
        assert_eq!(a.error, b.error);
        assert_eq!(a.stdout, b.stdout);
        assert_eq!(a.stderr, b.stderr);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_get_distinct_ids() {
    let store: Arc<dyn VerdictSink> = Arc::new(SqliteStore::connect(None).await.unwrap());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.record(&wrong_answer()).await.unwrap()
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap());
    }

    assert_eq!(ids.len(), 8);
    assert_eq!(store.list().await.unwrap().len(), 8);
}
