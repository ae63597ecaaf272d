use offs::{
    BlockSize, Core, IngestOptions, Source, StoreConfig, DEFAULT_POOL,
};

fn in_memory_core() -> Core {
    Core::new(StoreConfig::new(BlockSize::Message, "/tmp/offs-unused-in-memory"))
}

#[tokio::test]
async fn ingest_reconstruct_and_pool_ops_round_trip() {
    let core = in_memory_core();

    let source = Source::Buffer(b"hello offs".to_vec());
    let cbl = core
        .ingest_file(DEFAULT_POOL, &source, IngestOptions::default(), None, 0)
        .await
        .unwrap();

    let recovered = core.reconstruct_file(DEFAULT_POOL, &cbl).await.unwrap();
    assert_eq!(recovered, b"hello offs");

    let pools = core.list_pools().await.unwrap();
    assert_eq!(pools, vec![DEFAULT_POOL.to_owned()]);

    let stats = core.get_pool_stats(DEFAULT_POOL).await.unwrap();
    assert!(stats.block_count >= 3);
}

#[tokio::test]
async fn extended_cbl_round_trips_mime_and_file_name() {
    let core = in_memory_core();

    let source = Source::Buffer(b"contents of a named file".to_vec());
    let options = IngestOptions {
        create_extended: true,
        mime_type: Some("text/plain".to_owned()),
        file_name: Some("notes.txt".to_owned()),
        ..IngestOptions::default()
    };

    let cbl = core
        .ingest_file(DEFAULT_POOL, &source, options, None, 0)
        .await
        .unwrap();

    let record = offs::CblRecord::decode(&cbl).unwrap();
    assert!(record.is_extended());
    assert_eq!(record.mime_type(), Some("text/plain"));
    assert_eq!(record.file_name(), Some("notes.txt"));

    let recovered = core.reconstruct_file(DEFAULT_POOL, &cbl).await.unwrap();
    assert_eq!(recovered, b"contents of a named file");
}

#[tokio::test]
async fn delete_pool_removes_an_unreferenced_pool() {
    let core = in_memory_core();

    let source = Source::Buffer(b"z".to_vec());
    core.ingest_file(DEFAULT_POOL, &source, IngestOptions::default(), None, 0)
        .await
        .unwrap();

    core.delete_pool(DEFAULT_POOL).await.unwrap();
    assert!(core.list_pools().await.unwrap().is_empty());
}

#[tokio::test]
async fn bootstrap_pool_seeds_whiteners_before_ingest() {
    let core = in_memory_core();
    core.bootstrap_pool("whiteners", 8, 0).await.unwrap();

    let stats_before = core.get_pool_stats("whiteners").await.unwrap();
    assert_eq!(stats_before.block_count, 8);

    let source = Source::Buffer(b"draws from the bootstrapped cache".to_vec());
    let cbl = core
        .ingest_file("whiteners", &source, IngestOptions::default(), None, 0)
        .await
        .unwrap();

    let recovered = core.reconstruct_file("whiteners", &cbl).await.unwrap();
    assert_eq!(recovered, b"draws from the bootstrapped cache");
}
