use claimtrie::event::{ChainUpdate, ChannelSource, EventBuilder, EventSource, ReplaySource};
use claimtrie::registry::{run_feed, Registry, SharedRegistry};
use claimtrie::storage::RegistryStore;
use claimtrie::{AccountId, Amount, RegistryConfig, TxId};
use tempfile::TempDir;

fn receive(label: &str, account: &str, amount: &str) -> ChainUpdate {
    EventBuilder::new()
        .txid(TxId::digest(label.as_bytes()))
        .account(account)
        .amount(amount.parse().unwrap())
        .receive()
        .build()
        .unwrap()
        .into()
}

// ============================================================================
// SOURCE TESTS
// ============================================================================

#[tokio::test]
async fn test_replay_source_drains_in_order() {
    let mut source = ReplaySource::new(vec![ChainUpdate::Tip { height: 1 }, ChainUpdate::Tip { height: 2 }]);
    assert_eq!(source.remaining(), 2);
    assert_eq!(source.next_update().await, Some(ChainUpdate::Tip { height: 1 }));
    assert_eq!(source.next_update().await, Some(ChainUpdate::Tip { height: 2 }));
    assert_eq!(source.next_update().await, None);
}

#[tokio::test]
async fn test_channel_source_ends_when_sender_drops() {
    let (tx, mut source) = ChannelSource::new(4);
    tx.send(ChainUpdate::Tip { height: 5 }).await.unwrap();
    drop(tx);

    assert_eq!(source.next_update().await, Some(ChainUpdate::Tip { height: 5 }));
    assert_eq!(source.next_update().await, None);
}

// ============================================================================
// FEED TESTS
// ============================================================================

#[tokio::test]
async fn test_feed_counts_and_persists_accepted_updates() {
    let temp_dir = TempDir::new().unwrap();
    let store = RegistryStore::open(temp_dir.path()).unwrap();
    let registry = SharedRegistry::new(Registry::new(RegistryConfig::default().with_enforce_balances(true)));

    let overspend = EventBuilder::new()
        .txid(TxId::digest(b"spend"))
        .account("alice")
        .amount("5.0".parse().unwrap())
        .transfer("bob")
        .build()
        .unwrap()
        .into();

    let mut source = ReplaySource::new(vec![
        receive("r1", "alice", "1.0"),
        receive("r1", "alice", "1.0"),
        overspend,
        ChainUpdate::Tip { height: 3 },
    ]);

    let stats = run_feed(&mut source, &registry, Some(&store)).await.unwrap();
    assert_eq!(stats.applied, 2);
    assert_eq!(stats.duplicates, 1);
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.persisted, 2);

    assert_eq!(registry.balance(&AccountId::from("alice"), 0), Amount::from_dewies(100_000_000));
    assert_eq!(store.load_log().unwrap().len(), 2);
}

#[tokio::test]
async fn test_feed_from_spawned_producer() {
    let registry = SharedRegistry::new(Registry::new(RegistryConfig::default()));
    let (tx, mut source) = ChannelSource::new(1);

    let producer = tokio::spawn(async move {
        for i in 0..10 {
            tx.send(receive(&format!("r{}", i), "alice", "0.1")).await.unwrap();
        }
    });

    let stats = run_feed(&mut source, &registry, None).await.unwrap();
    producer.await.unwrap();

    assert_eq!(stats.applied, 10);
    assert_eq!(stats.persisted, 0);
    assert_eq!(registry.balance(&AccountId::from("alice"), 0).to_string(), "1.0");
}
