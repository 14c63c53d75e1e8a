use claimtrie::claim::{ClaimError, ClaimStore, StakeAggregator};
use claimtrie::event::{ContentRef, PublishPayload};
use claimtrie::{AccountId, Amount, ClaimId, Outpoint, Stake, StakeKind, TxId};

fn outpoint(label: &str) -> Outpoint {
    Outpoint::new(TxId::digest(label.as_bytes()), 0)
}

fn store_with_claim(deposit: u64) -> (ClaimStore, ClaimId) {
    let mut store = ClaimStore::new();
    let account = AccountId::from("alice");
    let payload = PublishPayload {
        name: "eels".to_string(),
        channel_id: None,
        content_ref: ContentRef::default(),
        claim_id: None,
    };
    let op = outpoint("claim");
    let decision = store.decide_publish(&account, &op, &payload, 255).unwrap();
    let outcome = store.commit_publish(&decision, &account, op, 0, Amount::from_dewies(deposit), &payload, 0);
    (store, *outcome.claim_id())
}

fn stake(target: ClaimId, label: &str, dewies: u64, kind: StakeKind) -> Stake {
    Stake::new(target, Amount::from_dewies(dewies), outpoint(label), AccountId::from("bob"), kind, 0)
}

// ============================================================================
// AGGREGATION TESTS
// ============================================================================

#[test]
fn test_supports_and_tips_both_count() {
    let (mut store, id) = store_with_claim(100);
    let mut aggregator = StakeAggregator::new();

    for s in [stake(id, "s1", 20, StakeKind::Support), stake(id, "t1", 30, StakeKind::Tip)] {
        aggregator.add_stake(&s);
        store.push_stake(s);
    }

    let claim = store.get(&id).unwrap();
    assert_eq!(aggregator.stake_total(&id), Amount::from_dewies(50));
    assert_eq!(aggregator.effective_amount(claim), Amount::from_dewies(150));

    let kinds: Vec<_> = store.stakes(&id).iter().map(Stake::kind).collect();
    assert_eq!(kinds, vec![StakeKind::Support, StakeKind::Tip]);
    assert!(kinds[0].is_redeemable());
    assert!(!kinds[1].is_redeemable());
}

#[test]
fn test_abandoned_claim_has_no_effective_amount() {
    let (mut store, id) = store_with_claim(100);
    let mut aggregator = StakeAggregator::new();
    let s = stake(id, "s1", 20, StakeKind::Support);
    aggregator.add_stake(&s);
    store.push_stake(s);

    store.commit_abandon(&id);
    let claim = store.get(&id).unwrap();
    assert_eq!(aggregator.effective_amount(claim), Amount::ZERO);
    assert_eq!(aggregator.raw_amount(claim), Amount::from_dewies(120));
}

#[test]
fn test_rebuild_matches_incremental() {
    let (mut store, id) = store_with_claim(5);
    let mut incremental = StakeAggregator::new();
    for (i, dewies) in [1u64, 2, 3].into_iter().enumerate() {
        let s = stake(id, &format!("s{}", i), dewies, StakeKind::Support);
        incremental.add_stake(&s);
        store.push_stake(s);
    }

    let mut rebuilt = StakeAggregator::new();
    rebuilt.rebuild(&store);
    assert_eq!(rebuilt.stake_total(&id), incremental.stake_total(&id));
    assert_eq!(rebuilt.stake_total(&id), Amount::from_dewies(6));
    assert_eq!(store.stake_count(), 3);
}

#[test]
fn test_overflow_is_refused() {
    let (store, id) = store_with_claim(u64::MAX - 10);
    let aggregator = StakeAggregator::new();
    let claim = store.get(&id).unwrap();

    assert!(aggregator.can_add(claim, Amount::from_dewies(10)).is_ok());
    assert_eq!(aggregator.can_add(claim, Amount::from_dewies(11)), Err(ClaimError::StakeOverflow));
}

#[test]
fn test_confirm_updates_stake_height() {
    let (mut store, id) = store_with_claim(5);
    store.push_stake(stake(id, "s1", 1, StakeKind::Tip));

    assert_eq!(store.confirm(&outpoint("s1").txid, 12), 1);
    assert_eq!(store.stakes(&id)[0].height(), 12);
    assert_eq!(store.confirm(&TxId::digest(b"unknown"), 12), 0);
}
