// Scenario Tests
// End-to-end stories driven through the registry facade with block confirmations

use claimtrie::claim::{AbandonOutcome, PublishOutcome};
use claimtrie::event::{AbandonTarget, ChainUpdate};
use claimtrie::registry::{ChannelRef, PublishRequest, Registry, TxContext};
use claimtrie::{AccountId, Amount, ClaimId, Outpoint, RegistryConfig, TriePath, TxId};

// ============================================================================
// HARNESS
// ============================================================================

fn lbc(s: &str) -> Amount {
    s.parse().expect("valid amount")
}

/// A registry plus a toy chain that mines one block per confirmed transaction
struct Chain {
    registry: Registry,
    height: u64,
    counter: u32,
}

impl Chain {
    fn new() -> Self {
        Self {
            registry: Registry::new(RegistryConfig::default().with_enforce_balances(true)),
            height: 0,
            counter: 0,
        }
    }

    /// A fresh pending transaction for `account`
    fn tx(&mut self, account: &str, fee: &str) -> TxContext {
        self.counter += 1;
        let txid = TxId::digest(format!("tx-{}", self.counter).as_bytes());
        TxContext::new(Outpoint::new(txid, 0), account).with_fee(lbc(fee))
    }

    /// Mine a block containing `txid`
    fn confirm_tx(&mut self, txid: TxId) {
        self.height += 1;
        self.registry
            .apply(ChainUpdate::Confirmed { txid, height: self.height })
            .unwrap();
        self.registry.apply(ChainUpdate::Tip { height: self.height }).unwrap();
    }

    fn generate(&mut self, blocks: u64) {
        self.height += blocks;
        self.registry.apply(ChainUpdate::Tip { height: self.height }).unwrap();
    }

    fn balance(&self, account: &str, confirmations: u64) -> String {
        self.registry
            .balance(&AccountId::from(account), confirmations)
            .to_string()
    }
}

// ============================================================================
// THE ADVENTURE
// ============================================================================

#[test]
fn test_adventure_of_a_channel_owner() {
    let mut chain = Chain::new();

    // Starting funds
    let funding = chain.tx("chris", "0");
    chain.registry.receive(&funding, lbc("10.0")).unwrap();
    chain.confirm_tx(funding.outpoint.txid);
    assert_eq!(chain.balance("chris", 0), "10.0");

    // Register the @spam channel
    let tx = chain.tx("chris", "0.010107");
    let channel_id = match chain.registry.publish(&tx, PublishRequest::new("@spam", lbc("1.0"))).unwrap() {
        PublishOutcome::Created(id) => id,
        other => panic!("expected a new channel, got {:?}", other),
    };
    chain.confirm_tx(tx.outpoint.txid);

    let channels = chain.registry.channels_of(&AccountId::from("chris"));
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].name(), "@spam");
    assert_eq!(chain.balance("chris", 0), "8.989893");

    chain.generate(6);
    assert_eq!(chain.balance("chris", 6), "8.989893");

    let resolution = chain.registry.resolve("lbry://@spam").unwrap();
    let certificate = resolution.certificate.as_ref().expect("channel resolves");
    assert_eq!(certificate.claim_id, channel_id);
    assert_eq!(resolution.claims_in_channel, Some(0));

    // Publish into the channel
    let tx = chain.tx("chris", "0.020107");
    let claim1 = chain
        .registry
        .publish(
            &tx,
            PublishRequest::new("hovercraft", lbc("1.0"))
                .in_channel(ChannelRef::Id(channel_id))
                .content("eels-v1"),
        )
        .unwrap();
    chain.confirm_tx(tx.outpoint.txid);
    assert_eq!(chain.balance("chris", 0), "7.969786");

    let resolution = chain.registry.resolve("lbry://@spam/hovercraft").unwrap();
    assert_eq!(resolution.claim.as_ref().map(|c| c.claim_id), Some(*claim1.claim_id()));

    chain.generate(5);
    assert_eq!(chain.balance("chris", 0), "7.969786");

    // Fix typos: same name and channel, so the claim is updated in place
    let tx = chain.tx("chris", "0.0002");
    let claim2 = chain
        .registry
        .publish(
            &tx,
            PublishRequest::new("hovercraft", lbc("1.0"))
                .in_channel(ChannelRef::Name("@spam".to_string()))
                .content("eels-v2"),
        )
        .unwrap();
    assert_eq!(claim2, PublishOutcome::Updated(*claim1.claim_id()));
    chain.confirm_tx(tx.outpoint.txid);

    // Take it down
    let tx = chain.tx("chris", "0.000205");
    let outcome = chain
        .registry
        .abandon(&tx, AbandonTarget::Claim(*claim1.claim_id()))
        .unwrap();
    assert_eq!(outcome, AbandonOutcome::Abandoned(*claim1.claim_id()));
    chain.confirm_tx(tx.outpoint.txid);

    let resolution = chain.registry.resolve("lbry://@spam/hovercraft").unwrap();
    assert!(resolution.claim.is_none());
    assert!(resolution.certificate.is_some());

    chain.generate(5);
    assert_eq!(chain.balance("chris", 0), "8.969381");

    // Send a friend 1 LBC
    let tx = chain.tx("chris", "0.000124");
    chain
        .registry
        .transfer(&tx, &AccountId::from("ramsey"), lbc("1.0"))
        .unwrap();
    chain.confirm_tx(tx.outpoint.txid);
    chain.generate(5);
    assert_eq!(chain.balance("chris", 0), "7.969257");
    assert_eq!(chain.balance("ramsey", 0), "1.0");
    assert_eq!(chain.balance("ramsey", 6), "1.0");

    // A fresh start
    let tx = chain.tx("chris", "0.0001");
    let claim3 = *chain
        .registry
        .publish(
            &tx,
            PublishRequest::new("fresh-start", lbc("1.0")).in_channel(ChannelRef::Name("@spam".to_string())),
        )
        .unwrap()
        .claim_id();
    chain.confirm_tx(tx.outpoint.txid);
    chain.generate(5);
    let uri = "lbry://@spam/fresh-start";

    // The friend supports it
    let support_tx = chain.tx("ramsey", "0.0001");
    chain.registry.support(&support_tx, &claim3, lbc("0.2")).unwrap();
    chain.confirm_tx(support_tx.outpoint.txid);

    let claim = chain.registry.resolve(uri).unwrap().into_claim().unwrap();
    assert_eq!(claim.amount.to_string(), "1.0");
    assert_eq!(claim.effective_amount.to_string(), "1.2");
    assert_eq!(claim.supports[0].amount.to_string(), "0.2");
    assert_eq!(claim.supports[0].txid, support_tx.outpoint.txid);
    chain.generate(5);

    // ... and tips it
    let tip_tx = chain.tx("ramsey", "0.0001");
    chain.registry.tip(&tip_tx, &claim3, lbc("0.3")).unwrap();
    chain.confirm_tx(tip_tx.outpoint.txid);

    let claim = chain.registry.resolve(uri).unwrap().into_claim().unwrap();
    assert_eq!(claim.supports[1].amount.to_string(), "0.3");
    assert_eq!(claim.supports[1].txid, tip_tx.outpoint.txid);
    chain.generate(5);

    // The author supports his own claim too
    let own_tx = chain.tx("chris", "0.0001");
    chain.registry.support(&own_tx, &claim3, lbc("0.4")).unwrap();
    chain.confirm_tx(own_tx.outpoint.txid);

    let claim = chain.registry.resolve(uri).unwrap().into_claim().unwrap();
    assert_eq!(claim.supports.len(), 3);
    assert_eq!(claim.supports[2].amount.to_string(), "0.4");
    assert_eq!(claim.supports[2].txid, own_tx.outpoint.txid);
    assert_eq!(claim.effective_amount.to_string(), "1.9");
    chain.generate(5);

    // A song that did not work out, abandoned by outpoint
    let tx = chain.tx("chris", "0.0001");
    let claim4 = chain
        .registry
        .publish(
            &tx,
            PublishRequest::new("hit-song", lbc("1.0")).in_channel(ChannelRef::Id(channel_id)),
        )
        .unwrap();
    chain.confirm_tx(tx.outpoint.txid);
    chain.generate(5);
    assert!(chain.registry.resolve("lbry://@spam/hit-song").unwrap().claim.is_some());

    let abandon_tx = chain.tx("chris", "0.0001");
    let outcome = chain
        .registry
        .abandon(&abandon_tx, AbandonTarget::Outpoint(tx.outpoint))
        .unwrap();
    assert_eq!(outcome, AbandonOutcome::Abandoned(*claim4.claim_id()));
    chain.confirm_tx(abandon_tx.outpoint.txid);

    let resolution = chain.registry.resolve("lbry://@spam/hit-song").unwrap();
    assert!(resolution.claim.is_none());
}

// ============================================================================
// CORE SCENARIO
// ============================================================================

#[test]
fn test_update_abandon_support_tip_sequence() {
    let mut chain = Chain::new();
    let funding = chain.tx("alice", "0");
    chain.registry.receive(&funding, lbc("10.0")).unwrap();
    let funding = chain.tx("bob", "0");
    chain.registry.receive(&funding, lbc("10.0")).unwrap();

    let tx = chain.tx("alice", "0");
    let channel = *chain
        .registry
        .publish(&tx, PublishRequest::new("@spam", lbc("0.01")))
        .unwrap()
        .claim_id();

    // Claim A in the channel
    let tx = chain.tx("alice", "0");
    let a = *chain
        .registry
        .publish(
            &tx,
            PublishRequest::new("hovercraft", lbc("1.0"))
                .in_channel(ChannelRef::Id(channel))
                .content("v1"),
        )
        .unwrap()
        .claim_id();
    let path = TriePath::in_channel(channel, "hovercraft");
    assert_eq!(chain.registry.winner_at(&path).map(|c| *c.claim_id()), Some(a));

    // Update A
    let tx = chain.tx("alice", "0");
    let outcome = chain
        .registry
        .publish(
            &tx,
            PublishRequest::new("hovercraft", lbc("1.0"))
                .in_channel(ChannelRef::Id(channel))
                .content("v2"),
        )
        .unwrap();
    assert_eq!(outcome, PublishOutcome::Updated(a));
    assert_eq!(chain.registry.winner_at(&path).map(|c| *c.claim_id()), Some(a));
    assert_eq!(chain.registry.claim(&a).unwrap().content_ref().as_str(), "v2");

    // Abandon A
    let tx = chain.tx("alice", "0");
    chain.registry.abandon(&tx, AbandonTarget::Claim(a)).unwrap();
    assert!(chain.registry.winner_at(&path).is_none());
    assert!(chain.registry.claim(&a).unwrap().is_abandoned());

    // Claim B elsewhere, then support and tip it
    let tx = chain.tx("alice", "0");
    let b: ClaimId = *chain
        .registry
        .publish(&tx, PublishRequest::new("eels", lbc("1.0")))
        .unwrap()
        .claim_id();
    let before = chain.registry.effective_amount(&b).unwrap();

    let tx = chain.tx("bob", "0");
    let after = chain.registry.support(&tx, &b, lbc("0.2")).unwrap();
    assert_eq!(after, before.checked_add(lbc("0.2")).unwrap());
    let stakes = chain.registry.stakes_of(&b);
    assert_eq!(stakes[0].amount(), lbc("0.2"));

    let tx = chain.tx("bob", "0");
    chain.registry.tip(&tx, &b, lbc("0.3")).unwrap();
    let stakes = chain.registry.stakes_of(&b);
    assert_eq!(stakes.len(), 2);
    assert_eq!(stakes[1].amount(), lbc("0.3"));
}
