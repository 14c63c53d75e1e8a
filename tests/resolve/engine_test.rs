use claimtrie::claim::StakeKind;
use claimtrie::event::AbandonTarget;
use claimtrie::registry::{ChannelRef, PublishRequest, Registry, RegistryError, TxContext};
use claimtrie::resolve::ResolveError;
use claimtrie::{Amount, ClaimId, Outpoint, RegistryConfig, TxId};

fn lbc(s: &str) -> Amount {
    s.parse().unwrap()
}

fn tx(label: &str, account: &str) -> TxContext {
    TxContext::new(Outpoint::new(TxId::digest(label.as_bytes()), 0), account)
}

fn publish(registry: &mut Registry, label: &str, account: &str, request: PublishRequest) -> ClaimId {
    *registry.publish(&tx(label, account), request).unwrap().claim_id()
}

/// @spam with three songs, a competing bare "eels" from bob, and a support
fn populated() -> (Registry, ClaimId, ClaimId) {
    let mut registry = Registry::new(RegistryConfig::default());
    let spam = publish(&mut registry, "chan", "chris", PublishRequest::new("@spam", lbc("1.0")));
    let eels = publish(
        &mut registry,
        "eels",
        "chris",
        PublishRequest::new("eels", lbc("0.5"))
            .in_channel(ChannelRef::Id(spam))
            .content("eels-sd"),
    );
    for name in ["hovercraft", "ham"] {
        publish(
            &mut registry,
            name,
            "chris",
            PublishRequest::new(name, lbc("0.1")).in_channel(ChannelRef::Name("@spam".to_string())),
        );
    }
    publish(&mut registry, "bob-eels", "bob", PublishRequest::new("eels", lbc("0.4")));
    registry.support(&tx("support", "fan"), &eels, lbc("0.2")).unwrap();
    registry.advance_tip(10);
    (registry, spam, eels)
}

// ============================================================================
// SINGLE URI TESTS
// ============================================================================

#[test]
fn test_bare_name_shows_claim_and_certificate() {
    let (registry, spam, eels) = populated();
    let resolution = registry.resolve("lbry://eels").unwrap();

    let claim = resolution.claim.as_ref().unwrap();
    assert_eq!(claim.claim_id, eels);
    assert_eq!(claim.amount, lbc("0.5"));
    assert_eq!(claim.effective_amount, lbc("0.7"));
    assert_eq!(claim.signing_channel, Some(spam));
    assert_eq!(claim.supports.len(), 1);
    assert_eq!(claim.supports[0].kind, StakeKind::Support);
    assert_eq!(claim.confirmations, 0);
    assert_eq!(resolution.certificate.as_ref().unwrap().claim_id, spam);
    assert!(resolution.error.is_none());
}

#[test]
fn test_channel_only() {
    let (registry, spam, _) = populated();
    let resolution = registry.resolve("@spam").unwrap();

    assert!(resolution.is_resolved());
    assert!(resolution.claim.is_none());
    assert_eq!(resolution.claims_in_channel, Some(3));
    assert_eq!(resolution.channel_contents, Some(Vec::new()));
    assert_eq!(resolution.into_claim().unwrap().claim_id, spam);
}

#[test]
fn test_channel_qualified_name_ignores_bare_competition() {
    let (mut registry, spam, eels) = populated();
    // Bob outbids at the bare name but is not in the channel
    publish(&mut registry, "bob-eels-2", "bob", PublishRequest::new("eels", lbc("5.0")));
    assert_ne!(registry.resolve("eels").unwrap().claim.unwrap().claim_id, eels);

    let resolution = registry.resolve("lbry://@spam/eels").unwrap();
    assert_eq!(resolution.certificate.unwrap().claim_id, spam);
    assert_eq!(resolution.claim.unwrap().claim_id, eels);
}

#[test]
fn test_missing_content_under_existing_channel() {
    let (registry, spam, _) = populated();
    let resolution = registry.resolve("@spam/nothing").unwrap();

    assert_eq!(resolution.certificate.unwrap().claim_id, spam);
    assert!(resolution.claim.is_none());
    assert!(resolution.error.is_none());
}

#[test]
fn test_unresolved_name() {
    let (registry, _, _) = populated();
    let resolution = registry.resolve("lbry://nothing").unwrap();

    assert!(!resolution.is_resolved());
    assert_eq!(resolution.error.as_deref(), Some("lbry://nothing did not resolve to a claim"));
    assert_eq!(
        resolution.into_claim(),
        Err(ResolveError::Unresolved("lbry://nothing".to_string()))
    );
}

#[test]
fn test_claim_id_prefix_selects_loser() {
    let (registry, _, eels) = populated();
    let loser = registry
        .claims()
        .claims_named("eels")
        .into_iter()
        .find(|c| c.claim_id() != &eels)
        .map(|c| *c.claim_id())
        .unwrap();

    let prefix = &loser.to_hex()[..8];
    let resolution = registry.resolve(&format!("eels#{}", prefix)).unwrap();
    assert_eq!(resolution.claim.unwrap().claim_id, loser);

    let full = registry.resolve(&format!("eels#{}", eels.to_hex().to_uppercase())).unwrap();
    assert_eq!(full.claim.unwrap().claim_id, eels);
}

#[test]
fn test_malformed_uri_is_an_error() {
    let (registry, _, _) = populated();
    assert!(matches!(
        registry.resolve("http://eels"),
        Err(RegistryError::Resolve(ResolveError::InvalidUri { .. }))
    ));
}

#[test]
fn test_abandoned_channel_orphans_certificate() {
    let (mut registry, spam, eels) = populated();
    registry
        .abandon(&tx("drop-chan", "chris"), AbandonTarget::Claim(spam))
        .unwrap();

    let resolution = registry.resolve("eels").unwrap();
    let claim = resolution.claim.unwrap();
    assert_eq!(claim.claim_id, eels);
    assert_eq!(claim.signing_channel, None);
    assert!(resolution.certificate.is_none());
    assert!(!registry.resolve("@spam").unwrap().is_resolved());
}

// ============================================================================
// BATCH AND LISTING TESTS
// ============================================================================

#[test]
fn test_resolve_many_marks_each_uri() {
    let (registry, _, eels) = populated();
    let results = registry.resolve_many(&["eels", "nothing", "http://bad"]);

    assert_eq!(results.len(), 3);
    assert_eq!(results["eels"].claim.as_ref().unwrap().claim_id, eels);
    assert!(results["nothing"].error.is_some());
    assert!(results["http://bad"].error.as_ref().unwrap().starts_with("Invalid URI"));
}

#[test]
fn test_list_channel_pages_by_name() {
    let (registry, spam, _) = populated();

    let first = registry.list_channel("@spam", 1, 2).unwrap();
    assert_eq!(first.channel.claim_id, spam);
    assert_eq!(first.total_items, 3);
    assert_eq!(first.total_pages, 2);
    let names: Vec<_> = first.items.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["eels", "ham"]);

    let second = registry.list_channel("@spam", 2, 2).unwrap();
    let names: Vec<_> = second.items.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["hovercraft"]);

    assert!(registry.list_channel("@spam", 3, 2).unwrap().items.is_empty());
}

#[test]
fn test_list_channel_errors() {
    let (registry, _, _) = populated();
    assert!(matches!(
        registry.list_channel("@spam", 0, 10),
        Err(RegistryError::Resolve(ResolveError::InvalidPage(_)))
    ));
    assert!(matches!(
        registry.list_channel("@spam/eels", 1, 10),
        Err(RegistryError::Resolve(ResolveError::InvalidUri { .. }))
    ));
    assert!(matches!(
        registry.list_channel("@nobody", 1, 10),
        Err(RegistryError::Resolve(ResolveError::Unresolved(_)))
    ));
}

#[test]
fn test_json_output_shape() {
    let (registry, _, _) = populated();
    let json = serde_json::to_value(registry.resolve("eels").unwrap()).unwrap();

    assert_eq!(json["claim"]["amount"], "0.5");
    assert_eq!(json["claim"]["effective_amount"], "0.7");
    assert_eq!(json["claim"]["supports"][0]["amount"], "0.2");
    assert!(json.get("error").is_none());
    assert!(json.get("uri").is_none());
}
