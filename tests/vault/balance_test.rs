// Balance tracking tests for the vault module

use claimtrie::vault::{
    confirmations, Accountant, EntryKind, LedgerEntry, VaultError,
};
use claimtrie::{AccountId, Amount, Outpoint, TxId};

fn outpoint(label: &str) -> Outpoint {
    Outpoint::new(TxId::digest(label.as_bytes()), 0)
}

fn lbc(s: &str) -> Amount {
    s.parse().unwrap()
}

fn entry(label: &str, kind: EntryKind, received: &str, sent: &str, fee: &str, height: u64) -> LedgerEntry {
    LedgerEntry::new(outpoint(label), kind, lbc(received), lbc(sent), lbc(fee), height)
}

// ============================================================================
// ACCOUNTANT CREATION TESTS
// ============================================================================

#[test]
fn test_unknown_account_has_zero_balance() {
    let accountant = Accountant::new();
    let nobody = AccountId::from("nobody");

    assert_eq!(accountant.unconfirmed_balance(&nobody), Amount::ZERO);
    assert_eq!(accountant.confirmed_balance(&nobody, 6, 100), Amount::ZERO);
    assert!(accountant.ledger(&nobody).is_none());
    assert_eq!(accountant.account_count(), 0);
}

// ============================================================================
// LEDGER ENTRY TESTS
// ============================================================================

#[test]
fn test_entry_net() {
    let publish = entry("p", EntryKind::Publish, "0", "1.0", "0.01", 0);
    assert_eq!(publish.net(), -101_000_000);

    let abandon = entry("a", EntryKind::Abandon, "1.0", "0", "0.0002", 0);
    assert_eq!(abandon.net(), 99_980_000);
}

#[test]
fn test_entry_confirmations_follow_tip() {
    let confirmed = entry("c", EntryKind::Receive, "1", "0", "0", 10);
    assert_eq!(confirmed.confirmations(10), 1);
    assert_eq!(confirmed.confirmations(15), 6);
    assert_eq!(confirmations(0, 15), 0);
}

// ============================================================================
// BALANCE TESTS
// ============================================================================

#[test]
fn test_publish_and_abandon_cycle() {
    let mut accountant = Accountant::new();
    let chris = AccountId::from("chris");

    accountant.record(&chris, entry("in", EntryKind::Receive, "10.0", "0", "0", 1));
    accountant.record(&chris, entry("pub", EntryKind::Publish, "0", "1.0", "0.010107", 2));
    assert_eq!(accountant.unconfirmed_balance(&chris).to_string(), "8.989893");

    accountant.record(&chris, entry("abandon", EntryKind::Abandon, "1.0", "0", "0.000205", 0));
    assert_eq!(accountant.unconfirmed_balance(&chris).to_string(), "9.989688");
    // The pending abandon is not counted at one confirmation
    assert_eq!(accountant.confirmed_balance(&chris, 1, 2).to_string(), "8.989893");
}

#[test]
fn test_confirm_moves_entries_into_depth() {
    let mut accountant = Accountant::new();
    let alice = AccountId::from("alice");
    let bob = AccountId::from("bob");

    let transfer = outpoint("transfer");
    accountant.record(&alice, entry("in", EntryKind::Receive, "5.0", "0", "0", 1));
    accountant.record(&alice, LedgerEntry::new(transfer, EntryKind::TransferOut, Amount::ZERO, lbc("2.0"), lbc("0.1"), 0));
    accountant.record(&bob, LedgerEntry::new(transfer, EntryKind::TransferIn, lbc("2.0"), Amount::ZERO, Amount::ZERO, 0));

    assert_eq!(accountant.confirmed_balance(&bob, 1, 5), Amount::ZERO);
    assert_eq!(accountant.confirm(&transfer.txid, 5), 2);
    assert_eq!(accountant.confirmed_balance(&bob, 1, 5), lbc("2.0"));
    assert_eq!(accountant.confirmed_balance(&bob, 6, 5), Amount::ZERO);
    assert_eq!(accountant.confirmed_balance(&bob, 6, 10), lbc("2.0"));
    assert_eq!(accountant.confirmed_balance(&alice, 1, 5), lbc("2.9"));

    // Confirming again at the same height changes nothing
    assert_eq!(accountant.confirm(&transfer.txid, 5), 0);
}

#[test]
fn test_ensure_available_counts_pending() {
    let mut accountant = Accountant::new();
    let alice = AccountId::from("alice");
    accountant.record(&alice, entry("in", EntryKind::Receive, "1.0", "0", "0", 0));

    assert!(accountant.ensure_available(&alice, Amount::ZERO).is_ok());
    assert!(accountant.ensure_available(&alice, lbc("1.0")).is_ok());
    assert!(matches!(
        accountant.ensure_available(&alice, lbc("1.00000001")),
        Err(VaultError::InsufficientBalance { .. })
    ));
    assert!(matches!(
        accountant.ensure_available(&AccountId::from("bob"), lbc("0.1")),
        Err(VaultError::InsufficientBalance { .. })
    ));
}

#[test]
fn test_accounts_sorted_and_ledger_kept_in_order() {
    let mut accountant = Accountant::new();
    for name in ["carol", "alice", "bob"] {
        accountant.record(&AccountId::from(name), entry(name, EntryKind::Receive, "1", "0", "0", 0));
    }
    let alice = AccountId::from("alice");
    accountant.record(&alice, entry("tip", EntryKind::Tip, "0", "0.3", "0", 0));

    let names: Vec<_> = accountant.accounts().iter().map(|a| a.as_str().to_string()).collect();
    assert_eq!(names, vec!["alice", "bob", "carol"]);

    let kinds: Vec<_> = accountant.ledger(&alice).unwrap().entries().iter().map(LedgerEntry::kind).collect();
    assert_eq!(kinds, vec![EntryKind::Receive, EntryKind::Tip]);
}
