//! Property tests for roster import and ticket export

#![allow(clippy::unwrap_used)] // Tests can unwrap

use proptest::prelude::*;
use std::sync::Arc;
use ticketera_core::types::NewUser;
use ticketera_ledger::{Ledger, LedgerEnvironment, export_tickets_csv, parse_roster_csv};
use ticketera_testing::properties::{csv_text, valid_rut};
use ticketera_testing::{InMemoryStore, test_clock};

fn empty_ledger() -> Ledger {
    Ledger::new(LedgerEnvironment::new(
        Arc::new(test_clock()),
        Arc::new(InMemoryStore::new()),
    ))
}

fn roster_strategy() -> impl Strategy<Value = Vec<NewUser>> {
    prop::collection::vec(
        (valid_rut(), csv_text(), csv_text())
            .prop_map(|(identity, name, group)| NewUser::new(identity, name, group)),
        1..20,
    )
}

proptest! {
    #[test]
    fn export_then_import_preserves_triples(rows in roster_strategy()) {
        let mut ledger = empty_ledger();
        for row in &rows {
            let user = ledger
                .create_user(&row.identity, row.name.clone(), row.group.clone())
                .unwrap();
            ledger.issue_ticket(user.id, &user.identity).unwrap();
        }

        let csv = export_tickets_csv(ledger.list_tickets());
        let parsed = parse_roster_csv(&csv).unwrap();

        prop_assert_eq!(parsed, rows);
    }

    #[test]
    fn import_keeps_one_user_per_identity(rows in roster_strategy()) {
        let mut ledger = empty_ledger();
        let doubled: Vec<NewUser> = rows.iter().chain(rows.iter()).cloned().collect();
        let report = ledger.import_users(doubled).unwrap();

        let mut distinct: Vec<&str> = rows.iter().map(|r| r.identity.as_str()).collect();
        distinct.sort_unstable();
        distinct.dedup();

        prop_assert_eq!(report.created, distinct.len());
        prop_assert_eq!(report.created + report.skipped, rows.len() * 2);
        prop_assert_eq!(ledger.list_users().len(), distinct.len());
    }

    #[test]
    fn at_most_one_ticket_per_identity_per_day(
        rows in roster_strategy(),
        claims in prop::collection::vec(any::<prop::sample::Index>(), 0..40),
    ) {
        let mut ledger = empty_ledger();
        ledger.import_users(rows.clone()).unwrap();

        for pick in claims {
            let row = &rows[pick.index(rows.len())];
            let _ = ledger.claim_ticket(&row.identity);
        }

        let mut seen: Vec<&str> = ledger
            .list_tickets()
            .iter()
            .map(|t| t.identity.as_str())
            .collect();
        let total = seen.len();
        seen.sort_unstable();
        seen.dedup();
        prop_assert_eq!(seen.len(), total);
    }
}
