use std::sync::Arc;

use chrono::NaiveDate;
use fintrack_core::{FixedClock, Services};
use fintrack_domain::{Amount, EntryId, EntryKind, NewEntry, UserId};

fn ledger_sum(services: &Services, uid: &UserId) -> Amount {
    let income: Amount = services
        .entries
        .list(uid, EntryKind::Income)
        .unwrap()
        .iter()
        .map(|entry| entry.amount)
        .sum();
    let expenses: Amount = services
        .entries
        .list(uid, EntryKind::Expense)
        .unwrap()
        .iter()
        .map(|entry| entry.amount)
        .sum();
    income - expenses
}

#[test]
fn total_matches_ledger_after_mixed_writes() {
    let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let services = Services::in_memory(Arc::new(FixedClock::on(day)));
    let uid = UserId::new("u1");
    let other = UserId::new("u2");
    services.users.add(uid.clone(), "One").unwrap();
    services.users.add(other.clone(), "Two").unwrap();

    let mut live: Vec<(EntryKind, EntryId)> = Vec::new();
    for step in 0..40i64 {
        let kind = if step % 3 == 0 {
            EntryKind::Income
        } else {
            EntryKind::Expense
        };
        let owner = if step % 5 == 0 { &other } else { &uid };
        let entry = NewEntry::new(
            owner.clone(),
            format!("step {step}"),
            Amount::new(step * 7 + 3),
            if step % 2 == 0 { "Food" } else { "Bills" },
            day,
        );
        let stored = services.entries.add(kind, entry).unwrap();
        live.push((kind, stored.id));

        if step % 4 == 3 {
            let (kind, id) = live.remove(live.len() / 2);
            assert!(services.entries.delete(kind, id).unwrap());
        }

        for user in [&uid, &other] {
            assert_eq!(
                services.users.total(user).unwrap(),
                Some(ledger_sum(&services, user)),
                "total drifted at step {step}"
            );
        }
    }
}
