use std::{path::PathBuf, sync::Arc};

use chrono::NaiveDate;
use fintrack::{
    fintrack_config::{Config, ConfigManager},
    fintrack_core::{FixedClock, PurgeOutcome},
    fintrack_domain::{Amount, EntryKind, NewBudget, NewEntry, UserId},
    FinTrackError, FinanceApp,
};
use tempfile::tempdir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn open_uses_default_database_under_home() {
    let dir = tempdir().expect("tempdir");
    let app = FinanceApp::open(dir.path()).expect("open");
    assert_eq!(
        app.database_path(),
        Some(dir.path().join("fintrack.db").as_path())
    );
    assert_eq!(app.config(), &Config::default());
    app.close().expect("close");
}

#[test]
fn configured_database_file_is_honoured() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");
    manager
        .save(&Config {
            database_file: Some(PathBuf::from("books/personal.db")),
            ..Config::default()
        })
        .expect("save");

    let app = FinanceApp::open(dir.path()).expect("open");
    assert_eq!(
        app.database_path(),
        Some(dir.path().join("books/personal.db").as_path())
    );
    app.close().expect("close");
}

#[test]
fn ledger_survives_close_and_reopen() {
    let dir = tempdir().expect("tempdir");
    let uid = UserId::new("u1");
    let clock = Arc::new(FixedClock::on(date(2024, 1, 20)));

    let app = FinanceApp::with_config(dir.path(), Config::default(), clock.clone()).expect("open");
    let services = app.services();
    services.users.ensure(uid.clone(), "Ada").expect("user");
    services
        .entries
        .add_income(NewEntry::new(uid.clone(), "Pay", Amount::new(1000), "Salary", date(2024, 1, 1)))
        .expect("income");
    let rent = services
        .entries
        .add_expense(NewEntry::new(uid.clone(), "Rent", Amount::new(300), "Housing", date(2024, 1, 2)))
        .expect("expense");
    services
        .budgets
        .add(NewBudget::new(uid.clone(), "Housing", Amount::new(600), date(2024, 1, 1), date(2024, 1, 31)).expect("range"))
        .expect("budget");
    assert_eq!(services.users.total(&uid).unwrap(), Some(Amount::new(700)));
    app.close().expect("close");

    let app = FinanceApp::with_config(dir.path(), Config::default(), clock).expect("reopen");
    let services = app.services();
    assert_eq!(services.users.total(&uid).unwrap(), Some(Amount::new(700)));
    assert_eq!(services.budgets.progress(&uid, "Housing").unwrap(), 50);
    assert_eq!(services.summary.all_transactions(&uid).unwrap().len(), 2);

    assert!(services.entries.delete(EntryKind::Expense, rent.id).unwrap());
    assert_eq!(services.users.total(&uid).unwrap(), Some(Amount::new(1000)));
    assert!(matches!(
        services.users.delete_all_data(&uid).unwrap(),
        PurgeOutcome::Purged(_)
    ));
    app.close().expect("close");
}

#[test]
fn malformed_config_surfaces_as_config_error() {
    let dir = tempdir().expect("tempdir");
    std::fs::write(dir.path().join("config.json"), "{ not json").expect("write");
    let err = FinanceApp::open(dir.path()).err().expect("error");
    assert!(matches!(err, FinTrackError::Config(_)));
}

#[test]
fn save_config_round_trips_through_home() {
    let dir = tempdir().expect("tempdir");
    let app = FinanceApp::open(dir.path()).expect("open");
    let updated = Config {
        currency: "EUR".into(),
        ..app.config().clone()
    };
    app.save_config(&updated).expect("save");
    app.close().expect("close");

    let app = FinanceApp::open(dir.path()).expect("reopen");
    assert_eq!(app.config().currency, "EUR");
    app.close().expect("close");
}

#[test]
fn balances_render_with_configured_currency_and_locale() {
    let dir = tempdir().expect("tempdir");
    let uid = UserId::new("u1");
    let config = Config {
        currency: "EUR".into(),
        locale: "de-DE".into(),
        ..Config::default()
    };
    let app = FinanceApp::with_config(dir.path(), config, Arc::new(FixedClock::on(date(2024, 1, 5))))
        .expect("open");
    let services = app.services();
    services.users.ensure(uid.clone(), "Ada").expect("user");
    services
        .entries
        .add_expense(NewEntry::new(uid.clone(), "Car", Amount::new(12_500), "Transport", date(2024, 1, 2)))
        .expect("expense");

    let total = services.users.total(&uid).unwrap().expect("total");
    assert_eq!(app.format_amount(total), "EUR -12.500");
    app.close().expect("close");
}
