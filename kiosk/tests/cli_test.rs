//! Drives the CLI handlers end to end against a file-backed kiosk

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect
#![allow(clippy::panic)] // Tests can panic

use clap::Parser;
use std::sync::Arc;
use tempfile::TempDir;
use ticketera::{Cli, Config, EXIT_FAILURE, EXIT_NOTICE, Kiosk, KioskError, KioskResult, handler};
use ticketera_testing::{ManualClock, test_instant};

const PASSWORD: &str = "admin123";

struct Harness {
    dir: TempDir,
    clock: ManualClock,
}

impl Harness {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temp dir"),
            clock: ManualClock::new(test_instant()),
        }
    }

    fn config(&self) -> Config {
        let data_dir = self.dir.path().join("data");
        Config::from_lookup(|key| match key {
            "TICKETERA_DATA_DIR" => Some(data_dir.display().to_string()),
            "TICKETERA_ADMIN_PASSWORD" => Some(PASSWORD.to_string()),
            "TICKETERA_RECEIPT_TITLE" => Some("BUENAMESA".to_string()),
            _ => None,
        })
        .expect("valid config")
    }

    /// Runs one command in a fresh kiosk, as the binary would
    fn run(&self, args: &[&str]) -> (KioskResult<()>, String) {
        let cli = Cli::try_parse_from(std::iter::once("ticketera").chain(args.iter().copied()))
            .expect("arguments should parse");
        let mut kiosk =
            Kiosk::open(&self.config(), Arc::new(self.clock.clone())).expect("kiosk opens");
        let mut out = Vec::new();
        let result = handler::run(&mut kiosk, &cli, &mut out);
        (result, String::from_utf8(out).expect("utf-8 output"))
    }

    fn ok(&self, args: &[&str]) -> String {
        let (result, out) = self.run(args);
        if let Err(err) = result {
            panic!("{args:?} failed: {err}");
        }
        out
    }

    fn err(&self, args: &[&str]) -> KioskError {
        self.run(args).0.expect_err("command should fail")
    }

    fn write(&self, name: &str, contents: &str) -> String {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path.display().to_string()
    }
}

#[test]
fn lunch_service_day() {
    let h = Harness::new();
    let roster = h.write(
        "roster.csv",
        "Tickets totales: 3\n\
         ID,Fecha y Hora,RUT,Nombre,Curso\n\
         1,\"01-03-2025 12:00:00\",\"12.345.678-5\",\"Ana Rojas\",\"1A\"\n\
         2,\"01-03-2025 12:00:00\",\"9.876.543-3\",\"Benjamín Soto\",\"2B\"\n\
         3,\"01-03-2025 12:00:00\",\"10.000.013-K\",\"Catalina Muñoz\",\"3C\"\n",
    );

    let out = h.ok(&["import", &roster, "-p", PASSWORD]);
    assert_eq!(out, "Imported 3 user(s); skipped 0 already registered\n");

    let receipt = h.ok(&["claim", "12345678-5"]);
    assert!(receipt.contains("BUENAMESA"));
    assert!(receipt.contains("#200000"));
    assert!(receipt.contains("Name:  Ana Rojas"));
    assert!(receipt.contains("Date:  03-03-2025"));

    let again = h.err(&["claim", "12.345.678-5"]);
    assert!(again.is_notice());
    assert_eq!(again.exit_code(), EXIT_NOTICE);

    let out = h.ok(&["check", "9.876.543-3"]);
    assert_eq!(out, "Benjamín Soto (2B) can claim today's ticket\n");

    let out = h.ok(&["tickets", "today", "-p", PASSWORD]);
    assert!(out.starts_with("#200000  03-03-2025 12:00:00  12.345.678-5"));
    assert!(out.ends_with("1 ticket(s)\n"));

    let out = h.ok(&["summary", "-p", PASSWORD]);
    assert!(out.contains("Users:         3"));
    assert!(out.contains("Tickets today: 1"));
}

#[test]
fn claims_reset_the_next_day() {
    let h = Harness::new();
    h.ok(&["users", "add", "1-9", "Uno", "1A", "-p", PASSWORD]);
    h.ok(&["claim", "1-9"]);
    assert!(h.err(&["claim", "19"]).is_notice());

    h.clock.advance_days(1);
    h.ok(&["claim", "19"]);
    let out = h.ok(&["tickets", "list", "-p", PASSWORD]);
    assert!(out.ends_with("2 ticket(s)\n"));
}

#[test]
fn blocked_user_is_refused() {
    let h = Harness::new();
    h.ok(&["users", "add", "12.345.678-5", "Ana", "1A", "-p", PASSWORD]);
    let out = h.ok(&["users", "block", "1", "-p", PASSWORD]);
    assert!(out.ends_with("BLOCKED\n"));

    let err = h.err(&["claim", "12.345.678-5"]);
    assert!(!err.is_notice());
    assert_eq!(err.exit_code(), EXIT_FAILURE);

    h.ok(&["users", "unblock", "1", "-p", PASSWORD]);
    h.ok(&["claim", "12.345.678-5"]);
}

#[test]
fn invalid_and_unknown_identities() {
    let h = Harness::new();
    h.ok(&["users", "add", "12.345.678-5", "Ana", "1A", "-p", PASSWORD]);

    let err = h.err(&["claim", "12.345.678-4"]);
    assert!(err.to_string().starts_with("Invalid identifier"));

    let err = h.err(&["claim", "1-9"]);
    assert!(err.to_string().contains("No user registered"));

    let err = h.err(&["users", "find", "1-9", "-p", PASSWORD]);
    assert!(err.to_string().contains("No user registered"));
}

#[test]
fn administration_needs_the_password() {
    let h = Harness::new();
    assert!(matches!(h.err(&["users", "list"]), KioskError::Unauthorized));
    assert!(matches!(
        h.err(&["users", "list", "-p", "nope"]),
        KioskError::Unauthorized
    ));
    assert!(matches!(
        h.err(&["clear-all", "--yes", "-p", "nope"]),
        KioskError::Unauthorized
    ));
    assert!(h.ok(&["users", "list", "-p", PASSWORD]).ends_with("0 user(s)\n"));
}

#[test]
fn destructive_commands_need_confirmation() {
    let h = Harness::new();
    h.ok(&["users", "add", "1-9", "Uno", "1A", "-p", PASSWORD]);
    h.ok(&["claim", "1-9"]);

    assert!(matches!(
        h.err(&["clear-users", "-p", PASSWORD]),
        KioskError::ConfirmationRequired(_)
    ));

    h.ok(&["clear-users", "--yes", "-p", PASSWORD]);
    let out = h.ok(&["summary", "-p", PASSWORD, "-f", "json"]);
    let summary: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(summary["users"], 0);
    assert_eq!(summary["tickets"], 1);

    h.ok(&["clear-all", "--yes", "-p", PASSWORD]);
    let out = h.ok(&["summary", "-p", PASSWORD, "-f", "json"]);
    let summary: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(summary["tickets"], 0);
}

#[test]
fn deleted_users_keep_their_tickets() {
    let h = Harness::new();
    h.ok(&["users", "add", "1-9", "Uno", "1A", "-p", PASSWORD]);
    h.ok(&["claim", "1-9"]);
    h.ok(&["users", "delete", "1", "-p", PASSWORD]);

    let out = h.ok(&["tickets", "list", "-p", PASSWORD, "-f", "json"]);
    let tickets: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(tickets[0]["name"], "Uno");
    assert_eq!(tickets[0]["user_id"], 1);

    assert!(matches!(
        h.err(&["users", "delete", "1", "-p", PASSWORD]),
        KioskError::UserNotFound(_)
    ));
}

#[test]
fn export_writes_the_day_file() {
    let h = Harness::new();
    h.ok(&["users", "add", "1-9", "Uno", "1A", "-p", PASSWORD]);
    h.ok(&["claim", "1-9"]);

    let target = h.dir.path().join("out.csv");
    let target_arg = target.display().to_string();
    let out = h.ok(&[
        "tickets", "export", "--date", "2025-03-03", "-o", &target_arg, "-p", PASSWORD,
    ]);
    assert!(out.starts_with("Exported 1 ticket(s) to "));

    let contents = std::fs::read_to_string(&target).unwrap();
    assert_eq!(
        contents,
        "1\nID,Fecha y Hora,RUT,Nombre,Curso\n200000,\"03-03-2025 12:00:00\",\"19\",\"Uno\",\"1A\"\n"
    );

    // the export can be fed back as a roster
    let out = h.ok(&["import", &target_arg, "-p", PASSWORD]);
    assert_eq!(out, "Imported 0 user(s); skipped 1 already registered\n");
}

#[test]
fn import_reports_bad_files() {
    let h = Harness::new();
    let short = h.write("short.csv", "1\nID,Fecha y Hora,RUT,Nombre,Curso\n");
    assert!(matches!(
        h.err(&["import", &short, "-p", PASSWORD]),
        KioskError::Csv(_)
    ));

    let missing = h.dir.path().join("nope.csv").display().to_string();
    assert!(matches!(
        h.err(&["import", &missing, "-p", PASSWORD]),
        KioskError::File { .. }
    ));

    let empty_rows = h.write("empty.csv", "1\nheader\n1,2,3\n");
    let out = h.ok(&["import", &empty_rows, "-p", PASSWORD]);
    assert!(out.starts_with("No valid users found"));
}

#[test]
fn claim_json_output() {
    let h = Harness::new();
    h.ok(&["users", "add", "10.000.013-K", "Cata", "3C", "-p", PASSWORD]);
    let out = h.ok(&["claim", "10000013k", "-f", "json"]);
    let ticket: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(ticket["id"], 200_000);
    assert_eq!(ticket["identity"], "10000013k");
    assert_eq!(ticket["issue_date"], "2025-03-03");
}
