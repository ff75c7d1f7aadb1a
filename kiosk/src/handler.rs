//! Command handlers.
//!
//! Each handler calls into the [`Kiosk`] and writes its result to `out` in
//! the requested [`OutputFormat`]. Nothing here touches stdout directly, so
//! the whole CLI can be driven from tests.

use crate::cli::{Cli, Commands, OutputFormat, TicketsCommand, UsersCommand};
use crate::error::{KioskError, KioskResult};
use crate::kiosk::Kiosk;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use ticketera_core::error::LedgerError;
use ticketera_core::rut;
use ticketera_core::types::{Ticket, User, UserId};
use ticketera_ledger::{ImportReport, LedgerSummary};

/// Run one parsed command against `kiosk`
///
/// # Errors
///
/// Returns the [`KioskError`] of the failing operation, or
/// [`KioskError::Output`] if writing to `out` fails.
pub fn run<W: Write>(kiosk: &mut Kiosk, cli: &Cli, out: &mut W) -> KioskResult<()> {
    let password = cli.password.as_deref();
    let format = cli.format;

    match &cli.command {
        Commands::Claim { rut } => {
            let claim = kiosk.claim(rut)?;
            match format {
                OutputFormat::Text => out.write_all(claim.receipt.as_bytes())?,
                OutputFormat::Json => write_json(out, &claim.ticket)?,
            }
        }
        Commands::Check { rut } => {
            let user = kiosk.check(rut)?;
            match format {
                OutputFormat::Text => writeln!(
                    out,
                    "{} ({}) can claim today's ticket",
                    user.name, user.group
                )?,
                OutputFormat::Json => write_json(out, user)?,
            }
        }
        Commands::Users(command) => run_users(kiosk, command, password, format, out)?,
        Commands::Tickets(command) => run_tickets(kiosk, command, password, format, out)?,
        Commands::Import { file } => {
            let text = fs::read_to_string(file).map_err(|source| KioskError::File {
                path: file.clone(),
                source,
            })?;
            let report = kiosk.import_csv(password, &text)?;
            print_import(out, &report, format)?;
        }
        Commands::Summary => {
            let summary = kiosk.summary(password)?;
            print_summary(out, &summary, format)?;
        }
        Commands::ClearUsers { yes } => {
            if !yes {
                return Err(KioskError::ConfirmationRequired("delete every user"));
            }
            kiosk.clear_users(password)?;
            writeln!(out, "All users deleted; ticket history kept")?;
        }
        Commands::ClearAll { yes } => {
            if !yes {
                return Err(KioskError::ConfirmationRequired("delete every user and ticket"));
            }
            kiosk.clear_all(password)?;
            writeln!(out, "All users and tickets deleted")?;
        }
    }
    Ok(())
}

fn run_users<W: Write>(
    kiosk: &mut Kiosk,
    command: &UsersCommand,
    password: Option<&str>,
    format: OutputFormat,
    out: &mut W,
) -> KioskResult<()> {
    match command {
        UsersCommand::Add { rut, name, group } => {
            let user = kiosk.add_user(password, rut, name, group)?;
            print_user(out, &user, format)?;
        }
        UsersCommand::List => {
            let users = kiosk.users(password)?;
            match format {
                OutputFormat::Text => {
                    for user in users {
                        writeln!(out, "{}", user_line(user))?;
                    }
                    writeln!(out, "{} user(s)", users.len())?;
                }
                OutputFormat::Json => write_json(out, &users)?,
            }
        }
        UsersCommand::Find { rut } => match kiosk.find(password, rut)? {
            Some(user) => print_user(out, user, format)?,
            None => return Err(LedgerError::UnknownIdentity(rut::normalize(rut)).into()),
        },
        UsersCommand::Block { id } => {
            let user = kiosk.set_blocked(password, UserId::new(*id), true)?;
            print_user(out, &user, format)?;
        }
        UsersCommand::Unblock { id } => {
            let user = kiosk.set_blocked(password, UserId::new(*id), false)?;
            print_user(out, &user, format)?;
        }
        UsersCommand::Rename { id, name } => {
            let user = kiosk.rename(password, UserId::new(*id), name)?;
            print_user(out, &user, format)?;
        }
        UsersCommand::Delete { id } => {
            kiosk.delete_user(password, UserId::new(*id))?;
            writeln!(out, "User {id} deleted; their tickets are kept")?;
        }
    }
    Ok(())
}

fn run_tickets<W: Write>(
    kiosk: &Kiosk,
    command: &TicketsCommand,
    password: Option<&str>,
    format: OutputFormat,
    out: &mut W,
) -> KioskResult<()> {
    match command {
        TicketsCommand::List { date } => {
            let tickets = kiosk.tickets(password, *date)?;
            print_tickets(out, &tickets, format)?;
        }
        TicketsCommand::Today => {
            let today = kiosk.ledger().today();
            let tickets = kiosk.tickets(password, Some(today))?;
            print_tickets(out, &tickets, format)?;
        }
        TicketsCommand::Export { date, output } => {
            let export = kiosk.export_csv(password, *date)?;
            let path = output
                .clone()
                .unwrap_or_else(|| PathBuf::from(&export.file_name));
            fs::write(&path, &export.contents).map_err(|source| KioskError::File {
                path: path.clone(),
                source,
            })?;
            match format {
                OutputFormat::Text => writeln!(
                    out,
                    "Exported {} ticket(s) to {}",
                    export.tickets,
                    path.display()
                )?,
                OutputFormat::Json => write_json(
                    out,
                    &serde_json::json!({ "path": path, "tickets": export.tickets }),
                )?,
            }
        }
    }
    Ok(())
}

// ========== Output ==========

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

fn user_line(user: &User) -> String {
    let status = if user.blocked { "  BLOCKED" } else { "" };
    format!(
        "{:>5}  {:<13}  {} [{}]{status}",
        user.id.get(),
        rut::format(&user.identity),
        user.name,
        user.group
    )
}

fn ticket_line(ticket: &Ticket) -> String {
    format!(
        "#{}  {} {}  {:<13}  {} [{}]",
        ticket.id.receipt_number(),
        ticket.issue_date.format("%d-%m-%Y"),
        ticket.issue_time.format("%H:%M:%S"),
        rut::format(&ticket.identity),
        ticket.name,
        ticket.group
    )
}

fn print_user<W: Write>(out: &mut W, user: &User, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Text => writeln!(out, "{}", user_line(user)),
        OutputFormat::Json => write_json(out, user),
    }
}

fn print_tickets<W: Write>(
    out: &mut W,
    tickets: &[&Ticket],
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => {
            for ticket in tickets {
                writeln!(out, "{}", ticket_line(ticket))?;
            }
            writeln!(out, "{} ticket(s)", tickets.len())
        }
        OutputFormat::Json => write_json(out, tickets),
    }
}

fn print_import<W: Write>(
    out: &mut W,
    report: &ImportReport,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Text if report.created == 0 && report.skipped == 0 => {
            writeln!(out, "No valid users found in the file; check its format")
        }
        OutputFormat::Text => writeln!(
            out,
            "Imported {} user(s); skipped {} already registered",
            report.created, report.skipped
        ),
        OutputFormat::Json => write_json(out, report),
    }
}

fn print_summary<W: Write>(
    out: &mut W,
    summary: &LedgerSummary,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => {
            writeln!(out, "Users:         {}", summary.users)?;
            writeln!(out, "Blocked users: {}", summary.blocked_users)?;
            writeln!(out, "Tickets:       {}", summary.tickets)?;
            writeln!(out, "Tickets today: {}", summary.tickets_today)
        }
        OutputFormat::Json => write_json(out, summary),
    }
}
