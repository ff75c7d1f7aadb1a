//! Roster import and ticket export in the kiosk's CSV layout.
//!
//! Both directions share one layout, so an exported ticket file can be fed
//! back in as a roster:
//!
//! ```text
//! 2
//! ID,Fecha y Hora,RUT,Nombre,Curso
//! 200000,"03-03-2025 12:00:00","123456785","Ana Rojas","1A"
//! 200001,"03-03-2025 12:04:31","98765433","Benjamín Soto","2B"
//! ```
//!
//! The first line is a count and the second a header; both are ignored on
//! import. Fields are not escaped: commas or double quotes inside a name or
//! group do not survive a round trip.

use chrono::NaiveDate;
use thiserror::Error;
use ticketera_core::rut;
use ticketera_core::types::{NewUser, Ticket};
use tracing::debug;

/// Fixed header line of the export
pub const HEADER: &str = "ID,Fecha y Hora,RUT,Nombre,Curso";

/// Lines before the first data row
const PREAMBLE_LINES: usize = 2;

/// Columns a data row must have
const MIN_COLUMNS: usize = 5;

/// Errors from reading a roster file
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CsvError {
    /// The text has no room for a data row after the count and header lines
    #[error("CSV must have at least 3 lines (count, header, data); found {found}")]
    TooFewLines {
        /// Non-empty lines found after trimming
        found: usize,
    },
}

/// Renders tickets in export layout, in the order given
#[must_use]
pub fn export_tickets_csv<'a>(tickets: impl IntoIterator<Item = &'a Ticket>) -> String {
    let rows: Vec<String> = tickets
        .into_iter()
        .map(|t| {
            format!(
                "{},\"{} {}\",\"{}\",\"{}\",\"{}\"",
                t.id,
                t.issue_date.format("%d-%m-%Y"),
                t.issue_time.format("%H:%M:%S"),
                t.identity,
                t.name,
                t.group
            )
        })
        .collect();

    let mut out = format!("{}\n{HEADER}\n", rows.len());
    for row in rows {
        out.push_str(&row);
        out.push('\n');
    }
    out
}

/// Parses a roster file into import rows.
///
/// Only columns 3 to 5 (identity, name, group) are read. Identities are
/// normalized but not checksum-validated. Rows with fewer than five columns
/// or an empty identity, name or group are dropped.
///
/// # Errors
///
/// Returns [`CsvError::TooFewLines`] if the trimmed text has fewer than three
/// lines.
pub fn parse_roster_csv(text: &str) -> Result<Vec<NewUser>, CsvError> {
    let lines: Vec<&str> = text.trim().lines().collect();
    if lines.len() <= PREAMBLE_LINES {
        return Err(CsvError::TooFewLines { found: lines.len() });
    }

    let mut rows = Vec::new();
    let mut dropped = 0_usize;
    for line in &lines[PREAMBLE_LINES..] {
        let columns: Vec<String> = line
            .split(',')
            .map(|col| col.trim().replace('"', ""))
            .collect();
        if columns.len() < MIN_COLUMNS {
            dropped += 1;
            continue;
        }

        let identity = rut::normalize(&columns[2]);
        let name = columns[3].trim();
        let group = columns[4].trim();
        if identity.is_empty() || name.is_empty() || group.is_empty() {
            dropped += 1;
            continue;
        }
        rows.push(NewUser::new(identity, name, group));
    }

    debug!(rows = rows.len(), dropped, "Parsed roster CSV");
    Ok(rows)
}

/// File name for an export of `date`: `tickets_dd-mm-yyyy.csv`
#[must_use]
pub fn export_file_name(date: NaiveDate) -> String {
    format!("tickets_{}.csv", date.format("%d-%m-%Y"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone, Utc};
    use ticketera_core::types::{TicketId, UserId};

    fn ticket(id: u64, identity: &str, name: &str, group: &str) -> Ticket {
        Ticket {
            id: TicketId::new(id),
            user_id: UserId::new(1),
            identity: identity.to_string(),
            name: name.to_string(),
            group: group.to_string(),
            issue_date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            issue_time: NaiveTime::from_hms_opt(12, 4, 31).unwrap(),
            issued_at: Utc.with_ymd_and_hms(2025, 3, 3, 15, 4, 31).unwrap(),
        }
    }

    #[test]
    fn export_layout() {
        let tickets = [
            ticket(200_000, "123456785", "Ana Rojas", "1A"),
            ticket(200_001, "98765433", "Benjamín Soto", "2B"),
        ];
        let csv = export_tickets_csv(&tickets);
        assert_eq!(
            csv,
            "2\n\
             ID,Fecha y Hora,RUT,Nombre,Curso\n\
             200000,\"03-03-2025 12:04:31\",\"123456785\",\"Ana Rojas\",\"1A\"\n\
             200001,\"03-03-2025 12:04:31\",\"98765433\",\"Benjamín Soto\",\"2B\"\n"
        );
    }

    #[test]
    fn export_of_nothing_still_has_preamble() {
        assert_eq!(export_tickets_csv(&[]), format!("0\n{HEADER}\n"));
    }

    #[test]
    fn parse_reads_columns_three_to_five() {
        let text = "Tickets totales: 2\n\
                    ID,Fecha y Hora,RUT,Nombre,Curso\n\
                    1,\"01-03-2025 12:00:00\",\"12.345.678-5\",\" Ana \",\"1A\"\n\
                    2, x ,10.000.013-K,Cata,3C,extra\n";
        let rows = parse_roster_csv(text).unwrap();
        assert_eq!(
            rows,
            vec![
                NewUser::new("123456785", "Ana", "1A"),
                NewUser::new("10000013k", "Cata", "3C"),
            ]
        );
    }

    #[test]
    fn parse_drops_short_and_incomplete_rows() {
        let text = "3\nheader\n1,2,19,Uno\n1,2,,Nadie,1A\n1,2,.-,Punto,1A\n\
                    1,2,78,Siete,\n1,2,14-0,Catorce,4D";
        let rows = parse_roster_csv(text).unwrap();
        assert_eq!(rows, vec![NewUser::new("140", "Catorce", "4D")]);
    }

    #[test]
    fn parse_does_not_validate_checksums() {
        let rows = parse_roster_csv("1\nh\n1,2,12.345.678-4,Ana,1A").unwrap();
        assert_eq!(rows[0].identity, "123456784");
    }

    #[test]
    fn parse_accepts_crlf() {
        let rows = parse_roster_csv("1\r\nh\r\n1,2,19,Uno,1A\r\n").unwrap();
        assert_eq!(rows, vec![NewUser::new("19", "Uno", "1A")]);
    }

    #[test]
    fn too_few_lines() {
        assert_eq!(
            parse_roster_csv("2\nID,Fecha y Hora,RUT,Nombre,Curso\n\n"),
            Err(CsvError::TooFewLines { found: 2 })
        );
        assert_eq!(parse_roster_csv("   "), Err(CsvError::TooFewLines { found: 0 }));
    }

    #[test]
    fn header_only_export_cannot_be_imported() {
        assert!(parse_roster_csv(&export_tickets_csv(&[])).is_err());
    }

    #[test]
    fn file_name_uses_day_month_year() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(export_file_name(date), "tickets_07-03-2025.csv");
    }
}
