//! Plain-text receipt for a thermal printer.

use ticketera_core::rut;
use ticketera_core::types::Ticket;

/// Printer width in characters
pub const RECEIPT_WIDTH: usize = 32;

/// Text printed around every receipt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptConfig {
    /// Heading line, usually the school or canteen name
    pub title: String,
    /// Closing line
    pub footer: String,
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            title: "TICKETERA".to_string(),
            footer: "Valid only on the day of issue".to_string(),
        }
    }
}

fn centered(text: &str) -> String {
    let len = text.chars().count();
    if len >= RECEIPT_WIDTH {
        return text.to_string();
    }
    let pad = (RECEIPT_WIDTH - len) / 2;
    format!("{}{text}", " ".repeat(pad))
}

/// Renders the receipt for `ticket`.
///
/// Every value comes from the ticket's snapshot, so a reprint matches the
/// original even after the user was renamed or deleted.
#[must_use]
pub fn render_receipt(ticket: &Ticket, config: &ReceiptConfig) -> String {
    let heavy = "=".repeat(RECEIPT_WIDTH);
    let light = "-".repeat(RECEIPT_WIDTH);

    let lines = [
        heavy.clone(),
        centered(&config.title),
        centered(&format!("#{}", ticket.id.receipt_number())),
        light.clone(),
        format!("Name:  {}", ticket.name),
        format!("RUT:   {}", rut::format(&ticket.identity)),
        format!("Group: {}", ticket.group),
        format!("Date:  {}", ticket.issue_date.format("%d-%m-%Y")),
        format!("Time:  {}", ticket.issue_time.format("%H:%M")),
        light,
        centered(&config.footer),
        heavy,
    ];

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
    use ticketera_core::types::{TicketId, UserId};

    fn ticket() -> Ticket {
        Ticket {
            id: TicketId::new(200_007),
            user_id: UserId::new(3),
            identity: "10000013k".to_string(),
            name: "Catalina Muñoz".to_string(),
            group: "3C".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            issue_time: NaiveTime::from_hms_opt(12, 4, 31).unwrap(),
            issued_at: Utc.with_ymd_and_hms(2025, 3, 3, 15, 4, 31).unwrap(),
        }
    }

    #[test]
    fn layout() {
        let receipt = render_receipt(&ticket(), &ReceiptConfig::default());
        let expected = "\
================================
           TICKETERA
            #200007
--------------------------------
Name:  Catalina Muñoz
RUT:   10.000.013-K
Group: 3C
Date:  03-03-2025
Time:  12:04
--------------------------------
 Valid only on the day of issue
================================
";
        assert_eq!(receipt, expected);
    }

    #[test]
    fn small_ids_are_zero_padded() {
        let mut t = ticket();
        t.id = TicketId::new(42);
        assert!(render_receipt(&t, &ReceiptConfig::default()).contains("#000042"));
    }

    #[test]
    fn long_titles_are_not_truncated() {
        let config = ReceiptConfig {
            title: "COLEGIO MUNICIPAL DE PEÑALOLÉN ORIENTE".to_string(),
            ..ReceiptConfig::default()
        };
        let receipt = render_receipt(&ticket(), &config);
        assert_eq!(receipt.lines().nth(1), Some(config.title.as_str()));
    }
}
