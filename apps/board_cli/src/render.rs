use board::{BoardItem, StatusPartition};
use shared::domain::{Order, Quote};

/// One-line summary of a card.
pub trait CardLine: BoardItem {
    fn line(&self) -> String;
}

impl CardLine for Order {
    fn line(&self) -> String {
        let due = self
            .delivery_date
            .map(|d| format!(" due {d}"))
            .unwrap_or_default();
        format!(
            "{}  {} - {} ({}){due}",
            self.id,
            self.customer_name,
            self.description,
            format_cents(self.total_cents)
        )
    }
}

impl CardLine for Quote {
    fn line(&self) -> String {
        let until = self
            .valid_until
            .map(|d| format!(" valid until {d}"))
            .unwrap_or_default();
        format!(
            "{}  {} - {} ({}){until}",
            self.id,
            self.customer_name,
            self.description,
            format_cents(self.total_cents)
        )
    }
}

pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{sign}{}.{:02}", cents / 100, cents % 100)
}

pub fn render_board<T: CardLine>(partition: &StatusPartition<T>) -> String {
    let mut out = String::new();
    for column in partition.columns() {
        out.push_str(&format!("== {} ({}) ==\n", column.status(), column.len()));
        for item in column.items() {
            out.push_str("  ");
            out.push_str(&item.line());
            out.push('\n');
        }
    }
    if partition.dropped() > 0 {
        out.push_str(&format!(
            "({} not shown: status outside the selected columns)\n",
            partition.dropped()
        ));
    }
    out
}
