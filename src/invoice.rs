//! Invoice image rendering.
//!
//! Invoices are produced as standalone SVG documents so they can be
//! served directly, stored as uploads and shared over WhatsApp.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct InvoiceData<'a> {
    pub store_name: &'a str,
    pub sku: &'a str,
    pub customer_name: &'a str,
    pub variation: Option<String>,
    pub quantity: i32,
    pub unit_price: i64,
    pub issued_at: DateTime<Utc>,
}

impl InvoiceData<'_> {
    pub fn total(&self) -> i64 {
        self.unit_price * i64::from(self.quantity.max(1))
    }
}

/// `150000` → `Rp 150.000`
pub fn format_price(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if amount < 0 {
        format!("-Rp {grouped}")
    } else {
        format!("Rp {grouped}")
    }
}

fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

pub fn render_svg(data: &InvoiceData<'_>) -> String {
    let mut rows = vec![
        ("Customer", escape_xml(data.customer_name)),
        ("SKU", escape_xml(data.sku)),
    ];
    if let Some(variation) = &data.variation {
        rows.push(("Variation", escape_xml(variation)));
    }
    rows.push(("Qty", data.quantity.max(1).to_string()));
    rows.push(("Price", format_price(data.unit_price)));

    let mut body = String::new();
    for (i, (label, value)) in rows.iter().enumerate() {
        let y = 150 + i * 40;
        body.push_str(&format!(
            r##"<text x="40" y="{y}" font-size="18" fill="#6b7280">{label}</text><text x="560" y="{y}" font-size="18" text-anchor="end" fill="#111827">{value}</text>"##
        ));
    }
    let total_y = 150 + rows.len() * 40 + 30;

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="600" height="{height}" viewBox="0 0 600 {height}" font-family="Helvetica, Arial, sans-serif"><rect width="600" height="{height}" fill="#ffffff"/><rect width="600" height="80" fill="#111827"/><text x="40" y="50" font-size="26" font-weight="bold" fill="#ffffff">{store}</text><text x="40" y="115" font-size="16" fill="#6b7280">INVOICE · {date}</text>{body}<line x1="40" y1="{line_y}" x2="560" y2="{line_y}" stroke="#e5e7eb" stroke-width="2"/><text x="40" y="{total_y}" font-size="22" font-weight="bold" fill="#111827">Total</text><text x="560" y="{total_y}" font-size="22" font-weight="bold" text-anchor="end" fill="#111827">{total}</text></svg>"##,
        height = total_y + 50,
        store = escape_xml(data.store_name),
        date = data.issued_at.format("%d %b %Y"),
        line_y = total_y - 35,
        total = format_price(data.total()),
    )
}
