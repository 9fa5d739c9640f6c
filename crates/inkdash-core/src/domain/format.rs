//! Text formatting shared by the widgets.
//!
//! The panel is tiny (250×122), so every number is squeezed into a short,
//! human-readable string before it is drawn.

/// Inserts `,` thousands separators into a non-negative integer string.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Rounds to a whole number and groups thousands: `12345.6` → `12,346`.
pub fn with_thousands(value: f64) -> String {
    let rounded = value.abs().round();
    let sign = if value < 0.0 && rounded > 0.0 { "-" } else { "" };
    format!("{sign}{}", group_thousands(&format!("{rounded:.0}")))
}

/// Byte counts: `512 B`, `1.5 KB`, `3.2 MB`, `1.25 GB`.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else if bytes < GB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    }
}

/// Transfer speed given in KB/s: `300 B/s`, `12.4 KB/s`, `2.1 MB/s`.
pub fn format_speed(kib_per_sec: f64) -> String {
    if kib_per_sec < 1.0 {
        format!("{:.0} B/s", kib_per_sec * 1024.0)
    } else if kib_per_sec < 1024.0 {
        format!("{kib_per_sec:.1} KB/s")
    } else {
        format!("{:.1} MB/s", kib_per_sec / 1024.0)
    }
}

/// Quote price: four decimals below $1, two below $100, grouped above.
pub fn format_price(price: f64) -> String {
    if price < 1.0 {
        format!("${price:.4}")
    } else if price < 100.0 {
        format!("${price:.2}")
    } else {
        format!("${}", with_thousands(price))
    }
}

/// Signed percentage with one decimal: `+1.2%`, `-0.4%`.
pub fn format_change_pct(pct: f64) -> String {
    format!("{pct:+.1}%")
}

/// Portfolio total: grouped whole dollars from $1,000 up, cents below.
pub fn format_total_value(value: f64) -> String {
    if value >= 1000.0 {
        format!("${}", with_thousands(value))
    } else {
        format!("${value:.2}")
    }
}

/// Daily change line: `+$12.30 (+1.5%)` or `-$4.00 (-0.2%)`.
pub fn format_daily_change(change: f64, pct: f64) -> String {
    let sign = if change >= 0.0 { '+' } else { '-' };
    format!("{sign}${:.2} ({})", change.abs(), format_change_pct(pct))
}

/// Cuts `text` to at most `max_chars` characters.
pub fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
