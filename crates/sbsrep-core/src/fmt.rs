//! Shared formatting helpers for report rendering.
//!
//! Pure string formatting only — no I/O, no report layout.

/// Format an integer with thousands separators: `1234567` -> `"1,234,567"`.
pub fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let offset = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - offset) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format a float to one decimal place for display: `30.75` -> `"30.8"`.
pub fn one_decimal(v: f64) -> String {
    format!("{:.1}", v)
}

/// Join queue ids with commas: `[1, 2, 3]` -> `"1, 2, 3"`.
pub fn join_ids<'a>(ids: impl IntoIterator<Item = &'a i64>) -> String {
    ids.into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
