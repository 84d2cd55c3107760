//! Number formatting for console output

/// Group digits in threes, e.g. `1234567` -> `1,234,567`
pub fn format_balance(balance: u128) -> String {
    let digits = balance.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// First `len` characters of an address followed by an ellipsis
pub fn abbreviate(address: &str, len: usize) -> String {
    let prefix: String = address.chars().take(len).collect();
    format!("{}...", prefix)
}
