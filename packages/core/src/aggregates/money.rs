//! Currency formatting in the `fr-FR` style: `1 234,56 €`

/// Narrow no-break space, used between digit groups
const GROUP_SEPARATOR: char = '\u{202F}';
/// No-break space, used before the currency symbol
const SYMBOL_SEPARATOR: char = '\u{00A0}';

/// Supported currency codes and their display symbols
pub const CURRENCIES: &[(&str, &str)] = &[
    ("EUR", "€"),
    ("USD", "$"),
    ("XOF", "CFA"),
    ("MAD", "DH"),
    ("CAD", "$"),
];

/// Symbol of a currency code; unknown codes are returned as is
pub fn currency_symbol(code: &str) -> &str {
    CURRENCIES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(code))
        .map(|(_, symbol)| *symbol)
        .unwrap_or(code)
}

/// Format `amount` with two decimals, grouped thousands and the currency symbol
pub fn format_money(amount: f64, currency: &str) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(GROUP_SEPARATOR);
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{}{},{:02}{}{}",
        sign,
        grouped,
        fraction,
        SYMBOL_SEPARATOR,
        currency_symbol(currency)
    )
}
