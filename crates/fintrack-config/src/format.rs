//! Display helpers driven by [`Config::currency`] and [`Config::locale`].

use crate::Config;

/// Digit grouping separator for a BCP 47 language tag. Only the language
/// subtag is consulted.
pub fn grouping_separator(locale: &str) -> char {
    let language = locale
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match language.as_str() {
        "de" | "es" | "it" | "nl" | "pt" | "da" | "id" => '.',
        "fr" | "sv" | "nb" | "fi" | "pl" | "cs" | "ru" => ' ',
        _ => ',',
    }
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx != 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}

impl Config {
    /// Renders whole currency units as `<CODE> <grouped digits>`, e.g. `EUR -1.234`.
    pub fn format_amount(&self, units: i64) -> String {
        let body = group_digits(
            &units.unsigned_abs().to_string(),
            grouping_separator(&self.locale),
        );
        let sign = if units < 0 { "-" } else { "" };
        format!("{} {sign}{body}", self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(currency: &str, locale: &str) -> Config {
        Config {
            currency: currency.into(),
            locale: locale.into(),
            ..Config::default()
        }
    }

    #[test]
    fn default_config_groups_with_commas() {
        let config = Config::default();
        assert_eq!(config.format_amount(0), "USD 0");
        assert_eq!(config.format_amount(999), "USD 999");
        assert_eq!(config.format_amount(1_234_567), "USD 1,234,567");
        assert_eq!(config.format_amount(-1_000), "USD -1,000");
    }

    #[test]
    fn locale_picks_the_separator() {
        assert_eq!(config("EUR", "pt-PT").format_amount(-1_234), "EUR -1.234");
        assert_eq!(config("EUR", "fr_FR").format_amount(12_345), "EUR 12 345");
        assert_eq!(config("GBP", "en-GB").format_amount(100_000), "GBP 100,000");
    }

    #[test]
    fn extreme_balances_render() {
        assert_eq!(
            Config::default().format_amount(i64::MIN),
            "USD -9,223,372,036,854,775,808"
        );
    }
}
