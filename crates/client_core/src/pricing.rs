//! Currency rendering policy. Controllers only ever see the trait.

pub trait PriceFormatter: Send + Sync {
    fn format(&self, amount: i64) -> String;
}

const NBSP: char = '\u{a0}';

/// Whole-ruble prices in the `ru-RU` style: `1 234 ₽` with non-breaking spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct RubleFormatter;

impl PriceFormatter for RubleFormatter {
    fn format(&self, amount: i64) -> String {
        let digits = amount.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 4);
        if amount < 0 {
            grouped.push('-');
        }
        for (index, digit) in digits.chars().enumerate() {
            if index > 0 && (digits.len() - index) % 3 == 0 {
                grouped.push(NBSP);
            }
            grouped.push(digit);
        }
        grouped.push(NBSP);
        grouped.push('₽');
        grouped
    }
}
