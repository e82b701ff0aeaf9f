//! Russian cardinal number spelling.
//!
//! Works on digit strings rather than machine integers so arbitrarily long
//! numerals never overflow. Groups of three digits are spelled with the
//! matching scale word in the right grammatical number; thousands take the
//! feminine forms (`одна тысяча`, `две тысячи`). Any Unicode decimal digit
//! is accepted and read by its value, so `٣` and `३` spell like `3`.

use regex::Regex;
use std::sync::LazyLock;

const UNITS_MASCULINE: [&str; 10] = [
    "", "один", "два", "три", "четыре", "пять", "шесть", "семь", "восемь", "девять",
];

const UNITS_FEMININE: [&str; 10] = [
    "", "одна", "две", "три", "четыре", "пять", "шесть", "семь", "восемь", "девять",
];

const TEENS: [&str; 10] = [
    "десять",
    "одиннадцать",
    "двенадцать",
    "тринадцать",
    "четырнадцать",
    "пятнадцать",
    "шестнадцать",
    "семнадцать",
    "восемнадцать",
    "девятнадцать",
];

const TENS: [&str; 10] = [
    "",
    "",
    "двадцать",
    "тридцать",
    "сорок",
    "пятьдесят",
    "шестьдесят",
    "семьдесят",
    "восемьдесят",
    "девяносто",
];

const HUNDREDS: [&str; 10] = [
    "",
    "сто",
    "двести",
    "триста",
    "четыреста",
    "пятьсот",
    "шестьсот",
    "семьсот",
    "восемьсот",
    "девятьсот",
];

/// Scale words as (one, few, many, feminine). Index 0 is 10^3.
const SCALES: [(&str, &str, &str, bool); 11] = [
    ("тысяча", "тысячи", "тысяч", true),
    ("миллион", "миллиона", "миллионов", false),
    ("миллиард", "миллиарда", "миллиардов", false),
    ("триллион", "триллиона", "триллионов", false),
    ("квадриллион", "квадриллиона", "квадриллионов", false),
    ("квинтиллион", "квинтиллиона", "квинтиллионов", false),
    ("секстиллион", "секстиллиона", "секстиллионов", false),
    ("септиллион", "септиллиона", "септиллионов", false),
    ("октиллион", "октиллиона", "октиллионов", false),
    ("нониллион", "нониллиона", "нониллионов", false),
    ("дециллион", "дециллиона", "дециллионов", false),
];

const ZERO: &str = "ноль";
const MINUS: &str = "минус";

/// Word joining the integer and fractional parts of a decimal.
pub const DECIMAL_POINT: &str = "целых";

static DECIMAL_DIGIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\p{Nd}$").expect("valid regex"));

fn is_decimal_digit(ch: char) -> bool {
    let mut buf = [0u8; 4];
    DECIMAL_DIGIT_RE.is_match(ch.encode_utf8(&mut buf))
}

/// Value of a Unicode decimal digit (`Nd`), `None` for anything else.
///
/// Every script's digits occupy a contiguous run starting at zero, so the
/// value is the distance from the start of the run.
fn digit_value(ch: char) -> Option<u32> {
    if let Some(d) = ch.to_digit(10) {
        return Some(d);
    }
    if !is_decimal_digit(ch) {
        return None;
    }
    let mut code = u32::from(ch);
    let mut offset = 0;
    while let Some(prev) = code.checked_sub(1).and_then(char::from_u32) {
        if !is_decimal_digit(prev) {
            break;
        }
        code -= 1;
        offset += 1;
    }
    Some(offset % 10)
}

/// Rewrite a run of decimal digits from any script as ASCII `0-9`.
///
/// Returns `None` if `digits` is empty or holds a non-digit.
pub fn ascii_digits(digits: &str) -> Option<String> {
    if digits.is_empty() {
        return None;
    }
    digits
        .chars()
        .map(|ch| digit_value(ch).and_then(|d| char::from_digit(d, 10)))
        .collect()
}

/// Spell a non-negative integer given as decimal digits.
///
/// Leading zeros are ignored. Numbers too long for the scale table are read
/// digit by digit. Returns `None` if `digits` is empty or contains anything
/// other than decimal digits.
pub fn spell_digits(digits: &str) -> Option<String> {
    let digits = ascii_digits(digits)?;
    let digits = digits.as_str();

    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return Some(ZERO.to_owned());
    }

    let groups = split_groups(significant);
    if groups.len() > SCALES.len() + 1 {
        return Some(spell_each_digit(significant));
    }

    let mut words: Vec<&'static str> = Vec::new();
    let top = groups.len() - 1;
    for (i, &group) in groups.iter().enumerate() {
        if group == 0 {
            continue;
        }
        let scale_index = top - i;
        if scale_index == 0 {
            push_triplet(&mut words, group, false);
        } else {
            let (one, few, many, feminine) = SCALES[scale_index - 1];
            push_triplet(&mut words, group, feminine);
            words.push(match plural_form(group) {
                Plural::One => one,
                Plural::Few => few,
                Plural::Many => many,
            });
        }
    }

    Some(words.join(" "))
}

/// Spell a signed integer or decimal numeral.
///
/// `sign` is the optional leading `-`/`+`, `integer` and `fraction` are the
/// digit runs on either side of the separator. Trailing zeros of the
/// fraction are dropped; an all-zero fraction drops the fractional clause.
pub fn spell_number(sign: Option<char>, integer: &str, fraction: Option<&str>) -> Option<String> {
    let mut out = String::new();
    if sign == Some('-') {
        out.push_str(MINUS);
        out.push(' ');
    }

    out.push_str(&spell_digits(integer)?);

    if let Some(fraction) = fraction {
        let fraction = ascii_digits(fraction)?;
        let trimmed = fraction.trim_end_matches('0');
        if !trimmed.is_empty() {
            out.push(' ');
            out.push_str(DECIMAL_POINT);
            out.push(' ');
            out.push_str(&spell_digits(trimmed)?);
        }
    }

    Some(out)
}

enum Plural {
    One,
    Few,
    Many,
}

fn plural_form(n: u16) -> Plural {
    let last_two = n % 100;
    if (11..=14).contains(&last_two) {
        return Plural::Many;
    }
    match n % 10 {
        1 => Plural::One,
        2..=4 => Plural::Few,
        _ => Plural::Many,
    }
}

/// Split a digit string into base-1000 groups, most significant first.
fn split_groups(digits: &str) -> Vec<u16> {
    let bytes = digits.as_bytes();
    let head = bytes.len() % 3;
    let mut groups = Vec::with_capacity(bytes.len() / 3 + 1);

    let mut push = |chunk: &[u8]| {
        let value = chunk
            .iter()
            .fold(0u16, |acc, &b| acc * 10 + u16::from(b - b'0'));
        groups.push(value);
    };

    if head > 0 {
        push(&bytes[..head]);
    }
    for chunk in bytes[head..].chunks(3) {
        push(chunk);
    }
    groups
}

fn push_triplet(words: &mut Vec<&'static str>, n: u16, feminine: bool) {
    let hundreds = usize::from(n / 100);
    let rest = n % 100;

    if hundreds > 0 {
        words.push(HUNDREDS[hundreds]);
    }
    if (10..20).contains(&rest) {
        words.push(TEENS[usize::from(rest - 10)]);
        return;
    }
    let tens = usize::from(rest / 10);
    let units = usize::from(rest % 10);
    if tens > 0 {
        words.push(TENS[tens]);
    }
    if units > 0 {
        words.push(if feminine {
            UNITS_FEMININE[units]
        } else {
            UNITS_MASCULINE[units]
        });
    }
}

fn spell_each_digit(digits: &str) -> String {
    digits
        .bytes()
        .map(|b| match b - b'0' {
            0 => ZERO,
            d => UNITS_MASCULINE[usize::from(d)],
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn spell(n: &str) -> String {
        spell_digits(n).unwrap()
    }

    #[test]
    fn small_numbers() {
        assert_eq!(spell("0"), "ноль");
        assert_eq!(spell("1"), "один");
        assert_eq!(spell("2"), "два");
        assert_eq!(spell("10"), "десять");
        assert_eq!(spell("13"), "тринадцать");
        assert_eq!(spell("21"), "двадцать один");
        assert_eq!(spell("40"), "сорок");
        assert_eq!(spell("99"), "девяносто девять");
    }

    #[test]
    fn hundreds() {
        assert_eq!(spell("100"), "сто");
        assert_eq!(spell("215"), "двести пятнадцать");
        assert_eq!(spell("999"), "девятьсот девяносто девять");
    }

    #[test]
    fn thousands_are_feminine() {
        assert_eq!(spell("1000"), "одна тысяча");
        assert_eq!(spell("2000"), "две тысячи");
        assert_eq!(spell("5000"), "пять тысяч");
        assert_eq!(spell("11000"), "одиннадцать тысяч");
        assert_eq!(spell("21000"), "двадцать одна тысяча");
        assert_eq!(spell("2024"), "две тысячи двадцать четыре");
    }

    #[test]
    fn millions_and_beyond() {
        assert_eq!(spell("1000000"), "один миллион");
        assert_eq!(spell("3000000"), "три миллиона");
        assert_eq!(spell("12000000"), "двенадцать миллионов");
        assert_eq!(spell("1001000"), "один миллион одна тысяча");
        assert_eq!(spell("2000000000"), "два миллиарда");
    }

    #[test]
    fn leading_zeros_are_ignored() {
        assert_eq!(spell("007"), "семь");
        assert_eq!(spell("000"), "ноль");
    }

    #[test]
    fn overlong_numbers_are_read_digit_by_digit() {
        let digits = "1".repeat(40);
        let spelled = spell(&digits);
        assert_eq!(spelled.split(' ').count(), 40);
        assert!(spelled.split(' ').all(|w| w == "один"));
    }

    #[test]
    fn rejects_non_digits() {
        assert!(spell_digits("").is_none());
        assert!(spell_digits("12a").is_none());
    }

    #[test]
    fn digits_from_other_scripts_are_read_by_value() {
        assert_eq!(ascii_digits("٢٠٢٤").unwrap(), "2024");
        assert_eq!(ascii_digits("३७").unwrap(), "37");
        assert_eq!(ascii_digits("\u{1D7E1}").unwrap(), "9");
        assert!(ascii_digits("٣x").is_none());
        assert_eq!(spell("٣"), "три");
        assert_eq!(spell("१०००"), "одна тысяча");
        assert_eq!(spell_number(None, "٢", Some("٥٠")).unwrap(), "два целых пять");
    }

    #[test]
    fn decimals() {
        assert_eq!(
            spell_number(None, "2", Some("5")).unwrap(),
            "два целых пять"
        );
        assert_eq!(
            spell_number(None, "3", Some("140")).unwrap(),
            "три целых четырнадцать"
        );
        assert_eq!(spell_number(None, "7", Some("000")).unwrap(), "семь");
        assert_eq!(spell_number(Some('-'), "4", None).unwrap(), "минус четыре");
        assert_eq!(spell_number(Some('+'), "4", None).unwrap(), "четыре");
    }
}
