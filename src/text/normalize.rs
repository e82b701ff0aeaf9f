//! Text normalization for Russian speech synthesis.
//!
//! Rewrites raw chat text into something the speech model can pronounce:
//! links and handles become placeholder words, markdown noise is stripped,
//! numerals are spelled out and Latin words are respelled in Cyrillic.

use super::numbers::spell_number;
use super::translit::latin_word_to_cyrillic;
use crate::error::{Result, SpeechError};
use regex::{Captures, Regex};
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Spoken replacement for URLs.
pub const LINK_WORD: &str = "ссылка";
/// Spoken replacement for `@handles`.
pub const MENTION_WORD: &str = "упоминание";
/// Spoken replacement for `%`.
pub const PERCENT_WORD: &str = "процентов";

const MARKUP_OPEN: &str = "<speak>";
const MARKUP_CLOSE: &str = "</speak>";

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://\S+|www\.\S+").expect("valid regex"));
static HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@[A-Za-z0-9_]{2,}").expect("valid regex"));
static MARKDOWN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_*\[\]()~`>#+=|{}\\]").expect("valid regex"));
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<sign>[-+])?(?P<int>\d+)(?:[.,](?P<frac>\d+))?").expect("valid regex")
});
static LATIN_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]+").expect("valid regex"));
static DISALLOWED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[^\w\s.,!?;:«»"'\-]"#).expect("valid regex"));
static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Returns `true` when the trimmed text is a `<speak>…</speak>` envelope.
///
/// Such text is already prepared by the caller and bypasses normalization,
/// annotation and chunking.
pub fn is_markup(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.len() >= MARKUP_OPEN.len() + MARKUP_CLOSE.len()
        && trimmed.starts_with(MARKUP_OPEN)
        && trimmed.ends_with(MARKUP_CLOSE)
}

/// Normalize raw text for synthesis.
///
/// Passes, in order:
/// 1. Unicode NFKC
/// 2. `<speak>` envelope short-circuit (returned trimmed, otherwise untouched)
/// 3. URLs → `ссылка`
/// 4. `@handles` → `упоминание`
/// 5. `%` → `процентов`
/// 6. markdown control characters → space
/// 7. line breaks → space
/// 8. numerals → words
/// 9. Latin words → Cyrillic
/// 10. anything outside word characters, whitespace and basic punctuation → space
/// 11. whitespace collapse and trim
///
/// # Errors
///
/// Returns [`SpeechError::EmptyInput`] if the input is blank or nothing
/// speakable remains.
pub fn normalize(text: &str) -> Result<String> {
    if text.trim().is_empty() {
        return Err(SpeechError::EmptyInput("text is empty".into()));
    }

    let canonical: String = text.nfkc().collect();
    if is_markup(&canonical) {
        return Ok(canonical.trim().to_owned());
    }

    let text = URL_RE.replace_all(&canonical, format!(" {LINK_WORD} ").as_str());
    let text = replace_handles(&text);
    let text = text.replace('%', &format!(" {PERCENT_WORD} "));
    let text = MARKDOWN_RE.replace_all(&text, " ");
    let text = text.replace(['\r', '\n'], " ");
    let text = spell_numbers(&text);
    let text = LATIN_WORD_RE.replace_all(&text, |caps: &Captures<'_>| {
        latin_word_to_cyrillic(&caps[0])
    });
    let text = DISALLOWED_RE.replace_all(&text, " ");
    let text = SPACES_RE.replace_all(&text, " ").trim().to_owned();

    if text.is_empty() {
        return Err(SpeechError::EmptyInput(
            "text became empty after normalization".into(),
        ));
    }
    Ok(text)
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Replace `@handles` that are not glued to a surrounding word.
fn replace_handles(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for m in HANDLE_RE.find_iter(text) {
        let before = text[..m.start()].chars().next_back();
        let after = text[m.end()..].chars().next();
        if before.is_some_and(is_word_char) || after.is_some_and(is_word_char) {
            continue;
        }
        out.push_str(&text[last..m.start()]);
        out.push(' ');
        out.push_str(MENTION_WORD);
        out.push(' ');
        last = m.end();
    }

    out.push_str(&text[last..]);
    out
}

/// Spell every numeral as Russian words.
///
/// A sign counts only when it does not follow a word character, so `10-20`
/// reads as a range rather than "ten minus twenty". Words are padded with a
/// space wherever they would otherwise touch a letter (`5км` → `пять км`).
fn spell_numbers(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    let mut last = 0;

    for caps in NUMBER_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let Some(integer) = caps.name("int") else {
            continue;
        };
        let fraction = caps.name("frac").map(|m| m.as_str());

        let before = text[..whole.start()].chars().next_back();
        let after = text[whole.end()..].chars().next();

        let mut sign = caps
            .name("sign")
            .and_then(|m| m.as_str().chars().next());
        let mut literal_sign = None;
        if sign.is_some() && before.is_some_and(is_word_char) {
            literal_sign = sign.take();
        }

        let Some(words) = spell_number(sign, integer.as_str(), fraction) else {
            continue;
        };

        out.push_str(&text[last..whole.start()]);
        match literal_sign {
            Some(ch) => out.push(ch),
            None if before.is_some_and(is_word_char) => out.push(' '),
            None => {}
        }
        out.push_str(&words);
        if after.is_some_and(is_word_char) {
            out.push(' ');
        }
        last = whole.end();
    }

    out.push_str(&text[last..]);
    out
}
