//! Latin → Cyrillic transliteration for bare Latin words.
//!
//! The speech model only knows Cyrillic, so Latin words are respelled letter
//! by letter. Case is folded; letters outside the table pass through.

/// Cyrillic spelling of a single Latin letter, if it has one.
pub fn latin_letter(ch: char) -> Option<&'static str> {
    let mapped = match ch.to_ascii_lowercase() {
        'a' => "а",
        'b' => "б",
        'c' => "ц",
        'd' => "д",
        'e' => "е",
        'f' => "ф",
        'g' => "г",
        'h' => "х",
        'i' => "и",
        'j' => "й",
        'k' => "к",
        'l' => "л",
        'm' => "м",
        'n' => "н",
        'o' => "о",
        'p' => "п",
        'q' => "к",
        'r' => "р",
        's' => "с",
        't' => "т",
        'u' => "у",
        'v' => "в",
        'w' => "в",
        'x' => "кс",
        'y' => "й",
        'z' => "з",
        _ => return None,
    };
    Some(mapped)
}

/// Transliterate one word.
pub fn latin_word_to_cyrillic(word: &str) -> String {
    let mut out = String::with_capacity(word.len() * 2);
    for ch in word.chars() {
        match latin_letter(ch) {
            Some(mapped) => out.push_str(mapped),
            None => out.push(ch),
        }
    }
    out
}
