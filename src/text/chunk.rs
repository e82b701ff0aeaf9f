//! Sentence-aware chunking under a character budget.
//!
//! Long inputs are cut into segments the model can synthesize in one shot.
//! Sentences are packed greedily; a sentence that alone exceeds the budget
//! is packed word by word instead. Lengths are counted in characters.

/// One segment of text, synthesized independently and played in `index` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based playback position.
    pub index: usize,
    /// Text to synthesize. Never empty.
    pub text: String,
}

/// Default per-chunk character budget.
pub const DEFAULT_MAX_CHARS: usize = 220;

/// Split `text` into indexed chunks of at most `max_chars` characters.
pub fn chunk(text: &str, max_chars: usize) -> Vec<Chunk> {
    split(text, max_chars)
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk { index, text })
        .collect()
}

/// Split `text` into chunk strings of at most `max_chars` characters.
///
/// Returns the trimmed input as the only chunk when it already fits. A word
/// longer than `max_chars` is the only thing ever cut mid-word.
pub fn split(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if char_len(trimmed) <= max_chars {
        return vec![trimmed.to_owned()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in sentences(trimmed) {
        if char_len(sentence) > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            chunks.extend(split_long_sentence(sentence, max_chars));
            continue;
        }

        if current.is_empty() {
            current.push_str(sentence);
        } else if char_len(&current) + 1 + char_len(sentence) <= max_chars {
            current.push(' ');
            current.push_str(sentence);
        } else {
            chunks.push(std::mem::replace(&mut current, sentence.to_owned()));
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn is_sentence_end(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?' | ';' | ':')
}

/// Split on whitespace that directly follows sentence-ending punctuation.
fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;
    let mut iter = text.char_indices().peekable();

    while let Some((i, ch)) = iter.next() {
        if ch.is_whitespace() && prev.is_some_and(is_sentence_end) {
            let sentence = text[start..i].trim();
            if !sentence.is_empty() {
                out.push(sentence);
            }
            // Swallow the whole whitespace run.
            let mut end = i + ch.len_utf8();
            while let Some(&(j, next)) = iter.peek() {
                if !next.is_whitespace() {
                    break;
                }
                end = j + next.len_utf8();
                iter.next();
            }
            start = end;
            prev = None;
            continue;
        }
        prev = Some(ch);
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

/// Greedy word packing for a sentence longer than the budget.
fn split_long_sentence(sentence: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in sentence.split_whitespace() {
        if char_len(word) > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            chunks.extend(split_word(word, max_chars));
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
        } else if char_len(&current) + 1 + char_len(word) <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            chunks.push(std::mem::replace(&mut current, word.to_owned()));
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Hard-cut a single oversized word at character boundaries.
fn split_word(word: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars
        .chunks(max_chars)
        .map(|piece| piece.iter().collect())
        .collect()
}
