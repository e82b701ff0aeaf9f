//! Text preparation: normalization, number spelling, transliteration and chunking.

pub mod chunk;
pub mod normalize;
mod numbers;
mod translit;

pub use chunk::{Chunk, DEFAULT_MAX_CHARS, chunk, split};
pub use normalize::{is_markup, normalize};
pub use numbers::{spell_digits, spell_number};
pub use translit::latin_word_to_cyrillic;
