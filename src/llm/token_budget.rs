//! Token estimation and budget calculation for LLM requests.
//!
//! Provides a lightweight heuristic to estimate token counts from text and
//! derives how many input tokens remain for diff content once the system
//! prompt, the expected response and a safety margin are reserved.

/// Latin letters, digits, ASCII punctuation and whitespace per token.
const LATIN_CHARS_PER_TOKEN: usize = 4;

/// CJK characters per token, expressed as the ratio 9/5 (1.8) so the
/// estimate stays in integer arithmetic.
const CJK_CHARS_PER_TOKEN_NUM: usize = 9;
const CJK_CHARS_PER_TOKEN_DEN: usize = 5;

/// Characters per token for everything else (emoji, Cyrillic, symbols).
const OTHER_CHARS_PER_TOKEN: usize = 3;

/// Safety buffer for formatting and special tokens, in percent.
const SAFETY_BUFFER_PCT: usize = 10;

/// Tokens reserved for the system prompt.
pub(crate) const SYSTEM_PROMPT_ALLOWANCE: usize = 800;

/// Tokens reserved for the model's response.
pub(crate) const RESPONSE_ALLOWANCE: usize = 1000;

/// Character class used for density-aware estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Latin,
    Cjk,
    Other,
}

fn classify(c: char) -> CharClass {
    if c.is_ascii() {
        return CharClass::Latin;
    }
    match u32::from(c) {
        // Latin-1 supplement and Latin extended letters
        0x00C0..=0x024F => CharClass::Latin,
        // CJK unified ideographs, extension A, compatibility ideographs
        0x4E00..=0x9FFF | 0x3400..=0x4DBF | 0xF900..=0xFAFF | 0x2_0000..=0x2_A6DF => {
            CharClass::Cjk
        }
        // CJK punctuation, hiragana, katakana
        0x3000..=0x30FF => CharClass::Cjk,
        // Hangul syllables and jamo
        0xAC00..=0xD7AF | 0x1100..=0x11FF | 0x3130..=0x318F => CharClass::Cjk,
        _ => CharClass::Other,
    }
}

/// Estimates the token count for a text string.
///
/// Counts Latin, CJK and other characters separately, divides each count
/// by its density (rounding up) and adds a 10% buffer. Pure and
/// deterministic; the empty string estimates to zero.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    let (mut latin, mut cjk, mut other) = (0usize, 0usize, 0usize);
    for c in text.chars() {
        match classify(c) {
            CharClass::Latin => latin += 1,
            CharClass::Cjk => cjk += 1,
            CharClass::Other => other += 1,
        }
    }

    let raw = latin.div_ceil(LATIN_CHARS_PER_TOKEN)
        + (cjk * CJK_CHARS_PER_TOKEN_DEN).div_ceil(CJK_CHARS_PER_TOKEN_NUM)
        + other.div_ceil(OTHER_CHARS_PER_TOKEN);

    (raw * (100 + SAFETY_BUFFER_PCT)).div_ceil(100)
}

/// Safety margin percentage for a context window; larger windows need less.
#[must_use]
pub(crate) fn safety_buffer_pct(context_limit: usize) -> usize {
    match context_limit {
        0..=8_191 => 20,
        8_192..=32_767 => 15,
        32_768..=131_071 => 10,
        _ => 5,
    }
}

/// Token budget for one model's context window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBudget {
    /// Total context window (input + output).
    context_limit: usize,
}

impl TokenBudget {
    /// Creates a budget for the given context window.
    #[must_use]
    pub fn new(context_limit: usize) -> Self {
        Self { context_limit }
    }

    /// Returns the context window this budget was built from.
    #[must_use]
    pub fn context_limit(&self) -> usize {
        self.context_limit
    }

    /// Tokens held back for the system prompt, the response and the safety
    /// margin.
    #[must_use]
    pub fn reserved_tokens(&self) -> usize {
        let margin = (self.context_limit * safety_buffer_pct(self.context_limit)).div_ceil(100);
        SYSTEM_PROMPT_ALLOWANCE + RESPONSE_ALLOWANCE + margin
    }

    /// Tokens left for diff content.
    #[must_use]
    pub fn available_tokens(&self) -> usize {
        self.context_limit.saturating_sub(self.reserved_tokens())
    }
}
