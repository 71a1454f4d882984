//! Session title generation
//!
//! A session's title is derived once from its first user message. The
//! derivation is a pure function of the text so the same conversation always
//! gets the same label.

/// Label used when the text contains no usable words
pub const DEFAULT_TITLE: &str = "New Chat";

/// Words that make a good title regardless of their length
const TRAVEL_KEYWORDS: &[&str] = &[
    "hotel", "hotels", "trip", "travel", "vacation", "book", "booking", "find", "search",
];

const MAX_TITLE_WORDS: usize = 3;

/// Derive a short, human-readable title from the first user message.
///
/// The text is lowercased and stripped of punctuation, then words of two
/// characters or fewer are dropped. Travel keywords and words longer than
/// four characters are preferred; when none are present the remaining words
/// are used instead. At most three words are kept, in their original order,
/// and the first letter is capitalised.
///
/// # Examples
///
/// ```
/// use travelchat::storage::generate_title;
///
/// assert_eq!(generate_title("I need a cheap hostel in Berlin"), "Cheap hostel berlin");
/// assert_eq!(generate_title("hotels in Paris july 10-12"), "Hotels paris");
/// assert_eq!(generate_title("a b c"), "New Chat");
/// ```
pub fn generate_title(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();

    let words: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .collect();

    let preferred: Vec<&str> = words
        .iter()
        .copied()
        .filter(|w| TRAVEL_KEYWORDS.contains(w) || w.chars().count() > 4)
        .collect();

    let chosen = if preferred.is_empty() { words } else { preferred };
    if chosen.is_empty() {
        return DEFAULT_TITLE.to_string();
    }

    let joined = chosen
        .into_iter()
        .take(MAX_TITLE_WORDS)
        .collect::<Vec<_>>()
        .join(" ");
    capitalize_first(&joined)
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
