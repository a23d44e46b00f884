//! Secret-word selection and hint masking.

use rand::RngCore;
use rand::seq::IndexedRandom;

/// Supplies the secret word for each round.
///
/// Only the selection contract matters to a room: every call returns a
/// non-empty word. The room passes its own RNG so tests can seed it.
pub trait WordProvider: Send + Sync + 'static {
    /// Picks the word for the next round.
    fn pick(&self, rng: &mut dyn RngCore) -> String;
}

/// A fixed list of words, picked uniformly at random.
#[derive(Debug, Clone)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    /// Builds a list from the given words. Blank entries and duplicates are
    /// dropped; an empty result falls back to the built-in list.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        for word in words {
            let word = word.into().trim().to_string();
            if !word.is_empty() && !list.contains(&word) {
                list.push(word);
            }
        }
        if list.is_empty() {
            tracing::warn!("empty word list given, using the built-in list");
            return Self::default();
        }
        Self { words: list }
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Always `false`; a `WordList` is never empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Whether `word` is in the list.
    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }
}

impl Default for WordList {
    fn default() -> Self {
        let mut words: Vec<String> = Vec::with_capacity(DEFAULT_WORDS.len());
        for word in DEFAULT_WORDS {
            if !words.iter().any(|w| w == word) {
                words.push((*word).to_string());
            }
        }
        Self { words }
    }
}

impl WordProvider for WordList {
    fn pick(&self, rng: &mut dyn RngCore) -> String {
        // `new` and `default` both guarantee at least one word.
        self.words
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| DEFAULT_WORDS[0].to_string())
    }
}

/// Masks a word for guessers: every ASCII letter becomes `"_ "`, anything
/// else (spaces, hyphens) is kept, and trailing whitespace is trimmed.
///
/// ```
/// assert_eq!(scribble_room::hint("x-ray"), "_ -_ _ _");
/// ```
pub fn hint(word: &str) -> String {
    let mut out = String::with_capacity(word.len() * 2);
    for c in word.chars() {
        if c.is_ascii_alphabetic() {
            out.push_str("_ ");
        } else {
            out.push(c);
        }
    }
    out.trim().to_string()
}

const DEFAULT_WORDS: &[&str] = &[
    "apple", "banana", "car", "dog", "elephant", "flower", "guitar", "house",
    "igloo", "jacket", "kite", "lion", "mountain", "notebook", "ocean", "pizza",
    "queen", "rainbow", "sun", "tree", "umbrella", "volcano", "whale", "xylophone",
    "yacht", "zebra", "airplane", "beach", "castle", "dragon", "eagle", "forest",
    "giraffe", "hamburger", "island", "jellyfish", "koala", "lamp", "moon",
    "ninja", "octopus", "penguin", "robot", "snowman", "tiger", "unicorn",
    "vampire", "wizard", "yeti", "zombie", "anchor", "butterfly", "cactus",
    "dinosaur", "earth", "fairy", "glasses", "helicopter", "ice cream", "kangaroo",
    "lighthouse", "mermaid", "nest", "owl", "pirate", "queen bee", "rocket",
    "starfish", "train", "umbrella", "violin", "watermelon", "x-ray", "yogurt",
    "zipper", "ant", "bear", "cat", "duck", "elephant", "fish", "goat", "horse",
    "insect", "jaguar", "key", "lobster", "monkey", "nurse", "ostrich", "peacock",
    "desk", "chair", "sofa", "television", "computer", "book", "pencil", "door",
    "window", "clock", "shoe", "hat", "shirt", "pants", "skirt", "socks",
    "gloves", "scarf", "necklace", "ring", "watch", "bracelet", "sunglasses",
    "backpack", "wallet", "purse", "camera", "headphones", "microphone", "speaker",
    "keyboard", "mouse", "monitor", "printer", "phone", "tablet", "scissors",
    "stapler", "paperclip", "ruler", "calculator", "calendar", "notebook", "pen",
];
