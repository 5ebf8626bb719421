//! Text to ASL animation lookup.
//!
//! Input is normalized, split into tokens and matched greedily left to
//! right: a known multi-word phrase starting at the current token wins,
//! longest first, otherwise the single token is mapped through a table of
//! informal variations. Every resulting word carries the path of its
//! animation, or an empty path when none exists.

use crate::{Error, Result};
use log::info;
use serde::Serialize;

/// Longest phrase, in tokens, tried at each position
const MAX_PHRASE_TOKENS: usize = 6;

const PHRASES: &[&str] = &[
    "nice to meet you",
    "are you here",
    "see you again",
    "see you later",
    "how are you",
    "thank you",
    "i love you",
    "good morning",
    "good night",
    "good afternoon",
    "good evening",
    "excuse me",
    "you are welcome",
    "what is your name",
    "pleased to meet you",
];

const VARIATIONS: &[(&str, &str)] = &[
    ("hi", "hello"),
    ("hey", "hello"),
    ("greetings", "hello"),
    ("bye", "goodbye"),
    ("farewell", "goodbye"),
    ("thanks", "thank you"),
    ("thank", "thank you"),
    ("thx", "thank you"),
    ("plz", "please"),
    ("yeah", "yes"),
    ("yep", "yes"),
    ("yup", "yes"),
    ("nope", "no"),
    ("nah", "no"),
    ("wanna", "want"),
];

const ANIMATIONS: &[(&str, &str)] = &[
    ("hello", "/static/animations/hello.gif"),
    ("hi", "/static/animations/hello.gif"),
    ("goodbye", "/static/animations/goodbye.gif"),
    ("bye", "/static/animations/goodbye.gif"),
    ("thank you", "/static/animations/thank-you.gif"),
    ("thanks", "/static/animations/thank-you.gif"),
    ("please", "/static/animations/please.gif"),
    ("yes", "/static/animations/yes.gif"),
    ("no", "/static/animations/no.gif"),
    ("sorry", "/static/animations/sorry.gif"),
    ("want", "/static/animations/want.gif"),
    ("help", "/static/animations/help.gif"),
    ("love", "/static/animations/i-love-you.gif"),
    ("happy", "/static/animations/happy.gif"),
    ("sad", "/static/animations/sad.gif"),
    ("good", "/static/animations/good.gif"),
    ("bad", "/static/animations/bad.gif"),
    ("water", "/static/animations/water.gif"),
    ("food", "/static/animations/food.gif"),
    ("eat", "/static/animations/eat.gif"),
    ("drink", "/static/animations/drink.gif"),
    ("sleep", "/static/animations/sleep.gif"),
    ("home", "/static/animations/home.gif"),
    ("family", "/static/animations/family.gif"),
    ("friend", "/static/animations/friend.gif"),
    ("go", "/static/animations/go.gif"),
    ("me", "/static/animations/me.gif"),
    ("to", "/static/animations/to.gif"),
    ("walk", "/static/animations/walk.gif"),
    ("back", "/static/animations/back.gif"),
    ("you", "/static/animations/you.gif"),
    ("work", "/static/animations/work.gif"),
    ("name", "/static/animations/name.gif"),
    ("meet", "/static/animations/meet.gif"),
    ("nice", "/static/animations/nice.gif"),
    ("here", "/static/animations/here.gif"),
    ("how are you", "/static/animations/how-are-you.gif"),
    ("applause", "/static/animations/applause.gif"),
    ("i love you", "/static/animations/i-love-you.gif"),
    ("good morning", "/static/animations/good-morning.gif"),
    ("nice to meet you", "/static/animations/nice-to-meet-you.gif"),
    ("pardon", "/static/animations/Pardon.gif"),
    ("good night", "/static/animations/goodnight.gif"),
    ("good afternoon", "/static/animations/afternoon.gif"),
    ("are you here", "/static/animations/here.gif"),
    ("see you again", "/static/animations/again.gif"),
];

/// Words to sign, in order, with their animations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Translation {
    pub words: Vec<String>,
    /// Animation path per word, empty when there is no animation
    pub animations: Vec<String>,
}

impl Translation {
    fn push(&mut self, word: &str) {
        self.words.push(word.to_string());
        self.animations.push(animation_for(word).to_string());
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.words.len()
    }
}

/// Animation path for a word or phrase, empty when unknown
#[must_use]
pub fn animation_for(word: &str) -> &'static str {
    ANIMATIONS
        .iter()
        .find(|(key, _)| *key == word)
        .map_or("", |&(_, path)| path)
}

fn canonical(token: &str) -> &str {
    VARIATIONS
        .iter()
        .find(|(from, _)| *from == token)
        .map_or(token, |&(_, to)| to)
}

/// Lower-case, replace punctuation with spaces and collapse whitespace
#[must_use]
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '\'' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Convert text into signable words
///
/// # Errors
///
/// Returns an error if the text is empty, or empty once punctuation is removed
pub fn translate(text: &str) -> Result<Translation> {
    if text.trim().is_empty() {
        return Err(Error::InvalidInput("No text provided".to_string()));
    }
    let cleaned = normalize(text);
    if cleaned.is_empty() {
        return Err(Error::InvalidInput("No valid text after cleaning".to_string()));
    }

    let tokens: Vec<&str> = cleaned.split(' ').collect();
    let mut translation = Translation::default();
    let mut i = 0;
    while i < tokens.len() {
        let longest = MAX_PHRASE_TOKENS.min(tokens.len() - i);
        let phrase = (2..=longest).rev().find_map(|len| {
            let candidate = tokens[i..i + len].join(" ");
            PHRASES.contains(&candidate.as_str()).then_some((candidate, len))
        });

        match phrase {
            Some((candidate, len)) => {
                translation.push(&candidate);
                i += len;
            }
            None => {
                translation.push(canonical(tokens[i]));
                i += 1;
            }
        }
    }

    info!("Converted to {} words: {:?}", translation.count(), translation.words);
    Ok(translation)
}
