//! Lexicon-based polarity/subjectivity scorer.
//!
//! Algorithm:
//! 1. Lower-case the text and split it into words; `, . ; : ! ?` end a clause.
//! 2. Intensifiers ("very", "slightly") scale the next scored word; negations ("not",
//!    "n't") flip it with a ×-0.5 dampening. Both reset at the end of a clause.
//! 3. polarity = mean of scored word polarities, subjectivity = mean of their
//!    subjectivities, each clamped to its range. No scored words ⇒ (0, 0).

use std::collections::HashMap;
use std::sync::OnceLock;

use super::{SentimentAnalyzer, SentimentScores};

const NEGATION_FACTOR: f64 = -0.5;

/// (word, polarity, subjectivity)
const LEXICON: &[(&str, f64, f64)] = &[
    ("amazing", 0.6, 0.9),
    ("awesome", 1.0, 1.0),
    ("beautiful", 0.85, 1.0),
    ("best", 1.0, 0.3),
    ("better", 0.5, 0.5),
    ("brilliant", 0.9, 1.0),
    ("clear", 0.1, 0.38),
    ("cool", 0.35, 0.65),
    ("delightful", 1.0, 1.0),
    ("easy", 0.43, 0.83),
    ("effective", 0.6, 0.8),
    ("elegant", 0.5, 0.75),
    ("enjoy", 0.4, 0.5),
    ("enjoyed", 0.4, 0.5),
    ("excellent", 1.0, 1.0),
    ("exciting", 0.3, 0.8),
    ("fantastic", 0.4, 0.9),
    ("fast", 0.2, 0.6),
    ("favorite", 0.5, 1.0),
    ("fine", 0.42, 0.5),
    ("fun", 0.3, 0.2),
    ("glad", 0.5, 1.0),
    ("good", 0.7, 0.6),
    ("great", 0.8, 0.75),
    ("happy", 0.8, 1.0),
    ("helpful", 0.5, 0.6),
    ("impressive", 1.0, 1.0),
    ("interesting", 0.5, 0.5),
    ("love", 0.5, 0.6),
    ("loved", 0.7, 0.8),
    ("lovely", 0.5, 0.75),
    ("nice", 0.6, 1.0),
    ("novel", 0.3, 0.5),
    ("outstanding", 0.5, 0.67),
    ("perfect", 1.0, 1.0),
    ("pleasant", 0.73, 0.97),
    ("positive", 0.23, 0.55),
    ("recommend", 0.4, 0.5),
    ("robust", 0.4, 0.5),
    ("satisfied", 0.5, 1.0),
    ("strong", 0.43, 0.73),
    ("superb", 1.0, 1.0),
    ("thanks", 0.2, 0.2),
    ("useful", 0.3, 0.0),
    ("wonderful", 1.0, 1.0),
    ("angry", -0.5, 1.0),
    ("annoying", -0.8, 0.9),
    ("awful", -1.0, 1.0),
    ("bad", -0.7, 0.67),
    ("boring", -1.0, 1.0),
    ("broken", -0.4, 0.4),
    ("confusing", -0.3, 0.7),
    ("difficult", -0.5, 1.0),
    ("disappointed", -0.75, 0.75),
    ("disappointing", -0.6, 0.7),
    ("dull", -0.3, 0.6),
    ("fail", -0.5, 0.3),
    ("failed", -0.5, 0.3),
    ("flawed", -0.5, 0.6),
    ("hard", -0.29, 0.54),
    ("hate", -0.8, 0.9),
    ("hated", -0.9, 0.7),
    ("horrible", -1.0, 1.0),
    ("mediocre", -0.2, 0.4),
    ("nasty", -1.0, 1.0),
    ("negative", -0.3, 0.4),
    ("painful", -0.7, 0.9),
    ("pathetic", -1.0, 1.0),
    ("poor", -0.4, 0.6),
    ("sad", -0.5, 1.0),
    ("slow", -0.3, 0.4),
    ("stupid", -0.8, 1.0),
    ("terrible", -1.0, 1.0),
    ("ugly", -0.7, 1.0),
    ("unhappy", -0.6, 0.9),
    ("useless", -0.5, 0.2),
    ("weak", -0.38, 0.56),
    ("worse", -0.4, 0.6),
    ("worst", -1.0, 1.0),
    ("wrong", -0.5, 0.9),
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("absolutely", 1.4),
    ("barely", 0.4),
    ("extremely", 1.5),
    ("fairly", 0.8),
    ("highly", 1.3),
    ("incredibly", 1.5),
    ("quite", 1.1),
    ("rather", 0.9),
    ("really", 1.3),
    ("slightly", 0.5),
    ("so", 1.2),
    ("somewhat", 0.7),
    ("super", 1.3),
    ("too", 1.2),
    ("totally", 1.3),
    ("very", 1.3),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "neither", "nor", "without", "hardly", "cannot",
];

const CLAUSE_BREAKS: &[char] = &[',', '.', ';', ':', '!', '?'];

fn lexicon() -> &'static HashMap<&'static str, (f64, f64)> {
    static LEXICON_MAP: OnceLock<HashMap<&'static str, (f64, f64)>> = OnceLock::new();
    LEXICON_MAP.get_or_init(|| {
        LEXICON
            .iter()
            .map(|&(word, polarity, subjectivity)| (word, (polarity, subjectivity)))
            .collect()
    })
}

fn intensity(word: &str) -> Option<f64> {
    INTENSIFIERS
        .iter()
        .find(|(w, _)| *w == word)
        .map(|&(_, factor)| factor)
}

fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(&word) || word.ends_with("n't")
}

#[derive(Debug, PartialEq)]
enum Token {
    Word(String),
    ClauseBreak,
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in text.chars().map(|c| if c == '\u{2019}' { '\'' } else { c }) {
        if ch.is_alphanumeric() || ch == '\'' {
            current.extend(ch.to_lowercase());
            continue;
        }
        if !current.is_empty() {
            tokens.push(Token::Word(std::mem::take(&mut current)));
        }
        if CLAUSE_BREAKS.contains(&ch) {
            tokens.push(Token::ClauseBreak);
        }
    }
    if !current.is_empty() {
        tokens.push(Token::Word(current));
    }

    tokens
}

/// Default analyzer backed by a small built-in lexicon.
pub struct LexiconAnalyzer;

impl SentimentAnalyzer for LexiconAnalyzer {
    fn analyze(&self, text: &str) -> SentimentScores {
        let lexicon = lexicon();
        let mut scored: Vec<(f64, f64)> = Vec::new();
        let mut multiplier = 1.0;
        let mut negated = false;

        for token in tokenize(text) {
            let word = match token {
                Token::Word(word) => word,
                Token::ClauseBreak => {
                    multiplier = 1.0;
                    negated = false;
                    continue;
                }
            };

            if let Some(&(polarity, subjectivity)) = lexicon.get(word.as_str()) {
                let mut polarity = polarity * multiplier;
                if negated {
                    polarity *= NEGATION_FACTOR;
                }
                scored.push((
                    polarity.clamp(-1.0, 1.0),
                    (subjectivity * multiplier).clamp(0.0, 1.0),
                ));
                multiplier = 1.0;
                negated = false;
            } else if let Some(factor) = intensity(&word) {
                multiplier *= factor;
            } else if is_negation(&word) {
                negated = !negated;
            }
        }

        if scored.is_empty() {
            return SentimentScores {
                polarity: 0.0,
                subjectivity: 0.0,
            };
        }

        let count = scored.len() as f64;
        let polarity = scored.iter().map(|(p, _)| p).sum::<f64>() / count;
        let subjectivity = scored.iter().map(|(_, s)| s).sum::<f64>() / count;

        SentimentScores {
            polarity: polarity.clamp(-1.0, 1.0),
            subjectivity: subjectivity.clamp(0.0, 1.0),
        }
    }
}
