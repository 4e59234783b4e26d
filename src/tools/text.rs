//! Text helpers shared by the tools and their local generators.

use std::collections::HashMap;

/// Fragments shorter than this (in characters) are not treated as sentences.
pub const MIN_SENTENCE_CHARS: usize = 20;

/// Words shorter than this are never picked as key terms.
const MIN_TERM_CHARS: usize = 4;

/// Combine processed texts into one labelled context block, bounded to `budget` characters.
pub fn prepare_context(texts: &[String], budget: usize) -> String {
    let context = texts
        .iter()
        .enumerate()
        .map(|(i, text)| format!("--- CONTENT {} ---\n{}\n", i + 1, text))
        .collect::<Vec<_>>()
        .join("\n");
    truncate_chars(&context, budget).to_string()
}

/// Join texts without labels, for the local generators.
pub fn join_plain(texts: &[String]) -> String {
    texts
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Longest prefix of `text` with at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Characters `start..end` of `text` (by char index, clamped).
pub fn char_slice(text: &str, start: usize, end: usize) -> String {
    text.chars().skip(start).take(end.saturating_sub(start)).collect()
}

/// `text` cut to `max_chars` with a trailing ellipsis when shortened.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    let cut = truncate_chars(&flat, max_chars);
    if cut.len() < flat.len() {
        format!("{}...", cut)
    } else {
        flat
    }
}

/// Split on `.` and keep trimmed fragments of at least [`MIN_SENTENCE_CHARS`].
pub fn split_sentences(text: &str) -> Vec<String> {
    text.split('.')
        .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|s| s.chars().count() >= MIN_SENTENCE_CHARS)
        .collect()
}

/// The longest alphabetic word in a sentence, used as its key term.
pub fn key_term(sentence: &str) -> Option<String> {
    let mut best: Option<&str> = None;
    for word in sentence.split_whitespace() {
        let word = word.trim_matches(|c: char| !c.is_alphanumeric());
        if word.chars().count() < MIN_TERM_CHARS || !word.chars().all(char::is_alphabetic) {
            continue;
        }
        if best.map_or(true, |b| word.chars().count() > b.chars().count()) {
            best = Some(word);
        }
    }
    best.map(str::to_string)
}

/// Replace the first whole-word occurrence of `term` with a blank.
pub fn blank_out(sentence: &str, term: &str) -> String {
    let mut replaced = false;
    sentence
        .split(' ')
        .map(|word| {
            let bare = word.trim_matches(|c: char| !c.is_alphanumeric());
            if !replaced && bare == term {
                replaced = true;
                word.replace(term, "_____")
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The first `words` words of a sentence.
pub fn lead_words(sentence: &str, words: usize) -> String {
    let all: Vec<&str> = sentence.split_whitespace().collect();
    if all.len() <= words {
        all.join(" ")
    } else {
        format!("{}...", all[..words].join(" "))
    }
}

/// Most frequent words of at least `min_chars` characters, by count then first appearance.
pub fn frequent_terms(text: &str, min_chars: usize, limit: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, word) in text.split_whitespace().enumerate() {
        let word = word
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if word.chars().count() < min_chars || !word.chars().all(char::is_alphabetic) {
            continue;
        }
        counts.entry(word).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(word, (count, _))| (word, count))
        .collect()
}
