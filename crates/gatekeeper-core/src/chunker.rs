//! Sentence-aware chunking with overlap.
//!
//! Text is segmented into sentences, then consecutive sentences are packed
//! into chunks. A chunk is closed when the next sentence would push it past
//! `max_length`, even if it has not reached `min_length` yet: `max_length`
//! is only ever exceeded by a single sentence that is longer than it. The
//! next chunk is seeded with the shortest run of trailing sentences of the
//! closed chunk whose length reaches `overlap` (never the whole chunk), and
//! the seed is shortened from the front if it would not leave room for the
//! following sentence.
//!
//! A sentence longer than `max_length` is never split. Pending text shorter
//! than `min_length` is folded into it; otherwise the pending text is closed
//! first and the long sentence becomes a chunk of its own. Either way the
//! chunk after it starts without overlap.
//!
//! Chunks are verbatim slices of the input, so the text between the first
//! and last sentence of a chunk keeps its original whitespace.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub min_length: usize,
    pub max_length: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { min_length: 1000, max_length: 2000, overlap: 100 }
    }
}

impl ChunkingConfig {
    pub fn new(min_length: usize, max_length: usize, overlap: usize) -> Result<Self> {
        let config = Self { min_length, max_length, overlap };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_length == 0 {
            return Err(Error::Config("chunking.max_length must be greater than zero".into()));
        }
        if self.min_length > self.max_length {
            return Err(Error::Config(format!(
                "chunking.min_length ({}) exceeds chunking.max_length ({})",
                self.min_length, self.max_length
            )));
        }
        Ok(())
    }
}

/// One sentence, trimmed of surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub bytes: Range<usize>,
    pub chars: Range<usize>,
}

impl Sentence {
    fn char_len(&self) -> usize {
        self.chars.end - self.chars.start
    }
}

/// Split `text` into sentences.
///
/// A sentence ends at `.`, `!`, `?` (or their full-width forms, plus any
/// closing quotes or brackets) followed by whitespace or end of text, and at
/// blank lines, so headings and list items without punctuation stand alone.
pub fn split_sentences(text: &str) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    let mut open: Option<(usize, usize)> = None;
    let mut end = (0usize, 0usize);
    let mut char_pos = 0usize;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        char_pos += 1;
        if c.is_whitespace() {
            if c == '\n' && starts_blank_line(&text[i + 1..]) {
                if let Some(start) = open.take() {
                    sentences.push(Sentence { bytes: start.0..end.0, chars: start.1..end.1 });
                }
            }
            continue;
        }
        if open.is_none() {
            open = Some((i, char_pos - 1));
        }
        end = (i + c.len_utf8(), char_pos);
        if is_terminal(c) {
            while let Some(&(j, next)) = chars.peek() {
                if !(is_terminal(next) || is_closing(next)) {
                    break;
                }
                chars.next();
                char_pos += 1;
                end = (j + next.len_utf8(), char_pos);
            }
            let at_boundary = chars.peek().map_or(true, |&(_, next)| next.is_whitespace());
            if at_boundary {
                if let Some(start) = open.take() {
                    sentences.push(Sentence { bytes: start.0..end.0, chars: start.1..end.1 });
                }
            }
        }
    }
    if let Some(start) = open {
        sentences.push(Sentence { bytes: start.0..end.0, chars: start.1..end.1 });
    }
    sentences
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '。' | '！' | '？' | '…')
}

fn is_closing(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '”' | '’' | '»')
}

fn starts_blank_line(rest: &str) -> bool {
    match rest.find('\n') {
        Some(p) => rest[..p].trim().is_empty(),
        None => false,
    }
}

pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Byte ranges of each chunk within `text`, in order.
    pub fn spans(&self, text: &str) -> Vec<Range<usize>> {
        let sentences = split_sentences(text);
        let cfg = &self.config;
        // Character length of sentences[a..=b] as it appears in `text`.
        let len = |a: usize, b: usize| sentences[b].chars.end - sentences[a].chars.start;
        let span = |a: usize, b: usize| sentences[a].bytes.start..sentences[b].bytes.end;

        let mut out = Vec::new();
        // The buffer is sentences[first..i]; sentences before `fresh` are overlap seed.
        let mut first = 0usize;
        let mut fresh = 0usize;

        for i in 0..sentences.len() {
            if sentences[i].char_len() > cfg.max_length {
                if fresh < i && len(first, i - 1) < cfg.min_length {
                    out.push(span(first, i));
                } else {
                    if fresh < i {
                        out.push(span(first, i - 1));
                    }
                    out.push(span(i, i));
                }
                first = i + 1;
                fresh = i + 1;
                continue;
            }
            if fresh < i && len(first, i) > cfg.max_length {
                out.push(span(first, i - 1));
                first = self.seed_start(&sentences, first, i - 1);
                fresh = i;
                while first < i && len(first, i) > cfg.max_length {
                    first += 1;
                }
            }
        }
        if fresh < sentences.len() {
            out.push(span(first, sentences.len() - 1));
        }
        out
    }

    /// Start index of the overlap seed taken from the chunk `sentences[first..=last]`.
    fn seed_start(&self, sentences: &[Sentence], first: usize, last: usize) -> usize {
        if self.config.overlap == 0 || first == last {
            return last + 1;
        }
        let mut start = last;
        while start > first + 1 && sentences[last].chars.end - sentences[start].chars.start < self.config.overlap {
            start -= 1;
        }
        start
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        self.spans(text).into_iter().map(|r| text[r].to_string()).collect()
    }
}

/// Split `text` into chunks according to `config`.
pub fn chunk(text: &str, config: &ChunkingConfig) -> Result<Vec<String>> {
    Ok(Chunker::new(config.clone())?.split(text))
}
