//! Token stream contract and the built-in streams
//!
//! The index consumes tokens through the [`TokenStream`] trait: a
//! lazy, finite, non-restartable sequence with an explicit
//! begin/advance/end lifecycle. Streams are passed into ingestion by
//! value, so whatever resources they hold are released exactly once on
//! every exit path.
//!
//! Real analysis (stemming, stop words, language handling) lives
//! outside this crate; the streams here are the minimal set needed to
//! feed the index directly: whitespace text, verbatim keywords, and
//! pre-built token lists.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One token as seen by the index.
///
/// `position_increment` is relative to the previous token; zero means
/// this token occupies the same position (a synonym or overlap).
/// Offsets are byte offsets into the original text, when the producer
/// tracks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub term: &'a [u8],
    pub position_increment: u32,
    pub offset: Option<(u32, u32)>,
}

/// A lazy, finite token source.
///
/// Lifecycle: `begin` exactly once, `advance` until it yields `None`,
/// then `end` exactly once. The stream is dropped by the consumer
/// afterwards, on success and on failure alike.
pub trait TokenStream {
    /// Prepare the stream for consumption.
    fn begin(&mut self) -> Result<()> {
        Ok(())
    }

    /// Produce the next token, or `None` once exhausted.
    fn advance(&mut self) -> Result<Option<Token<'_>>>;

    /// Finish consumption; called after the last `advance`.
    fn end(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Whitespace-splitting stream over a piece of text.
///
/// Words are stripped of non-alphanumeric characters and lowercased
/// (ASCII fast path, Unicode fallback); words that clean away to
/// nothing are skipped. Every token carries a unit position increment
/// and the byte offsets of the original word.
pub struct TextTokenStream {
    text: String,
    byte_pos: usize,
    buf: Vec<u8>,
}

impl TextTokenStream {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            byte_pos: 0,
            buf: Vec::with_capacity(32),
        }
    }
}

impl TokenStream for TextTokenStream {
    fn advance(&mut self) -> Result<Option<Token<'_>>> {
        loop {
            let rest = &self.text[self.byte_pos..];
            let Some(start_rel) = rest
                .char_indices()
                .find(|(_, c)| !c.is_whitespace())
                .map(|(i, _)| i)
            else {
                self.byte_pos = self.text.len();
                return Ok(None);
            };
            let start = self.byte_pos + start_rel;

            let word_rest = &self.text[start..];
            let end_rel = word_rest
                .char_indices()
                .find(|(_, c)| c.is_whitespace())
                .map(|(i, _)| i)
                .unwrap_or(word_rest.len());
            let end = start + end_rel;
            self.byte_pos = end;

            let word = &self.text[start..end];
            self.buf.clear();
            if word.is_ascii() {
                // ASCII fast path - byte iteration, no char decoding
                for &b in word.as_bytes() {
                    if b.is_ascii_alphanumeric() {
                        self.buf.push(b.to_ascii_lowercase());
                    }
                }
            } else {
                for c in word
                    .chars()
                    .filter(|c| c.is_alphanumeric())
                    .flat_map(|c| c.to_lowercase())
                {
                    let mut utf8 = [0u8; 4];
                    self.buf.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
                }
            }
            if self.buf.is_empty() {
                continue;
            }

            return Ok(Some(Token {
                term: &self.buf,
                position_increment: 1,
                offset: Some((start as u32, end as u32)),
            }));
        }
    }
}

/// One verbatim token per keyword, without any text analysis.
///
/// Offsets are synthetic, as if the keywords were written out
/// separated by single blanks.
pub struct KeywordTokenStream {
    keywords: Vec<String>,
    index: usize,
    upto: u32,
}

impl KeywordTokenStream {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            index: 0,
            upto: 0,
        }
    }
}

impl TokenStream for KeywordTokenStream {
    fn advance(&mut self) -> Result<Option<Token<'_>>> {
        let Some(keyword) = self.keywords.get(self.index) else {
            return Ok(None);
        };
        self.index += 1;
        let start = self.upto;
        let end = start + keyword.len() as u32;
        self.upto = end + 1;
        Ok(Some(Token {
            term: keyword.as_bytes(),
            position_increment: 1,
            offset: Some((start, end)),
        }))
    }
}

/// An owned token, for building streams ahead of time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedToken {
    pub term: Vec<u8>,
    pub position_increment: u32,
    pub offset: Option<(u32, u32)>,
}

impl OwnedToken {
    pub fn new(term: impl AsRef<[u8]>, position_increment: u32) -> Self {
        Self {
            term: term.as_ref().to_vec(),
            position_increment,
            offset: None,
        }
    }

    pub fn with_offset(mut self, start: u32, end: u32) -> Self {
        self.offset = Some((start, end));
        self
    }
}

/// Replays a pre-built token list, increments and offsets included.
///
/// The way to feed the index tokens with explicit position increments
/// (overlaps, gaps) when no analyzer is in the loop.
pub struct CannedTokenStream {
    tokens: Vec<OwnedToken>,
    index: usize,
}

impl CannedTokenStream {
    pub fn new(tokens: Vec<OwnedToken>) -> Self {
        Self { tokens, index: 0 }
    }
}

impl TokenStream for CannedTokenStream {
    fn advance(&mut self) -> Result<Option<Token<'_>>> {
        let Some(token) = self.tokens.get(self.index) else {
            return Ok(None);
        };
        self.index += 1;
        Ok(Some(Token {
            term: &token.term,
            position_increment: token.position_increment,
            offset: token.offset,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(mut stream: impl TokenStream) -> Vec<(Vec<u8>, u32, Option<(u32, u32)>)> {
        let mut out = Vec::new();
        stream.begin().unwrap();
        while let Some(token) = stream.advance().unwrap() {
            out.push((token.term.to_vec(), token.position_increment, token.offset));
        }
        stream.end().unwrap();
        out
    }

    #[test]
    fn test_text_stream_lowercases_and_strips() {
        let tokens = collect(TextTokenStream::new("Hello, World!"));
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].0, b"hello");
        assert_eq!(tokens[0].2, Some((0, 6))); // includes the comma byte
        assert_eq!(tokens[1].0, b"world");
    }

    #[test]
    fn test_text_stream_skips_pure_punctuation() {
        let tokens = collect(TextTokenStream::new("a -- b"));
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].0, b"a");
        assert_eq!(tokens[1].0, b"b");
    }

    #[test]
    fn test_text_stream_empty() {
        assert!(collect(TextTokenStream::new("")).is_empty());
        assert!(collect(TextTokenStream::new("   \t\n")).is_empty());
    }

    #[test]
    fn test_text_stream_unicode() {
        let tokens = collect(TextTokenStream::new("Bücher Straße"));
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].0, "bücher".as_bytes());
        assert_eq!(tokens[1].0, "straße".as_bytes());
    }

    #[test]
    fn test_keyword_stream_offsets() {
        let tokens = collect(KeywordTokenStream::new(["ab", "cde", "f"]));
        assert_eq!(tokens[0].2, Some((0, 2)));
        assert_eq!(tokens[1].2, Some((3, 6)));
        assert_eq!(tokens[2].2, Some((7, 8)));
        assert!(tokens.iter().all(|t| t.1 == 1));
    }

    #[test]
    fn test_canned_stream_preserves_increments() {
        let tokens = collect(CannedTokenStream::new(vec![
            OwnedToken::new("wifi", 1),
            OwnedToken::new("wireless", 0),
            OwnedToken::new("network", 1),
        ]));
        assert_eq!(tokens[1].0, b"wireless");
        assert_eq!(tokens[1].1, 0);
    }
}
