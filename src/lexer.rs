//! # Body Lexer
//!
//! Splits the melody body into tokens. Patterns are tried in a fixed priority
//! order and the first one that matches wins, so `|:` is a start repeat rather
//! than a bar followed by junk, and `[|` is a thick-thin bar rather than a
//! group.
//!
//! Characters that match nothing become [`TokenKind::Mismatch`] tokens and are
//! ignored downstream. Every stream ends with exactly one [`TokenKind::End`].

/// Kinds of body token, in matching priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Note,           // optional ^ _ = then A-G, a-g or z
    Group,          // [CEG]
    ThinThickBar,   // |]
    ThinThinBar,    // ||
    ThickThinBar,   // [|
    StartRepeat,    // |:
    EndRepeat,      // :|
    StartEndRepeat, // ::
    FirstRepeat,    // [1
    SecondRepeat,   // [2
    Bar,            // |
    ChordSymbol,    // "Am7"
    Duration,       // 2, 16
    InvertDuration, // /
    OctaveUp,       // '
    OctaveDown,     // ,
    Mismatch,
    End,
}

/// Fixed-text tokens, tried after notes and groups
const LITERALS: &[(&str, TokenKind)] = &[
    ("|]", TokenKind::ThinThickBar),
    ("||", TokenKind::ThinThinBar),
    ("[|", TokenKind::ThickThinBar),
    ("|:", TokenKind::StartRepeat),
    (":|", TokenKind::EndRepeat),
    ("::", TokenKind::StartEndRepeat),
    ("[1", TokenKind::FirstRepeat),
    ("[2", TokenKind::SecondRepeat),
    ("|", TokenKind::Bar),
];

/// A token with the text it matched and its byte offset in the body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub offset: usize,
}

/// Lexer over a melody body.
///
/// Iterating yields each token once, then `End`, then nothing.
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            position: 0,
            finished: false,
        }
    }

    /// Tokenize the whole input from the start, `End` included.
    pub fn tokenize(input: &'a str) -> Vec<Token<'a>> {
        Lexer::new(input).collect()
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.position..]
    }

    /// Length of a note spelling at the cursor, if there is one
    fn check_note(&self) -> Option<usize> {
        let bytes = self.remaining().as_bytes();
        let start = usize::from(matches!(bytes.first(), Some(b'^' | b'_' | b'=')));
        match bytes.get(start) {
            Some(b'A'..=b'G' | b'a'..=b'g' | b'z') => Some(start + 1),
            _ => None,
        }
    }

    /// Length of a `[...]` group of letters and digits at the cursor
    fn check_group(&self) -> Option<usize> {
        let rest = self.remaining().strip_prefix('[')?;
        let inner = rest
            .bytes()
            .take_while(|b| matches!(*b, b'A'..=b'G' | b'a'..=b'd' | b'0'..=b'9'))
            .count();
        (rest.as_bytes().get(inner) == Some(&b']')).then_some(inner + 2)
    }

    /// Length of a quoted chord symbol on a single line
    fn check_chord_symbol(&self) -> Option<usize> {
        let rest = self.remaining().strip_prefix('"')?;
        let close = rest.find(['"', '\n'])?;
        (rest.as_bytes()[close] == b'"').then_some(close + 2)
    }

    fn check_duration(&self) -> Option<usize> {
        let digits = self
            .remaining()
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        (digits > 0).then_some(digits)
    }

    fn next_kind(&self) -> (TokenKind, usize) {
        if let Some(len) = self.check_note() {
            return (TokenKind::Note, len);
        }
        if let Some(len) = self.check_group() {
            return (TokenKind::Group, len);
        }
        let remaining = self.remaining();
        if let Some((literal, kind)) = LITERALS.iter().find(|(l, _)| remaining.starts_with(l)) {
            return (*kind, literal.len());
        }
        if let Some(len) = self.check_chord_symbol() {
            return (TokenKind::ChordSymbol, len);
        }
        if let Some(len) = self.check_duration() {
            return (TokenKind::Duration, len);
        }
        match remaining.chars().next() {
            Some('/') => (TokenKind::InvertDuration, 1),
            Some('\'') => (TokenKind::OctaveUp, 1),
            Some(',') => (TokenKind::OctaveDown, 1),
            Some(c) => (TokenKind::Mismatch, c.len_utf8()),
            None => (TokenKind::End, 0),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if self.finished {
            return None;
        }
        let offset = self.position;
        let (kind, len) = self.next_kind();
        if kind == TokenKind::End {
            self.finished = true;
        }
        self.position += len;
        Some(Token {
            kind,
            text: &self.input[offset..self.position],
            offset,
        })
    }
}
