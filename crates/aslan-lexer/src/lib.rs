//! Tokenizes an ASLAN byte stream into literal-text runs and delimiter
//! tokens. The lexer never blocks and never rejects input: a delimiter
//! attempt that fails to complete (missing close bracket, wrong kind
//! letter, stream ends mid-match) degrades to literal text rather than an
//! error, per the format's graceful-degradation design.
//!
//! Escape mode is armed and disarmed by the caller (the state engine) via
//! [`Lexer::set_escape`] rather than being entered autonomously the moment
//! an `e_LABEL` delimiter is tokenized — see the parser crate for why.

mod cursor;
mod token;

pub use token::{DelimKind, Delimiter, Token, TokenKind};

use cursor::Cursor;

enum MatchResult {
    Complete(Delimiter, usize),
    Incomplete,
    NotDelimiter(usize),
}

/// Streaming tokenizer over an accumulating text buffer.
pub struct Lexer {
    buffer: String,
    pos: usize,
    pending: Vec<Token>,
    escape_label: Option<String>,
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lexer {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            pos: 0,
            pending: Vec::new(),
            escape_label: None,
        }
    }

    /// Append a chunk of input. May arrive split mid-delimiter or
    /// mid-escape-close-tag; the lexer retains whatever partial match is
    /// pending across calls.
    pub fn feed(&mut self, chunk: &str) {
        self.buffer.push_str(chunk);
    }

    /// Arm or disarm escape mode. Called by the state engine when it
    /// actually applies a recognized `e` delimiter (not merely when the
    /// lexer happens to tokenize one).
    pub fn set_escape(&mut self, label: Option<String>) {
        self.escape_label = label;
    }

    pub fn is_escaping(&self) -> bool {
        self.escape_label.is_some()
    }

    /// Pull the next token, if one can be produced from buffered input.
    /// `eof` must be `true` once no further `feed` calls will occur
    /// (i.e. inside `finish()`), so trailing partial matches flush as
    /// literal text instead of being held back forever.
    pub fn next_token(&mut self, eof: bool) -> Option<Token> {
        if self.pending.is_empty() {
            self.pump(eof);
        }
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }

    fn pump(&mut self, eof: bool) {
        loop {
            if self.pos >= self.buffer.len() {
                return;
            }
            let rest = &self.buffer[self.pos..];
            let progressed = if self.escape_label.is_some() {
                self.pump_escape(rest, eof)
            } else {
                self.pump_normal(rest, eof)
            };
            if !progressed || !self.pending.is_empty() {
                return;
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let start = self.pos as u32;
        let end = start + text.len() as u32;
        self.pending
            .push(Token::new(TokenKind::Text(text.to_string()), start, end));
    }

    fn push_delim(&mut self, delim: Delimiter, len: usize) {
        let start = self.pos as u32;
        let end = start + len as u32;
        self.pending.push(Token::new(TokenKind::Delim(delim), start, end));
    }

    fn pump_normal(&mut self, rest: &str, eof: bool) -> bool {
        match rest.find('[') {
            None => {
                self.push_text(rest);
                self.pos += rest.len();
                true
            }
            Some(0) => match try_match_delimiter(rest, eof) {
                MatchResult::Complete(delim, len) => {
                    self.push_delim(delim, len);
                    self.pos += len;
                    true
                }
                MatchResult::NotDelimiter(len) => {
                    self.push_text(&rest[..len]);
                    self.pos += len;
                    true
                }
                MatchResult::Incomplete => false,
            },
            Some(i) => {
                self.push_text(&rest[..i]);
                self.pos += i;
                true
            }
        }
    }

    fn pump_escape(&mut self, rest: &str, eof: bool) -> bool {
        let label = self.escape_label.clone().expect("escape active");
        let needle = format!("[aslane_{label}]");
        match rest.find(needle.as_str()) {
            Some(0) => {
                self.push_delim(
                    Delimiter {
                        kind: DelimKind::Escape,
                        label: Some(label),
                        arg: None,
                    },
                    needle.len(),
                );
                self.pos += needle.len();
                true
            }
            Some(i) => {
                self.push_text(&rest[..i]);
                self.pos += i;
                true
            }
            None => {
                if eof {
                    self.push_text(rest);
                    self.pos += rest.len();
                    true
                } else {
                    let hold = longest_overlap(rest, &needle);
                    let safe_len = rest.len() - hold;
                    if safe_len > 0 {
                        self.push_text(&rest[..safe_len]);
                        self.pos += safe_len;
                        true
                    } else {
                        false
                    }
                }
            }
        }
    }
}

/// Longest suffix of `haystack` that is a prefix of `needle` (excluding
/// a full match of `needle` itself, which callers check separately via
/// `find`). Used to avoid flushing a chunk tail that might still grow
/// into the escape close tag on the next `feed`.
fn longest_overlap(haystack: &str, needle: &str) -> usize {
    let max = needle.len().min(haystack.len()).saturating_sub(1);
    for k in (1..=max).rev() {
        if haystack.ends_with(&needle[..k]) {
            return k;
        }
    }
    0
}

fn try_match_delimiter(rest: &str, eof: bool) -> MatchResult {
    let mut cur = Cursor::new(rest);
    cur.advance(); // '['
    for expected in "aslan".chars() {
        match cur.peek() {
            Some(c) if c == expected => {
                cur.advance();
            }
            Some(_) => return MatchResult::NotDelimiter(cur.pos() as usize),
            None => {
                return if eof {
                    MatchResult::NotDelimiter(cur.pos() as usize)
                } else {
                    MatchResult::Incomplete
                };
            }
        }
    }

    let kind_char = match cur.peek() {
        Some(c) => c,
        None => {
            return if eof {
                MatchResult::NotDelimiter(cur.pos() as usize)
            } else {
                MatchResult::Incomplete
            };
        }
    };
    let kind = match DelimKind::from_char(kind_char) {
        Some(k) => {
            cur.advance();
            k
        }
        None => {
            cur.advance();
            return scan_to_bracket_or_incomplete(&mut cur, eof);
        }
    };

    match cur.peek() {
        Some(']') => {
            cur.advance();
            MatchResult::Complete(
                Delimiter {
                    kind,
                    label: None,
                    arg: None,
                },
                cur.pos() as usize,
            )
        }
        Some('_') => {
            cur.advance();
            let label_start = cur.pos();
            cur.eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
            let label_end = cur.pos();
            let label = rest[label_start as usize..label_end as usize].to_string();

            match cur.peek() {
                Some(':') => {
                    cur.advance();
                    let arg_start = cur.pos();
                    cur.eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
                    let arg_end = cur.pos();
                    if arg_end == arg_start {
                        return scan_to_bracket_or_incomplete(&mut cur, eof);
                    }
                    let arg = rest[arg_start as usize..arg_end as usize].to_string();
                    match cur.peek() {
                        Some(']') => {
                            cur.advance();
                            MatchResult::Complete(
                                Delimiter {
                                    kind,
                                    label: Some(label),
                                    arg: Some(arg),
                                },
                                cur.pos() as usize,
                            )
                        }
                        Some(_) => MatchResult::NotDelimiter(cur.pos() as usize),
                        None => {
                            if eof {
                                MatchResult::NotDelimiter(cur.pos() as usize)
                            } else {
                                MatchResult::Incomplete
                            }
                        }
                    }
                }
                Some(']') => {
                    cur.advance();
                    MatchResult::Complete(
                        Delimiter {
                            kind,
                            label: Some(label),
                            arg: None,
                        },
                        cur.pos() as usize,
                    )
                }
                Some(_) => MatchResult::NotDelimiter(cur.pos() as usize),
                None => {
                    if eof {
                        MatchResult::NotDelimiter(cur.pos() as usize)
                    } else {
                        MatchResult::Incomplete
                    }
                }
            }
        }
        Some(_) => MatchResult::NotDelimiter(cur.pos() as usize),
        None => {
            if eof {
                MatchResult::NotDelimiter(cur.pos() as usize)
            } else {
                MatchResult::Incomplete
            }
        }
    }
}

/// Reached after an unrecognized kind byte: per the format's recovery
/// rule, the whole `[aslan<bad-kind>...]` run passes through as literal
/// text up to (and including) the next `]`, rather than stopping at the
/// bad byte.
fn scan_to_bracket_or_incomplete(cur: &mut Cursor<'_>, eof: bool) -> MatchResult {
    cur.eat_while(|c| c != ']');
    match cur.peek() {
        Some(']') => {
            cur.advance();
            MatchResult::NotDelimiter(cur.pos() as usize)
        }
        None => {
            if eof {
                MatchResult::NotDelimiter(cur.pos() as usize)
            } else {
                MatchResult::Incomplete
            }
        }
    }
}
