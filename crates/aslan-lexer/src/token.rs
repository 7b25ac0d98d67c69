use aslan_common::Span;

/// The ten recognized delimiter kinds, per `[aslan<kind><suffix>]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimKind {
    /// `d` - data/key.
    Data,
    /// `o` - object (map) toggle.
    Object,
    /// `a` - array (sequence) toggle.
    Array,
    /// `p` - part separator.
    Part,
    /// `i` - instruction.
    Instruction,
    /// `c` - comment.
    Comment,
    /// `e` - escape.
    Escape,
    /// `g` - strict-start marker.
    Go,
    /// `s` - strict-end marker.
    Stop,
    /// `v` - void/null assignment.
    Void,
}

impl DelimKind {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'd' => Some(Self::Data),
            'o' => Some(Self::Object),
            'a' => Some(Self::Array),
            'p' => Some(Self::Part),
            'i' => Some(Self::Instruction),
            'c' => Some(Self::Comment),
            'e' => Some(Self::Escape),
            'g' => Some(Self::Go),
            's' => Some(Self::Stop),
            'v' => Some(Self::Void),
            _ => None,
        }
    }
}

/// A fully-recognized delimiter: kind plus its optional label and arg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiter {
    pub kind: DelimKind,
    pub label: Option<String>,
    pub arg: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A run of literal (non-delimiter) characters.
    Text(String),
    Delim(Delimiter),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, start: u32, end: u32) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
        }
    }
}
