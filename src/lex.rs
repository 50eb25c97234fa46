// SPDX: CC0-1.0

use crate::eval::OperatorTyp;
use core::{fmt, iter::Peekable, str::CharIndices};
use std::sync::Arc;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubStr {
    src: Arc<String>,
    start: usize,
    len: usize,
}

impl SubStr {
    #[inline]
    pub const fn new(src: Arc<String>, start: usize, len: usize) -> Self {
        Self { src, start, len }
    }

    #[inline]
    pub fn all(src: Arc<String>) -> Self {
        let len = src.len();
        Self::new(src, 0, len)
    }

    pub fn src(&self) -> Arc<String> {
        Arc::clone(&self.src)
    }

    pub const fn start(&self) -> usize {
        self.start
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self) -> &str {
        &self.src[self.start..self.start + self.len]
    }

    pub fn shift_right(&mut self, by: usize) {
        self.len += by;
    }

    /// Carets under this span, aligned to be printed below [`SubStr::src`].
    /// Empty spans still get a single caret so the position is visible.
    pub fn underline(&self) -> String {
        format!(
            "{}{}",
            " ".repeat(self.start),
            "^".repeat(self.len.max(1))
        )
    }
}

impl fmt::Display for SubStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokTyp {
    Ident,
    Number,
    Op(OperatorTyp),
    Comma,
    OpenParen,
    CloseParen,

    // unsupported tokens
    XGreater,
    XLess,
    XEqual,
    XPipe,
    XOpenSquareBracket,
    XCloseSquareBracket,
    XOpenCurly,
    XCloseCurly,
}

impl TokTyp {
    pub const fn is_unsupported(&self) -> bool {
        match self {
            Self::Ident
            | Self::Number
            | Self::Op(_)
            | Self::Comma
            | Self::OpenParen
            | Self::CloseParen => false,

            // unsupported tokens
            Self::XGreater
            | Self::XLess
            | Self::XEqual
            | Self::XPipe
            | Self::XOpenSquareBracket
            | Self::XCloseSquareBracket
            | Self::XOpenCurly
            | Self::XCloseCurly => true,
        }
    }

    /// Whether a `-` or `+` following this token is a sign rather than a
    /// binary operator.
    const fn expects_operand(prev: Option<Self>) -> bool {
        match prev {
            None | Some(Self::Op(_) | Self::Comma | Self::OpenParen) => true,
            Some(_) => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tok {
    pub typ: TokTyp,
    pub loc: SubStr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum LexErrTyp {
    #[error("invalid character")]
    InvalidChar,
    #[error("unsupported character")]
    Unsupported(TokTyp),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LexErr {
    pub typ: LexErrTyp,
    pub loc: SubStr,
}

#[derive(Debug)]
pub struct Lexer<'src> {
    src: &'src Arc<String>,
    cur: Peekable<CharIndices<'src>>,
    prev: Option<TokTyp>,
    has_errored: bool, // tells iter to yield None after error
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src Arc<String>) -> Self {
        Self {
            src,
            cur: src.char_indices().peekable(),
            prev: None,
            has_errored: false,
        }
    }

    pub fn trim_whitespace(&mut self) {
        while let Some((_, chr)) = self.cur.peek() {
            if chr.is_whitespace() {
                self.cur.next();
            } else {
                break;
            }
        }
    }

    fn span(&self, start: usize, chr: char) -> SubStr {
        SubStr::new(Arc::clone(self.src), start, chr.len_utf8())
    }

    pub fn consume_unambiguous(&mut self) -> Option<Tok> {
        let (idx, chr) = self.cur.peek().copied()?;
        let signed = TokTyp::expects_operand(self.prev);
        let typ = match chr {
            '+' if signed => TokTyp::Op(OperatorTyp::Pos),
            '-' if signed => TokTyp::Op(OperatorTyp::Neg),
            '+' => TokTyp::Op(OperatorTyp::Add),
            '-' => TokTyp::Op(OperatorTyp::Sub),
            '*' => TokTyp::Op(OperatorTyp::Mul),
            '/' => TokTyp::Op(OperatorTyp::Div),
            '%' => TokTyp::Op(OperatorTyp::Rem),
            '^' => TokTyp::Op(OperatorTyp::Pow),
            ',' => TokTyp::Comma,
            '(' => TokTyp::OpenParen,
            ')' => TokTyp::CloseParen,

            '>' => TokTyp::XGreater,
            '<' => TokTyp::XLess,
            '=' => TokTyp::XEqual,
            '|' => TokTyp::XPipe,
            '[' => TokTyp::XOpenSquareBracket,
            ']' => TokTyp::XCloseSquareBracket,
            '{' => TokTyp::XOpenCurly,
            '}' => TokTyp::XCloseCurly,
            _ => return None,
        };
        self.cur.next(); // consume because we only peeked
        Some(Tok {
            typ,
            loc: self.span(idx, chr),
        })
    }

    /// Gathers a token whose first character satisfies `first` and whose
    /// remaining characters satisfy `rest`.
    pub fn consume_by<F, P>(&mut self, typ: TokTyp, first: F, rest: P) -> Option<Tok>
    where
        F: Fn(char) -> bool,
        P: Fn(char) -> bool,
    {
        let (start, chr) = self.cur.peek().copied()?;
        if !first(chr) {
            return None;
        }
        let mut tok = Tok {
            typ,
            loc: SubStr::new(Arc::clone(self.src), start, 0),
        };
        tok.loc.shift_right(chr.len_utf8());
        self.cur.next();
        while let Some((_, chr)) = self.cur.peek().copied() {
            if !rest(chr) {
                break;
            }
            tok.loc.shift_right(chr.len_utf8());
            self.cur.next();
        }
        Some(tok)
    }

    /// Extends a number token with an exponent such as `e-5` or `E3`. A
    /// trailing `e` not followed by digits is left for the constant.
    fn consume_exponent(&mut self, tok: &mut Tok) {
        let mut ahead = self.cur.clone();
        let mut len = match ahead.next() {
            Some((_, 'e' | 'E')) => 1,
            _ => return,
        };
        if let Some((_, '+' | '-')) = ahead.peek() {
            ahead.next();
            len += 1;
        }
        if !matches!(ahead.peek(), Some((_, chr)) if chr.is_ascii_digit()) {
            return;
        }
        while let Some((_, chr)) = ahead.peek() {
            if !chr.is_ascii_digit() {
                break;
            }
            ahead.next();
            len += 1;
        }
        tok.loc.shift_right(len);
        self.cur = ahead;
    }
}

pub fn is_ident_start(chr: char) -> bool {
    chr.is_ascii_alphabetic() || chr == '_'
}

pub fn is_ident_continue(chr: char) -> bool {
    chr.is_ascii_alphanumeric() || chr == '_'
}

impl Iterator for Lexer<'_> {
    type Item = Result<Tok, LexErr>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_errored {
            return None;
        }

        self.trim_whitespace();

        let (next_idx, next_chr) = self.cur.peek().copied()?;
        let is_number = |chr: char| chr.is_ascii_digit() || chr == '.';
        let tok = if let Some(tok) = self.consume_unambiguous() {
            tok
        } else if let Some(tok) = self.consume_by(TokTyp::Ident, is_ident_start, is_ident_continue)
        {
            tok
        } else if let Some(mut tok) = self.consume_by(TokTyp::Number, is_number, is_number) {
            self.consume_exponent(&mut tok);
            tok
        } else {
            self.has_errored = true;
            return Some(Err(LexErr {
                typ: LexErrTyp::InvalidChar,
                loc: self.span(next_idx, next_chr),
            }));
        };

        if tok.typ.is_unsupported() {
            self.has_errored = true;
            return Some(Err(LexErr {
                typ: LexErrTyp::Unsupported(tok.typ),
                loc: tok.loc,
            }));
        }
        self.prev = Some(tok.typ);
        Some(Ok(tok))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typs(src: &str) -> Vec<TokTyp> {
        let src = Arc::new(src.to_string());
        Lexer::new(&src)
            .map(|tok| tok.map(|tok| tok.typ))
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn minus_is_sign_only_in_operand_position() {
        use OperatorTyp::*;
        assert_eq!(
            typs("-x - 1"),
            [
                TokTyp::Op(Neg),
                TokTyp::Ident,
                TokTyp::Op(Sub),
                TokTyp::Number
            ]
        );
        assert_eq!(
            typs("x-1"),
            [TokTyp::Ident, TokTyp::Op(Sub), TokTyp::Number]
        );
        assert_eq!(
            typs("2^-(1)"),
            [
                TokTyp::Number,
                TokTyp::Op(Pow),
                TokTyp::Op(Neg),
                TokTyp::OpenParen,
                TokTyp::Number,
                TokTyp::CloseParen
            ]
        );
    }

    #[test]
    fn number_then_ident_splits() {
        let src = Arc::new(String::from("2x _Ab9"));
        let toks: Vec<_> = Lexer::new(&src).map(Result::unwrap).collect();
        assert_eq!(toks.len(), 3);
        assert_eq!(toks[0].loc.get(), "2");
        assert_eq!(toks[1].loc.get(), "x");
        assert_eq!(toks[2].loc.get(), "_Ab9");
    }

    #[test]
    fn exponents_belong_to_numbers() {
        for src in ["1e-5", "2E3", "1.5e+2", "6e0"] {
            let text = Arc::new(src.to_string());
            let toks: Vec<_> = Lexer::new(&text).map(Result::unwrap).collect();
            assert_eq!(toks.len(), 1, "{src}");
            assert_eq!(toks[0].typ, TokTyp::Number);
            assert_eq!(toks[0].loc.get(), src);
        }
        // no digits after the `e`, so it is the constant
        assert_eq!(typs("2e"), [TokTyp::Number, TokTyp::Ident]);
        assert_eq!(
            typs("2e-x"),
            [TokTyp::Number, TokTyp::Ident, TokTyp::Op(OperatorTyp::Sub), TokTyp::Ident]
        );
        assert_eq!(typs("2ex"), [TokTyp::Number, TokTyp::Ident]);
    }

    #[test]
    fn unsupported_and_invalid_chars_stop_lexing() {
        let src = Arc::new(String::from("y = x"));
        let mut lex = Lexer::new(&src);
        assert!(lex.next().unwrap().is_ok());
        let err = lex.next().unwrap().unwrap_err();
        assert_eq!(err.typ, LexErrTyp::Unsupported(TokTyp::XEqual));
        assert_eq!(err.loc.start(), 2);
        assert!(lex.next().is_none());

        let src = Arc::new(String::from("x $ 1"));
        let err = Lexer::new(&src).nth(1).unwrap().unwrap_err();
        assert_eq!(err.typ, LexErrTyp::InvalidChar);
        assert_eq!(err.loc.underline(), "  ^");
    }
}
