//! Nested list values.
//!
//! FETCH responses carry their payload as a parenthesized structure of
//! atoms, quoted strings, literals, and nested lists. The payload is parsed
//! into this uniform tree once and then walked by key, which keeps the
//! per-key decoding small and lets callers inspect items the engine does
//! not interpret (message flags, most notably).

use crate::parser::lexer::{Lexer, Token};
use crate::Result;

/// One node of the FETCH payload tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sexp {
    /// An atom or quoted string, kept in textual form.
    Atom(String),
    /// An all-digit atom, decoded.
    Number(u32),
    /// A literal, carried as opaque bytes.
    Literal(Vec<u8>),
    /// A parenthesized sequence of nested values.
    List(Vec<Sexp>),
    /// The special atom `NIL`: the absent value, distinct from `""`.
    Nil,
}

impl Sexp {
    /// Reads one value: a list, atom, quoted string, literal, number, or
    /// `NIL`.
    ///
    /// # Errors
    ///
    /// Returns a parse error on mismatched parentheses or a token that
    /// cannot start a value.
    pub fn read(lexer: &mut Lexer<'_>) -> Result<Self> {
        match lexer.next_token()? {
            Token::LParen => Self::read_list(lexer),
            Token::Atom(s) => Ok(Self::Atom(s.to_string())),
            Token::QuotedString(s) => Ok(Self::Atom(s)),
            Token::Number(n) => Ok(Self::Number(n)),
            Token::Literal(data) => Ok(Self::Literal(data)),
            Token::Nil => Ok(Self::Nil),
            token => Err(lexer.error(&format!("unexpected token in value: {token:?}"))),
        }
    }

    /// Reads list elements after an opening parenthesis.
    fn read_list(lexer: &mut Lexer<'_>) -> Result<Self> {
        let mut items = Vec::new();
        loop {
            match lexer.peek() {
                Some(b')') => {
                    lexer.advance();
                    break;
                }
                Some(b' ') => {
                    lexer.advance();
                }
                Some(b'\r' | b'\n') | None => {
                    return Err(lexer.error("unterminated list"));
                }
                Some(_) => items.push(Self::read(lexer)?),
            }
        }
        Ok(Self::List(items))
    }

    /// Returns the text of an atom.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Atom(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a nonnegative integer: a decoded number, or an
    /// atom that parses as one.
    #[must_use]
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Atom(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Returns the bytes of a literal.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Literal(data) => Some(data),
            _ => None,
        }
    }

    /// Returns the elements of a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Sexp]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns true for the absent value.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn read(input: &[u8]) -> Sexp {
        let mut lexer = Lexer::new(input);
        Sexp::read(&mut lexer).unwrap()
    }

    #[test]
    fn flat_list() {
        let sexp = read(b"(FLAGS 42 \"quoted text\" NIL)");
        assert_eq!(
            sexp,
            Sexp::List(vec![
                Sexp::Atom("FLAGS".into()),
                Sexp::Number(42),
                Sexp::Atom("quoted text".into()),
                Sexp::Nil,
            ])
        );
    }

    #[test]
    fn nested_lists() {
        let sexp = read(b"(a (b (c)) d)");
        assert_eq!(
            sexp,
            Sexp::List(vec![
                Sexp::Atom("a".into()),
                Sexp::List(vec![
                    Sexp::Atom("b".into()),
                    Sexp::List(vec![Sexp::Atom("c".into())]),
                ]),
                Sexp::Atom("d".into()),
            ])
        );
    }

    #[test]
    fn empty_list() {
        assert_eq!(read(b"()"), Sexp::List(Vec::new()));
    }

    #[test]
    fn literal_inside_list() {
        let sexp = read(b"(RFC822 {5}\r\nhello)");
        assert_eq!(
            sexp,
            Sexp::List(vec![
                Sexp::Atom("RFC822".into()),
                Sexp::Literal(b"hello".to_vec()),
            ])
        );
    }

    #[test]
    fn unterminated_list_is_an_error() {
        let mut lexer = Lexer::new(b"(a b\r\n");
        assert!(Sexp::read(&mut lexer).is_err());
    }

    #[test]
    fn stray_close_is_an_error() {
        let mut lexer = Lexer::new(b")");
        assert!(Sexp::read(&mut lexer).is_err());
    }

    #[test]
    fn accessors() {
        assert_eq!(read(b"atom").as_str(), Some("atom"));
        assert_eq!(read(b"99").as_u32(), Some(99));
        assert_eq!(Sexp::Atom("123".into()).as_u32(), Some(123));
        assert_eq!(read(b"{2}\r\nok").as_bytes(), Some(b"ok".as_ref()));
        assert!(read(b"NIL").is_nil());
        assert!(read(b"(x)").as_list().is_some());
        assert_eq!(read(b"atom").as_u32(), None);
    }
}
