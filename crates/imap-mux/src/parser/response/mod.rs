//! Response parsing: one wire unit to a structured value.
//!
//! The entry point decodes the leading tag (`*`, `+`, or `a<digits>`) and
//! dispatches on the body. Any parse failure short-circuits to the unit
//! boundary; by session policy such failures are fatal, so no mid-token
//! recovery is attempted.

mod fetch;
mod types;

pub use types::{
    Address, Envelope, FetchRecord, ListEntry, ServerResponse, StatusResponse, UntaggedResponse,
};

use crate::parser::lexer::{Lexer, Token};
use crate::types::{ResponseCode, Status, Tag};
use crate::Result;

/// Parses complete response units.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses one response unit: a line plus any embedded literals.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed data, an unexpected leading tag,
    /// or an untagged keyword the engine does not recognize.
    pub fn parse(input: &[u8]) -> Result<ServerResponse> {
        let mut lexer = Lexer::new(input);

        match lexer.next_token()? {
            Token::Asterisk => {
                lexer.expect_space()?;
                parse_untagged(&mut lexer).map(ServerResponse::Untagged)
            }
            Token::Plus => parse_continuation(&mut lexer),
            Token::Atom(s) => {
                let Some(tag) = Tag::parse(s) else {
                    return Err(lexer.error(&format!("unexpected tag {s:?}")));
                };
                lexer.expect_space()?;
                let status = parse_status(&mut lexer)?;
                Ok(ServerResponse::Tagged { tag, status })
            }
            token => Err(lexer.error(&format!("unexpected tag {token:?}"))),
        }
    }
}

/// Dispatches the body of a `*` response on its leading atom or number.
fn parse_untagged(lexer: &mut Lexer<'_>) -> Result<UntaggedResponse> {
    match lexer.next_token()? {
        Token::Atom(keyword) => match keyword.to_ascii_uppercase().as_str() {
            "OK" | "NO" | "BAD" => {
                // From the match arm; cannot fail.
                let status = Status::from_atom(keyword)
                    .ok_or_else(|| lexer.error("unreachable status keyword"))?;
                let response = parse_status_body(lexer, status)?;
                Ok(hoist_code(response))
            }
            "CAPABILITY" => parse_capability(lexer),
            "LIST" => {
                lexer.expect_space()?;
                parse_list(lexer)
            }
            "FLAGS" => {
                lexer.expect_space()?;
                let flags = lexer.read_paren_string_list()?;
                lexer.expect_eol()?;
                Ok(UntaggedResponse::Flags(flags))
            }
            _ => Err(lexer.error(&format!("unhandled untagged response {keyword:?}"))),
        },
        Token::Number(n) => {
            lexer.expect_space()?;
            let keyword = lexer.read_atom_string()?;
            match keyword.to_ascii_uppercase().as_str() {
                "EXISTS" => {
                    lexer.expect_eol()?;
                    Ok(UntaggedResponse::Exists(n))
                }
                "RECENT" => {
                    lexer.expect_eol()?;
                    Ok(UntaggedResponse::Recent(n))
                }
                "EXPUNGE" => {
                    lexer.expect_eol()?;
                    Ok(UntaggedResponse::Expunge(n))
                }
                "FETCH" => {
                    lexer.expect_space()?;
                    fetch::parse_fetch(lexer, n).map(UntaggedResponse::Fetch)
                }
                _ => Err(lexer.error(&format!("unhandled untagged response {keyword:?}"))),
            }
        }
        token => Err(lexer.error(&format!("unexpected token after *: {token:?}"))),
    }
}

/// Parses a status line starting at the status keyword.
fn parse_status(lexer: &mut Lexer<'_>) -> Result<StatusResponse> {
    let keyword = lexer.read_atom_string()?;
    let status = Status::from_atom(keyword)
        .ok_or_else(|| lexer.error(&format!("unexpected status {keyword:?}")))?;
    parse_status_body(lexer, status)
}

/// Parses the remainder of a status line: optional `[code]`, then text.
fn parse_status_body(lexer: &mut Lexer<'_>, status: Status) -> Result<StatusResponse> {
    if lexer.peek() == Some(b' ') {
        lexer.advance();
    }

    let code = if lexer.peek() == Some(b'[') {
        Some(parse_response_code(lexer)?)
    } else {
        None
    };

    let text = lexer.read_text_to_eol();
    Ok(StatusResponse {
        status,
        code,
        text,
        extras: Vec::new(),
    })
}

/// Parses a bracketed response code. Three forms are structured; anything
/// else is kept as the atom plus its free text.
fn parse_response_code(lexer: &mut Lexer<'_>) -> Result<ResponseCode> {
    lexer.expect(&Token::LBracket)?;
    let atom = lexer.read_atom_string()?;

    match atom.to_ascii_uppercase().as_str() {
        "PERMANENTFLAGS" => {
            lexer.expect_space()?;
            let flags = lexer.read_paren_string_list()?;
            lexer.expect(&Token::RBracket)?;
            lexer.expect_space()?;
            Ok(ResponseCode::PermanentFlags(flags))
        }
        "UIDVALIDITY" => {
            lexer.expect_space()?;
            let value = lexer.read_number()?;
            lexer.expect(&Token::RBracket)?;
            lexer.expect_space()?;
            Ok(ResponseCode::UidValidity(value))
        }
        "UIDNEXT" => {
            lexer.expect_space()?;
            let value = lexer.read_number()?;
            lexer.expect(&Token::RBracket)?;
            lexer.expect_space()?;
            Ok(ResponseCode::UidNext(value))
        }
        _ => {
            let text = lexer.read_code_text()?;
            if lexer.peek() == Some(b' ') {
                lexer.advance();
            }
            Ok(ResponseCode::Other {
                atom: atom.to_string(),
                text,
            })
        }
    }
}

/// Lifts a structured code out of an untagged OK into its own variant, the
/// form callers match on when draining extras.
fn hoist_code(response: StatusResponse) -> UntaggedResponse {
    match response.code {
        Some(ResponseCode::PermanentFlags(flags)) => UntaggedResponse::PermanentFlags(flags),
        Some(ResponseCode::UidValidity(value)) => UntaggedResponse::UidValidity(value),
        Some(ResponseCode::UidNext(value)) => UntaggedResponse::UidNext(value),
        _ => UntaggedResponse::Status(response),
    }
}

/// Parses `CAPABILITY` data: atoms until end of line.
fn parse_capability(lexer: &mut Lexer<'_>) -> Result<UntaggedResponse> {
    let mut capabilities = Vec::new();
    while lexer.peek() == Some(b' ') {
        lexer.advance();
        capabilities.push(lexer.read_atom_string()?.to_string());
    }
    lexer.expect_eol()?;
    Ok(UntaggedResponse::Capability(capabilities))
}

/// Parses a LIST entry: flag list, delimiter, mailbox name.
fn parse_list(lexer: &mut Lexer<'_>) -> Result<UntaggedResponse> {
    let flags = lexer.read_paren_string_list()?;
    lexer.expect_space()?;

    let delimiter = match lexer.next_token()? {
        Token::Nil => None,
        Token::QuotedString(s) => Some(s),
        token => return Err(lexer.error(&format!("expected delimiter, got {token:?}"))),
    };
    lexer.expect_space()?;

    let mailbox = lexer.read_astring()?;
    lexer.expect_eol()?;

    let mut entry = ListEntry::new(mailbox, delimiter);
    for flag in flags {
        match flag.as_str() {
            "\\Noinferiors" => entry.inferiors = Some(false),
            "\\Noselect" => entry.selectable = Some(false),
            "\\Marked" => entry.marked = Some(true),
            "\\Unmarked" => entry.marked = Some(false),
            "\\HasChildren" => entry.children = Some(true),
            "\\HasNoChildren" => entry.children = Some(false),
            _ => entry.extensions.push(flag),
        }
    }
    Ok(UntaggedResponse::List(entry))
}

/// Parses a `+` continuation: everything after the marker is prompt text.
fn parse_continuation(lexer: &mut Lexer<'_>) -> Result<ServerResponse> {
    if lexer.peek() == Some(b' ') {
        lexer.advance();
    }
    let text = lexer.read_text_to_eol();
    Ok(ServerResponse::Continuation { text })
}
