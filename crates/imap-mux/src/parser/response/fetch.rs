//! FETCH response decoding.
//!
//! The payload is read as one S-expression and walked as key/value pairs.
//! The envelope format is rigid: exactly ten fields, with address lists as
//! nested four-field sublists.

use crate::parser::lexer::Lexer;
use crate::parser::sexp::Sexp;
use crate::Result;

use super::types::{Address, Envelope, FetchRecord};

/// Parses the body of `* <seq> FETCH (...)`.
pub(super) fn parse_fetch(lexer: &mut Lexer<'_>, seq: u32) -> Result<FetchRecord> {
    let body = Sexp::read(lexer)?;
    let Sexp::List(items) = body else {
        return Err(lexer.error("fetch body must be a list"));
    };
    if items.len() % 2 != 0 {
        return Err(lexer.error("fetch list must pair keys with values"));
    }

    let mut record = FetchRecord::new(seq);
    let mut items = items.into_iter();
    while let (Some(key), Some(value)) = (items.next(), items.next()) {
        let Sexp::Atom(key) = key else {
            return Err(lexer.error("fetch key must be an atom"));
        };
        match key.to_ascii_uppercase().as_str() {
            "ENVELOPE" => record.envelope = Some(parse_envelope(lexer, value)?),
            "FLAGS" => record.flags = Some(value),
            "INTERNALDATE" => record.internal_date = Some(string_value(lexer, value)?),
            "RFC822" => record.rfc822 = Some(literal_value(lexer, value)?),
            "RFC822.HEADER" => record.rfc822_header = Some(literal_value(lexer, value)?),
            "RFC822.SIZE" => record.size = Some(number_value(lexer, &value)?),
            _ => return Err(lexer.error(&format!("unhandled fetch key {key:?}"))),
        }
    }

    lexer.expect_eol()?;
    Ok(record)
}

/// Decodes the ten-field envelope structure.
fn parse_envelope(lexer: &Lexer<'_>, value: Sexp) -> Result<Envelope> {
    let Sexp::List(fields) = value else {
        return Err(lexer.error("envelope must be a list"));
    };
    let fields: [Sexp; 10] = match <[Sexp; 10]>::try_from(fields) {
        Ok(fields) => fields,
        Err(fields) => {
            return Err(lexer.error(&format!("envelope needs 10 fields, had {}", fields.len())));
        }
    };
    let [date, subject, from, sender, reply_to, to, cc, bcc, in_reply_to, message_id] = fields;

    Ok(Envelope {
        date: nil_or_string(lexer, date)?,
        subject: nil_or_string(lexer, subject)?,
        from: address_list(lexer, from)?,
        sender: address_list(lexer, sender)?,
        reply_to: address_list(lexer, reply_to)?,
        to: address_list(lexer, to)?,
        cc: address_list(lexer, cc)?,
        bcc: address_list(lexer, bcc)?,
        in_reply_to: nil_or_string(lexer, in_reply_to)?,
        message_id: nil_or_string(lexer, message_id)?,
    })
}

/// Decodes an envelope address list: `NIL` or a list of four-field
/// sublists.
fn address_list(lexer: &Lexer<'_>, value: Sexp) -> Result<Vec<Address>> {
    match value {
        Sexp::Nil => Ok(Vec::new()),
        Sexp::List(items) => items
            .into_iter()
            .map(|item| parse_address(lexer, item))
            .collect(),
        _ => Err(lexer.error("expected address list or NIL")),
    }
}

fn parse_address(lexer: &Lexer<'_>, value: Sexp) -> Result<Address> {
    let Sexp::List(parts) = value else {
        return Err(lexer.error("address must be a list"));
    };
    let parts: [Sexp; 4] = match <[Sexp; 4]>::try_from(parts) {
        Ok(parts) => parts,
        Err(parts) => {
            return Err(lexer.error(&format!("address needs 4 fields, had {}", parts.len())));
        }
    };
    let [name, source_route, mailbox, host] = parts;

    Ok(Address {
        name: nil_or_string(lexer, name)?,
        source_route: nil_or_string(lexer, source_route)?,
        mailbox: nil_or_string(lexer, mailbox)?,
        host: nil_or_string(lexer, host)?,
    })
}

/// `NIL` becomes the absent value; strings, numbers, and literals become
/// text.
fn nil_or_string(lexer: &Lexer<'_>, value: Sexp) -> Result<Option<String>> {
    match value {
        Sexp::Nil => Ok(None),
        Sexp::Atom(s) => Ok(Some(s)),
        Sexp::Number(n) => Ok(Some(n.to_string())),
        Sexp::Literal(data) => Ok(Some(String::from_utf8_lossy(&data).into_owned())),
        Sexp::List(_) => Err(lexer.error("expected string, got list")),
    }
}

fn string_value(lexer: &Lexer<'_>, value: Sexp) -> Result<String> {
    nil_or_string(lexer, value)?.ok_or_else(|| lexer.error("expected string, got NIL"))
}

fn literal_value(lexer: &Lexer<'_>, value: Sexp) -> Result<Vec<u8>> {
    match value {
        Sexp::Literal(data) => Ok(data),
        _ => Err(lexer.error("expected literal bytes")),
    }
}

fn number_value(lexer: &Lexer<'_>, value: &Sexp) -> Result<u32> {
    value
        .as_u32()
        .ok_or_else(|| lexer.error("expected number"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fetch(input: &[u8], seq: u32) -> Result<FetchRecord> {
        let mut lexer = Lexer::new(input);
        parse_fetch(&mut lexer, seq)
    }

    #[test]
    fn size_and_internal_date() {
        let record = fetch(
            b"(INTERNALDATE \"17-Jul-1996 02:44:25 -0700\" RFC822.SIZE 4286)\r\n",
            3,
        )
        .unwrap();
        assert_eq!(record.seq, 3);
        assert_eq!(
            record.internal_date.as_deref(),
            Some("17-Jul-1996 02:44:25 -0700")
        );
        assert_eq!(record.size, Some(4286));
        assert!(record.envelope.is_none());
    }

    #[test]
    fn flags_stay_as_a_tree() {
        let record = fetch(b"(FLAGS (\\Seen \\Answered))\r\n", 1).unwrap();
        let flags = record.flags.unwrap();
        let items = flags.as_list().unwrap();
        assert_eq!(items[0].as_str(), Some("\\Seen"));
        assert_eq!(items[1].as_str(), Some("\\Answered"));
    }

    #[test]
    fn rfc822_literals() {
        let record = fetch(
            b"(RFC822.HEADER {15}\r\nSubject: hi\r\n\r\n)\r\n",
            9,
        )
        .unwrap();
        assert_eq!(
            record.rfc822_header.as_deref(),
            Some(b"Subject: hi\r\n\r\n".as_ref())
        );
    }

    #[test]
    fn odd_length_body_is_an_error() {
        assert!(fetch(b"(RFC822.SIZE)\r\n", 1).is_err());
    }

    #[test]
    fn unknown_key_is_an_error() {
        assert!(fetch(b"(UID 100)\r\n", 1).is_err());
    }

    #[test]
    fn envelope_wrong_arity_is_an_error() {
        assert!(fetch(b"(ENVELOPE (NIL NIL NIL))\r\n", 1).is_err());
    }

    #[test]
    fn short_address_is_an_error() {
        assert!(fetch(
            b"(ENVELOPE (NIL NIL ((\"name\" NIL \"box\")) NIL NIL NIL NIL NIL NIL NIL))\r\n",
            1
        )
        .is_err());
    }

    #[test]
    fn envelope_round_trip() {
        let record = fetch(
            b"(ENVELOPE (\"Wed, 17 Jul 1996 02:23:25 -0700\" \"Re: test\" \
              ((\"Terry Gray\" NIL \"gray\" \"cac.washington.edu\")) \
              ((\"Terry Gray\" NIL \"gray\" \"cac.washington.edu\")) \
              ((\"Terry Gray\" NIL \"gray\" \"cac.washington.edu\")) \
              ((NIL NIL \"imap\" \"cac.washington.edu\")) \
              NIL NIL NIL \"<B27397-0100000@cac.washington.edu>\"))\r\n",
            12,
        )
        .unwrap();

        let envelope = record.envelope.unwrap();
        assert_eq!(
            envelope.date.as_deref(),
            Some("Wed, 17 Jul 1996 02:23:25 -0700")
        );
        assert_eq!(envelope.subject.as_deref(), Some("Re: test"));
        assert_eq!(envelope.from.len(), 1);
        assert_eq!(envelope.from[0].name.as_deref(), Some("Terry Gray"));
        assert_eq!(envelope.from[0].mailbox.as_deref(), Some("gray"));
        assert_eq!(envelope.from[0].host.as_deref(), Some("cac.washington.edu"));
        assert_eq!(
            envelope.from[0].email().as_deref(),
            Some("gray@cac.washington.edu")
        );
        assert_eq!(envelope.to[0].name, None);
        assert_eq!(envelope.to[0].mailbox.as_deref(), Some("imap"));
        assert!(envelope.cc.is_empty());
        assert!(envelope.bcc.is_empty());
        assert_eq!(envelope.in_reply_to, None);
        assert_eq!(
            envelope.message_id.as_deref(),
            Some("<B27397-0100000@cac.washington.edu>")
        );
    }
}
