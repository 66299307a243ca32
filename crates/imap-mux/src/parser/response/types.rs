//! Structured response values.

use crate::parser::sexp::Sexp;
use crate::types::{ResponseCode, Status, Tag};
use crate::{Error, Result};

/// One complete response unit read off the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerResponse {
    /// Command completion carrying a client tag.
    Tagged {
        /// The tag echoed back by the server.
        tag: Tag,
        /// The completion status line.
        status: StatusResponse,
    },
    /// Server data beginning with `*`.
    Untagged(UntaggedResponse),
    /// Continuation prompt beginning with `+`.
    Continuation {
        /// Free-form prompt text, possibly empty.
        text: String,
    },
}

/// An OK/NO/BAD line: status, optional bracketed code, free text, and the
/// untagged responses grouped with the completion.
///
/// `extras` is empty when the value comes straight from the parser; the
/// correlator fills it with the untagged responses that arrived since the
/// previous tagged completion, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusResponse {
    /// The three-valued completion status.
    pub status: Status,
    /// The bracketed response code, if the server sent one.
    pub code: Option<ResponseCode>,
    /// Human-readable text.
    pub text: String,
    /// Untagged responses delivered with this completion.
    pub extras: Vec<UntaggedResponse>,
}

impl StatusResponse {
    /// True if the status is `OK`.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Converts a `NO` or `BAD` completion into [`Error::Imap`].
    ///
    /// # Errors
    ///
    /// Returns `Error::Imap` carrying the status and text when the status
    /// is not `OK`.
    pub fn into_result(self) -> Result<Self> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(Error::Imap {
                status: self.status,
                text: self.text,
            })
        }
    }
}

/// Server data sent without a tag.
#[derive(Debug, Clone, PartialEq)]
pub enum UntaggedResponse {
    /// An OK/NO/BAD line whose code (if any) is not decoded structurally.
    Status(StatusResponse),
    /// CAPABILITY: the server's capability atoms, in order.
    Capability(Vec<String>),
    /// LIST: one mailbox entry.
    List(ListEntry),
    /// FLAGS: the flags defined for a mailbox.
    Flags(Vec<String>),
    /// EXISTS: number of messages in the mailbox.
    Exists(u32),
    /// RECENT: number of messages with the \Recent flag.
    Recent(u32),
    /// EXPUNGE: sequence number of a removed message.
    Expunge(u32),
    /// FETCH: data items for one message.
    Fetch(FetchRecord),
    /// PERMANENTFLAGS lifted out of an untagged OK.
    PermanentFlags(Vec<String>),
    /// UIDVALIDITY lifted out of an untagged OK.
    UidValidity(u32),
    /// UIDNEXT lifted out of an untagged OK.
    UidNext(u32),
}

/// One mailbox entry from a LIST response.
///
/// The name-attribute fields are tri-valued: `None` when the server said
/// nothing, `Some(bool)` when a flag asserted or denied the property.
/// Flags the engine does not recognize are kept verbatim in `extensions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// The mailbox name.
    pub mailbox: String,
    /// Hierarchy delimiter; `None` for a flat namespace (`NIL`).
    pub delimiter: Option<String>,
    /// `Some(false)` when `\Noinferiors` was present.
    pub inferiors: Option<bool>,
    /// `Some(false)` when `\Noselect` was present.
    pub selectable: Option<bool>,
    /// Set by `\Marked` / `\Unmarked`.
    pub marked: Option<bool>,
    /// Set by `\HasChildren` / `\HasNoChildren`.
    pub children: Option<bool>,
    /// Unrecognized name-attributes, verbatim.
    pub extensions: Vec<String>,
}

impl ListEntry {
    /// Creates an entry with all attributes unset.
    #[must_use]
    pub fn new(mailbox: impl Into<String>, delimiter: Option<String>) -> Self {
        Self {
            mailbox: mailbox.into(),
            delimiter,
            inferiors: None,
            selectable: None,
            marked: None,
            children: None,
            extensions: Vec::new(),
        }
    }
}

/// Data items for one message from a FETCH response.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRecord {
    /// Message sequence number.
    pub seq: u32,
    /// The FLAGS item, left as its raw tree for the caller to inspect.
    pub flags: Option<Sexp>,
    /// The decoded ENVELOPE item.
    pub envelope: Option<Envelope>,
    /// The INTERNALDATE item.
    pub internal_date: Option<String>,
    /// The RFC822.SIZE item.
    pub size: Option<u32>,
    /// The RFC822 item: the full raw message.
    pub rfc822: Option<Vec<u8>>,
    /// The RFC822.HEADER item: the raw header section.
    pub rfc822_header: Option<Vec<u8>>,
}

impl FetchRecord {
    /// Creates an empty record for the given sequence number.
    #[must_use]
    pub const fn new(seq: u32) -> Self {
        Self {
            seq,
            flags: None,
            envelope: None,
            internal_date: None,
            size: None,
            rfc822: None,
            rfc822_header: None,
        }
    }
}

/// The ten-field message summary from FETCH ENVELOPE (RFC 3501 §7.4.2).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    /// Date header.
    pub date: Option<String>,
    /// Subject header.
    pub subject: Option<String>,
    /// From addresses.
    pub from: Vec<Address>,
    /// Sender addresses.
    pub sender: Vec<Address>,
    /// Reply-To addresses.
    pub reply_to: Vec<Address>,
    /// To addresses.
    pub to: Vec<Address>,
    /// Cc addresses.
    pub cc: Vec<Address>,
    /// Bcc addresses.
    pub bcc: Vec<Address>,
    /// In-Reply-To header.
    pub in_reply_to: Option<String>,
    /// Message-ID header.
    pub message_id: Option<String>,
}

/// One address from an envelope address list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Display name.
    pub name: Option<String>,
    /// Source route (obsolete SMTP routing).
    pub source_route: Option<String>,
    /// Local part.
    pub mailbox: Option<String>,
    /// Domain part.
    pub host: Option<String>,
}

impl Address {
    /// Returns `mailbox@host` when both parts are present.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        match (&self.mailbox, &self.host) {
            (Some(mailbox), Some(host)) => Some(format!("{mailbox}@{host}")),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_requires_both_parts() {
        let full = Address {
            name: Some("Terry Gray".into()),
            source_route: None,
            mailbox: Some("gray".into()),
            host: Some("cac.washington.edu".into()),
        };
        assert_eq!(full.email().as_deref(), Some("gray@cac.washington.edu"));

        let hostless = Address {
            name: None,
            source_route: None,
            mailbox: Some("gray".into()),
            host: None,
        };
        assert_eq!(hostless.email(), None);
    }

    #[test]
    fn status_into_result() {
        let ok = StatusResponse {
            status: Status::Ok,
            code: None,
            text: "done".into(),
            extras: Vec::new(),
        };
        assert!(ok.into_result().is_ok());

        let no = StatusResponse {
            status: Status::No,
            code: None,
            text: "denied".into(),
            extras: Vec::new(),
        };
        match no.into_result() {
            Err(Error::Imap { status, text }) => {
                assert_eq!(status, Status::No);
                assert_eq!(text, "denied");
            }
            other => panic!("expected Imap error, got {other:?}"),
        }
    }

    #[test]
    fn list_entry_starts_unset() {
        let entry = ListEntry::new("INBOX", Some("/".into()));
        assert_eq!(entry.mailbox, "INBOX");
        assert!(entry.inferiors.is_none());
        assert!(entry.selectable.is_none());
        assert!(entry.marked.is_none());
        assert!(entry.children.is_none());
        assert!(entry.extensions.is_empty());
    }
}
