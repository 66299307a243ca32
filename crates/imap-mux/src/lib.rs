//! # imap-mux
//!
//! A client-side IMAP4rev1 (RFC 3501) wire-protocol engine. The crate drives
//! a TLS-connected session with an IMAP server, multiplexing concurrent
//! tagged commands over the single byte stream: any number of tasks submit
//! commands while one background reader parses every server response,
//! groups untagged data with the tagged completion that terminates it, and
//! routes each group back to the task that issued the command.
//!
//! ## Features
//!
//! - **Full response parsing**: atoms, quoted strings, `{n}` literals
//!   (8-bit clean), parenthesized lists, and the nested S-expression
//!   structure FETCH uses, decoded into structured values
//! - **Response demultiplexing**: untagged responses that belong to a
//!   pending command are delivered with its completion; everything else
//!   flows to a separate unsolicited channel
//! - **Concurrent command submission**: monotonic tag allocation and a
//!   pending-command registry pair each command with its reply
//! - **TLS via rustls**: secure connections without an OpenSSL dependency
//!
//! ## Quick start
//!
//! ```ignore
//! use imap_mux::{Config, TlsSession};
//!
//! #[tokio::main]
//! async fn main() -> imap_mux::Result<()> {
//!     let config = Config::new("imap.example.com", 993);
//!     let session = TlsSession::connect(&config).await?;
//!     println!("server says: {}", session.greeting());
//!
//!     session.login("user@example.com", "password").await?;
//!
//!     let (_, folders) = session.list("", "*").await?;
//!     for folder in &folders {
//!         println!("folder: {}", folder.mailbox);
//!     }
//!
//!     let inbox = session.examine("INBOX").await?;
//!     println!("{} messages, {} recent", inbox.exists, inbox.recent);
//!
//!     let (_, messages) = session.fetch("1:10", &["ENVELOPE"]).await?;
//!     for message in &messages {
//!         if let Some(envelope) = &message.envelope {
//!             println!("{}: {:?}", message.seq, envelope.subject);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`connection`]: TLS establishment and response framing
//! - [`parser`]: lexer, S-expressions, and response decoding
//! - [`session`]: the session façade, correlator, and reader loop
//! - [`types`]: core protocol types (status, tags, response codes)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod connection;
mod error;
pub mod parser;
pub mod session;
pub mod types;

pub use error::{Error, Result};
pub use parser::{
    Address, Envelope, FetchRecord, ListEntry, ResponseParser, ServerResponse, Sexp,
    StatusResponse, UntaggedResponse,
};
pub use session::{
    quote, Config, ExamineResponse, ReplySink, Session, TlsSession, Unsolicited,
};
pub use types::{ResponseCode, Status, Tag, TagSequence};
