//! The session façade.
//!
//! A [`Session`] owns one connection: the write half sits behind an async
//! mutex so concurrent callers serialize their frames, and a single
//! background task owns the read half, parsing responses and routing each
//! tagged completion, together with the untagged responses grouped in
//! front of it, back to the caller that issued the command. Untagged
//! traffic that no command claimed flows out of a separate channel.

mod config;
mod reader;
mod registry;

pub use config::Config;
pub use reader::Unsolicited;
pub use registry::ReplySink;

use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_rustls::client::TlsStream;

use crate::connection::{connect_tls, FramedReader};
use crate::parser::{
    FetchRecord, ListEntry, ResponseParser, ServerResponse, StatusResponse, UntaggedResponse,
};
use crate::types::{Status, Tag};
use crate::{Error, Result};

use registry::Registry;

/// A [`Session`] over the default TLS transport.
pub type TlsSession = Session<TlsStream<TcpStream>>;

/// One multiplexed IMAP connection.
///
/// Cheap to share behind an `Arc`: every command method takes `&self`, and
/// any number of tasks may have commands in flight at once.
pub struct Session<S> {
    writer: Mutex<WriteHalf<S>>,
    registry: Arc<Registry>,
    greeting: String,
    unsolicited: Option<mpsc::UnboundedReceiver<Unsolicited>>,
    reader_task: JoinHandle<()>,
}

impl TlsSession {
    /// Connects to the configured server over TLS and reads the greeting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] when the connection times out or the
    /// greeting is not an untagged OK, and transport/TLS errors otherwise.
    pub async fn connect(config: &Config) -> Result<Self> {
        let stream = tokio::time::timeout(
            config.connect_timeout,
            connect_tls(&config.host, config.port),
        )
        .await
        .map_err(|_| {
            Error::Connect(format!(
                "timed out connecting to {}:{}",
                config.host, config.port
            ))
        })??;
        Self::from_stream(stream).await
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Builds a session over an established transport.
    ///
    /// Reads exactly one response unit (the server greeting, which must be
    /// an untagged OK) and then starts the background reader.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] when the greeting is anything else.
    pub async fn from_stream(stream: S) -> Result<Self> {
        let (read_half, write_half) = tokio::io::split(stream);
        let mut framed = FramedReader::new(read_half);

        let unit = framed.read_unit().await?;
        let greeting = match ResponseParser::parse(&unit)? {
            ServerResponse::Untagged(UntaggedResponse::Status(status))
                if status.status == Status::Ok =>
            {
                status.text
            }
            other => {
                return Err(Error::Connect(format!("unexpected greeting {other:?}")));
            }
        };
        tracing::debug!(greeting = %greeting, "connected");

        let registry = Arc::new(Registry::new());
        let (unsolicited_tx, unsolicited_rx) = mpsc::unbounded_channel();

        let reader_task = tokio::spawn({
            let registry = Arc::clone(&registry);
            async move {
                let err = match reader::run(framed, &registry, &unsolicited_tx).await {
                    Ok(()) => Error::Closed("reader stopped".to_string()),
                    Err(err) => err,
                };
                tracing::warn!(error = %err, "reader loop terminated");
                let reason = match &err {
                    Error::Closed(reason) => reason.clone(),
                    other => other.to_string(),
                };
                registry.close(&reason);
            }
        });

        Ok(Self {
            writer: Mutex::new(write_half),
            registry,
            greeting,
            unsolicited: Some(unsolicited_rx),
            reader_task,
        })
    }

    /// The text of the server greeting.
    #[must_use]
    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    /// True once the session is torn down; sends fail immediately after.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.registry.is_closed()
    }

    /// Number of commands currently awaiting their completion.
    #[must_use]
    pub fn pending_commands(&self) -> usize {
        self.registry.pending_count()
    }

    /// Takes the receiving end of the unsolicited stream: untagged
    /// responses that arrived while no command was pending, and every
    /// continuation prompt. Can be taken once; events arriving after the
    /// receiver is dropped are discarded with a warning.
    pub fn unsolicited_channel(&mut self) -> Option<mpsc::UnboundedReceiver<Unsolicited>> {
        self.unsolicited.take()
    }

    /// Frames `command` as `a<tag> <command>\r\n` and writes it, optionally
    /// registering `reply` for the tagged completion.
    ///
    /// The registration happens before any bytes reach the wire. A command
    /// sent without a reply sink cannot have its completion claimed (the
    /// reader treats the orphaned tag as a protocol error and tears the
    /// session down), so fire-and-forget is only for commands whose
    /// completion the session will never observe (a final LOGOUT, say).
    ///
    /// A literal-bearing command is driven manually: send the prefix ending
    /// in `{n}` here (the CRLF this method appends completes the literal
    /// announcement), wait for [`Unsolicited::Continuation`], then push the
    /// payload and the rest of the command with [`send_raw`](Self::send_raw).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `command` contains CR or LF,
    /// [`Error::Closed`] once the session is torn down, and transport
    /// errors from the write.
    pub async fn send(&self, command: &str, reply: Option<ReplySink>) -> Result<Tag> {
        if command.bytes().any(|b| matches!(b, b'\r' | b'\n')) {
            return Err(Error::Config(
                "command must not contain CR or LF".to_string(),
            ));
        }
        let tag = self.registry.register(reply)?;

        let mut frame = BytesMut::with_capacity(command.len() + 16);
        frame.extend_from_slice(tag.to_string().as_bytes());
        frame.extend_from_slice(b" ");
        frame.extend_from_slice(command.as_bytes());
        frame.extend_from_slice(b"\r\n");

        let written = {
            let mut writer = self.writer.lock().await;
            match writer.write_all(&frame).await {
                Ok(()) => writer.flush().await,
                Err(err) => Err(err),
            }
        };
        if let Err(err) = written {
            // The frame never reached the wire whole; the entry must not
            // outlive the failed write.
            self.registry.remove(tag);
            return Err(err.into());
        }
        Ok(tag)
    }

    /// Writes raw bytes on the transport, serialized with other writers.
    ///
    /// This is the escape hatch for literal payloads; it performs no
    /// framing and no validation.
    ///
    /// # Errors
    ///
    /// Returns transport errors from the write.
    pub async fn send_raw(&self, data: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(data).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Sends `command` and waits for its tagged completion.
    ///
    /// The returned response may carry `NO` or `BAD` status; use
    /// [`StatusResponse::into_result`] to turn those into errors. Dropping
    /// the returned future before it resolves abandons the command: the
    /// registration is removed, and the server's eventual reply for that
    /// tag tears the session down, since the stream cannot be
    /// resynchronized past it.
    ///
    /// # Errors
    ///
    /// Everything [`send`](Self::send) returns, plus [`Error::Closed`] when
    /// the session fails while the command is in flight.
    pub async fn send_sync(&self, command: &str) -> Result<StatusResponse> {
        let (sink, reply) = oneshot::channel();
        let tag = self.send(command, Some(sink)).await?;

        let mut guard = Unregister {
            registry: &self.registry,
            tag: Some(tag),
        };
        let response = reply
            .await
            .map_err(|_| Error::Closed("session closed".to_string()))?;
        guard.disarm();
        response
    }

    /// Authenticates with a plaintext LOGIN.
    ///
    /// # Errors
    ///
    /// Everything [`send_sync`](Self::send_sync) returns. The response is
    /// handed back unchanged; a failed login is a `NO` completion, not an
    /// `Err`.
    pub async fn login(&self, user: &str, pass: &str) -> Result<StatusResponse> {
        self.send_sync(&format!("LOGIN {user} {pass}")).await
    }

    /// Lists mailboxes matching `name` under `reference`.
    ///
    /// The LIST entries are drained out of the response's extras and
    /// returned separately; anything else the server grouped in stays.
    ///
    /// # Errors
    ///
    /// Everything [`send_sync`](Self::send_sync) returns, plus
    /// [`Error::Config`] when an argument contains CR or LF.
    pub async fn list(
        &self,
        reference: &str,
        name: &str,
    ) -> Result<(StatusResponse, Vec<ListEntry>)> {
        let command = format!("LIST {} {}", quote(reference)?, quote(name)?);
        let mut response = self.send_sync(&command).await?;

        let mut entries = Vec::new();
        let mut leftover = Vec::new();
        for extra in std::mem::take(&mut response.extras) {
            match extra {
                UntaggedResponse::List(entry) => entries.push(entry),
                other => leftover.push(other),
            }
        }
        response.extras = leftover;
        Ok((response, entries))
    }

    /// Examines `mailbox` read-only, collecting the counters the server is
    /// required to send into an [`ExamineResponse`].
    ///
    /// # Errors
    ///
    /// Everything [`send_sync`](Self::send_sync) returns, plus
    /// [`Error::Config`] when the mailbox name contains CR or LF.
    pub async fn examine(&self, mailbox: &str) -> Result<ExamineResponse> {
        let command = format!("EXAMINE {}", quote(mailbox)?);
        let mut response = self.send_sync(&command).await?;

        let mut flags = Vec::new();
        let mut exists = 0;
        let mut recent = 0;
        let mut uid_validity = None;
        let mut uid_next = None;
        let mut permanent_flags = None;
        let mut leftover = Vec::new();
        for extra in std::mem::take(&mut response.extras) {
            match extra {
                UntaggedResponse::Flags(f) => flags = f,
                UntaggedResponse::Exists(n) => exists = n,
                UntaggedResponse::Recent(n) => recent = n,
                UntaggedResponse::UidValidity(v) => uid_validity = Some(v),
                UntaggedResponse::UidNext(v) => uid_next = Some(v),
                UntaggedResponse::PermanentFlags(f) => permanent_flags = Some(f),
                other => leftover.push(other),
            }
        }
        response.extras = leftover;

        Ok(ExamineResponse {
            response,
            flags,
            exists,
            recent,
            uid_validity,
            uid_next,
            permanent_flags,
        })
    }

    /// Fetches `fields` for the messages in `sequence` (e.g. `"1:10"`).
    ///
    /// Multiple fields are framed as a parenthesized list. The FETCH
    /// records are drained out of the extras and returned separately.
    ///
    /// # Errors
    ///
    /// Everything [`send_sync`](Self::send_sync) returns, plus
    /// [`Error::Config`] when no fields are given.
    pub async fn fetch(
        &self,
        sequence: &str,
        fields: &[&str],
    ) -> Result<(StatusResponse, Vec<FetchRecord>)> {
        let fields_text = match fields {
            [] => {
                return Err(Error::Config(
                    "fetch requires at least one field".to_string(),
                ));
            }
            [single] => (*single).to_string(),
            many => format!("({})", many.join(" ")),
        };
        let mut response = self
            .send_sync(&format!("FETCH {sequence} {fields_text}"))
            .await?;

        let mut records = Vec::new();
        let mut leftover = Vec::new();
        for extra in std::mem::take(&mut response.extras) {
            match extra {
                UntaggedResponse::Fetch(record) => records.push(record),
                other => leftover.push(other),
            }
        }
        response.extras = leftover;
        Ok((response, records))
    }
}

impl<S> Drop for Session<S> {
    fn drop(&mut self) {
        self.reader_task.abort();
        self.registry.close("session dropped");
    }
}

impl<S> std::fmt::Debug for Session<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("greeting", &self.greeting)
            .field("closed", &self.is_closed())
            .field("pending_commands", &self.pending_commands())
            .finish_non_exhaustive()
    }
}

/// EXAMINE outcome with the required counters pulled out of the extras.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamineResponse {
    /// The tagged completion, with the drained extras removed.
    pub response: StatusResponse,
    /// The mailbox's defined flags.
    pub flags: Vec<String>,
    /// Message count.
    pub exists: u32,
    /// Recent-message count.
    pub recent: u32,
    /// UIDVALIDITY, when the server sent it.
    pub uid_validity: Option<u32>,
    /// Predicted next UID, when the server sent it.
    pub uid_next: Option<u32>,
    /// Permanently settable flags, when the server sent them.
    pub permanent_flags: Option<Vec<String>>,
}

/// Quotes `input` as an IMAP quoted string, escaping `"` and `\`.
///
/// # Errors
///
/// Returns [`Error::Config`] when the input contains CR or LF, which can
/// never appear inside a quoted string; nothing is written to the wire.
pub fn quote(input: &str) -> Result<String> {
    if input.bytes().any(|b| matches!(b, b'\r' | b'\n')) {
        return Err(Error::Config(
            "quoted string must not contain CR or LF".to_string(),
        ));
    }
    let mut out = String::with_capacity(input.len() + 2);
    out.push('"');
    for c in input.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    Ok(out)
}

/// Removes a pending registration when a `send_sync` future is dropped
/// before its completion arrives.
struct Unregister<'a> {
    registry: &'a Registry,
    tag: Option<Tag>,
}

impl Unregister<'_> {
    fn disarm(&mut self) {
        self.tag = None;
    }
}

impl Drop for Unregister<'_> {
    fn drop(&mut self) {
        if let Some(tag) = self.tag.take() {
            if self.registry.remove(tag).is_some() {
                tracing::warn!(%tag, "command abandoned in flight; the session cannot be resynchronized");
            }
        }
    }
}
