//! The demultiplexing read loop.
//!
//! Exactly one task runs this loop per session; it is the sole owner of the
//! transport's read half. Untagged responses seen while a command is in
//! flight accumulate in a batch that is handed over, in arrival order,
//! with the tagged completion that ends it. The server guarantees a tagged
//! completion follows all the untagged responses it generated, and IMAP
//! never interleaves across tags, so batching requires no reordering.

use tokio::io::AsyncRead;
use tokio::sync::mpsc;

use crate::connection::FramedReader;
use crate::parser::{ResponseParser, ServerResponse, UntaggedResponse};
use crate::{Error, Result};

use super::registry::Registry;

/// Server traffic that no pending command claimed.
#[derive(Debug, Clone, PartialEq)]
pub enum Unsolicited {
    /// An untagged response that arrived while nothing was pending.
    Response(UntaggedResponse),
    /// A continuation prompt. A caller mid-way through a literal-bearing
    /// command reacts to it; everyone else can ignore it.
    Continuation(String),
}

/// Pumps the read half until the transport fails, the server violates the
/// protocol, or a caller abandons a delivery. Always returns an error; the
/// caller turns it into session teardown.
pub(crate) async fn run<R>(
    mut framed: FramedReader<R>,
    registry: &Registry,
    unsolicited: &mpsc::UnboundedSender<Unsolicited>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut batch: Option<Vec<UntaggedResponse>> = None;

    loop {
        let unit = framed.read_unit().await?;
        let response = ResponseParser::parse(&unit)?;
        tracing::trace!(?response, "response unit");

        match response {
            ServerResponse::Untagged(resp) => {
                // A batch opens at the first untagged response seen while
                // any command is pending, and stays open until the tagged
                // completion claims it whole.
                if batch.is_none() && registry.has_pending() {
                    batch = Some(Vec::new());
                }
                match batch.as_mut() {
                    Some(extras) => extras.push(resp),
                    None => emit(unsolicited, Unsolicited::Response(resp)),
                }
            }
            ServerResponse::Continuation { text } => {
                emit(unsolicited, Unsolicited::Continuation(text));
            }
            ServerResponse::Tagged { tag, mut status } => {
                let Some(sink) = registry.remove(tag) else {
                    return Err(Error::Protocol(format!("unknown tag {tag}")));
                };
                status.extras = batch.take().unwrap_or_default();
                if sink.send(Ok(status)).is_err() {
                    return Err(Error::Cancelled);
                }
            }
        }
    }
}

fn emit(unsolicited: &mpsc::UnboundedSender<Unsolicited>, event: Unsolicited) {
    if unsolicited.send(event).is_err() {
        tracing::warn!("unsolicited event dropped: receiver gone");
    }
}
