//! The pending-command registry.
//!
//! Maps each in-flight tag to the one-shot channel that will receive its
//! completion. The next-tag counter lives under the same mutex so tags are
//! observed registered in allocation order. The mutex guards map and
//! counter operations only and is never held across I/O.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::parser::StatusResponse;
use crate::types::{Tag, TagSequence};
use crate::{Error, Result};

/// One-shot reply channel for a command completion.
///
/// The caller owns the receiving end; the registry owns the registration.
pub type ReplySink = oneshot::Sender<Result<StatusResponse>>;

/// Tag allocation plus the table of commands awaiting completion.
#[derive(Debug)]
pub(crate) struct Registry {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    tags: TagSequence,
    pending: HashMap<Tag, ReplySink>,
    closed: Option<String>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                tags: TagSequence::new(),
                pending: HashMap::new(),
                closed: None,
            }),
        }
    }

    /// Allocates the next tag, registering `sink` for its completion.
    ///
    /// Fails once the session is closed; entries are created before any
    /// bytes are written so the reader can never see a tag it does not
    /// know about for a command this session sent.
    pub(crate) fn register(&self, sink: Option<ReplySink>) -> Result<Tag> {
        let mut inner = self.lock();
        if let Some(reason) = &inner.closed {
            return Err(Error::Closed(reason.clone()));
        }
        let tag = inner.tags.next_tag();
        if let Some(sink) = sink {
            inner.pending.insert(tag, sink);
        }
        Ok(tag)
    }

    /// Removes and returns the sink registered for `tag`.
    pub(crate) fn remove(&self, tag: Tag) -> Option<ReplySink> {
        self.lock().pending.remove(&tag)
    }

    /// True if any command is awaiting its completion.
    pub(crate) fn has_pending(&self) -> bool {
        !self.lock().pending.is_empty()
    }

    /// Number of commands awaiting completion.
    pub(crate) fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// Fails every pending entry with `reason` and refuses further
    /// registrations. The first close wins; later calls only drain
    /// whatever raced in.
    pub(crate) fn close(&self, reason: &str) {
        let drained: Vec<ReplySink> = {
            let mut inner = self.lock();
            if inner.closed.is_none() {
                inner.closed = Some(reason.to_string());
            }
            inner.pending.drain().map(|(_, sink)| sink).collect()
        };
        for sink in drained {
            let _ = sink.send(Err(Error::Closed(reason.to_string())));
        }
    }

    /// True once the session is torn down.
    pub(crate) fn is_closed(&self) -> bool {
        self.lock().closed.is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("registry mutex poisoned")
    }
}
