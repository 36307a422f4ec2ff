// src/host.rs

//! The host script-runtime collaborator seam.
//!
//! The embedding runtime owns the script-visible value that wraps a
//! [`Session`]; to this layer it is only a registration slot plus an error
//! channel. All fatal errors cross this boundary as short human-readable
//! messages; no error codes are handed back toward the engine side.

use crate::error::Result;
use crate::runtime::SessionRuntime;
use crate::session::Session;

/// Type identifier under which sessions are registered with the host.
pub const SESSION_TYPE_TAG: &str = "md.session";

/// What this layer needs from the embedding script runtime.
pub trait HostRuntime {
    /// Registers `session` as the current opaque value for `tag`,
    /// superseding (and thereby tearing down) any previous one.
    fn register(&mut self, tag: &str, session: Session);

    /// The currently registered session, if one exists under `tag`.
    ///
    /// A mismatched or absent value is signaled as `None`; callers must
    /// tolerate it.
    fn get_mut(&mut self, tag: &str) -> Option<&mut Session>;

    /// Removes and returns the registered session.
    fn take(&mut self, tag: &str) -> Option<Session>;

    /// Reports a named error message back to the script caller.
    fn report_error(&mut self, message: &str);
}

/// Minimal single-slot host, used by the test suite and embedders that
/// manage one session at a time.
#[derive(Default)]
pub struct InProcessHost {
    slot: Option<(String, Session)>,
    error: Option<String>,
}

impl InProcessHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last reported error, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

impl HostRuntime for InProcessHost {
    fn register(&mut self, tag: &str, session: Session) {
        self.slot = Some((tag.to_string(), session));
    }

    fn get_mut(&mut self, tag: &str) -> Option<&mut Session> {
        match &mut self.slot {
            Some((t, session)) if t == tag => Some(session),
            _ => None,
        }
    }

    fn take(&mut self, tag: &str) -> Option<Session> {
        if self.slot.as_ref().is_some_and(|(t, _)| t == tag) {
            self.slot.take().map(|(_, s)| s)
        } else {
            None
        }
    }

    fn report_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }
}

/// Parses a snapshot and registers the resulting session with the host.
///
/// On failure no session is registered and the error goes through the host
/// error channel.
pub fn parse_into_host(host: &mut dyn HostRuntime, runtime: &SessionRuntime, bytes: &[u8]) {
    match runtime.parse(bytes) {
        Ok(session) => host.register(SESSION_TYPE_TAG, session),
        Err(e) => host.report_error(&format!("unable to read md session snapshot: {e}")),
    }
}

/// Clones the host's current session and registers the copy.
///
/// The source is left in place; a failure leaves the source's error state
/// set and registers nothing.
pub fn copy_in_host(host: &mut dyn HostRuntime, runtime: &SessionRuntime) {
    let outcome = match host.get_mut(SESSION_TYPE_TAG) {
        Some(source) => Some(runtime.duplicate(source)),
        None => None,
    };
    match outcome {
        None => host.report_error("can't copy - no md session present"),
        Some(Err(e)) => host.report_error(&format!("can't copy - {e}")),
        Some(Ok(copy)) => host.register(SESSION_TYPE_TAG, copy),
    }
}

/// One-line description of the host's current session.
pub fn describe_in_host(host: &mut dyn HostRuntime) -> Option<String> {
    host.get_mut(SESSION_TYPE_TAG).map(|s| s.describe())
}

/// Measures and writes the host's current session into `sink`.
///
/// # Errors
///
/// Propagates snapshot errors; additionally reports through the host error
/// channel when no session is registered.
pub fn snapshot_from_host(
    host: &mut dyn HostRuntime,
    runtime: &SessionRuntime,
) -> Result<Option<Vec<u8>>> {
    let outcome = match host.get_mut(SESSION_TYPE_TAG) {
        Some(session) => Some(runtime.snapshot_to_vec(session)),
        None => None,
    };
    match outcome {
        None => {
            host.report_error("no md session present");
            Ok(None)
        }
        Some(Err(e)) => {
            host.report_error(&format!("unable to capture md session: {e}"));
            Err(e)
        }
        Some(Ok(bytes)) => Ok(Some(bytes)),
    }
}
