// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `JobDispatcher` (§4.2): at most one background job per session,
//! deduplicating retries of the identical request and reporting `NotReady`
//! for everything else.

use std::collections::HashMap;

use mm_core::{MmError, MmResult, SessionId};
use parking_lot::Mutex;
use std::future::Future;
use tokio::task::JoinHandle;
use tracing::warn;

/// One session's in-flight or just-finished background job.
///
/// `fingerprint` is the request that started the job — structural equality
/// over the request value stands in for a digest, per §4.2: "in binary-framed
/// RPC, the serialized payload bytes suffice," and `PartialEq` on the typed
/// request gives the same answer with fewer moving parts.
struct JobSlot<Req, Res> {
    fingerprint: Req,
    handle: JoinHandle<Res>,
}

/// A table of `session_id -> JobSlot`, guarded by one lock that is never
/// held across a worker call or a background job's execution — only across
/// the synchronous decision of "start / still running / hand back result."
pub struct JobDispatcher<Req, Res> {
    jobs: Mutex<HashMap<SessionId, JobSlot<Req, Res>>>,
}

impl<Req, Res> Default for JobDispatcher<Req, Res> {
    fn default() -> Self {
        Self { jobs: Mutex::new(HashMap::new()) }
    }
}

enum Action<Res> {
    NotReady,
    Ready(JoinHandle<Res>),
}

impl<Req, Res> JobDispatcher<Req, Res>
where
    Req: PartialEq + Clone + Send + 'static,
    Res: Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Start, poll, or reclaim the background job for `session_id`.
    ///
    /// - No slot, or a finished slot with a stale fingerprint: start `work`
    ///   and fail `NotReady`.
    /// - A slot still running: fail `NotReady` without touching `work`.
    /// - A finished slot whose fingerprint matches `request`: clear the slot
    ///   and return its result exactly once.
    pub async fn try_job<F, Fut>(
        &self,
        session_id: &SessionId,
        request: &Req,
        work: F,
    ) -> MmResult<Res>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Res> + Send + 'static,
    {
        let action = {
            let mut jobs = self.jobs.lock();
            let slot_state =
                jobs.get(session_id).map(|slot| (slot.handle.is_finished(), slot.fingerprint == *request));
            match slot_state {
                None => {
                    let handle = tokio::spawn(work());
                    jobs.insert(
                        session_id.clone(),
                        JobSlot { fingerprint: request.clone(), handle },
                    );
                    Action::NotReady
                }
                Some((false, _)) => Action::NotReady,
                Some((true, true)) => match jobs.remove(session_id) {
                    Some(slot) => Action::Ready(slot.handle),
                    None => Action::NotReady,
                },
                Some((true, false)) => {
                    jobs.remove(session_id);
                    let handle = tokio::spawn(work());
                    jobs.insert(
                        session_id.clone(),
                        JobSlot { fingerprint: request.clone(), handle },
                    );
                    Action::NotReady
                }
            }
        };

        match action {
            Action::NotReady => {
                Err(MmError::NotReady(format!("job for session {session_id} is running")))
            }
            Action::Ready(handle) => handle.await.map_err(|e| {
                warn!(session_id = %session_id, error = %e, "background job panicked");
                MmError::Other(format!("job task for session {session_id} panicked: {e}"))
            }),
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
