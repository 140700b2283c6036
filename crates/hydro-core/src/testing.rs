// In-memory hub for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::DateTime;
use hydro_api::AssignReply;

use crate::assign::AssignmentRequest;
use crate::backend::HubBackend;
use crate::error::{AssignError, FetchError, RenameError};
use crate::model::{DeviceSnapshot, DeviceType, Node, NodeId};
use crate::rename::RenameRequest;

/// Reservoirs for ids starting with `R` or `N`, wells for `W`, unknown otherwise.
pub(crate) fn snapshot_of(ids: &[&str]) -> DeviceSnapshot {
    let nodes = ids
        .iter()
        .map(|id| Node {
            id: NodeId::from(*id),
            name: String::new(),
            device_type: match id.chars().next() {
                Some('R' | 'N') => DeviceType::AquaReservPro,
                Some('W') => DeviceType::WellguardPro,
                _ => DeviceType::Other("Unknown".into()),
            },
            status: "OK".into(),
            rssi: -55,
            last_seen: DateTime::from_timestamp(1_700_000_000, 0),
            assigned_to: None,
        })
        .collect();
    DeviceSnapshot::new(nodes)
}

pub(crate) struct FakeHub {
    fetches: Mutex<VecDeque<Result<DeviceSnapshot, FetchError>>>,
    fetch_delay: Duration,
    fetch_calls: AtomicUsize,
    assign_result: Result<AssignReply, AssignError>,
    assigned: Mutex<Vec<AssignmentRequest>>,
    rename_result: Result<(), RenameError>,
    renamed: Mutex<Vec<RenameRequest>>,
}

impl FakeHub {
    pub(crate) fn new() -> Self {
        Self {
            fetches: Mutex::new(VecDeque::new()),
            fetch_delay: Duration::ZERO,
            fetch_calls: AtomicUsize::new(0),
            assign_result: Ok(AssignReply {
                status: 200,
                text: "OK".into(),
            }),
            assigned: Mutex::new(Vec::new()),
            rename_result: Ok(()),
            renamed: Mutex::new(Vec::new()),
        }
    }

    /// Results handed out in order; once exhausted every fetch fails.
    pub(crate) fn with_fetches(self, fetches: Vec<Result<DeviceSnapshot, FetchError>>) -> Self {
        *self.fetches.lock().unwrap() = fetches.into();
        self
    }

    pub(crate) fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    pub(crate) fn with_assign_result(mut self, result: Result<AssignReply, AssignError>) -> Self {
        self.assign_result = result;
        self
    }

    pub(crate) fn with_rename_result(mut self, result: Result<(), RenameError>) -> Self {
        self.rename_result = result;
        self
    }

    pub(crate) fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn assign_calls(&self) -> Vec<AssignmentRequest> {
        self.assigned.lock().unwrap().clone()
    }

    pub(crate) fn rename_calls(&self) -> Vec<RenameRequest> {
        self.renamed.lock().unwrap().clone()
    }
}

impl HubBackend for FakeHub {
    async fn fetch_snapshot(&self) -> Result<DeviceSnapshot, FetchError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.fetches.lock().unwrap().pop_front();
        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }
        next.unwrap_or_else(|| {
            Err(FetchError::Unreachable {
                reason: "no scripted response".into(),
            })
        })
    }

    async fn assign(&self, request: &AssignmentRequest) -> Result<AssignReply, AssignError> {
        self.assigned.lock().unwrap().push(request.clone());
        self.assign_result.clone()
    }

    async fn set_name(&self, request: &RenameRequest) -> Result<(), RenameError> {
        self.renamed.lock().unwrap().push(request.clone());
        self.rename_result.clone()
    }
}
