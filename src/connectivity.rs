//! Network reachability signal.
//!
//! The monitor turns periodic health probes into online/offline transitions
//! and forwards them to the controller, which keeps the latest
//! [`ConnectivityStatus`] for the check-in and check-out screens. It does not
//! queue or replay anything: `pending_offline_records` stays zero until an
//! offline queue with defined ordering, replay and conflict rules exists.

use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::api::AttendanceService;
use crate::kiosk::KioskHandle;
use crate::state_machine::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityStatus {
    pub online: bool,
    pub pending_offline_records: usize,
}

impl Default for ConnectivityStatus {
    fn default() -> Self {
        Self {
            online: true,
            pending_offline_records: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct ConnectivityMonitor {
    status: ConnectivityStatus,
}

impl ConnectivityMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ConnectivityStatus {
        self.status
    }

    /// Records a probe result. Returns the new status only on a transition.
    pub fn observe(&mut self, online: bool) -> Option<ConnectivityStatus> {
        if self.status.online == online {
            return None;
        }
        self.status.online = online;
        Some(self.status)
    }
}

/// Probes the service every `period` and reports transitions to the kiosk.
/// Ends when the kiosk stops accepting events.
pub async fn probe_loop<S>(service: Rc<S>, period: Duration, handle: KioskHandle)
where
    S: AttendanceService,
{
    let mut monitor = ConnectivityMonitor::new();
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let online = match service.ping().await {
            Ok(()) => true,
            Err(err) => {
                debug!(error = %err, "Connectivity probe failed");
                false
            }
        };
        if let Some(status) = monitor.observe(online) {
            if status.online {
                info!("Connectivity restored");
            } else {
                warn!("Connectivity lost");
            }
            if !handle.send(Event::ConnectivityChanged { online }) {
                break;
            }
        }
    }
}
