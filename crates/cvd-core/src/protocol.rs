//! The per-tick root tree every actor runs.

use crate::nodes::common::Spec;
use crate::nodes::discovery::discover_vulnerability;
use crate::nodes::inbound::receive_messages;
use crate::nodes::report::rm_not_in;
use crate::rm::RmState;
use crate::workflow::{embargo_management, report_management};

/// Append this actor's boundary state and last tick's traffic to the state
/// log, then start a fresh traffic record.
pub fn snapshot() -> Spec {
    Spec::action("Snapshot", |bb| {
        let row = bb.snapshot();
        bb.state_log.push(row);
        bb.msgs_received_this_tick.clear();
        bb.msgs_emitted_this_tick.clear();
        Some(true)
    })
}

/// `Snapshot -> Discover -> ReceiveMessages -> ReportManagement ->
/// EmbargoManagement`, guarded by the report still being open.
pub fn protocol_root() -> Spec {
    Spec::sequence(
        "CvdProtocolBt",
        vec![
            snapshot(),
            rm_not_in(RmState::Closed),
            discover_vulnerability(),
            receive_messages(),
            report_management(),
            embargo_management(),
        ],
    )
}
