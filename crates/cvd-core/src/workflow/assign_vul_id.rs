//! Vulnerability identifier assignment.

use cvd_bt::{ALWAYS_SUCCEED, OFTEN_SUCCEED, PROBABLY_SUCCEED, USUALLY_SUCCEED};
use tracing::debug;

use crate::nodes::common::Spec;

fn assign_id() -> Spec {
    Spec::sequence(
        "AssignIdIfPossible",
        vec![
            Spec::fuzzer("IsIDAssignmentAuthority", OFTEN_SUCCEED),
            Spec::fuzzer("IdAssignable", PROBABLY_SUCCEED),
            Spec::fuzzer("AssignId", ALWAYS_SUCCEED),
            Spec::action("RecordVulId", |bb| {
                let id = format!("VU#{}", uuid::Uuid::new_v4().simple());
                debug!(actor = %bb.name, %id, "Assigned vulnerability id");
                bb.vul_id = Some(id);
                Some(true)
            }),
        ],
    )
}

/// Assign an identifier when we are an authority for it, otherwise request
/// one. Nothing to do once an identifier exists.
pub fn assign_vul_id() -> Spec {
    Spec::fallback(
        "AssignVulID",
        vec![
            Spec::check("IdAssigned", |bb| bb.vul_id.is_some()),
            Spec::sequence(
                "AssignIdIfInScope",
                vec![
                    Spec::fuzzer("InScope", USUALLY_SUCCEED),
                    Spec::fallback(
                        "AssignOrRequestId",
                        vec![assign_id(), Spec::fuzzer("RequestId", USUALLY_SUCCEED)],
                    ),
                ],
            ),
        ],
    )
}
