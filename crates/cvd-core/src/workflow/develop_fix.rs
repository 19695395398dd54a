//! Fix development (vendors only).

use cvd_bt::ALMOST_ALWAYS_SUCCEED;

use crate::message::MessageType;
use crate::nodes::case::{cs_vendor_aware_and_fix_ready, to_fix_ready};
use crate::nodes::common::Spec;
use crate::nodes::messaging::emit;
use crate::nodes::report::rm_in;
use crate::rm::RmState;

/// Short-circuits for actors that cannot build a fix and for cases that
/// already have one; otherwise builds it once the report is accepted.
pub fn develop_fix() -> Spec {
    Spec::fallback(
        "DevelopFix",
        vec![
            Spec::check("CannotDevelopFix", |bb| {
                !bb.role.is_vendor() || !bb.capabilities.develop_fix
            }),
            cs_vendor_aware_and_fix_ready(),
            Spec::sequence(
                "CreateFixForAcceptedReports",
                vec![
                    rm_in(RmState::Accepted),
                    Spec::fuzzer("CreateFix", ALMOST_ALWAYS_SUCCEED),
                    to_fix_ready(),
                    emit(MessageType::FixReady),
                ],
            ),
        ],
    )
}
