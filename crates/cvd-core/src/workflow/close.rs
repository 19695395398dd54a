//! Report closure.

use cvd_bt::{ALWAYS_SUCCEED, USUALLY_FAIL};

use crate::cs::CsFlag;
use crate::message::MessageType;
use crate::nodes::case::cs_has;
use crate::nodes::common::Spec;
use crate::nodes::messaging::emit;
use crate::nodes::report::{rm_in, to_closed};
use crate::rm::RmState;

/// Close once a fix is deployed, or the report was deferred or found
/// invalid, and nothing else keeps it open.
pub fn close_report() -> Spec {
    Spec::fallback(
        "RMCloseBt",
        vec![
            rm_in(RmState::Closed),
            Spec::sequence(
                "ReportClosureSequence",
                vec![
                    Spec::sequence(
                        "CloseCriteriaMet",
                        vec![
                            Spec::fallback(
                                "DeployedDeferredOrInvalid",
                                vec![
                                    cs_has(CsFlag::FixDeployed),
                                    rm_in(RmState::Deferred),
                                    rm_in(RmState::Invalid),
                                ],
                            ),
                            Spec::fuzzer("OtherCloseCriteriaMet", USUALLY_FAIL),
                        ],
                    ),
                    Spec::fuzzer("PreCloseAction", ALWAYS_SUCCEED),
                    Spec::sequence(
                        "CloseAndNotify",
                        vec![to_closed(), emit(MessageType::ReportClosed)],
                    ),
                ],
            ),
        ],
    )
}
