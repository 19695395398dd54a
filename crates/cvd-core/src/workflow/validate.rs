//! Report validation.

use cvd_bt::{ALMOST_ALWAYS_SUCCEED, PROBABLY_SUCCEED, USUALLY_SUCCEED};

use crate::message::MessageType;
use crate::nodes::common::{in_any_state, Spec};
use crate::nodes::messaging::emit;
use crate::nodes::report::{rm_in, to_invalid, to_valid};
use crate::rm::RmState;

/// Enough information to revisit an invalid report, or gather more and find
/// nothing new.
fn ensure_adequate_validation_info() -> Spec {
    Spec::fallback(
        "EnsureAdequateValidationInfo",
        vec![
            Spec::fuzzer("EnoughValidationInfo", USUALLY_SUCCEED),
            Spec::sequence(
                "GetMoreValidationInfo",
                vec![
                    Spec::fuzzer("GatherValidationInfo", ALMOST_ALWAYS_SUCCEED),
                    Spec::fuzzer("NoNewValidationInfo", PROBABLY_SUCCEED),
                ],
            ),
        ],
    )
}

fn validation_sequence() -> Spec {
    Spec::sequence(
        "ValidationSequence",
        vec![
            in_any_state("ReceivedOrInvalid", &[RmState::Received, RmState::Invalid]),
            Spec::fuzzer("EvaluateReportCredibility", ALMOST_ALWAYS_SUCCEED),
            Spec::fuzzer("EvaluateReportValidity", ALMOST_ALWAYS_SUCCEED),
            Spec::sequence(
                "ValidateReport",
                vec![to_valid(), emit(MessageType::ReportValid)],
            ),
        ],
    )
}

/// Validate a received report, or re-validate an invalid one when new
/// information arrives. Reports that fail evaluation become invalid.
pub fn validate_report() -> Spec {
    Spec::fallback(
        "RMValidateBt",
        vec![
            rm_in(RmState::Valid),
            Spec::sequence(
                "HandleRmI",
                vec![rm_in(RmState::Invalid), ensure_adequate_validation_info()],
            ),
            validation_sequence(),
            Spec::sequence(
                "InvalidateReport",
                vec![to_invalid(), emit(MessageType::ReportInvalid)],
            ),
        ],
    )
}
