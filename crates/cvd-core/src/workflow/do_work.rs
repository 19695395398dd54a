//! Work an accepted report.

use cvd_bt::ALWAYS_SUCCEED;

use crate::nodes::common::Spec;
use crate::workflow::assign_vul_id::assign_vul_id;
use crate::workflow::deployment::deployment;
use crate::workflow::develop_fix::develop_fix;
use crate::workflow::monitor_threats::monitor_threats;
use crate::workflow::publication::{acquire_exploit, publication};
use crate::workflow::report_to_others::maybe_report_to_others;

/// Every work item gets a chance each tick, in shuffled order. One success
/// is enough for the tick's work to count as done.
pub fn do_work() -> Spec {
    Spec::parallel(
        "DoWork",
        1,
        vec![
            develop_fix(),
            deployment(),
            monitor_threats(),
            publication(),
            maybe_report_to_others(),
            assign_vul_id(),
            acquire_exploit(),
            Spec::fuzzer("OtherWork", ALWAYS_SUCCEED),
        ],
    )
}
