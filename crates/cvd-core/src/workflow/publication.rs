//! Publication of the report, fix and exploit.

use cvd_bt::{
    ALMOST_ALWAYS_FAIL, ALMOST_ALWAYS_SUCCEED, ALWAYS_SUCCEED, OFTEN_SUCCEED, USUALLY_FAIL,
    USUALLY_SUCCEED,
};

use crate::message::MessageType;
use crate::nodes::case::{cs_vendor_aware_and_fix_ready, to_public_aware};
use crate::nodes::common::Spec;
use crate::nodes::embargo::em_none_or_exited;
use crate::nodes::messaging::emit;
use crate::workflow::develop_fix::develop_fix;
use crate::workflow::embargo::embargo_management;

/// Obtain an exploit from outside the case (a third party, a public
/// repository).
pub fn acquire_exploit() -> Spec {
    Spec::fuzzer("AcquireExploit", USUALLY_FAIL)
}

fn maybe_prepare_exploit() -> Spec {
    Spec::fallback(
        "MaybePrepareExploitForPublication",
        vec![
            Spec::fuzzer("NoPublishExploit", USUALLY_SUCCEED),
            Spec::fuzzer("ExploitReady", OFTEN_SUCCEED),
            Spec::fallback(
                "ReadyExploitForPublication",
                vec![
                    acquire_exploit(),
                    Spec::fuzzer("PrepareExploit", ALMOST_ALWAYS_SUCCEED),
                ],
            ),
            Spec::fuzzer("ReprioritizeExploit", ALWAYS_SUCCEED),
        ],
    )
}

fn maybe_prepare_fix() -> Spec {
    Spec::fallback(
        "MaybePrepareFixForPublication",
        vec![
            Spec::fuzzer("NoPublishFix", ALMOST_ALWAYS_FAIL),
            cs_vendor_aware_and_fix_ready(),
            Spec::sequence(
                "ReadyFixForPublication",
                vec![
                    develop_fix(),
                    Spec::fuzzer("PrepareFix", ALMOST_ALWAYS_SUCCEED),
                ],
            ),
            Spec::fuzzer("ReprioritizeFix", ALWAYS_SUCCEED),
        ],
    )
}

fn maybe_prepare_report() -> Spec {
    Spec::fallback(
        "MaybePrepareReportForPublication",
        vec![
            Spec::fuzzer("NoPublishReport", ALMOST_ALWAYS_FAIL),
            Spec::fuzzer("PrepareReport", ALMOST_ALWAYS_SUCCEED),
            Spec::fuzzer("ReprioritizeReport", ALWAYS_SUCCEED),
        ],
    )
}

/// Either everything intended for publication is out, or prepare the
/// pieces, let the embargo run its course and then go public.
pub fn publication() -> Spec {
    Spec::fallback(
        "Publication",
        vec![
            Spec::sequence(
                "EnsureAllDesiredItemsArePublished",
                vec![
                    Spec::fallback(
                        "EnsurePublicationPriorityIsSet",
                        vec![
                            Spec::fuzzer("PublicationIntentsSet", USUALLY_FAIL),
                            Spec::fuzzer("PrioritizePublicationIntents", ALWAYS_SUCCEED),
                        ],
                    ),
                    Spec::fuzzer("AllPublished", ALMOST_ALWAYS_FAIL),
                ],
            ),
            Spec::sequence(
                "PublishWhenReady",
                vec![
                    Spec::sequence(
                        "PreparePublication",
                        vec![maybe_prepare_exploit(), maybe_prepare_fix(), maybe_prepare_report()],
                    ),
                    embargo_management(),
                    em_none_or_exited(),
                    Spec::fuzzer("Publish", ALMOST_ALWAYS_SUCCEED),
                    to_public_aware(),
                    emit(MessageType::PublicAware),
                ],
            ),
        ],
    )
}
