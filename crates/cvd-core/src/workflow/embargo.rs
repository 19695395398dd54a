//! Embargo Management behaviors: proposing, evaluating, revising and
//! terminating embargoes.

use cvd_bt::{
    ALMOST_ALWAYS_SUCCEED, ALMOST_CERTAINLY_FAIL, ALWAYS_SUCCEED, ONE_IN_ONE_HUNDRED,
    ONE_IN_TWO_HUNDRED, PROBABLY_FAIL, USUALLY_FAIL, USUALLY_SUCCEED,
};

use crate::cs::CsFlag;
use crate::em::EmState;
use crate::message::MessageType;
use crate::nodes::case::{cs_has, cs_lacks, cs_not_pxa, cs_pxa};
use crate::nodes::common::{in_any_state, Spec};
use crate::nodes::embargo::{
    em_active_or_revise, em_in, em_none_or_exited, em_not_in, revise_to_active, to_active,
    to_exited, to_none, to_proposed, to_revise,
};
use crate::nodes::messaging::emit;
use crate::nodes::report::rm_start_or_closed;
use crate::nodes::roles::role_is_not_deployer;

fn other_reason_to_exit() -> Spec {
    Spec::fallback(
        "OtherReasonToExitEmbargo",
        vec![
            Spec::sequence(
                "ExitWhenDeployed",
                vec![
                    cs_has(CsFlag::FixDeployed),
                    Spec::fuzzer("ExitEmbargoWhenDeployed", PROBABLY_FAIL),
                ],
            ),
            Spec::sequence(
                "ExitWhenFixReady",
                vec![
                    cs_has(CsFlag::FixReady),
                    role_is_not_deployer(),
                    Spec::fuzzer("ExitEmbargoWhenFixReady", USUALLY_FAIL),
                ],
            ),
            Spec::fuzzer("ExitEmbargoForOtherReason", ONE_IN_TWO_HUNDRED),
        ],
    )
}

/// End a proposed or active embargo when the case has gone public or the
/// participant has its own reasons.
///
/// A pending proposal is withdrawn with `ER`; an embargo in force is exited
/// with `ET`. Succeeds immediately when no embargo exists.
pub fn terminate_embargo() -> Spec {
    Spec::fallback(
        "TerminateEmbargoBt",
        vec![
            em_none_or_exited(),
            Spec::sequence(
                "WithdrawProposal",
                vec![
                    em_in(EmState::Proposed),
                    Spec::fallback(
                        "ReasonToWithdraw",
                        vec![cs_not_pxa(), other_reason_to_exit()],
                    ),
                    to_none(),
                    emit(MessageType::EmbargoRejected),
                ],
            ),
            Spec::sequence(
                "ExitEmbargo",
                vec![
                    em_active_or_revise(),
                    Spec::fallback(
                        "ReasonToExit",
                        vec![
                            cs_not_pxa(),
                            Spec::fuzzer("EmbargoTimerExpired", ONE_IN_ONE_HUNDRED),
                            other_reason_to_exit(),
                        ],
                    ),
                    Spec::fuzzer("OnEmbargoExit", ALWAYS_SUCCEED),
                    to_exited(),
                    emit(MessageType::EmbargoTerminated),
                ],
            ),
        ],
    )
}

/// Offer new embargo terms: a fresh proposal from `N` or `P`, a revision
/// from `A` or `R`.
pub fn propose_embargo() -> Spec {
    Spec::sequence(
        "ProposeEmbargoBt",
        vec![
            em_not_in(EmState::Exited),
            cs_pxa(),
            Spec::fallback(
                "AvoidNewEmbargoWhenDeployed",
                vec![
                    cs_lacks(CsFlag::FixDeployed),
                    Spec::fuzzer("ReasonToProposeEmbargoWhenDeployed", ALMOST_CERTAINLY_FAIL),
                ],
            ),
            Spec::fuzzer("SelectEmbargoOfferTerms", ALWAYS_SUCCEED),
            Spec::fallback(
                "ChooseProposalKind",
                vec![
                    Spec::sequence(
                        "SkipCounterProposal",
                        vec![
                            in_any_state("ProposedOrRevise", &[EmState::Proposed, EmState::Revise]),
                            Spec::invert(
                                "AvoidEmbargoCounterProposal",
                                Spec::fuzzer("WillingToCounterEmbargoProposal", USUALLY_FAIL),
                            ),
                        ],
                    ),
                    Spec::sequence(
                        "ProposeNewEmbargo",
                        vec![
                            in_any_state("NoneOrProposed", &[EmState::NoEmbargo, EmState::Proposed]),
                            to_proposed(),
                            emit(MessageType::EmbargoProposal),
                        ],
                    ),
                    Spec::sequence(
                        "ProposeEmbargoRevision",
                        vec![
                            em_active_or_revise(),
                            to_revise(),
                            emit(MessageType::EmbargoRevisionProposal),
                        ],
                    ),
                ],
            ),
        ],
    )
}

fn evaluate_and_accept() -> Spec {
    Spec::sequence(
        "EvaluateAndAcceptProposedEmbargo",
        vec![
            Spec::fuzzer("EvaluateEmbargoProposal", USUALLY_SUCCEED),
            Spec::fuzzer("OnEmbargoAccept", ALWAYS_SUCCEED),
            to_active(),
            emit(MessageType::EmbargoAccepted),
        ],
    )
}

fn counter_proposal() -> Spec {
    Spec::sequence(
        "CounterProposal",
        vec![
            Spec::fuzzer("WillingToCounterEmbargoProposal", USUALLY_FAIL),
            propose_embargo(),
        ],
    )
}

fn em_none() -> Spec {
    Spec::sequence(
        "EmNone",
        vec![
            em_in(EmState::NoEmbargo),
            Spec::fallback(
                "MaybeProposeEmbargo",
                vec![
                    Spec::fuzzer("StopProposingEmbargo", USUALLY_FAIL),
                    propose_embargo(),
                ],
            ),
        ],
    )
}

fn em_proposed() -> Spec {
    Spec::sequence(
        "EmProposed",
        vec![
            em_in(EmState::Proposed),
            Spec::fallback(
                "ChooseEmProposedResponse",
                vec![
                    terminate_embargo(),
                    evaluate_and_accept(),
                    counter_proposal(),
                    Spec::sequence(
                        "RejectProposedEmbargo",
                        vec![
                            Spec::fuzzer("OnEmbargoReject", ALWAYS_SUCCEED),
                            to_none(),
                            emit(MessageType::EmbargoRejected),
                        ],
                    ),
                ],
            ),
        ],
    )
}

fn em_active() -> Spec {
    Spec::sequence(
        "EmActive",
        vec![
            em_in(EmState::Active),
            Spec::fallback(
                "ChooseEmActiveResponse",
                vec![
                    terminate_embargo(),
                    Spec::fuzzer("CurrentEmbargoAcceptable", ALMOST_ALWAYS_SUCCEED),
                    propose_embargo(),
                ],
            ),
        ],
    )
}

fn em_revise() -> Spec {
    Spec::sequence(
        "EmRevise",
        vec![
            em_in(EmState::Revise),
            Spec::fallback(
                "ChooseEmReviseResponse",
                vec![
                    terminate_embargo(),
                    evaluate_and_accept(),
                    counter_proposal(),
                    Spec::sequence(
                        "RejectRevision",
                        vec![
                            Spec::fuzzer("OnEmbargoReject", ALWAYS_SUCCEED),
                            revise_to_active(),
                            emit(MessageType::EmbargoRevisionRejected),
                        ],
                    ),
                ],
            ),
        ],
    )
}

/// Per-tick embargo workflow, dispatched on the current EM state.
pub fn embargo_management() -> Spec {
    Spec::fallback(
        "EmbargoManagementBt",
        vec![
            rm_start_or_closed(),
            em_in(EmState::Exited),
            Spec::sequence(
                "AvoidNewEmbargoWhenNotInCs_pxa",
                vec![cs_not_pxa(), em_in(EmState::NoEmbargo)],
            ),
            em_none(),
            em_proposed(),
            em_active(),
            em_revise(),
        ],
    )
}
