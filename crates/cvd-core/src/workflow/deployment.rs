//! Fix and mitigation deployment.
//!
//! A deployer that is also the vendor deploys as soon as the fix is ready.
//! Any other deployer waits until the fix is public.

use cvd_bt::{
    ALMOST_ALWAYS_FAIL, ALMOST_ALWAYS_SUCCEED, ALWAYS_SUCCEED, OFTEN_SUCCEED, USUALLY_FAIL,
    USUALLY_SUCCEED,
};

use crate::cs::CsFlag;
use crate::message::MessageType;
use crate::nodes::case::{cs_has, to_fix_deployed};
use crate::nodes::common::Spec;
use crate::nodes::messaging::emit;
use crate::nodes::report::{rm_in, to_accepted, to_deferred};
use crate::nodes::roles::role_is_vendor;
use crate::rm::RmState;

fn decide_whether_to_deploy() -> Spec {
    Spec::fallback(
        "DecideWhetherToDeploy",
        vec![
            rm_in(RmState::Deferred),
            rm_in(RmState::Accepted),
            Spec::sequence(
                "DecideToAcceptDeploymentTasking",
                vec![
                    Spec::fuzzer("PrioritizeDeployment", ALMOST_ALWAYS_SUCCEED),
                    to_accepted(),
                    emit(MessageType::ReportAccepted),
                ],
            ),
            Spec::sequence(
                "DeferDeploymentTasking",
                vec![to_deferred(), emit(MessageType::ReportDeferred)],
            ),
        ],
    )
}

fn deploy_fix_when_ready() -> Spec {
    Spec::sequence(
        "DeployFixWhenReady",
        vec![
            Spec::fallback(
                "DecideAbilityToDeploy",
                vec![
                    role_is_vendor(),
                    Spec::check("CSinStateNotDeployedButPublicAware", |bb| {
                        !bb.q_cs.fix_deployed() && bb.q_cs.public_aware()
                    }),
                ],
            ),
            Spec::check("CSinStateVendorAwareFixReadyFixNotDeployed", |bb| {
                bb.q_cs.vendor_aware_and_fix_ready() && !bb.q_cs.fix_deployed()
            }),
            Spec::fuzzer("DeployFix", ALMOST_ALWAYS_FAIL),
            to_fix_deployed(),
            emit(MessageType::FixDeployed),
        ],
    )
}

fn deploy() -> Spec {
    Spec::fallback(
        "Deploy",
        vec![
            rm_in(RmState::Deferred),
            cs_has(CsFlag::FixDeployed),
            deploy_fix_when_ready(),
            Spec::fuzzer("MitigationDeployed", USUALLY_FAIL),
            Spec::sequence(
                "DeployMitigationWhenReady",
                vec![
                    Spec::fuzzer("MitigationAvailable", OFTEN_SUCCEED),
                    Spec::fuzzer("DeployMitigation", USUALLY_SUCCEED),
                ],
            ),
        ],
    )
}

pub fn deployment() -> Spec {
    Spec::fallback(
        "Deployment",
        vec![
            cs_has(CsFlag::FixDeployed),
            Spec::sequence(
                "ShouldStayInRmDeferred",
                vec![
                    rm_in(RmState::Deferred),
                    Spec::fuzzer("NoNewDeploymentInfo", USUALLY_SUCCEED),
                ],
            ),
            Spec::sequence(
                "DeployIfDesired",
                vec![
                    Spec::check("CanDeployFix", |bb| {
                        bb.role.is_deployer() && bb.capabilities.deploy_fix
                    }),
                    decide_whether_to_deploy(),
                    deploy(),
                ],
            ),
            Spec::sequence(
                "MonitorDeploymentIfDesired",
                vec![
                    Spec::fuzzer("MonitoringRequirement", OFTEN_SUCCEED),
                    Spec::fuzzer("MonitorDeployment", ALWAYS_SUCCEED),
                ],
            ),
        ],
    )
}
