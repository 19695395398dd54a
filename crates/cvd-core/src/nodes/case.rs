//! Case State conditions and flag transitions.

use tracing::debug;

use crate::cs::{CaseState, CsFlag};
use crate::nodes::common::Spec;

pub fn cs_has(flag: CsFlag) -> Spec {
    Spec::check(format!("CSin{}", flag.letter().to_ascii_uppercase()), move |bb| {
        bb.q_cs.has(flag)
    })
}

pub fn cs_lacks(flag: CsFlag) -> Spec {
    Spec::check(format!("CSnotIn{}", flag.letter().to_ascii_uppercase()), move |bb| {
        !bb.q_cs.has(flag)
    })
}

/// Public unaware, no exploit, no attacks.
pub fn cs_pxa() -> Spec {
    Spec::check("CSinStatePxaClear", |bb| bb.q_cs.is_pxa_clear())
}

/// Any of P, X or A is set.
pub fn cs_not_pxa() -> Spec {
    Spec::check("CSinStatePublicOrExploitOrAttacks", |bb| !bb.q_cs.is_pxa_clear())
}

pub fn cs_vendor_aware_and_fix_ready() -> Spec {
    Spec::check("CSinStateVendorAwareAndFixReady", |bb| {
        bb.q_cs.vendor_aware_and_fix_ready()
    })
}

pub fn cs_public_and_exploit() -> Spec {
    Spec::check("CSinStatePublicAndExploit", |bb| bb.q_cs.public_and_exploit())
}

fn set_flag(flag: CsFlag) -> Spec {
    Spec::action(format!("Set{}", flag.letter().to_ascii_uppercase()), move |bb| {
        let from: CaseState = bb.q_cs;
        let to = from.with(flag);
        if to != from {
            bb.q_cs = to;
            bb.q_cs_history.push(to);
            debug!(actor = %bb.name, axis = "CS", %from, %to, "State change");
        }
        Some(true)
    })
}

/// Set `flag` once `guard` holds. A no-op success if already set.
fn flag_change(flag: CsFlag, guard: Option<Spec>) -> Spec {
    let upper = flag.letter().to_ascii_uppercase();
    let mut steps = Vec::new();
    steps.extend(guard);
    steps.push(set_flag(flag));
    Spec::fallback(
        format!("q_cs_to_{upper}"),
        vec![
            cs_has(flag),
            Spec::sequence(format!("q_cs_to_{upper}_Transition"), steps),
        ],
    )
}

pub fn to_vendor_aware() -> Spec {
    flag_change(CsFlag::VendorAware, None)
}

/// Requires vendor awareness.
pub fn to_fix_ready() -> Spec {
    flag_change(CsFlag::FixReady, Some(cs_has(CsFlag::VendorAware)))
}

/// Requires vendor awareness and a ready fix.
pub fn to_fix_deployed() -> Spec {
    flag_change(CsFlag::FixDeployed, Some(cs_vendor_aware_and_fix_ready()))
}

pub fn to_public_aware() -> Spec {
    flag_change(CsFlag::PublicAware, None)
}

pub fn to_exploit_public() -> Spec {
    flag_change(CsFlag::ExploitPublic, None)
}

pub fn to_attacks_observed() -> Spec {
    flag_change(CsFlag::AttacksObserved, None)
}
