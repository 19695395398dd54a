//! Role conditions.

use crate::nodes::common::Spec;
use crate::roles::CvdRoles;

pub fn role_is(name: &str, role: CvdRoles) -> Spec {
    Spec::check(format!("RoleIs{name}"), move |bb| bb.role.contains(role))
}

pub fn role_is_not(name: &str, role: CvdRoles) -> Spec {
    Spec::check(format!("RoleIsNot{name}"), move |bb| !bb.role.contains(role))
}

pub fn role_is_vendor() -> Spec {
    role_is("Vendor", CvdRoles::VENDOR)
}

pub fn role_is_not_vendor() -> Spec {
    role_is_not("Vendor", CvdRoles::VENDOR)
}

pub fn role_is_not_deployer() -> Spec {
    role_is_not("Deployer", CvdRoles::DEPLOYER)
}
