//! Role policy: which Permission Snapshot a role sees.

use std::collections::BTreeSet;

use crate::{Capability, Module, PermissionSnapshot, Role};

use Capability::*;

const ADMIN: &[(Module, &[Capability])] = &[
    (Module::Dashboard, &[View]),
    (Module::Employees, &[View, Manage, Export]),
    (Module::Recruitment, &[View, Manage]),
    (Module::Payroll, &[View, Manage, Export]),
    (Module::Attendance, &[View, Manage]),
    (Module::Leave, &[View, Manage, ViewApprovals, AddHolidays]),
    (Module::Performance, &[View, Manage]),
    (Module::Training, &[View, Manage]),
    (Module::Approvals, &[View, ViewApprovals]),
    (Module::Reports, &[View, Export]),
    (Module::Settings, &[View, Manage, ViewMailTemplates, AddHolidays]),
];

const HR: &[(Module, &[Capability])] = &[
    (Module::Dashboard, &[View]),
    (Module::Employees, &[View, Manage, Export]),
    (Module::Recruitment, &[View, Manage]),
    (Module::Payroll, &[View, Manage]),
    (Module::Attendance, &[View, Manage]),
    (Module::Leave, &[View, Manage, ViewApprovals, AddHolidays]),
    (Module::Performance, &[View]),
    (Module::Training, &[View, Manage]),
    (Module::Approvals, &[View, ViewApprovals]),
    (Module::Reports, &[View, Export]),
    (Module::Settings, &[View, ViewMailTemplates, AddHolidays]),
];

const MANAGER: &[(Module, &[Capability])] = &[
    (Module::Dashboard, &[View]),
    (Module::Employees, &[View]),
    (Module::Attendance, &[View]),
    (Module::Leave, &[View, ViewApprovals]),
    (Module::Performance, &[View, Manage]),
    (Module::Training, &[View]),
    (Module::Approvals, &[View, ViewApprovals]),
    (Module::Reports, &[View]),
];

const EMPLOYEE: &[(Module, &[Capability])] = &[
    (Module::Dashboard, &[View]),
    (Module::Attendance, &[View]),
    (Module::Leave, &[View]),
    (Module::Performance, &[View]),
    (Module::Training, &[View]),
];

/// Capabilities a role holds per module, before install status is applied.
pub fn role_grants(role: Role) -> &'static [(Module, &'static [Capability])] {
    match role {
        Role::Admin => ADMIN,
        Role::Hr => HR,
        Role::Manager => MANAGER,
        Role::Employee => EMPLOYEE,
    }
}

/// Derives Permission Snapshots from a role and the deployment's installed
/// apps.
///
/// - No IO
/// - No panics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionPolicy {
    installed: BTreeSet<Module>,
}

impl PermissionPolicy {
    pub fn new(installed: impl IntoIterator<Item = Module>) -> Self {
        Self {
            installed: installed.into_iter().collect(),
        }
    }

    pub fn all_installed() -> Self {
        Self::new(Module::ALL)
    }

    pub fn installed(&self) -> impl Iterator<Item = Module> + '_ {
        self.installed.iter().copied()
    }

    /// Every installed app appears (installed, possibly with no grants);
    /// grants for apps that are not installed are dropped.
    pub fn snapshot_for(&self, role: Role) -> PermissionSnapshot {
        let mut snapshot = PermissionSnapshot::empty();
        for module in &self.installed {
            snapshot = snapshot.install(*module);
        }
        for (module, capabilities) in role_grants(role) {
            if self.installed.contains(module) {
                snapshot = snapshot.grant(*module, capabilities.iter().copied());
            }
        }
        snapshot
    }
}

impl Default for PermissionPolicy {
    fn default() -> Self {
        Self::all_installed()
    }
}
