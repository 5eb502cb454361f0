//! Permission Snapshot: which apps are installed and what the current
//! identity may do in each.
//!
//! Both axes are closed enums. A module that is not in the snapshot is, by
//! construction, neither installed nor granted anything.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// An installable app / navigation module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Dashboard,
    Employees,
    Recruitment,
    Payroll,
    Attendance,
    Leave,
    Performance,
    Training,
    Approvals,
    Reports,
    Settings,
}

impl Module {
    pub const ALL: [Module; 11] = [
        Module::Dashboard,
        Module::Employees,
        Module::Recruitment,
        Module::Payroll,
        Module::Attendance,
        Module::Leave,
        Module::Performance,
        Module::Training,
        Module::Approvals,
        Module::Reports,
        Module::Settings,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Module::Dashboard => "dashboard",
            Module::Employees => "employees",
            Module::Recruitment => "recruitment",
            Module::Payroll => "payroll",
            Module::Attendance => "attendance",
            Module::Leave => "leave",
            Module::Performance => "performance",
            Module::Training => "training",
            Module::Approvals => "approvals",
            Module::Reports => "reports",
            Module::Settings => "settings",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Module::ALL.into_iter().find(|m| m.slug() == slug)
    }
}

impl core::fmt::Display for Module {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.slug())
    }
}

/// A per-module feature flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    View,
    Manage,
    ViewApprovals,
    ViewMailTemplates,
    AddHolidays,
    Export,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::View,
        Capability::Manage,
        Capability::ViewApprovals,
        Capability::ViewMailTemplates,
        Capability::AddHolidays,
        Capability::Export,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Capability::View => "view",
            Capability::Manage => "manage",
            Capability::ViewApprovals => "view_approvals",
            Capability::ViewMailTemplates => "view_mail_templates",
            Capability::AddHolidays => "add_holidays",
            Capability::Export => "export",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Capability::ALL.into_iter().find(|c| c.slug() == slug)
    }
}

/// Access to a single module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleAccess {
    pub installed: bool,
    #[serde(default)]
    pub capabilities: BTreeSet<Capability>,
}

/// Immutable (per render pass) description of what the current identity may
/// see. Replaced wholesale whenever the identity changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSnapshot {
    modules: BTreeMap<Module, ModuleAccess>,
}

/// Wire shape used by [`PermissionSnapshot::from_json`]; names stay strings
/// so unknown ones can be dropped instead of failing the whole document.
#[derive(Debug, Deserialize)]
struct RawModuleAccess {
    #[serde(default)]
    installed: bool,
    #[serde(default)]
    capabilities: Vec<String>,
}

impl PermissionSnapshot {
    /// Nothing installed, nothing granted.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Mark `module` installed and add `capabilities` to it.
    pub fn grant(
        mut self,
        module: Module,
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> Self {
        let access = self.modules.entry(module).or_default();
        access.installed = true;
        access.capabilities.extend(capabilities);
        self
    }

    /// Mark `module` installed without granting anything.
    pub fn install(self, module: Module) -> Self {
        self.grant(module, [])
    }

    pub fn access(&self, module: Module) -> Option<&ModuleAccess> {
        self.modules.get(&module)
    }

    pub fn is_installed(&self, module: Module) -> bool {
        self.modules.get(&module).is_some_and(|a| a.installed)
    }

    /// `true` only if `module` is installed and `capability` was granted.
    pub fn allows(&self, module: Module, capability: Capability) -> bool {
        self.modules
            .get(&module)
            .is_some_and(|a| a.installed && a.capabilities.contains(&capability))
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn modules(&self) -> impl Iterator<Item = (Module, &ModuleAccess)> {
        self.modules.iter().map(|(m, a)| (*m, a))
    }

    /// Parse a backend-provided snapshot
    /// (`{"payroll": {"installed": true, "capabilities": ["view"]}}`).
    ///
    /// Unknown module and capability names are dropped, never guessed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: HashMap<String, RawModuleAccess> = serde_json::from_str(json)?;
        let mut modules = BTreeMap::new();

        for (name, access) in raw {
            let Some(module) = Module::from_slug(&name) else {
                tracing::debug!(module = %name, "dropping unknown module from permission snapshot");
                continue;
            };
            let capabilities = access
                .capabilities
                .iter()
                .filter_map(|c| {
                    let parsed = Capability::from_slug(c);
                    if parsed.is_none() {
                        tracing::debug!(%module, capability = %c, "dropping unknown capability");
                    }
                    parsed
                })
                .collect();
            modules.insert(
                module,
                ModuleAccess {
                    installed: access.installed,
                    capabilities,
                },
            );
        }

        Ok(Self { modules })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_module_is_neither_installed_nor_allowed() {
        let snapshot = PermissionSnapshot::empty().grant(Module::Recruitment, [Capability::View]);
        assert!(!snapshot.is_installed(Module::Payroll));
        assert!(!snapshot.allows(Module::Payroll, Capability::View));
        assert!(snapshot.allows(Module::Recruitment, Capability::View));
    }

    #[test]
    fn installed_without_flag_does_not_allow() {
        let snapshot = PermissionSnapshot::empty().install(Module::Payroll);
        assert!(snapshot.is_installed(Module::Payroll));
        assert!(!snapshot.allows(Module::Payroll, Capability::View));
    }

    #[test]
    fn uninstalled_module_never_allows_even_with_flags() {
        let json = r#"{"payroll": {"installed": false, "capabilities": ["view"]}}"#;
        let snapshot = PermissionSnapshot::from_json(json).unwrap();
        assert!(!snapshot.allows(Module::Payroll, Capability::View));
    }

    #[test]
    fn from_json_drops_unknown_names() {
        let json = r#"{
            "recruitment": {"installed": true, "capabilities": ["view", "teleport"]},
            "crm": {"installed": true, "capabilities": ["view"]}
        }"#;
        let snapshot = PermissionSnapshot::from_json(json).unwrap();

        assert!(snapshot.allows(Module::Recruitment, Capability::View));
        assert_eq!(snapshot.modules().count(), 1);
        assert_eq!(
            snapshot.access(Module::Recruitment).unwrap().capabilities.len(),
            1
        );
    }

    #[test]
    fn slugs_round_trip() {
        for module in Module::ALL {
            assert_eq!(Module::from_slug(module.slug()), Some(module));
        }
        for capability in Capability::ALL {
            assert_eq!(Capability::from_slug(capability.slug()), Some(capability));
        }
    }
}
