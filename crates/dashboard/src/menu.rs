//! Menu Tree and the permission-driven Menu Filter.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use hrdesk_auth::{Capability, Module, PermissionSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmenuEntry {
    pub label: Cow<'static, str>,
    pub route: Cow<'static, str>,
}

/// A top-level navigation entry.
///
/// Submenu entries carry no permission of their own: they are shown exactly
/// when their parent is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    pub app: Module,
    pub label: Cow<'static, str>,
    pub icon: Cow<'static, str>,
    #[serde(default)]
    pub route: Option<Cow<'static, str>>,
    /// Capability required in `app`; `None` means visible whenever installed.
    #[serde(default)]
    pub permission: Option<Capability>,
    #[serde(default)]
    pub submenu: Vec<SubmenuEntry>,
}

impl MenuEntry {
    pub fn new(app: Module, label: &'static str, icon: &'static str) -> Self {
        Self {
            app,
            label: Cow::Borrowed(label),
            icon: Cow::Borrowed(icon),
            route: None,
            permission: None,
            submenu: Vec::new(),
        }
    }

    pub fn route(mut self, route: &'static str) -> Self {
        self.route = Some(Cow::Borrowed(route));
        self
    }

    pub fn requires(mut self, capability: Capability) -> Self {
        self.permission = Some(capability);
        self
    }

    pub fn item(mut self, label: &'static str, route: &'static str) -> Self {
        self.submenu.push(SubmenuEntry {
            label: Cow::Borrowed(label),
            route: Cow::Borrowed(route),
        });
        self
    }

    /// Installed, and holding the named capability if there is one.
    pub fn is_visible(&self, permissions: &PermissionSnapshot) -> bool {
        if !permissions.is_installed(self.app) {
            return false;
        }
        match self.permission {
            Some(capability) => permissions.allows(self.app, capability),
            None => true,
        }
    }

    /// Every route this entry links to: its own, then its submenu's.
    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.route
            .as_deref()
            .into_iter()
            .chain(self.submenu.iter().map(|s| &*s.route))
    }
}

/// How a path relates to the menu for a given snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// Linked from a visible entry.
    Visible,
    /// Linked only from entries the snapshot hides.
    Hidden,
    /// Not part of the menu (profile, role dashboards, ...).
    Unlisted,
}

/// Static navigation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuTree {
    entries: Vec<MenuEntry>,
}

impl MenuTree {
    pub fn new(entries: Vec<MenuEntry>) -> Self {
        Self { entries }
    }

    /// The stock HR navigation.
    pub fn standard() -> Self {
        use Capability::{View, ViewApprovals};

        Self::new(vec![
            MenuEntry::new(Module::Dashboard, "Dashboard", "home").route("/dashboard"),
            MenuEntry::new(Module::Employees, "Employees", "users")
                .requires(View)
                .item("Directory", "/employees")
                .item("Add Employee", "/employees/new"),
            MenuEntry::new(Module::Recruitment, "Recruitment", "briefcase")
                .requires(View)
                .item("Job Openings", "/recruitment/jobs")
                .item("Candidates", "/recruitment/candidates")
                .item("Interviews", "/recruitment/interviews"),
            MenuEntry::new(Module::Payroll, "Payroll", "wallet")
                .requires(View)
                .item("Salaries", "/payroll/salaries")
                .item("Payslips", "/payroll/payslips"),
            MenuEntry::new(Module::Attendance, "Attendance", "clock")
                .requires(View)
                .item("Timesheets", "/attendance/timesheets")
                .item("Overtime", "/attendance/overtime"),
            MenuEntry::new(Module::Leave, "Leave", "calendar")
                .requires(View)
                .item("Leave Requests", "/leave/requests")
                .item("Leave Approvals", "/leave/approvals")
                .item("Holidays", "/leave/holidays"),
            MenuEntry::new(Module::Performance, "Performance", "trending-up")
                .requires(View)
                .item("Reviews", "/performance/reviews")
                .item("Goals", "/performance/goals"),
            MenuEntry::new(Module::Training, "Training", "book")
                .requires(View)
                .route("/training/programs"),
            MenuEntry::new(Module::Approvals, "Approvals", "check-square")
                .requires(ViewApprovals)
                .route("/approvals"),
            MenuEntry::new(Module::Reports, "Reports", "bar-chart")
                .requires(View)
                .route("/reports"),
            MenuEntry::new(Module::Settings, "Settings", "settings")
                .requires(View)
                .item("Company", "/settings/company")
                .item("Mail Templates", "/settings/mail-templates")
                .item("Holiday Calendar", "/settings/holidays"),
        ])
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    /// Entries visible under `permissions`, in source order.
    ///
    /// Omission only: the result is always an ordered subsequence of
    /// [`entries`](Self::entries).
    pub fn filter(&self, permissions: &PermissionSnapshot) -> Vec<&MenuEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.is_visible(permissions))
            .collect()
    }

    /// Routes reachable through the filtered menu, in menu order.
    pub fn visible_routes(&self, permissions: &PermissionSnapshot) -> Vec<&str> {
        self.filter(permissions)
            .into_iter()
            .flat_map(MenuEntry::routes)
            .collect()
    }

    pub fn route_access(&self, path: &str, permissions: &PermissionSnapshot) -> RouteAccess {
        let mut owners = self
            .entries
            .iter()
            .filter(|entry| entry.routes().any(|r| r == path))
            .peekable();

        if owners.peek().is_none() {
            return RouteAccess::Unlisted;
        }
        if owners.any(|entry| entry.is_visible(permissions)) {
            RouteAccess::Visible
        } else {
            RouteAccess::Hidden
        }
    }
}

impl Default for MenuTree {
    fn default() -> Self {
        Self::standard()
    }
}
