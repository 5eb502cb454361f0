//! Page Title Resolver: exact path → title lookup.

/// Shown for any path without an explicit entry.
pub const DEFAULT_TITLE: &str = "HR Management";

const TITLES: &[(&str, &str)] = &[
    ("/dashboard", "Dashboard"),
    ("/admin/dashboard", "Admin Dashboard"),
    ("/hr/dashboard", "HR Dashboard"),
    ("/manager/dashboard", "Manager Dashboard"),
    ("/employee/dashboard", "Employee Dashboard"),
    ("/employees", "Employees"),
    ("/employees/new", "Add Employee"),
    ("/recruitment/jobs", "Job Openings"),
    ("/recruitment/candidates", "Candidates"),
    ("/recruitment/interviews", "Interviews"),
    ("/payroll/salaries", "Salaries"),
    ("/payroll/payslips", "Payslips"),
    ("/attendance/timesheets", "Timesheets"),
    ("/attendance/overtime", "Overtime"),
    ("/leave/requests", "Leave Requests"),
    ("/leave/approvals", "Leave Approvals"),
    ("/leave/holidays", "Holidays"),
    ("/performance/reviews", "Performance Reviews"),
    ("/performance/goals", "Goals"),
    ("/training/programs", "Training Programs"),
    ("/approvals", "Approvals"),
    ("/reports", "Reports"),
    ("/settings/company", "Company Settings"),
    ("/settings/mail-templates", "Mail Templates"),
    ("/settings/holidays", "Holiday Calendar"),
    ("/profile", "My Profile"),
    ("/login", "Sign In"),
    ("/register", "Create Account"),
    ("/forgot-password", "Reset Password"),
];

/// Title for `path` with the stock default.
pub fn page_title(path: &str) -> &'static str {
    lookup(path).unwrap_or(DEFAULT_TITLE)
}

fn lookup(path: &str) -> Option<&'static str> {
    TITLES
        .iter()
        .find(|(route, _)| *route == path)
        .map(|(_, title)| *title)
}

/// Resolver with a configurable fallback title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleResolver {
    default_title: String,
}

impl TitleResolver {
    pub fn new(default_title: impl Into<String>) -> Self {
        Self {
            default_title: default_title.into(),
        }
    }

    pub fn resolve<'a>(&'a self, path: &str) -> &'a str {
        lookup(path).unwrap_or(self.default_title.as_str())
    }

    pub fn is_known(&self, path: &str) -> bool {
        lookup(path).is_some()
    }
}

impl Default for TitleResolver {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE)
    }
}
