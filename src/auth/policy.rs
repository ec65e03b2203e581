//! Access policy selection
//!
//! Maps the `DOCS_ACCESS` value to the rule a user has to pass before a
//! document is served.

use super::user::User;

/// Recognised `DOCS_ACCESS` values, in policy order
pub const ACCESS_CHOICES: [&str; 4] = ["public", "login_required", "staff", "superuser"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessPolicy {
    #[default]
    Public,
    LoginRequired,
    Staff,
    Superuser,
}

/// Outcome of checking a user against a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Send the user to the login URL
    RedirectToLogin,
    /// Answer with the login form in place of the document
    ShowLoginForm,
}

impl AccessPolicy {
    /// Parse a recognised policy name
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "public" => Some(Self::Public),
            "login_required" => Some(Self::LoginRequired),
            "staff" => Some(Self::Staff),
            "superuser" => Some(Self::Superuser),
            _ => None,
        }
    }

    /// Select the policy for a setting value.
    ///
    /// Unrecognised values select `Public`. Callers serving documents must
    /// validate the value against `ACCESS_CHOICES` first.
    pub fn select(value: &str) -> Self {
        Self::parse(value).unwrap_or(Self::Public)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::LoginRequired => "login_required",
            Self::Staff => "staff",
            Self::Superuser => "superuser",
        }
    }

    pub fn authorize(self, user: &User) -> Decision {
        let active = user.is_authenticated() && user.is_active;
        match self {
            Self::Public => Decision::Allow,
            Self::LoginRequired if active => Decision::Allow,
            Self::LoginRequired => Decision::RedirectToLogin,
            Self::Staff if active && user.is_staff => Decision::Allow,
            Self::Superuser if active && user.is_superuser => Decision::Allow,
            Self::Staff | Self::Superuser => Decision::ShowLoginForm,
        }
    }
}

impl std::fmt::Display for AccessPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
