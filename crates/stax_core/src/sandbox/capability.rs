//! Capability set granted to sandboxed app documents.

use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One permission the sandbox may grant to hosted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SandboxCapability {
    Scripts,
    Forms,
    Popups,
    Modals,
}

/// Attribute token for script execution.
pub const SANDBOX_ALLOW_SCRIPTS: &str = "allow-scripts";
/// Attribute token for form submission.
pub const SANDBOX_ALLOW_FORMS: &str = "allow-forms";
/// Attribute token for transient popups.
pub const SANDBOX_ALLOW_POPUPS: &str = "allow-popups";
/// Attribute token for alert/confirm/prompt dialogs.
pub const SANDBOX_ALLOW_MODALS: &str = "allow-modals";

/// Token that would expose host state; never granted.
const SANDBOX_SAME_ORIGIN: &str = "allow-same-origin";

impl SandboxCapability {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scripts => SANDBOX_ALLOW_SCRIPTS,
            Self::Forms => SANDBOX_ALLOW_FORMS,
            Self::Popups => SANDBOX_ALLOW_POPUPS,
            Self::Modals => SANDBOX_ALLOW_MODALS,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Scripts => "Allow the app's scripts to run.",
            Self::Forms => "Allow the app to submit forms.",
            Self::Popups => "Allow the app to open transient popup windows.",
            Self::Modals => "Allow the app to show alert and confirm dialogs.",
        }
    }
}

/// Parses one capability from its attribute token.
pub fn parse_sandbox_capability(value: &str) -> Result<SandboxCapability, SandboxCapabilityError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(SandboxCapabilityError::EmptyCapability);
    }

    match normalized {
        SANDBOX_ALLOW_SCRIPTS => Ok(SandboxCapability::Scripts),
        SANDBOX_ALLOW_FORMS => Ok(SandboxCapability::Forms),
        SANDBOX_ALLOW_POPUPS => Ok(SandboxCapability::Popups),
        SANDBOX_ALLOW_MODALS => Ok(SandboxCapability::Modals),
        SANDBOX_SAME_ORIGIN => Err(SandboxCapabilityError::Forbidden(normalized.to_string())),
        other => Err(SandboxCapabilityError::Unsupported(other.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SandboxCapabilityError {
    EmptyCapability,
    Unsupported(String),
    /// Token is known but breaks host isolation.
    Forbidden(String),
}

impl Display for SandboxCapabilityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCapability => write!(f, "sandbox capability must not be empty"),
            Self::Unsupported(value) => write!(f, "sandbox capability is unsupported: {value}"),
            Self::Forbidden(value) => write!(f, "sandbox capability is forbidden: {value}"),
        }
    }
}

impl Error for SandboxCapabilityError {}

/// Capability set applied to one mounted document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxPolicy {
    granted: BTreeSet<SandboxCapability>,
}

impl Default for SandboxPolicy {
    fn default() -> Self {
        Self::from_capabilities([
            SandboxCapability::Scripts,
            SandboxCapability::Forms,
            SandboxCapability::Popups,
            SandboxCapability::Modals,
        ])
    }
}

impl SandboxPolicy {
    pub fn from_capabilities(capabilities: impl IntoIterator<Item = SandboxCapability>) -> Self {
        Self {
            granted: capabilities.into_iter().collect(),
        }
    }

    /// Parses a space-separated attribute value such as `allow-scripts allow-forms`.
    pub fn parse(attribute: &str) -> Result<Self, SandboxCapabilityError> {
        let granted = attribute
            .split_whitespace()
            .map(parse_sandbox_capability)
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { granted })
    }

    pub fn allows(&self, capability: SandboxCapability) -> bool {
        self.granted.contains(&capability)
    }

    /// Renders the sandbox attribute value for the host's frame element.
    pub fn sandbox_attribute(&self) -> String {
        self.granted
            .iter()
            .map(|capability| capability.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::{
        parse_sandbox_capability, SandboxCapability, SandboxCapabilityError, SandboxPolicy,
    };

    #[test]
    fn default_policy_grants_execution_but_not_same_origin() {
        let policy = SandboxPolicy::default();
        assert!(policy.allows(SandboxCapability::Scripts));
        assert!(policy.allows(SandboxCapability::Forms));
        assert!(policy.allows(SandboxCapability::Popups));
        assert_eq!(
            policy.sandbox_attribute(),
            "allow-scripts allow-forms allow-popups allow-modals"
        );
        assert!(!policy.sandbox_attribute().contains("same-origin"));
    }

    #[test]
    fn same_origin_is_rejected() {
        let err = SandboxPolicy::parse("allow-scripts allow-same-origin")
            .expect_err("same-origin must be refused");
        assert_eq!(
            err,
            SandboxCapabilityError::Forbidden("allow-same-origin".to_string())
        );
    }

    #[test]
    fn parses_tokens_and_rejects_unknown() {
        assert_eq!(
            parse_sandbox_capability(" allow-forms ").expect("forms"),
            SandboxCapability::Forms
        );
        assert_eq!(
            parse_sandbox_capability("").expect_err("empty"),
            SandboxCapabilityError::EmptyCapability
        );
        assert!(matches!(
            parse_sandbox_capability("allow-downloads"),
            Err(SandboxCapabilityError::Unsupported(_))
        ));
    }

    #[test]
    fn descriptions_are_user_facing() {
        assert!(SandboxCapability::Scripts.description().contains("scripts"));
        assert!(SandboxCapability::Popups.description().contains("popup"));
    }
}
