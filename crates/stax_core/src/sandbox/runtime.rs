//! Sandbox host trait and an in-process headless implementation.

use crate::model::app::AppId;
use crate::sandbox::capability::SandboxPolicy;
use log::{info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SandboxError {
    /// Document cannot be instantiated (empty or otherwise malformed).
    MalformedDocument { instance: AppId, reason: String },
    /// Host refused to create the execution context.
    Rejected { instance: AppId, reason: String },
}

impl Display for SandboxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedDocument { instance, reason } => {
                write!(f, "sandbox document for {instance} is malformed: {reason}")
            }
            Self::Rejected { instance, reason } => {
                write!(f, "sandbox host rejected {instance}: {reason}")
            }
        }
    }
}

impl Error for SandboxError {}

/// Isolated execution context provider.
pub trait SandboxHost {
    /// Hands a resolved document to a fresh execution context for `instance`.
    ///
    /// Returning `Ok` means the document was handed off, not that it loaded.
    fn mount(
        &mut self,
        instance: &AppId,
        document: &str,
        policy: &SandboxPolicy,
    ) -> Result<(), SandboxError>;

    /// Destroys the execution context; unknown instances are ignored.
    fn unmount(&mut self, instance: &AppId);
}

/// One document held by the headless host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountedDocument {
    pub document: String,
    pub sandbox_attribute: String,
}

/// Headless host that keeps mounted documents in memory.
///
/// Used by the CLI and by hosts that render documents elsewhere.
#[derive(Debug, Default)]
pub struct HeadlessSandboxHost {
    mounted: BTreeMap<AppId, MountedDocument>,
    fail_next: Option<String>,
    mount_count: usize,
}

impl HeadlessSandboxHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `mount` call fail with `reason`.
    pub fn fail_next_mount(&mut self, reason: impl Into<String>) {
        self.fail_next = Some(reason.into());
    }

    pub fn mounted(&self, instance: &AppId) -> Option<&MountedDocument> {
        self.mounted.get(instance)
    }

    pub fn is_mounted(&self, instance: &AppId) -> bool {
        self.mounted.contains_key(instance)
    }

    pub fn live_count(&self) -> usize {
        self.mounted.len()
    }

    /// Total successful mounts over the host lifetime.
    pub fn mount_count(&self) -> usize {
        self.mount_count
    }
}

impl SandboxHost for HeadlessSandboxHost {
    fn mount(
        &mut self,
        instance: &AppId,
        document: &str,
        policy: &SandboxPolicy,
    ) -> Result<(), SandboxError> {
        if let Some(reason) = self.fail_next.take() {
            warn!("event=sandbox_mount module=sandbox status=error instance={instance} error_code=host_rejected");
            return Err(SandboxError::Rejected {
                instance: instance.clone(),
                reason,
            });
        }
        if document.trim().is_empty() {
            return Err(SandboxError::MalformedDocument {
                instance: instance.clone(),
                reason: "document is empty".to_string(),
            });
        }

        self.mounted.insert(
            instance.clone(),
            MountedDocument {
                document: document.to_string(),
                sandbox_attribute: policy.sandbox_attribute(),
            },
        );
        self.mount_count += 1;
        info!(
            "event=sandbox_mount module=sandbox status=ok instance={} bytes={}",
            instance,
            document.len()
        );
        Ok(())
    }

    fn unmount(&mut self, instance: &AppId) {
        if self.mounted.remove(instance).is_some() {
            info!("event=sandbox_unmount module=sandbox status=ok instance={instance}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{HeadlessSandboxHost, SandboxError, SandboxHost};
    use crate::model::app::AppId;
    use crate::sandbox::capability::SandboxPolicy;

    #[test]
    fn mounts_and_unmounts_documents() {
        let mut host = HeadlessSandboxHost::new();
        let id = AppId::new("demo");
        host.mount(&id, "<p>x</p>", &SandboxPolicy::default())
            .expect("mount");
        assert!(host.is_mounted(&id));
        assert_eq!(
            host.mounted(&id).expect("mounted").sandbox_attribute,
            "allow-scripts allow-forms allow-popups allow-modals"
        );

        host.unmount(&id);
        assert!(!host.is_mounted(&id));
        assert_eq!(host.mount_count(), 1);
    }

    #[test]
    fn rejects_empty_document_and_injected_failure() {
        let mut host = HeadlessSandboxHost::new();
        let id = AppId::new("demo");
        assert!(matches!(
            host.mount(&id, "  ", &SandboxPolicy::default()),
            Err(SandboxError::MalformedDocument { .. })
        ));

        host.fail_next_mount("no frames left");
        assert!(matches!(
            host.mount(&id, "<p>x</p>", &SandboxPolicy::default()),
            Err(SandboxError::Rejected { .. })
        ));
        host.mount(&id, "<p>x</p>", &SandboxPolicy::default())
            .expect("failure is one-shot");
    }
}
