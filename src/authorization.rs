//! Edit authorization for form records.
//!
//! The form session only consumes the boolean from [`EditPolicy::can_edit`].
//! A finalized visit denies every edit; otherwise the role must hold the
//! capability for the record kind.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{RecordKind, Role};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Authenticated user, injected into a form session at mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: Uuid,
    pub role: Role,
}

impl UserSession {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }
}

/// Lifecycle of the medical visit a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    #[default]
    InProgress,
    Finalized,
}

// ═══════════════════════════════════════════════════════════
// Policies
// ═══════════════════════════════════════════════════════════

/// Role/capability check gating the Viewing → Editing transition.
pub trait EditPolicy: Send + Sync {
    fn can_edit(&self, role: Role, kind: RecordKind) -> bool;
}

/// Default capability table.
///
/// Antecedents and driving questionnaires are taken at the front desk;
/// technical exams by the technician; clinical exams by the doctor only.
/// Admin and doctor may edit everything they can see.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolePolicy;

impl RolePolicy {
    pub const fn editors(kind: RecordKind) -> &'static [Role] {
        match kind {
            RecordKind::Antecedent | RecordKind::DrivingExperience => {
                &[Role::Assistant, Role::Doctor, Role::Admin]
            }
            RecordKind::TechnicalExam => &[Role::Technician, Role::Doctor, Role::Admin],
            RecordKind::ClinicalExam => &[Role::Doctor, Role::Admin],
        }
    }
}

impl EditPolicy for RolePolicy {
    fn can_edit(&self, role: Role, kind: RecordKind) -> bool {
        Self::editors(kind).contains(&role)
    }
}

/// Wraps a policy and denies every edit once the visit is finalized.
#[derive(Debug, Clone, Copy)]
pub struct VisitLock<P> {
    inner: P,
    status: VisitStatus,
}

impl<P: EditPolicy> VisitLock<P> {
    pub fn new(inner: P, status: VisitStatus) -> Self {
        Self { inner, status }
    }
}

impl<P: EditPolicy> EditPolicy for VisitLock<P> {
    fn can_edit(&self, role: Role, kind: RecordKind) -> bool {
        self.status != VisitStatus::Finalized && self.inner.can_edit(role, kind)
    }
}
