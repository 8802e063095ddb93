//! Role-based authorization.
//!
//! Every protected operation is listed in [`Operation`] and [`is_allowed`] is the
//! only place deciding which roles may perform it. Handlers check the caller's
//! [`Identity`] before touching any service.

use model::entities::user_detail::Role;
use tracing::warn;

use crate::error::{Result, ServiceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    RegisterUser,
    ListUsers,
    SearchStudents,
    ViewOwnProfile,
    ViewLatestUser,
    ViewUser,
    UpdateUserDetails,
    ChangeRole,
    DeleteUser,
    ViewUserEnrollments,
    ViewUserInstallments,
    ManageOrientations,
    ViewOrientations,
    ViewOrientationEnrollments,
    ManageSubjects,
    ViewSubjects,
    ManageEnrollments,
    ViewEnrollments,
    ManageInstallments,
    ViewInstallment,
    ManagePayments,
    ViewPayments,
    ViewOwnPayments,
    GenerateReminders,
    ViewOwnNotifications,
}

/// Returns whether `role` may perform `operation` on any record.
///
/// Operations guarded with [`Identity::require_self_or`] are additionally open to
/// the owner of the record.
pub fn is_allowed(role: Role, operation: Operation) -> bool {
    use Operation::*;

    match operation {
        ViewOwnProfile | ViewOrientations | ViewOwnNotifications => true,
        RegisterUser | ViewLatestUser | ChangeRole | DeleteUser => role == Role::Admin,
        ManageOrientations | ManageSubjects | ManageInstallments => role == Role::Admin,
        ManagePayments | ViewPayments | GenerateReminders => role == Role::Admin,
        UpdateUserDetails => role == Role::Admin,
        ListUsers | SearchStudents | ViewUser => matches!(role, Role::Admin | Role::Supervisor),
        ViewUserEnrollments | ViewUserInstallments | ViewInstallment => {
            matches!(role, Role::Admin | Role::Supervisor)
        }
        ViewOrientationEnrollments | ViewSubjects => matches!(role, Role::Admin | Role::Supervisor),
        ManageEnrollments | ViewEnrollments => matches!(role, Role::Admin | Role::Supervisor),
        ViewOwnPayments => role == Role::Student,
    }
}

/// The authenticated caller, as vouched for by the access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i32,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: i32, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn can(&self, operation: Operation) -> bool {
        is_allowed(self.role, operation)
    }

    pub fn require(&self, operation: Operation) -> Result<()> {
        if self.can(operation) {
            Ok(())
        } else {
            warn!(
                "User {} with role {} denied {:?}",
                self.user_id,
                self.role.as_str(),
                operation
            );
            Err(ServiceError::Forbidden(format!(
                "Role {} is not allowed to perform this operation",
                self.role.as_str()
            )))
        }
    }

    /// Passes when the role allows `operation` or the caller owns the record.
    pub fn require_self_or(&self, operation: Operation, owner_id: i32) -> Result<()> {
        if self.user_id == owner_id {
            return Ok(());
        }
        self.require(operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_only_operations() {
        for operation in [
            Operation::RegisterUser,
            Operation::DeleteUser,
            Operation::ChangeRole,
            Operation::ManagePayments,
            Operation::GenerateReminders,
        ] {
            assert!(is_allowed(Role::Admin, operation));
            assert!(!is_allowed(Role::Supervisor, operation));
            assert!(!is_allowed(Role::Student, operation));
        }
    }

    #[test]
    fn test_supervisor_reads_and_manages_enrollments() {
        assert!(is_allowed(Role::Supervisor, Operation::ListUsers));
        assert!(is_allowed(Role::Supervisor, Operation::ManageEnrollments));
        assert!(is_allowed(Role::Supervisor, Operation::ViewSubjects));
        assert!(!is_allowed(Role::Supervisor, Operation::ManageSubjects));
        assert!(!is_allowed(Role::Student, Operation::ViewSubjects));
    }

    #[test]
    fn test_open_operations() {
        for role in [Role::Admin, Role::Supervisor, Role::Student] {
            assert!(is_allowed(role, Operation::ViewOwnProfile));
            assert!(is_allowed(role, Operation::ViewOrientations));
            assert!(is_allowed(role, Operation::ViewOwnNotifications));
        }
        assert!(is_allowed(Role::Student, Operation::ViewOwnPayments));
        assert!(!is_allowed(Role::Admin, Operation::ViewOwnPayments));
    }

    #[test]
    fn test_require_self_or() {
        let student = Identity::new(7, Role::Student);
        assert!(student.require_self_or(Operation::ViewUserEnrollments, 7).is_ok());
        assert!(matches!(
            student.require_self_or(Operation::ViewUserEnrollments, 8),
            Err(ServiceError::Forbidden(_))
        ));

        let supervisor = Identity::new(2, Role::Supervisor);
        assert!(supervisor.require_self_or(Operation::ViewUserEnrollments, 8).is_ok());
        assert!(supervisor.require_self_or(Operation::UpdateUserDetails, 2).is_ok());
        assert!(supervisor.require_self_or(Operation::UpdateUserDetails, 8).is_err());
    }
}
