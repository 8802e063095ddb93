//! This file serves as the root for all SeaORM entity modules.
//! The data model of the school administration backend: users and their
//! personal details, orientations and subjects, enrollments, and the
//! installment/payment ledger with its derived notifications.

pub mod enrollment;
pub mod installment;
pub mod notification;
pub mod orientation;
pub mod payment;
pub mod subject;
pub mod user;
pub mod user_detail;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::enrollment::Entity as Enrollment;
    pub use super::installment::Entity as Installment;
    pub use super::notification::Entity as Notification;
    pub use super::orientation::Entity as Orientation;
    pub use super::payment::Entity as Payment;
    pub use super::subject::Entity as Subject;
    pub use super::user::Entity as User;
    pub use super::user_detail::Entity as UserDetail;
}
