pub mod enrollments;
pub mod health;
pub mod installments;
pub mod notifications;
pub mod orientations;
pub mod payments;
pub mod subjects;
pub mod users;
