//! Database entities.

pub mod activity;
pub mod feedback;
pub mod notification;
pub mod recommendation;
pub mod student;
pub mod teacher;
pub mod user;

pub use activity::Entity as Activity;
pub use feedback::Entity as Feedback;
pub use notification::Entity as Notification;
pub use recommendation::Entity as Recommendation;
pub use student::Entity as Student;
pub use teacher::Entity as Teacher;
pub use user::Entity as User;
