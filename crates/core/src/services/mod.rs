//! Business logic services.

pub mod account;
pub mod activity;
pub mod feedback;
pub mod notification;
pub mod recommendation;
pub mod student;
pub mod teacher;

pub use account::{AccountProfile, AccountService, SigninInput};
pub use activity::{ActivityService, CreateActivityInput, UpdateActivityInput};
pub use feedback::{
    summarize, CreateFeedbackInput, FeedbackService, FeedbackSummary, UpdateFeedbackInput,
};
pub use notification::NotificationService;
pub use recommendation::{CreateRecommendationInput, RecommendationService, SaveTopMatchOutcome};
pub use student::{CreateStudentInput, StudentService, UpdateStudentInput};
pub use teacher::{CreateTeacherInput, TeacherService, UpdateTeacherInput};
