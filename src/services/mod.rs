// Business logic services

pub mod user_service;
pub mod relationship_service;
pub mod template_service;
pub mod assignment_service;
pub mod schedule_service;
pub mod schedule_processor;
pub mod reminder_service;
pub mod session_service;
pub mod feedback_service;
pub mod progression_service;
pub mod notification_service;
pub mod job_runner;

pub use user_service::UserService;
pub use relationship_service::RelationshipService;
pub use template_service::TemplateService;
pub use assignment_service::AssignmentService;
pub use schedule_service::ScheduleService;
pub use schedule_processor::{ProcessorOptions, ScheduleProcessor};
pub use reminder_service::ReminderService;
pub use session_service::SessionService;
pub use feedback_service::{FeedbackError, FeedbackService};
pub use progression_service::ProgressionService;
pub use notification_service::NotificationService;
pub use job_runner::JobRunner;
