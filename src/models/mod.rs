// Data models for coaching, scheduling and progression

pub mod user;
pub mod coaching;
pub mod template;
pub mod assignment;
pub mod schedule;
pub mod session;
pub mod feedback;
pub mod progression;
pub mod notification;

pub use user::*;
pub use coaching::*;
pub use template::*;
pub use assignment::*;
pub use schedule::*;
pub use session::*;
pub use feedback::*;
pub use progression::*;
pub use notification::*;
