//! Data models for Central Server entities.
//!
//! - `UserProfile`: the signed-in user's identity and role
//! - `Notification`: dashboard notifications with archival state
//! - `MonthlyReport` / `ReportPage`: paginated canteen reports

pub mod notification;
pub mod report;
pub mod user;

pub use notification::{Notification, NotificationsWrapper};
pub use report::{MonthlyReport, ReportPage};
pub use user::{CurrentUserResponse, UserProfile};
