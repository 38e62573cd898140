pub mod contract;
pub mod dashboard;
pub mod notification;
pub mod relative_time;

pub use contract::{Contract, ContractStatus, RiskLevel, UnknownStatus};
pub use dashboard::{DashboardStats, RECENT_LIMIT, recent_contracts};
pub use notification::{
    FEED_LIMIT, NotificationItem, NotificationKind, NotificationPreferences,
    derive_notifications, derive_notifications_with, notification_id, unread_count,
};
pub use relative_time::format_relative_time;
