//! Side effects that run beside the request path.

pub mod activity_log;
pub mod contact_extraction;

pub use activity_log::record_activity;
pub use contact_extraction::dispatch_contact_extraction;
