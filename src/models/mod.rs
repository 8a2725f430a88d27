//! # Data Layer Models
//!
//! Row types and SQL for the admission ledger tables. Functions that run
//! inside an admission transaction take `&mut PgConnection`; standalone
//! collaborator operations take `&PgPool`.
//!
//! ## Core Models
//!
//! - [`Event`] - capacity-bearing resource with a time-driven status
//! - [`User`] - identity synced from the identity provider
//! - [`Registration`] - seat held (or attended) by a user
//! - [`WaitlistEntry`] - FIFO queue position for a full event
//! - [`Invitation`] - guest list entry for private events
//! - [`Notification`] - in-app inbox message

pub mod event;
pub mod invitation;
pub mod notification;
pub mod registration;
pub mod user;
pub mod waitlist_entry;

pub use event::{Event, NewEvent};
pub use invitation::Invitation;
pub use notification::Notification;
pub use registration::Registration;
pub use user::{NewUser, User};
pub use waitlist_entry::WaitlistEntry;
