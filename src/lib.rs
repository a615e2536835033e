//! This crate manages calendar events and to-do items (iCal `VEVENT` and `VTODO` components) stored by a calendar backend.
//!
//! Backends are reached through the traits of the [`traits`] module. This crate provides two of them:
//! a CalDAV client in the [`client`] module, and a local file-based backend in the [`cache`] module.
//!
//! A [`Provider`](provider::Provider) runs the operations a host application needs on top of a backend:
//! creating events and to-do items, completing and deleting to-do items, and listing the to-do items of every task list,
//! sorted by due date. A task list that cannot be reached does not prevent the others from being listed.

pub mod traits;
pub mod error;
pub use error::{Error, Result};

pub mod calendar;
pub use calendar::{CalendarSource, ExtensionKind, Extensions};
pub use calendar::cached_calendar::CachedCalendar;
pub use calendar::remote_calendar::RemoteCalendar;
pub mod component;
pub use component::Component;
pub mod time;
pub mod task;
pub use task::{NewTodo, TodoAction, TodoStatus};
pub mod event;
pub use event::NewEvent;
pub mod provider;
pub use provider::Provider;

pub mod client;
pub mod cache;
pub mod resource;

pub mod ical;
pub mod config;
pub mod mock_behaviour;
pub mod output;
pub mod utils;
