//! # Notification Services
//!
//! Alert channels for the hotel scanner: native dialog, external command,
//! default browser, e-mail through AWS SES and Pushbullet pushes.

/// Shared channel types and errors
mod types;
pub use types::*;

/// Channel construction from the configured targets
mod service;
pub use service::*;

/// Native message dialog
mod popup;
pub use popup::*;

/// External command invocation
mod command;
pub use command::*;

/// Default browser navigation
mod browser;
pub use browser::*;

/// E-mail via AWS SES
mod email_service;
pub use email_service::*;

/// Pushbullet notifications
mod push_service;
pub use push_service::*;
