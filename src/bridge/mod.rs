//! Message passing between the popup, the content script and the background,
//! and the web app's auth token hand-off.

pub mod background;
pub mod content;
pub mod messages;
pub mod popup;

pub use background::{Background, BackgroundRouter, HttpBackground};
pub use content::{AlwaysConsent, Consent, ConsentAction, ContentScript, PageBadge};
pub use messages::{Envelope, Request, WindowMessage, UNKNOWN_ACTION};
pub use popup::{AuthState, LogEntry, LogLevel, Popup, Status, StatusKind};
