pub mod board;
pub mod bridge;
pub mod cli;
pub mod client;
pub mod config;
pub mod form;
pub mod page;
pub mod store;
pub mod types;
pub mod utils;

pub use client::{ApiError, BackendClient};
pub use config::AppConfig;
pub use form::{AutofillData, FieldDescriptor, FillOutcome, FormFiller, FormSurface};
pub use store::ExtensionStore;
