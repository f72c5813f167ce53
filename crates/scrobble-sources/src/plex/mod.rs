pub mod webhook;

pub use webhook::{parse_webhook, WebhookError};
