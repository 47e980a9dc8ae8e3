//! Thin typed wrappers over [`ApiClient`] for each FeiShu resource family.
//!
//! Every wrapper shares one client (and so one token manager) through an
//! `Arc`. Calls authorize with the tenant token unless the wrapper was built
//! with [`with_user_access`](ChatApi::with_user_access).

pub mod calendar;
pub mod chat;
pub mod contact;
pub mod document;
pub mod message;
pub mod spreadsheet;
pub mod task;

pub use calendar::{CalendarApi, EventDraft};
pub use chat::ChatApi;
pub use contact::ContactApi;
pub use document::DocumentApi;
pub use message::MessageApi;
pub use spreadsheet::SpreadsheetApi;
pub use task::{TaskApi, TaskDraft};

use serde_json::Value;

/// Move `key` out of a response `data` object, `Null` when absent.
pub(crate) fn take(mut data: Value, key: &str) -> Value {
    data.get_mut(key).map(Value::take).unwrap_or(Value::Null)
}

/// Generates the shared constructor and access-mode builder for a wrapper.
macro_rules! api_wrapper {
    ($name:ident) => {
        impl $name {
            pub fn new(client: std::sync::Arc<feishu_client::ApiClient>) -> Self {
                Self {
                    client,
                    user_access: false,
                }
            }

            /// Authorize calls with the user access token.
            pub fn with_user_access(mut self, user_access: bool) -> Self {
                self.user_access = user_access;
                self
            }

            fn options(&self) -> feishu_client::RequestOptions {
                let options = feishu_client::RequestOptions::new();
                if self.user_access {
                    options.as_user()
                } else {
                    options
                }
            }
        }
    };
}

pub(crate) use api_wrapper;
