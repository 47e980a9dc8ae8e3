use std::sync::Arc;

use feishu_client::{ApiClient, ListPage};
use feishu_core::FeishuError;
use serde_json::{json, Value};

use super::{api_wrapper, take};

/// Calendars and their events (`/calendar/v4`).
pub struct CalendarApi {
    client: Arc<ApiClient>,
    user_access: bool,
}

api_wrapper!(CalendarApi);

/// A new event. Times are Unix timestamps in seconds, as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDraft {
    pub summary: String,
    pub start_time: String,
    pub end_time: String,
    pub description: Option<String>,
}

impl EventDraft {
    fn to_body(&self) -> Value {
        let mut body = json!({
            "summary": self.summary,
            "start_time": { "timestamp": self.start_time },
            "end_time": { "timestamp": self.end_time },
        });
        if let Some(desc) = &self.description {
            body["description"] = json!(desc);
        }
        body
    }
}

impl CalendarApi {
    /// Calendars visible to the caller. FeiShu returns them under
    /// `calendar_list` rather than `items`.
    pub async fn list_calendars(
        &self,
        page_token: Option<&str>,
    ) -> Result<ListPage<Value>, FeishuError> {
        let options = self
            .options()
            .query("page_size", 50)
            .query_opt("page_token", page_token);
        let mut data: Value = self.client.get("/calendar/v4/calendars", options).await?;
        let items = data
            .get_mut("calendar_list")
            .map(Value::take)
            .and_then(|list| match list {
                Value::Array(items) => Some(items),
                _ => None,
            })
            .unwrap_or_default();
        Ok(ListPage {
            items,
            page_token: data["page_token"].as_str().map(String::from),
            has_more: data["has_more"].as_bool().unwrap_or(false),
        })
    }

    /// Events of `calendar_id`, optionally bounded by Unix-second timestamps.
    pub async fn list_events(
        &self,
        calendar_id: &str,
        start_time: Option<&str>,
        end_time: Option<&str>,
        page_token: Option<&str>,
    ) -> Result<ListPage<Value>, FeishuError> {
        let options = self
            .options()
            .path_param("calendar_id", calendar_id)
            .query_opt("start_time", start_time)
            .query_opt("end_time", end_time)
            .query_opt("page_token", page_token);
        self.client
            .get_list("/calendar/v4/calendars/:calendar_id/events", options)
            .await
    }

    pub async fn create_event(
        &self,
        calendar_id: &str,
        draft: &EventDraft,
    ) -> Result<Value, FeishuError> {
        let options = self
            .options()
            .path_param("calendar_id", calendar_id)
            .json(draft.to_body());
        let data: Value = self
            .client
            .post("/calendar/v4/calendars/:calendar_id/events", options)
            .await?;
        Ok(take(data, "event"))
    }

    pub async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), FeishuError> {
        let options = self
            .options()
            .path_param("calendar_id", calendar_id)
            .path_param("event_id", event_id);
        let _: Value = self
            .client
            .delete(
                "/calendar/v4/calendars/:calendar_id/events/:event_id",
                options,
            )
            .await?;
        Ok(())
    }
}
