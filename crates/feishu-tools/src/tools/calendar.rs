use std::sync::Arc;

use async_trait::async_trait;
use feishu_client::ApiClient;
use feishu_core::{FeishuError, Tool};
use serde_json::{json, Value};

use super::{
    action, as_user_property, optional_str, page_result, required_str, unknown_action,
    user_access,
};
use crate::api::{CalendarApi, EventDraft};

const ACTIONS: &str = "list_calendars | list_events | create_event | delete_event";

/// Manage FeiShu calendars and events.
pub struct FeishuCalendarTool {
    client: Arc<ApiClient>,
}

impl FeishuCalendarTool {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for FeishuCalendarTool {
    fn name(&self) -> &'static str {
        "feishu_calendar"
    }

    fn description(&self) -> &'static str {
        "Manage FeiShu calendars. \
         action='list_calendars' lists calendars; \
         action='list_events' lists a calendar's events; \
         action='create_event' schedules an event; \
         action='delete_event' removes one. Times are Unix seconds."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["list_calendars", "list_events", "create_event", "delete_event"]
                },
                "calendar_id": { "type": "string" },
                "event_id": { "type": "string" },
                "summary": { "type": "string" },
                "description": { "type": "string" },
                "start_time": { "type": "string", "description": "Unix seconds" },
                "end_time": { "type": "string", "description": "Unix seconds" },
                "page_token": { "type": "string" },
                "as_user": as_user_property()
            },
            "required": ["action"]
        }))
    }

    async fn call(&self, args: Value) -> Result<Value, FeishuError> {
        let api = CalendarApi::new(self.client.clone()).with_user_access(user_access(&args));
        match action(&args)? {
            "list_calendars" => {
                let page = api.list_calendars(optional_str(&args, "page_token")).await?;
                Ok(page_result("calendars", page))
            }

            "list_events" => {
                let calendar_id = required_str(&args, "calendar_id")?;
                let page = api
                    .list_events(
                        calendar_id,
                        optional_str(&args, "start_time"),
                        optional_str(&args, "end_time"),
                        optional_str(&args, "page_token"),
                    )
                    .await?;
                Ok(page_result("events", page))
            }

            "create_event" => {
                let calendar_id = required_str(&args, "calendar_id")?;
                let draft = EventDraft {
                    summary: required_str(&args, "summary")?.to_string(),
                    start_time: required_str(&args, "start_time")?.to_string(),
                    end_time: required_str(&args, "end_time")?.to_string(),
                    description: optional_str(&args, "description").map(String::from),
                };
                let event = api.create_event(calendar_id, &draft).await?;
                Ok(json!({ "event_id": event["event_id"], "event": event }))
            }

            "delete_event" => {
                let calendar_id = required_str(&args, "calendar_id")?;
                let event_id = required_str(&args, "event_id")?;
                api.delete_event(calendar_id, event_id).await?;
                Ok(json!({ "event_id": event_id, "status": "deleted" }))
            }

            other => Err(unknown_action(other, ACTIONS)),
        }
    }
}
