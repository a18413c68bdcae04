//! Calendar tools
//!
//! - `list_calendars`: names of the user's calendars
//! - `schedule_event`: create an event in a calendar picked by name

use crate::input::parse_input;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use context_agent_core::agent::{Tool, ToolError, ToolExecutorFn, ToolFuture};
use context_agent_nextcloud::{Calendar, CalendarEvent, EventTiming, NextcloudClient};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%I:%M %p";

/// Create the `list_calendars` tool
///
/// Returns the calendar names joined with `", "`, e.g. `Personal, Work`.
#[must_use]
pub fn list_calendars_tool(client: NextcloudClient) -> (Tool, ToolExecutorFn) {
    let tool = Tool {
        name: "list_calendars".to_string(),
        description: "List all existing calendars by name".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {}
        }),
    };

    let executor = Arc::new(move |_input: String| {
        let client = client.clone();
        Box::pin(async move {
            let calendars = client.calendars().await.map_err(ToolError::new)?;
            Ok(calendars
                .iter()
                .map(|calendar| calendar.name.as_str())
                .collect::<Vec<_>>()
                .join(", "))
        }) as ToolFuture
    }) as ToolExecutorFn;

    (tool, executor)
}

#[derive(Debug, Deserialize)]
struct ScheduleEventInput {
    calendar_name: String,
    title: String,
    description: String,
    start_date: String,
    end_date: String,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
}

/// Create the `schedule_event` tool
///
/// Creates an event and returns `true`. Omitting either time creates an
/// all-day event spanning `start_date` through `end_date`.
#[must_use]
pub fn schedule_event_tool(client: NextcloudClient) -> (Tool, ToolExecutorFn) {
    let tool = Tool {
        name: "schedule_event".to_string(),
        description: "Create a new event in a calendar. Omit start_time and end_time parameters to create an all-day event.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "calendar_name": {
                    "type": "string",
                    "description": "The name of the calendar to add the event to"
                },
                "title": {
                    "type": "string",
                    "description": "The title of the event"
                },
                "description": {
                    "type": "string",
                    "description": "The description of the event"
                },
                "start_date": {
                    "type": "string",
                    "description": "The start date of the event in the following form: YYYY-MM-DD e.g. '2024-12-01'"
                },
                "end_date": {
                    "type": "string",
                    "description": "The end date of the event in the following form: YYYY-MM-DD e.g. '2024-12-01'"
                },
                "start_time": {
                    "type": "string",
                    "description": "The start time in the following form: HH:MM AM/PM e.g. '3:00 PM'"
                },
                "end_time": {
                    "type": "string",
                    "description": "The end time in the following form: HH:MM AM/PM e.g. '4:00 PM'"
                },
                "location": {
                    "type": "string",
                    "description": "The location of the event"
                },
                "timezone": {
                    "type": "string",
                    "description": "Timezone (e.g. 'America/New_York'). Defaults to UTC."
                }
            },
            "required": ["calendar_name", "title", "description", "start_date", "end_date"]
        }),
    };

    let executor = Arc::new(move |input: String| {
        let client = client.clone();
        Box::pin(async move {
            let input: ScheduleEventInput = parse_input(&input)?;

            let timing = event_timing(
                &input.start_date,
                &input.end_date,
                input.start_time.as_deref(),
                input.end_time.as_deref(),
                input.timezone.as_deref(),
            )?;

            let event = CalendarEvent::new(input.title, timing)
                .with_description(input.description)
                .with_location(input.location);

            let calendars = client.calendars().await.map_err(ToolError::new)?;
            let calendar = find_calendar(calendars, &input.calendar_name)?;
            client
                .add_event(&calendar, &event)
                .await
                .map_err(ToolError::new)?;

            Ok(json!(true).to_string())
        }) as ToolFuture
    }) as ToolExecutorFn;

    (tool, executor)
}

/// Calendars sharing a display name resolve to the last one listed
fn find_calendar(calendars: Vec<Calendar>, name: &str) -> Result<Calendar, ToolError> {
    calendars
        .into_iter()
        .rev()
        .find(|calendar| calendar.name == name)
        .ok_or_else(|| ToolError {
            message: format!("Calendar not found: {name}"),
        })
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate, ToolError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| ToolError {
        message: format!("Invalid {field} '{value}': expected YYYY-MM-DD"),
    })
}

fn parse_time(value: &str, field: &str) -> Result<NaiveTime, ToolError> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT).map_err(|_| ToolError {
        message: format!("Invalid {field} '{value}': expected HH:MM AM/PM"),
    })
}

fn localize(tz: Tz, local: NaiveDateTime) -> Result<chrono::DateTime<Utc>, ToolError> {
    tz.from_local_datetime(&local)
        .earliest()
        .map(|instant| instant.with_timezone(&Utc))
        .ok_or_else(|| ToolError {
            message: format!("Time {local} does not exist in timezone {tz}"),
        })
}

/// Turn the tool's date/time strings into an event timing
///
/// Times only count when both are given; otherwise the event is all-day and
/// the timezone is only validated.
fn event_timing(
    start_date: &str,
    end_date: &str,
    start_time: Option<&str>,
    end_time: Option<&str>,
    timezone: Option<&str>,
) -> Result<EventTiming, ToolError> {
    let start = parse_date(start_date, "start_date")?;
    let end = parse_date(end_date, "end_date")?;

    let timezone = timezone
        .map(str::trim)
        .filter(|tz| !tz.is_empty())
        .unwrap_or("UTC");
    let tz: Tz = timezone.parse().map_err(|_| ToolError {
        message: format!("Invalid timezone: {timezone}"),
    })?;

    let start_time = start_time.filter(|time| !time.trim().is_empty());
    let end_time = end_time.filter(|time| !time.trim().is_empty());

    let timing = match (start_time, end_time) {
        (Some(start_time), Some(end_time)) => EventTiming::Timed {
            start: localize(tz, start.and_time(parse_time(start_time, "start_time")?))?,
            end: localize(tz, end.and_time(parse_time(end_time, "end_time")?))?,
        },
        _ => EventTiming::AllDay { start, end },
    };

    let ends_before_start = match timing {
        EventTiming::AllDay { start, end } => end < start,
        EventTiming::Timed { start, end } => end < start,
    };
    if ends_before_start {
        return Err(ToolError {
            message: "Event ends before it starts".to_string(),
        });
    }

    Ok(timing)
}
