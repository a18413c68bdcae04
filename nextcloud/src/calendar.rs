//! CalDAV calendars: listing a user's calendars and adding events
//!
//! Calendars are discovered with a `Depth: 1` PROPFIND on the user's calendar
//! home. Events are written as single-VEVENT iCalendar objects.

use crate::{client::NextcloudClient, error::NextcloudError};
use chrono::{DateTime, NaiveDate, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Method;

const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:" xmlns:cal="urn:ietf:params:xml:ns:caldav">
  <d:prop>
    <d:displayname/>
    <d:resourcetype/>
  </d:prop>
</d:propfind>"#;

const PRODID: &str = "PRODID:-//Context Agent//Calendar Tools//EN";

/// A calendar collection
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Calendar {
    /// Display name (or the collection's path segment when it has none)
    pub name: String,
    /// Absolute href of the collection, ending with `/`
    pub href: String,
}

/// When an event takes place
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventTiming {
    /// Whole days, both dates inclusive
    AllDay {
        /// First day
        start: NaiveDate,
        /// Last day
        end: NaiveDate,
    },
    /// Fixed instants
    Timed {
        /// Start instant
        start: DateTime<Utc>,
        /// End instant
        end: DateTime<Utc>,
    },
}

/// An event to be stored in a calendar
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalendarEvent {
    /// Globally unique id, also used as the resource file name
    pub uid: String,
    /// Title
    pub summary: String,
    /// Free-text description
    pub description: String,
    /// Optional location
    pub location: Option<String>,
    /// Start and end
    pub timing: EventTiming,
}

impl CalendarEvent {
    /// Create an event with a fresh UID
    #[must_use]
    pub fn new(summary: impl Into<String>, timing: EventTiming) -> Self {
        Self {
            uid: uuid::Uuid::new_v4().to_string(),
            summary: summary.into(),
            description: String::new(),
            location: None,
            timing,
        }
    }

    /// Builder: set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder: set the location
    #[must_use]
    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location.filter(|location| !location.is_empty());
        self
    }

    /// Render as an iCalendar object (RFC 5545, CRLF line endings)
    #[must_use]
    pub fn to_ics(&self, stamp: DateTime<Utc>) -> String {
        let mut lines = vec![
            "BEGIN:VCALENDAR".to_string(),
            "VERSION:2.0".to_string(),
            PRODID.to_string(),
            "BEGIN:VEVENT".to_string(),
            format!("UID:{}", self.uid),
            format!("DTSTAMP:{}", format_utc(stamp)),
        ];

        match self.timing {
            EventTiming::AllDay { start, end } => {
                // DTEND is exclusive for DATE values
                let end = end.succ_opt().unwrap_or(end);
                lines.push(format!("DTSTART;VALUE=DATE:{}", start.format("%Y%m%d")));
                lines.push(format!("DTEND;VALUE=DATE:{}", end.format("%Y%m%d")));
            }
            EventTiming::Timed { start, end } => {
                lines.push(format!("DTSTART:{}", format_utc(start)));
                lines.push(format!("DTEND:{}", format_utc(end)));
            }
        }

        lines.push(format!("SUMMARY:{}", escape_text(&self.summary)));
        if !self.description.is_empty() {
            lines.push(format!("DESCRIPTION:{}", escape_text(&self.description)));
        }
        if let Some(location) = &self.location {
            lines.push(format!("LOCATION:{}", escape_text(location)));
        }
        lines.push("END:VEVENT".to_string());
        lines.push("END:VCALENDAR".to_string());

        let mut ics = String::new();
        for line in lines {
            ics.push_str(&fold_line(&line));
            ics.push_str("\r\n");
        }
        ics
    }
}

fn format_utc(instant: DateTime<Utc>) -> String {
    instant.format("%Y%m%dT%H%M%SZ").to_string()
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped
}

/// Fold to at most 75 octets per physical line without splitting characters
fn fold_line(line: &str) -> String {
    let mut folded = String::with_capacity(line.len() + line.len() / 25);
    let mut width = 0;
    for ch in line.chars() {
        let len = ch.len_utf8();
        if width + len > 75 {
            folded.push_str("\r\n ");
            width = 1;
        }
        folded.push(ch);
        width += len;
    }
    folded
}

#[derive(Default)]
struct PropfindEntry {
    href: String,
    display_name: String,
    is_calendar: bool,
}

impl PropfindEntry {
    fn into_calendar(self) -> Calendar {
        let name = if self.display_name.trim().is_empty() {
            let segment = self
                .href
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default();
            urlencoding::decode(segment).map_or_else(|_| segment.to_string(), |s| s.into_owned())
        } else {
            self.display_name
        };

        Calendar {
            name,
            href: self.href,
        }
    }
}

#[derive(Clone, Copy)]
enum Field {
    Href,
    DisplayName,
}

fn xml_error(error: impl std::fmt::Display) -> NextcloudError {
    NextcloudError::ResponseParseFailed(format!("Invalid WebDAV response: {error}"))
}

/// Extract calendar collections from a PROPFIND multistatus body
///
/// # Errors
///
/// Returns `NextcloudError::ResponseParseFailed` if the XML is malformed
pub fn parse_calendars(xml: &str) -> Result<Vec<Calendar>, NextcloudError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut calendars = Vec::new();
    let mut current: Option<PropfindEntry> = None;
    let mut field: Option<Field> = None;
    let mut in_resourcetype = false;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(element) => match element.local_name().as_ref() {
                b"response" => current = Some(PropfindEntry::default()),
                b"href" => field = Some(Field::Href),
                b"displayname" => field = Some(Field::DisplayName),
                b"resourcetype" => in_resourcetype = true,
                b"calendar" if in_resourcetype => {
                    if let Some(entry) = current.as_mut() {
                        entry.is_calendar = true;
                    }
                }
                _ => {}
            },
            Event::Empty(element) => {
                if in_resourcetype && element.local_name().as_ref() == b"calendar" {
                    if let Some(entry) = current.as_mut() {
                        entry.is_calendar = true;
                    }
                }
            }
            Event::Text(text) => {
                if let (Some(entry), Some(field)) = (current.as_mut(), field) {
                    let text = text.unescape().map_err(xml_error)?;
                    match field {
                        Field::Href => entry.href.push_str(&text),
                        Field::DisplayName => entry.display_name.push_str(&text),
                    }
                }
            }
            Event::End(element) => match element.local_name().as_ref() {
                b"href" | b"displayname" => field = None,
                b"resourcetype" => in_resourcetype = false,
                b"response" => {
                    if let Some(entry) = current.take() {
                        if entry.is_calendar {
                            calendars.push(entry.into_calendar());
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(calendars)
}

impl NextcloudClient {
    /// List the acting user's calendars
    ///
    /// # Errors
    ///
    /// Returns errors for failed requests or unparsable multistatus bodies
    pub async fn calendars(&self) -> Result<Vec<Calendar>, NextcloudError> {
        let home = format!(
            "/remote.php/dav/calendars/{}/",
            urlencoding::encode(&self.config().user)
        );
        let method = Method::from_bytes(b"PROPFIND")
            .map_err(|e| NextcloudError::RequestFailed(e.to_string()))?;

        let body = self
            .dav(
                method,
                &home,
                &[
                    ("Depth", "1"),
                    ("Content-Type", "application/xml; charset=utf-8"),
                ],
                PROPFIND_BODY.to_string(),
            )
            .await?;

        let calendars = parse_calendars(&body)?;
        tracing::debug!(count = calendars.len(), "Listed calendars");
        Ok(calendars)
    }

    /// Store `event` as a new resource in `calendar`
    ///
    /// # Errors
    ///
    /// Returns errors for failed requests, including a `412` if a resource
    /// with the same UID already exists
    pub async fn add_event(
        &self,
        calendar: &Calendar,
        event: &CalendarEvent,
    ) -> Result<(), NextcloudError> {
        let path = format!("{}{}.ics", self.relative_path(&calendar.href), event.uid);

        self.dav(
            Method::PUT,
            &path,
            &[
                ("Content-Type", "text/calendar; charset=utf-8"),
                ("If-None-Match", "*"),
            ],
            event.to_ics(Utc::now()),
        )
        .await?;

        tracing::info!(calendar = %calendar.name, uid = %event.uid, "Created calendar event");
        Ok(())
    }
}
