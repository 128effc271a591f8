//! Event command handlers

use chrono::NaiveDateTime;
use tracing::{debug, info};

use super::{confirm, Output};
use crate::cli::{EventFilterArgs, EventFormArgs, EventUpdateArgs};
use crate::models::{CreateEventRequest, UpdateEventRequest};
use crate::services::stats::{events_with_stats, EventFilter, EventWithStats, Participation};
use crate::state::AppContext;
use crate::utils::errors::{CampusError, Result};
use crate::utils::helpers::{flexible_datetime, format_rating, format_timestamp, truncate_text};

/// Accept `2024-09-01T14:00`, `2024-09-01 14:00` or a full RFC 3339 timestamp
pub fn parse_event_date(raw: &str) -> Result<NaiveDateTime> {
    let normalized = raw.trim().replacen(' ', "T", 1);
    flexible_datetime::parse(&normalized).ok_or_else(|| {
        CampusError::Validation(format!(
            "Invalid date '{}', expected e.g. 2024-09-01T14:00",
            raw
        ))
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// One line per event in the list view
pub fn render_event_line(event: &EventWithStats, participation: Option<&Participation>) -> String {
    let capacity = event
        .event
        .max_attendees
        .map(|max| format!("/{}", max))
        .unwrap_or_default();
    let mut line = format!(
        "#{:<4} {:<32} {:<10} {}  {}  reg {}{}  att {}  rating {}",
        event.event.id,
        truncate_text(&event.event.title, 29),
        event.event.event_type,
        format_timestamp(event.event.date),
        event.college_name,
        event.registration_count,
        capacity,
        event.attendance_count,
        format_rating(event.average_feedback),
    );

    if let Some(participation) = participation {
        if participation.has_attended(event.event.id) {
            line.push_str("  [attended]");
        } else if participation.is_registered(event.event.id) {
            line.push_str("  [registered]");
        } else if event.is_full() {
            line.push_str("  [full]");
        }
    }
    line
}

pub fn render_event_detail(event: &EventWithStats) -> String {
    let e = &event.event;
    let mut lines = vec![
        format!("{} (#{})", e.title, e.id),
        format!("  type:      {}", e.event_type),
        format!("  when:      {}", format_timestamp(e.date)),
        format!("  college:   {}", event.college_name),
    ];
    if let Some(location) = &e.location {
        lines.push(format!("  where:     {}", location));
    }
    match e.max_attendees {
        Some(max) => lines.push(format!(
            "  capacity:  {}/{}",
            event.registration_count, max
        )),
        None => lines.push(format!("  registered: {}", event.registration_count)),
    }
    lines.push(format!("  attended:  {}", event.attendance_count));
    lines.push(format!("  rating:    {}", format_rating(event.average_feedback)));
    if let Some(description) = &e.description {
        lines.push(String::new());
        lines.push(description.clone());
    }
    lines.join("\n")
}

/// Handle `campus events list`
pub async fn handle_list(context: &AppContext, args: &EventFilterArgs, out: Output) -> Result<()> {
    let mut store = context.open_store()?;
    store.load().await?;

    let stats = store.event_stats();
    let filter = EventFilter::from(args);
    let matched: Vec<&EventWithStats> = filter.apply(&stats);
    debug!(total = stats.len(), matched = matched.len(), "Events filtered");

    let participation = (!context.session().is_admin()).then(|| store.participation());
    out.emit(&matched, |events| {
        if events.is_empty() {
            return "No events found.".to_string();
        }
        events
            .iter()
            .map(|e| render_event_line(e, participation.as_ref()))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

/// Handle `campus events show`
pub async fn handle_show(context: &AppContext, event_id: i64, out: Output) -> Result<()> {
    let mut store = context.open_store()?;
    store.load().await?;

    // Events past the first page are fetched individually.
    let event = match store.event(event_id) {
        Some(event) => event.clone(),
        None => context.api().get_event(event_id).await?,
    };
    let stats = events_with_stats(
        std::slice::from_ref(&event),
        store.registrations(),
        store.attendances(),
        store.feedbacks(),
        store.colleges(),
    );
    let Some(event) = stats.into_iter().next() else {
        return Err(CampusError::request(404, Some("Event not found".to_string())));
    };
    out.emit(&event, render_event_detail)
}

/// Handle `campus events create`
pub async fn handle_create(context: &AppContext, form: EventFormArgs, out: Output) -> Result<()> {
    context.session().require_admin()?;
    let title = form.title.trim().to_string();
    if title.is_empty() {
        return Err(CampusError::Validation("Title is required".to_string()));
    }

    let request = CreateEventRequest {
        title,
        description: non_empty(form.description),
        event_type: form.event_type.into(),
        date: parse_event_date(&form.date)?,
        location: non_empty(form.location),
        max_attendees: form.max_attendees,
        college_id: form.college,
    };

    let mut store = context.open_store()?;
    let event = store.create_event(&request).await?;
    info!(event_id = event.id, "Event created");
    out.emit(&event, |e| format!("Created event #{}: {}", e.id, e.title))
}

/// Handle `campus events update`
pub async fn handle_update(context: &AppContext, form: EventUpdateArgs, out: Output) -> Result<()> {
    context.session().require_admin()?;
    let request = UpdateEventRequest {
        title: non_empty(form.title),
        description: form.description,
        event_type: form.event_type.map(Into::into),
        date: form.date.as_deref().map(parse_event_date).transpose()?,
        location: form.location,
        max_attendees: form.max_attendees,
        college_id: form.college,
    };

    let mut store = context.open_store()?;
    let event = store.update_event(form.event_id, &request).await?;
    out.emit(&event, |e| format!("Updated event #{}: {}", e.id, e.title))
}

/// Handle `campus events delete`
pub async fn handle_delete(
    context: &AppContext,
    event_id: i64,
    yes: bool,
    out: Output,
) -> Result<()> {
    context.session().require_admin()?;
    if !yes && !confirm(&format!("Delete event #{} and all its registrations?", event_id))? {
        out.notice("Cancelled.");
        return Ok(());
    }

    let mut store = context.open_store()?;
    store.delete_event(event_id).await?;
    out.notice(&format!("Deleted event #{}.", event_id));
    Ok(())
}

/// Handle `campus events register`
pub async fn handle_register(context: &AppContext, event_id: i64, out: Output) -> Result<()> {
    context.session().require_user()?;
    let mut store = context.open_store()?;
    let registration = store.register(event_id).await?;
    out.emit(&registration, |r| {
        format!("Registered for event #{} (registration #{})", r.event_id, r.id)
    })
}
