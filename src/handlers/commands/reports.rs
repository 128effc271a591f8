//! Student dashboard and admin reports

use serde::Serialize;

use super::Output;
use crate::cli::EventFilterArgs;
use crate::services::stats::{EventFilter, EventWithStats, Participation, ReportSummary};
use crate::state::AppContext;
use crate::utils::errors::Result;
use crate::utils::helpers::{format_rating, format_timestamp};

#[derive(Debug, Clone, Serialize)]
pub struct MyEventRow {
    pub event_id: i64,
    pub title: String,
    pub date: String,
    pub attended: bool,
    pub feedback_given: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub registered: usize,
    pub attended: usize,
    pub feedback_given: usize,
    pub events: Vec<MyEventRow>,
}

impl Dashboard {
    pub fn build(stats: &[EventWithStats], participation: &Participation) -> Self {
        let events = stats
            .iter()
            .filter(|e| participation.is_registered(e.event.id))
            .map(|e| MyEventRow {
                event_id: e.event.id,
                title: e.event.title.clone(),
                date: format_timestamp(e.event.date),
                attended: participation.has_attended(e.event.id),
                feedback_given: participation.has_feedback(e.event.id),
            })
            .collect();

        Self {
            registered: participation.registered_event_ids.len(),
            attended: participation.attended_event_ids.len(),
            feedback_given: participation.feedback_event_ids.len(),
            events,
        }
    }
}

pub fn render_dashboard(dashboard: &Dashboard) -> String {
    let mut lines = vec![format!(
        "Registered: {}   Attended: {}   Feedback given: {}",
        dashboard.registered, dashboard.attended, dashboard.feedback_given
    )];
    if dashboard.events.is_empty() {
        lines.push("You haven't registered for any events yet.".to_string());
    }
    for row in &dashboard.events {
        let status = match (row.attended, row.feedback_given) {
            (true, true) => "attended, rated",
            (true, false) => "attended, awaiting your feedback",
            _ => "registered",
        };
        lines.push(format!("#{:<4} {:<32} {}  {}", row.event_id, row.title, row.date, status));
    }
    lines.join("\n")
}

/// Handle `campus my`
pub async fn handle_my(context: &AppContext, out: Output) -> Result<()> {
    context.session().require_user()?;
    let mut store = context.open_store()?;
    store.load().await?;

    let dashboard = Dashboard::build(&store.event_stats(), &store.participation());
    out.emit(&dashboard, render_dashboard)
}

pub fn render_report(report: &ReportSummary) -> String {
    let mut lines = vec![
        format!("Events:          {}", report.total_events),
        format!("Registrations:   {}", report.total_registrations),
        format!("Attendance:      {}", report.total_attendance),
        format!("Attendance rate: {:.1}%", report.attendance_rate),
        format!("Average rating:  {}", format_rating(report.average_rating)),
    ];

    if !report.popularity.is_empty() {
        lines.push(String::new());
        lines.push("Most popular events".to_string());
        for entry in &report.popularity {
            lines.push(format!(
                "  {:<24} reg {:<4} att {}",
                entry.name, entry.registrations, entry.attendance
            ));
        }
    }

    if !report.type_distribution.is_empty() {
        lines.push(String::new());
        lines.push("Events by type".to_string());
        for (event_type, count) in &report.type_distribution {
            lines.push(format!("  {:<12} {}", event_type, count));
        }
    }

    if !report.top_students.is_empty() {
        lines.push(String::new());
        lines.push("Most active students".to_string());
        for student in &report.top_students {
            lines.push(format!(
                "  {:<24} reg {:<4} att {}",
                student.student.full_name, student.registration_count, student.attendance_count
            ));
        }
    }
    lines.join("\n")
}

/// Handle `campus report`
pub async fn handle_report(
    context: &AppContext,
    args: &EventFilterArgs,
    out: Output,
) -> Result<()> {
    context.session().require_admin()?;
    let mut store = context.open_store()?;
    store.load().await?;

    let report = store.report(&EventFilter::from(args));
    out.emit(&report, render_report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Event, EventType};
    use chrono::NaiveDate;

    fn stats(id: i64, title: &str) -> EventWithStats {
        EventWithStats {
            event: Event {
                id,
                title: title.to_string(),
                description: None,
                event_type: EventType::Seminar,
                date: NaiveDate::from_ymd_opt(2024, 10, 5).unwrap().and_hms_opt(9, 30, 0).unwrap(),
                location: None,
                max_attendees: None,
                college_id: 1,
                created_by: None,
                created_at: None,
                updated_at: None,
                average_rating: None,
            },
            registration_count: 1,
            attendance_count: 0,
            average_feedback: 0.0,
            college_name: "North Campus".to_string(),
        }
    }

    #[test]
    fn test_dashboard_only_lists_registered_events() {
        let participation = Participation {
            registered_event_ids: vec![2, 3],
            attended_event_ids: vec![3],
            feedback_event_ids: vec![],
        };
        let all = vec![stats(1, "Fest"), stats(2, "Seminar"), stats(3, "Hackathon")];
        let dashboard = Dashboard::build(&all, &participation);

        assert_eq!(dashboard.registered, 2);
        assert_eq!(dashboard.attended, 1);
        assert_eq!(dashboard.events.len(), 2);
        assert!(render_dashboard(&dashboard).contains("awaiting your feedback"));
    }

    #[test]
    fn test_render_empty_report() {
        let text = render_report(&ReportSummary::build(&[], &[]));
        assert!(text.contains("Attendance rate: 0.0%"));
        assert!(text.contains("Average rating:  N/A"));
        assert!(!text.contains("Most popular"));
    }
}
