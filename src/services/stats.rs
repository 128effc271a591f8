//! Statistics aggregation
//!
//! Pure projections from the flat registration/attendance/feedback arrays to
//! per-event and per-student view models. Nothing here is stored or patched
//! incrementally: every call recomputes from its inputs, so calling twice on
//! the same data yields the same output.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::models::{Attendance, College, Event, EventType, Feedback, Registration, User, UserRole};
use crate::utils::helpers::truncate_text;

/// Shown when an event or student points at a college we don't know
pub const UNKNOWN_COLLEGE: &str = "Unknown College";

/// How many rows the report's ranked lists keep
pub const REPORT_TOP_N: usize = 10;

const POPULARITY_TITLE_CHARS: usize = 20;

/// Event with derived counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventWithStats {
    #[serde(flatten)]
    pub event: Event,
    pub registration_count: usize,
    pub attendance_count: usize,
    /// Mean rating, 0 when the event has no feedback
    pub average_feedback: f64,
    pub college_name: String,
}

impl EventWithStats {
    pub fn has_feedback(&self) -> bool {
        self.average_feedback > 0.0
    }

    pub fn is_full(&self) -> bool {
        self.event.is_full(self.registration_count)
    }
}

/// Student with derived counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentWithStats {
    #[serde(flatten)]
    pub student: User,
    pub registration_count: usize,
    pub attendance_count: usize,
    pub college_name: String,
}

fn college_names(colleges: &[College]) -> HashMap<i64, &str> {
    colleges.iter().map(|c| (c.id, c.name.as_str())).collect()
}

fn college_name(names: &HashMap<i64, &str>, college_id: Option<i64>) -> String {
    college_id
        .and_then(|id| names.get(&id))
        .map(|name| name.to_string())
        .unwrap_or_else(|| UNKNOWN_COLLEGE.to_string())
}

/// A registration counts as attended once, however many check-ins it has
fn attended_registrations(attendances: &[Attendance]) -> HashSet<i64> {
    attendances.iter().map(|a| a.registration_id).collect()
}

/// Per-event statistics.
///
/// Attendance and feedback are attributed to an event through their owning
/// registration; rows whose registration is not in `registrations` are
/// ignored.
pub fn events_with_stats(
    events: &[Event],
    registrations: &[Registration],
    attendances: &[Attendance],
    feedbacks: &[Feedback],
    colleges: &[College],
) -> Vec<EventWithStats> {
    let names = college_names(colleges);
    let registration_event: HashMap<i64, i64> =
        registrations.iter().map(|r| (r.id, r.event_id)).collect();

    let mut registration_counts: HashMap<i64, usize> = HashMap::new();
    for registration in registrations {
        *registration_counts.entry(registration.event_id).or_default() += 1;
    }

    let mut attendance_counts: HashMap<i64, usize> = HashMap::new();
    for registration_id in attended_registrations(attendances) {
        if let Some(event_id) = registration_event.get(&registration_id) {
            *attendance_counts.entry(*event_id).or_default() += 1;
        }
    }

    let mut rating_totals: HashMap<i64, (u64, usize)> = HashMap::new();
    for feedback in feedbacks {
        if let Some(event_id) = registration_event.get(&feedback.registration_id) {
            let entry = rating_totals.entry(*event_id).or_default();
            entry.0 += u64::from(feedback.rating);
            entry.1 += 1;
        }
    }

    events
        .iter()
        .map(|event| {
            let average_feedback = match rating_totals.get(&event.id) {
                Some((sum, count)) if *count > 0 => *sum as f64 / *count as f64,
                _ => 0.0,
            };
            EventWithStats {
                event: event.clone(),
                registration_count: registration_counts.get(&event.id).copied().unwrap_or(0),
                attendance_count: attendance_counts.get(&event.id).copied().unwrap_or(0),
                average_feedback,
                college_name: college_name(&names, Some(event.college_id)),
            }
        })
        .collect()
}

/// Per-student statistics for the admin view; non-student accounts are skipped
pub fn students_with_stats(
    users: &[User],
    registrations: &[Registration],
    attendances: &[Attendance],
    colleges: &[College],
) -> Vec<StudentWithStats> {
    let names = college_names(colleges);
    let registration_student: HashMap<i64, i64> =
        registrations.iter().map(|r| (r.id, r.student_id)).collect();

    let mut registration_counts: HashMap<i64, usize> = HashMap::new();
    for registration in registrations {
        *registration_counts.entry(registration.student_id).or_default() += 1;
    }

    let mut attendance_counts: HashMap<i64, usize> = HashMap::new();
    for registration_id in attended_registrations(attendances) {
        if let Some(student_id) = registration_student.get(&registration_id) {
            *attendance_counts.entry(*student_id).or_default() += 1;
        }
    }

    users
        .iter()
        .filter(|user| user.role == UserRole::Student)
        .map(|user| StudentWithStats {
            student: user.clone(),
            registration_count: registration_counts.get(&user.id).copied().unwrap_or(0),
            attendance_count: attendance_counts.get(&user.id).copied().unwrap_or(0),
            college_name: college_name(&names, user.college_id),
        })
        .collect()
}

/// What the current student has done, keyed by event id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Participation {
    pub registered_event_ids: Vec<i64>,
    pub attended_event_ids: Vec<i64>,
    pub feedback_event_ids: Vec<i64>,
}

impl Participation {
    /// Derive event id sets through the owning registrations
    pub fn derive(
        registrations: &[Registration],
        attendances: &[Attendance],
        feedbacks: &[Feedback],
    ) -> Self {
        let registration_event: HashMap<i64, i64> =
            registrations.iter().map(|r| (r.id, r.event_id)).collect();

        Self {
            registered_event_ids: unique(registrations.iter().map(|r| r.event_id)),
            attended_event_ids: unique(
                attendances
                    .iter()
                    .filter_map(|a| registration_event.get(&a.registration_id).copied()),
            ),
            feedback_event_ids: unique(
                feedbacks
                    .iter()
                    .filter_map(|f| registration_event.get(&f.registration_id).copied()),
            ),
        }
    }

    pub fn is_registered(&self, event_id: i64) -> bool {
        self.registered_event_ids.contains(&event_id)
    }

    pub fn has_attended(&self, event_id: i64) -> bool {
        self.attended_event_ids.contains(&event_id)
    }

    pub fn has_feedback(&self, event_id: i64) -> bool {
        self.feedback_event_ids.contains(&event_id)
    }
}

/// First occurrence order, duplicates dropped
fn unique(ids: impl Iterator<Item = i64>) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}

/// Conjunctive list filter used by the event browser and the reports
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Case-insensitive substring of the title
    pub search: Option<String>,
    /// Exact event type
    pub event_type: Option<EventType>,
    /// Case-insensitive substring of the college name
    pub college: Option<String>,
}

fn contains_ignore_case(haystack: &str, needle: &Option<String>) -> bool {
    match needle.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
    }
}

impl EventFilter {
    pub fn matches(&self, event: &EventWithStats) -> bool {
        contains_ignore_case(&event.event.title, &self.search)
            && self.event_type.map_or(true, |t| event.event.event_type == t)
            && contains_ignore_case(&event.college_name, &self.college)
    }

    pub fn apply<'a>(&self, events: &'a [EventWithStats]) -> Vec<&'a EventWithStats> {
        events.iter().filter(|e| self.matches(e)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopularityEntry {
    pub name: String,
    pub registrations: usize,
    pub attendance: usize,
}

/// Dashboard numbers for a filtered set of events
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total_events: usize,
    pub total_registrations: usize,
    pub total_attendance: usize,
    /// Percentage of registrations that turned into attendance
    pub attendance_rate: f64,
    /// Mean of the per-event averages over events that received feedback
    pub average_rating: f64,
    pub popularity: Vec<PopularityEntry>,
    pub type_distribution: BTreeMap<EventType, usize>,
    pub top_students: Vec<StudentWithStats>,
}

impl ReportSummary {
    pub fn build(events: &[&EventWithStats], students: &[StudentWithStats]) -> Self {
        let total_registrations: usize = events.iter().map(|e| e.registration_count).sum();
        let total_attendance: usize = events.iter().map(|e| e.attendance_count).sum();

        let attendance_rate = if total_registrations > 0 {
            total_attendance as f64 / total_registrations as f64 * 100.0
        } else {
            0.0
        };

        let rated: Vec<f64> = events
            .iter()
            .filter(|e| e.has_feedback())
            .map(|e| e.average_feedback)
            .collect();
        let average_rating = if rated.is_empty() {
            0.0
        } else {
            rated.iter().sum::<f64>() / rated.len() as f64
        };

        let mut ranked: Vec<&EventWithStats> = events.to_vec();
        ranked.sort_by(|a, b| b.registration_count.cmp(&a.registration_count));
        let popularity = ranked
            .into_iter()
            .take(REPORT_TOP_N)
            .map(|e| PopularityEntry {
                name: truncate_text(&e.event.title, POPULARITY_TITLE_CHARS),
                registrations: e.registration_count,
                attendance: e.attendance_count,
            })
            .collect();

        let mut type_distribution = BTreeMap::new();
        for event in events {
            *type_distribution.entry(event.event.event_type).or_insert(0) += 1;
        }

        let mut top_students = students.to_vec();
        top_students.sort_by(|a, b| b.registration_count.cmp(&a.registration_count));
        top_students.truncate(REPORT_TOP_N);

        Self {
            total_events: events.len(),
            total_registrations,
            total_attendance,
            attendance_rate,
            average_rating,
            popularity,
            type_distribution,
            top_students,
        }
    }
}
