//! Local event store
//!
//! The arrays a screen works from: events, colleges, registrations,
//! attendance, feedback and (for admins) users. Loads are all-or-nothing,
//! mutations are mirrored locally only after the backend accepted them, and
//! `refresh` throws everything away and refetches.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::models::{
    Attendance, College, CreateEventRequest, CreateFeedbackRequest, Event, Feedback, Registration,
    UpdateEventRequest, User,
};
use crate::models::feedback::{is_valid_rating, MAX_RATING, MIN_RATING};
use crate::services::api::{ApiClient, DEFAULT_EVENT_LIMIT};
use crate::services::stats::{
    events_with_stats, students_with_stats, EventFilter, EventWithStats, Participation,
    ReportSummary, StudentWithStats,
};
use crate::utils::errors::{CampusError, Result};
use crate::utils::logging;

pub const NOT_REGISTERED: &str = "You are not registered for this event";
pub const FEEDBACK_EXISTS: &str = "Feedback already submitted for this event";
pub const ATTENDANCE_EXISTS: &str = "Attendance already marked for this event";

/// Which endpoints the store reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataScope {
    /// `/registrations/my`, `/attendance/my`, `/feedback/my`
    Student,
    /// `/registrations/all`, `/attendance/all`, `/feedback/all` and `/users`
    Admin,
}

impl DataScope {
    pub fn for_user(user: &User) -> Self {
        if user.is_admin() {
            DataScope::Admin
        } else {
            DataScope::Student
        }
    }
}

/// Cloneable liveness flag; once closed, late results are dropped
#[derive(Debug, Clone)]
pub struct StoreHandle {
    alive: Arc<AtomicBool>,
}

impl StoreHandle {
    pub fn close(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
struct Snapshot {
    events: Vec<Event>,
    colleges: Vec<College>,
    registrations: Vec<Registration>,
    attendances: Vec<Attendance>,
    feedbacks: Vec<Feedback>,
    users: Vec<User>,
}

#[derive(Debug)]
pub struct EventStore {
    api: ApiClient,
    scope: DataScope,
    data: Snapshot,
    loaded: bool,
    handle: StoreHandle,
}

impl EventStore {
    pub fn new(api: ApiClient, scope: DataScope) -> Self {
        Self {
            api,
            scope,
            data: Snapshot::default(),
            loaded: false,
            handle: StoreHandle {
                alive: Arc::new(AtomicBool::new(true)),
            },
        }
    }

    pub fn scope(&self) -> DataScope {
        self.scope
    }

    pub fn handle(&self) -> StoreHandle {
        self.handle.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Fetch every array at once; nothing is applied unless all succeed.
    ///
    /// Returns `false` when the store was closed before the results arrived.
    #[instrument(skip(self), fields(scope = ?self.scope))]
    pub async fn load(&mut self) -> Result<bool> {
        let api = &self.api;
        let snapshot = match self.scope {
            DataScope::Student => {
                let (events, colleges, registrations, attendances, feedbacks) = tokio::try_join!(
                    api.list_events(0, DEFAULT_EVENT_LIMIT),
                    api.list_colleges(),
                    api.my_registrations(),
                    api.my_attendance(),
                    api.my_feedback(),
                )?;
                Snapshot {
                    events,
                    colleges,
                    registrations,
                    attendances,
                    feedbacks,
                    users: Vec::new(),
                }
            }
            DataScope::Admin => {
                let (events, colleges, registrations, attendances, feedbacks, users) =
                    tokio::try_join!(
                        api.list_events(0, DEFAULT_EVENT_LIMIT),
                        api.list_colleges(),
                        api.all_registrations(),
                        api.all_attendance(),
                        api.all_feedback(),
                        api.list_users(),
                    )?;
                Snapshot {
                    events,
                    colleges,
                    registrations,
                    attendances,
                    feedbacks,
                    users,
                }
            }
        };

        if !self.handle.is_alive() {
            debug!("Store closed while loading, discarding results");
            return Ok(false);
        }

        debug!(
            events = snapshot.events.len(),
            registrations = snapshot.registrations.len(),
            "Store loaded"
        );
        self.data = snapshot;
        self.loaded = true;
        Ok(true)
    }

    /// Mark the local arrays stale
    pub fn invalidate(&mut self) {
        self.loaded = false;
    }

    /// Drop the local arrays and refetch from the backend.
    ///
    /// A failed refresh leaves the store empty and unloaded.
    pub async fn refresh(&mut self) -> Result<bool> {
        self.invalidate();
        self.data = Snapshot::default();
        self.load().await
    }

    /// Load only if nothing has been loaded since the last invalidation
    pub async fn ensure_loaded(&mut self) -> Result<()> {
        if !self.loaded {
            self.load().await?;
        }
        Ok(())
    }

    /// Refetch attendance alone, e.g. after a QR check-in
    pub async fn reload_attendance(&mut self) -> Result<()> {
        let attendances = match self.scope {
            DataScope::Student => self.api.my_attendance().await?,
            DataScope::Admin => self.api.all_attendance().await?,
        };
        if self.handle.is_alive() {
            self.data.attendances = attendances;
        }
        Ok(())
    }
}

// Read access and derived statistics
impl EventStore {
    pub fn events(&self) -> &[Event] {
        &self.data.events
    }

    pub fn event(&self, event_id: i64) -> Option<&Event> {
        self.data.events.iter().find(|e| e.id == event_id)
    }

    pub fn colleges(&self) -> &[College] {
        &self.data.colleges
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.data.registrations
    }

    pub fn attendances(&self) -> &[Attendance] {
        &self.data.attendances
    }

    pub fn feedbacks(&self) -> &[Feedback] {
        &self.data.feedbacks
    }

    pub fn users(&self) -> &[User] {
        &self.data.users
    }

    pub fn event_stats(&self) -> Vec<EventWithStats> {
        events_with_stats(
            &self.data.events,
            &self.data.registrations,
            &self.data.attendances,
            &self.data.feedbacks,
            &self.data.colleges,
        )
    }

    pub fn student_stats(&self) -> Vec<StudentWithStats> {
        students_with_stats(
            &self.data.users,
            &self.data.registrations,
            &self.data.attendances,
            &self.data.colleges,
        )
    }

    pub fn participation(&self) -> Participation {
        Participation::derive(
            &self.data.registrations,
            &self.data.attendances,
            &self.data.feedbacks,
        )
    }

    pub fn report(&self, filter: &EventFilter) -> ReportSummary {
        let stats = self.event_stats();
        let filtered = filter.apply(&stats);
        ReportSummary::build(&filtered, &self.student_stats())
    }

    /// The current student's registration for `event_id`
    pub fn registration_for(&self, event_id: i64) -> Option<&Registration> {
        self.data.registrations.iter().find(|r| r.event_id == event_id)
    }

    fn require_student_scope(&self, action: &str) -> Result<()> {
        match self.scope {
            DataScope::Student => Ok(()),
            DataScope::Admin => Err(CampusError::PermissionDenied(format!(
                "Only students can {}",
                action
            ))),
        }
    }
}

// Mutations: call the backend, then mirror the accepted entity locally
impl EventStore {
    pub async fn create_event(&mut self, request: &CreateEventRequest) -> Result<Event> {
        let event = self.api.create_event(request).await?;
        logging::log_event_action(event.id, "create", event.created_by);
        self.data.events.push(event.clone());
        Ok(event)
    }

    pub async fn update_event(
        &mut self,
        event_id: i64,
        request: &UpdateEventRequest,
    ) -> Result<Event> {
        if request.is_empty() {
            return Err(CampusError::Validation("Nothing to update".to_string()));
        }
        let event = self.api.update_event(event_id, request).await?;
        logging::log_event_action(event_id, "update", None);
        match self.data.events.iter_mut().find(|e| e.id == event_id) {
            Some(existing) => *existing = event.clone(),
            None => self.data.events.push(event.clone()),
        }
        Ok(event)
    }

    /// Delete an event along with its local registrations, attendance and feedback
    pub async fn delete_event(&mut self, event_id: i64) -> Result<()> {
        self.api.delete_event(event_id).await?;
        logging::log_event_action(event_id, "delete", None);

        let data = &mut self.data;
        let dropped: Vec<i64> = data
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id)
            .map(|r| r.id)
            .collect();

        data.events.retain(|e| e.id != event_id);
        data.registrations.retain(|r| r.event_id != event_id);
        data.attendances
            .retain(|a| a.event_id != event_id && !dropped.contains(&a.registration_id));
        data.feedbacks
            .retain(|f| f.event_id != event_id && !dropped.contains(&f.registration_id));
        Ok(())
    }

    pub async fn create_college(&mut self, name: &str) -> Result<College> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CampusError::Validation("College name is required".to_string()));
        }
        let college = self.api.create_college(name).await?;
        info!(college_id = college.id, "College created");
        self.data.colleges.push(college.clone());
        Ok(college)
    }

    /// Register the current student; a repeat registration surfaces as `DuplicateAction`
    pub async fn register(&mut self, event_id: i64) -> Result<Registration> {
        self.require_student_scope("register for events")?;
        let registration = self.api.create_registration(event_id).await?;
        logging::log_user_action(
            Some(registration.student_id),
            "register",
            Some(&event_id.to_string()),
        );
        self.data.registrations.push(registration.clone());
        Ok(registration)
    }

    /// Manual check-in through the current student's registration
    pub async fn mark_attendance(&mut self, event_id: i64) -> Result<Attendance> {
        self.require_student_scope("mark their own attendance")?;
        let registration_id = self
            .registration_for(event_id)
            .map(|r| r.id)
            .ok_or_else(|| CampusError::Validation(NOT_REGISTERED.to_string()))?;
        if self.data.attendances.iter().any(|a| a.registration_id == registration_id) {
            return Err(CampusError::DuplicateAction(ATTENDANCE_EXISTS.to_string()));
        }

        let attendance = self.api.create_attendance(registration_id, event_id).await?;
        logging::log_attendance(event_id, "manual", true, "Attendance marked");
        self.data.attendances.push(attendance.clone());
        Ok(attendance)
    }

    /// Rate an attended event; one feedback per registration
    pub async fn submit_feedback(
        &mut self,
        event_id: i64,
        rating: u8,
        comment: Option<String>,
    ) -> Result<Feedback> {
        self.require_student_scope("submit feedback")?;
        if !is_valid_rating(rating) {
            return Err(CampusError::Validation(format!(
                "Rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }
        let registration_id = self
            .registration_for(event_id)
            .map(|r| r.id)
            .ok_or_else(|| CampusError::Validation(NOT_REGISTERED.to_string()))?;
        if self.data.feedbacks.iter().any(|f| f.registration_id == registration_id) {
            return Err(CampusError::DuplicateAction(FEEDBACK_EXISTS.to_string()));
        }
        if !self.data.attendances.iter().any(|a| a.registration_id == registration_id) {
            return Err(CampusError::Validation(
                "Feedback can only be given after attending the event".to_string(),
            ));
        }

        let request = CreateFeedbackRequest {
            registration_id,
            event_id,
            rating,
            comment: comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
        };
        let feedback = self.api.create_feedback(&request).await?;
        logging::log_user_action(
            Some(feedback.student_id),
            "feedback",
            Some(&event_id.to_string()),
        );
        self.data.feedbacks.push(feedback.clone());
        Ok(feedback)
    }
}
