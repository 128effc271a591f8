//! Attendance command handlers

use std::path::Path;

use tokio::time::Instant;
use tracing::debug;

use super::Output;
use crate::services::attendance::{CheckInMode, CheckInOutcome};
use crate::services::qr::{self, Frame, QrPayload};
use crate::state::AppContext;
use crate::utils::errors::{CampusError, Result};

/// Handle `campus attendance mark`
pub async fn handle_mark(context: &AppContext, event_id: i64, out: Output) -> Result<()> {
    let mut store = context.open_store()?;
    store.load().await?;
    let attendance = store.mark_attendance(event_id).await?;
    out.emit(&attendance, |a| format!("Checked in to event #{}", a.event_id))
}

/// Handle `campus attendance scan`: read the code from an image and check in.
///
/// With `--event` this is an admin check-in against that event, otherwise
/// the logged-in student checks in for the event in the code.
pub async fn handle_scan(
    context: &AppContext,
    image_path: &Path,
    selected_event: Option<i64>,
    out: Output,
) -> Result<()> {
    let image = image::open(image_path)?.to_luma8();
    let frame = Frame::from_image(&image);

    let mut scanner = context.scan_session();
    scanner.start();
    let payload = scanner
        .offer_frame(&frame, Instant::now())
        .ok_or_else(|| CampusError::InvalidPayload("No QR code found in image".to_string()))??;
    debug!(event_id = payload.event_id, state = ?scanner.state(), "Scanned attendance code");

    let mode = match selected_event {
        Some(event_id) => {
            context.session().require_admin()?;
            CheckInMode::Admin {
                selected_event: Some(event_id),
            }
        }
        None => CheckInMode::SelfService,
    };

    let participation = match mode {
        CheckInMode::SelfService => {
            let mut store = context.open_store()?;
            store.load().await?;
            store.participation()
        }
        CheckInMode::Admin { .. } => Default::default(),
    };

    let mut desk = context.check_in_desk();
    let outcome = desk.submit(mode, &payload, &participation).await?;
    out.emit(&outcome_view(&outcome), |view| render_outcome(view, &outcome))
}

#[derive(Debug, serde::Serialize)]
struct OutcomeView<'a> {
    marked: bool,
    message: &'a str,
    student_name: Option<&'a str>,
    event_title: Option<&'a str>,
}

fn outcome_view(outcome: &CheckInOutcome) -> OutcomeView<'_> {
    let (student_name, event_title) = match outcome {
        CheckInOutcome::Marked(result) => {
            (result.student_name.as_deref(), result.event_title.as_deref())
        }
        CheckInOutcome::AlreadyMarked(_) => (None, None),
    };
    OutcomeView {
        marked: outcome.is_marked(),
        message: outcome.message(),
        student_name,
        event_title,
    }
}

fn render_outcome(view: &OutcomeView<'_>, outcome: &CheckInOutcome) -> String {
    match outcome {
        CheckInOutcome::Marked(_) => {
            let who = match (view.student_name, view.event_title) {
                (Some(student), Some(event)) => format!(" ({} at {})", student, event),
                _ => String::new(),
            };
            format!("Success: {}{}", view.message, who)
        }
        CheckInOutcome::AlreadyMarked(message) => format!("Notice: {}", message),
    }
}

/// Handle `campus attendance qr`
pub async fn handle_qr(
    context: &AppContext,
    event_id: i64,
    output: Option<&Path>,
    out: Output,
) -> Result<()> {
    context.session().require_admin()?;
    let event = context.api().get_event(event_id).await?;
    let payload = QrPayload::new(event.id);

    match output {
        Some(path) => {
            let format = qr::save_qr(&payload, path)?;
            out.emit(&payload, |_| {
                format!(
                    "Wrote {} QR code for '{}' to {}",
                    format,
                    event.title,
                    path.display()
                )
            })
        }
        None => {
            let code = payload.to_qr()?;
            let text = payload.encode()?;
            out.emit(&payload, |_| {
                format!(
                    "Attendance QR for '{}'\n{}\n{}",
                    event.title,
                    qr::render_terminal(&code),
                    text
                )
            })
        }
    }
}
