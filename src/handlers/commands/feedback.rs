//! Feedback command handlers

use super::Output;
use crate::models::{AverageRating, Feedback};
use crate::state::AppContext;
use crate::utils::errors::Result;
use crate::utils::helpers::{format_rating, format_timestamp};

/// Handle `campus feedback submit`
pub async fn handle_submit(
    context: &AppContext,
    event_id: i64,
    rating: u8,
    comment: Option<String>,
    out: Output,
) -> Result<()> {
    let mut store = context.open_store()?;
    store.load().await?;
    let feedback = store.submit_feedback(event_id, rating, comment).await?;
    out.emit(&feedback, |f| {
        format!("Thanks! You rated event #{} {}/5.", f.event_id, f.rating)
    })
}

pub fn render_feedback(feedback: &Feedback) -> String {
    let stars = "*".repeat(usize::from(feedback.rating));
    let when = feedback
        .created_at
        .map(format_timestamp)
        .unwrap_or_default();
    let mut line = format!(
        "#{:<4} event #{:<4} {:<5} {}",
        feedback.id, feedback.event_id, stars, when
    );
    if let Some(comment) = feedback.comment.as_deref().filter(|c| !c.is_empty()) {
        line.push_str(&format!("\n      \"{}\"", comment));
    }
    line
}

/// Handle `campus feedback list`
pub async fn handle_list(context: &AppContext, event: Option<i64>, out: Output) -> Result<()> {
    let feedbacks = match event {
        Some(event_id) => context.api().event_feedback(event_id).await?,
        None => {
            let mut store = context.open_store()?;
            store.load().await?;
            store.feedbacks().to_vec()
        }
    };

    out.emit(&feedbacks, |feedbacks| {
        if feedbacks.is_empty() {
            return "No feedback yet.".to_string();
        }
        feedbacks.iter().map(render_feedback).collect::<Vec<_>>().join("\n")
    })
}

pub fn render_rating(event_id: i64, rating: &AverageRating) -> String {
    let average = format_rating(rating.average_rating.unwrap_or(0.0));
    let count = rating.total_feedback.unwrap_or(0);
    format!("Event #{}: {} ({} ratings)", event_id, average, count)
}

/// Handle `campus feedback rating`
pub async fn handle_rating(context: &AppContext, event_id: i64, out: Output) -> Result<()> {
    let rating = context.api().event_average_rating(event_id).await?;
    out.emit(&rating, |r| render_rating(event_id, r))
}
