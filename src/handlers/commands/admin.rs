//! College and user administration commands

use super::Output;
use crate::services::stats::StudentWithStats;
use crate::state::AppContext;
use crate::utils::errors::Result;

/// Handle `campus colleges list`; works without logging in so signup can pick one
pub async fn handle_colleges_list(context: &AppContext, out: Output) -> Result<()> {
    let colleges = context.api().list_colleges().await?;
    out.emit(&colleges, |colleges| {
        if colleges.is_empty() {
            return "No colleges yet.".to_string();
        }
        colleges
            .iter()
            .map(|c| format!("#{:<4} {}", c.id, c.name))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

/// Handle `campus colleges create`
pub async fn handle_college_create(context: &AppContext, name: &str, out: Output) -> Result<()> {
    context.session().require_admin()?;
    let mut store = context.open_store()?;
    let college = store.create_college(name).await?;
    out.emit(&college, |c| format!("Created college #{}: {}", c.id, c.name))
}

pub fn render_student(student: &StudentWithStats) -> String {
    format!(
        "#{:<4} {:<24} {:<28} {:<20} reg {:<3} att {}",
        student.student.id,
        student.student.full_name,
        student.student.email,
        student.college_name,
        student.registration_count,
        student.attendance_count
    )
}

/// Handle `campus users list`
pub async fn handle_users_list(context: &AppContext, out: Output) -> Result<()> {
    context.session().require_admin()?;
    let mut store = context.open_store()?;
    store.load().await?;

    let students = store.student_stats();
    out.emit(&students, |students| {
        if students.is_empty() {
            return "No students registered.".to_string();
        }
        students.iter().map(render_student).collect::<Vec<_>>().join("\n")
    })
}
