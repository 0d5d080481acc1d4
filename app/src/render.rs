//! Plain-text rendering of the two screens.

use std::fmt::Write;

use student_core::{Field, ListPhase, ListSnapshot, Pagination, StudentForm, SubmitOutcome};

pub fn list(snapshot: &ListSnapshot<'_>, notice: Option<&str>) -> String {
    let mut out = String::from("Students\n");
    if let Some(notice) = notice {
        let _ = writeln!(out, "* {notice}");
    }

    if snapshot.is_initial_loading() {
        out.push_str("Loading...\n");
        return out;
    }
    if let ListPhase::Failed(err) = &snapshot.phase {
        let _ = writeln!(out, "Could not load students: {err}");
    }
    if snapshot.placeholder {
        out.push_str("(previous page shown while loading)\n");
    }

    let _ = writeln!(out, "{:>6}  {:<28}  {}", "#", "Name", "Email");
    for student in snapshot.students {
        let _ = writeln!(
            out,
            "{:>6}  {:<28}  {}",
            student.id,
            student.full_name(),
            student.fields.email
        );
    }
    out.push_str(&pager(&snapshot.pagination));
    out.push('\n');
    out
}

fn pager(pagination: &Pagination) -> String {
    let mut parts = Vec::with_capacity(pagination.links.len() + 2);
    parts.push(if pagination.previous_enabled {
        "< Previous".to_string()
    } else {
        "(Previous)".to_string()
    });
    for link in &pagination.links {
        parts.push(if link.active {
            format!("[{}]", link.number)
        } else {
            link.number.to_string()
        });
    }
    parts.push(if pagination.next_enabled {
        "Next >".to_string()
    } else {
        "(Next)".to_string()
    });
    parts.join(" ")
}

pub fn form(form: &StudentForm) -> String {
    let mut out = format!("{}\n", form.title());
    for field in Field::ALL {
        let _ = writeln!(out, "  {:<14} {}", format!("{}:", field.label()), form.value(field));
        if let Some(message) = form.field_error(field) {
            let _ = writeln!(out, "  {:<14} ! {message}", "");
        }
    }
    let _ = writeln!(out, "[{}]", form.submit_label());
    match form.outcome() {
        Some(SubmitOutcome::Succeeded { message }) => {
            let _ = writeln!(out, "* {message}");
        }
        Some(SubmitOutcome::Failed(_)) if form.field_errors().is_none() => {
            out.push_str("* Save failed\n");
        }
        _ => {}
    }
    out
}
