//! HTML pages. Deliberately plain: a shared layout plus one function per view.

use crate::{
    auth::ADMIN_USERNAME,
    courses::Course,
    credentials::User,
    session::{Flash, Session},
};
use axum::http::StatusCode;
use std::fmt::Write as _;

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, user: Option<&str>, flashes: &[Flash], body: &str) -> String {
    let mut nav = String::from(r#"<a href="/">Home</a> <a href="/courses">Courses</a>"#);
    match user {
        Some(name) => {
            if name == ADMIN_USERNAME {
                nav.push_str(r#" <a href="/admin">Admin</a>"#);
            }
            let _ = write!(
                nav,
                r#" <span class="user">{}</span> <a href="/logout">Log out</a>"#,
                escape(name)
            );
        }
        None => nav.push_str(r#" <a href="/login">Log in</a> <a href="/register">Register</a>"#),
    }

    let mut notices = String::new();
    for flash in flashes {
        let _ = write!(
            notices,
            r#"<div class="flash flash-{}">{}</div>"#,
            flash.category.as_str(),
            escape(&flash.message)
        );
    }

    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{title} - Studyhall</title></head>\
         <body><nav>{nav}</nav>{notices}<main>{body}</main></body></html>\n",
        title = escape(title),
    )
}

fn credentials_form(action: &str, submit: &str) -> String {
    format!(
        r#"<form method="post" action="{action}">
<label>Username <input type="text" name="username" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">{submit}</button>
</form>"#
    )
}

#[must_use]
pub fn index(username: &str, flashes: &[Flash]) -> String {
    let body = format!(
        r#"<h1>Welcome, {}</h1><p><a href="/courses">Browse the courses</a></p>"#,
        escape(username)
    );
    layout("Home", Some(username), flashes, &body)
}

#[must_use]
pub fn register(user: Option<&str>, flashes: &[Flash]) -> String {
    let body = format!(
        "<h1>Register</h1>{}<p>Already registered? <a href=\"/login\">Log in</a></p>",
        credentials_form("/register", "Register")
    );
    layout("Register", user, flashes, &body)
}

#[must_use]
pub fn login(user: Option<&str>, flashes: &[Flash]) -> String {
    let body = format!(
        "<h1>Log in</h1>{}<p>No account yet? <a href=\"/register\">Register</a></p>",
        credentials_form("/login", "Log in")
    );
    layout("Log in", user, flashes, &body)
}

#[must_use]
pub fn admin(users: &[User], user: Option<&str>, flashes: &[Flash]) -> String {
    let mut rows = String::new();
    for (position, account) in users.iter().enumerate() {
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}</td></tr>",
            position + 1,
            escape(&account.username)
        );
    }

    let body = format!(
        r#"<h1>Admin dashboard</h1><p>{} registered users. <a href="/admin/download">Download users.csv</a></p>
<table><thead><tr><th>#</th><th>Username</th></tr></thead><tbody>{rows}</tbody></table>"#,
        users.len()
    );
    layout("Admin", user, flashes, &body)
}

#[must_use]
pub fn courses(courses: &[Course], session: &Session, flashes: &[Flash]) -> String {
    let mut items = String::new();
    for course in courses {
        let _ = write!(
            items,
            r#"<li><a href="/course/{id}">{title}</a> <span class="progress">{progress}%</span></li>"#,
            id = course.id,
            title = escape(&course.title),
            progress = session.progress(course.id),
        );
    }

    let body = format!("<h1>Courses</h1><ul>{items}</ul>");
    layout("Courses", session.username(), flashes, &body)
}

#[must_use]
pub fn course_detail(course: &Course, session: &Session, flashes: &[Flash]) -> String {
    let body = format!(
        r#"<h1>{title}</h1><p>{description}</p>
<p>Your progress: <strong class="progress">{progress}%</strong></p>
<form method="post" action="/course/{id}/update">
<label>Progress <input type="number" name="progress" value="{progress}"></label>
<button type="submit">Save</button>
</form>
<p><a href="/courses">All courses</a></p>"#,
        id = course.id,
        title = escape(&course.title),
        description = escape(&course.description),
        progress = session.progress(course.id),
    );
    layout(&course.title, session.username(), flashes, &body)
}

#[must_use]
pub fn error(status: StatusCode, detail: &str) -> String {
    let title = status.canonical_reason().unwrap_or("Error");
    let body = format!(
        "<h1>{} {}</h1><p>{}</p>",
        status.as_u16(),
        escape(title),
        escape(detail)
    );
    layout(title, None, &[], &body)
}
