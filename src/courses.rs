//! Static course catalog.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Course {
    pub id: u32,
    pub title: String,
    pub description: String,
}

/// Immutable list of courses, built once at startup.
#[derive(Debug, Clone)]
pub struct Catalog {
    courses: Vec<Course>,
}

impl Catalog {
    #[must_use]
    pub fn new(courses: Vec<Course>) -> Self {
        Self { courses }
    }

    /// The three courses the portal ships with.
    #[must_use]
    pub fn builtin() -> Self {
        let course = |id, title: &str, description: &str| Course {
            id,
            title: title.to_string(),
            description: description.to_string(),
        };

        Self::new(vec![
            course(
                1,
                "Web Foundations",
                "HTTP, HTML forms and how a browser talks to a server.",
            ),
            course(
                2,
                "Data Structures",
                "Lists, maps, trees and the cost of the operations on them.",
            ),
            course(
                3,
                "Secure Programming",
                "Password storage, sessions and the usual ways web apps get broken.",
            ),
        ])
    }

    #[must_use]
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    #[must_use]
    pub fn get(&self, id: u32) -> Option<&Course> {
        self.courses.iter().find(|course| course.id == id)
    }

    /// Resolve a raw path segment. Only the canonical decimal form matches:
    /// `2` resolves, `02` and `+2` do not.
    #[must_use]
    pub fn lookup(&self, raw_id: &str) -> Option<&Course> {
        let id = raw_id.parse::<u32>().ok()?;
        if id.to_string() != raw_id {
            return None;
        }
        self.get(id)
    }
}
