//! # Directories
//!
//! A directory is a folder-like entity scoping a set of resources to a course
//! and an owner. Directories come in two shapes:
//!
//! - **Roots**: carry an explicit [`Visibility`]
//! - **Subdirectories**: one level below a root, tagged [`SubdirectoryKind::Theory`]
//!   or [`SubdirectoryKind::Lab`], and store no visibility of their own
//!
//! ## Visibility inheritance
//!
//! A subdirectory's visibility is always read from its parent at the time of
//! the check (see [`Directory::effective_visibility`]). Nothing is copied down
//! on create, so changing a root's visibility can never leave its children
//! disagreeing with it.
//!
//! ## Course codes
//!
//! Course codes are trimmed and upper-cased on the way in ([`CourseCode::parse`]).
//! A code is not unique on its own: any number of owners, and the same owner
//! more than once, may keep folders for one course.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::catalog::Course;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("course code is required")]
    MissingCourseCode,
    #[error("title is required")]
    MissingTitle,
    #[error("unknown visibility: {0}")]
    UnknownVisibility(String),
    #[error("unknown subdirectory type: {0}")]
    UnknownSubdirectoryKind(String),
    #[error("subdirectories inherit visibility from their parent")]
    SubdirectoryVisibility,
    #[error("subdirectories cannot contain further subdirectories")]
    NestedSubdirectory,
    #[error("only the owner of the parent directory can add subdirectories")]
    NotParentOwner,
}

/// Access tier of a root directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Any authenticated requester.
    Public,
    /// The owner only.
    #[default]
    Private,
    /// The owner and identities connected to the owner.
    Connections,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Connections => "connections",
        }
    }
}

impl AsRef<str> for Visibility {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            "connections" => Ok(Visibility::Connections),
            other => Err(DirectoryError::UnknownVisibility(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubdirectoryKind {
    Theory,
    Lab,
}

impl SubdirectoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubdirectoryKind::Theory => "theory",
            SubdirectoryKind::Lab => "lab",
        }
    }

    /// Suffix appended to the parent's title, e.g. `"Data Structures - Lab"`.
    pub fn title_suffix(&self) -> &'static str {
        match self {
            SubdirectoryKind::Theory => "Theory",
            SubdirectoryKind::Lab => "Lab",
        }
    }
}

impl AsRef<str> for SubdirectoryKind {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for SubdirectoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubdirectoryKind {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "theory" => Ok(SubdirectoryKind::Theory),
            "lab" => Ok(SubdirectoryKind::Lab),
            other => Err(DirectoryError::UnknownSubdirectoryKind(other.to_string())),
        }
    }
}

/// A trimmed, upper-cased course code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CourseCode(String);

impl CourseCode {
    pub fn parse(raw: &str) -> Result<Self, DirectoryError> {
        let code = raw.trim().to_uppercase();
        if code.is_empty() {
            return Err(DirectoryError::MissingCourseCode);
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CourseCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CourseCode {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CourseCode {
    type Error = DirectoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CourseCode> for String {
    fn from(code: CourseCode) -> Self {
        code.0
    }
}

/// A persisted directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    pub id: Uuid,
    pub course_code: CourseCode,
    pub title: String,
    pub owner_id: String,
    /// Stored visibility. Always `Some` for roots and `None` for subdirectories.
    pub visibility: Option<Visibility>,
    pub parent_directory_id: Option<Uuid>,
    pub subdirectory_type: Option<SubdirectoryKind>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Directory {
    pub fn is_subdirectory(&self) -> bool {
        self.parent_directory_id.is_some()
    }

    /// Visibility that applies to this directory right now.
    ///
    /// Roots answer with their stored value. Subdirectories answer with the
    /// parent's stored value; a missing or mismatched parent resolves to
    /// [`Visibility::Private`].
    pub fn effective_visibility(&self, parent: Option<&Directory>) -> Visibility {
        match self.parent_directory_id {
            None => self.visibility.unwrap_or_default(),
            Some(parent_id) => parent
                .filter(|p| p.id == parent_id)
                .and_then(|p| p.visibility)
                .unwrap_or(Visibility::Private),
        }
    }

    /// Case-insensitive prefix match against the course code or the title.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.course_code.as_str().to_lowercase().starts_with(&query)
            || self.title.to_lowercase().starts_with(&query)
    }
}

/// A directory that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDirectory {
    pub id: Uuid,
    pub course_code: CourseCode,
    pub title: String,
    pub owner_id: String,
    pub visibility: Option<Visibility>,
    pub parent_directory_id: Option<Uuid>,
    pub subdirectory_type: Option<SubdirectoryKind>,
}

/// A root together with the subdirectories created alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryPlan {
    pub root: NewDirectory,
    pub subdirectories: Vec<NewDirectory>,
}

impl NewDirectory {
    /// Plan a root directory for a catalog course.
    ///
    /// An empty title falls back to the catalog's course name. When
    /// `with_subdirectories` is set and the course has a lab section, a
    /// Theory/Lab pair is planned under the root.
    pub fn plan_root(
        course: &Course,
        title: Option<&str>,
        owner_id: &str,
        visibility: Visibility,
        with_subdirectories: bool,
    ) -> Result<DirectoryPlan, DirectoryError> {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(course.name.trim())
            .to_string();
        if title.is_empty() {
            return Err(DirectoryError::MissingTitle);
        }

        let root = NewDirectory {
            id: Uuid::new_v4(),
            course_code: course.code.clone(),
            title,
            owner_id: owner_id.to_string(),
            visibility: Some(visibility),
            parent_directory_id: None,
            subdirectory_type: None,
        };

        let subdirectories = if with_subdirectories && course.has_lab {
            [SubdirectoryKind::Theory, SubdirectoryKind::Lab]
                .into_iter()
                .map(|kind| root.child(kind))
                .collect()
        } else {
            Vec::new()
        };

        Ok(DirectoryPlan {
            root,
            subdirectories,
        })
    }

    /// Plan a subdirectory under an existing root owned by `owner_id`.
    pub fn plan_subdirectory(
        parent: &Directory,
        kind: SubdirectoryKind,
        title: Option<&str>,
        owner_id: &str,
    ) -> Result<NewDirectory, DirectoryError> {
        if parent.is_subdirectory() {
            return Err(DirectoryError::NestedSubdirectory);
        }
        if parent.owner_id != owner_id {
            return Err(DirectoryError::NotParentOwner);
        }

        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} - {}", parent.title, kind.title_suffix()));

        Ok(NewDirectory {
            id: Uuid::new_v4(),
            course_code: parent.course_code.clone(),
            title,
            owner_id: parent.owner_id.clone(),
            visibility: None,
            parent_directory_id: Some(parent.id),
            subdirectory_type: Some(kind),
        })
    }

    fn child(&self, kind: SubdirectoryKind) -> NewDirectory {
        NewDirectory {
            id: Uuid::new_v4(),
            course_code: self.course_code.clone(),
            title: format!("{} - {}", self.title, kind.title_suffix()),
            owner_id: self.owner_id.clone(),
            visibility: None,
            parent_directory_id: Some(self.id),
            subdirectory_type: Some(kind),
        }
    }

    /// Stamp timestamps on a planned directory, as the store does on insert.
    pub fn into_directory(self, now: OffsetDateTime) -> Directory {
        Directory {
            id: self.id,
            course_code: self.course_code,
            title: self.title,
            owner_id: self.owner_id,
            visibility: self.visibility,
            parent_directory_id: self.parent_directory_id,
            subdirectory_type: self.subdirectory_type,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(has_lab: bool) -> Course {
        Course {
            code: CourseCode::parse("cse220").unwrap(),
            name: "Data Structures".to_string(),
            has_lab,
        }
    }

    #[test]
    fn test_course_code_normalization() {
        let code = CourseCode::parse("  cse220 ").unwrap();
        assert_eq!(code.as_str(), "CSE220");
        assert_eq!(
            CourseCode::parse("   "),
            Err(DirectoryError::MissingCourseCode)
        );
    }

    #[test]
    fn test_visibility_parse() {
        assert_eq!("Public".parse::<Visibility>(), Ok(Visibility::Public));
        assert_eq!(
            "connections".parse::<Visibility>(),
            Ok(Visibility::Connections)
        );
        assert!(matches!(
            "friends".parse::<Visibility>(),
            Err(DirectoryError::UnknownVisibility(_))
        ));
    }

    #[test]
    fn test_plan_root_with_lab() {
        let plan = NewDirectory::plan_root(
            &course(true),
            Some("  "),
            "user_a",
            Visibility::Public,
            true,
        )
        .unwrap();

        assert_eq!(plan.root.title, "Data Structures");
        assert_eq!(plan.root.visibility, Some(Visibility::Public));
        assert_eq!(plan.subdirectories.len(), 2);

        let theory = &plan.subdirectories[0];
        assert_eq!(theory.title, "Data Structures - Theory");
        assert_eq!(theory.parent_directory_id, Some(plan.root.id));
        assert_eq!(theory.visibility, None);
        assert_eq!(theory.subdirectory_type, Some(SubdirectoryKind::Theory));
        assert_eq!(
            plan.subdirectories[1].subdirectory_type,
            Some(SubdirectoryKind::Lab)
        );
    }

    #[test]
    fn test_plan_root_without_lab_skips_subdirectories() {
        let plan = NewDirectory::plan_root(
            &course(false),
            Some("My notes"),
            "user_a",
            Visibility::Private,
            true,
        )
        .unwrap();
        assert_eq!(plan.root.title, "My notes");
        assert!(plan.subdirectories.is_empty());
    }

    #[test]
    fn test_subdirectory_inherits_parent_visibility() {
        let plan =
            NewDirectory::plan_root(&course(true), None, "user_a", Visibility::Connections, true)
                .unwrap();
        let now = OffsetDateTime::now_utc();
        let mut root = plan.root.into_directory(now);
        let lab = plan.subdirectories[1].clone().into_directory(now);

        assert_eq!(lab.effective_visibility(Some(&root)), Visibility::Connections);

        root.visibility = Some(Visibility::Public);
        assert_eq!(lab.effective_visibility(Some(&root)), Visibility::Public);

        // no parent at hand
        assert_eq!(lab.effective_visibility(None), Visibility::Private);
    }

    #[test]
    fn test_plan_subdirectory_rules() {
        let now = OffsetDateTime::now_utc();
        let plan =
            NewDirectory::plan_root(&course(true), None, "user_a", Visibility::Public, true)
                .unwrap();
        let root = plan.root.into_directory(now);
        let theory = plan.subdirectories[0].clone().into_directory(now);

        let lab =
            NewDirectory::plan_subdirectory(&root, SubdirectoryKind::Lab, None, "user_a").unwrap();
        assert_eq!(lab.title, "Data Structures - Lab");
        assert_eq!(lab.course_code, root.course_code);

        assert_eq!(
            NewDirectory::plan_subdirectory(&root, SubdirectoryKind::Lab, None, "user_b"),
            Err(DirectoryError::NotParentOwner)
        );
        assert_eq!(
            NewDirectory::plan_subdirectory(&theory, SubdirectoryKind::Lab, None, "user_a"),
            Err(DirectoryError::NestedSubdirectory)
        );
    }

    #[test]
    fn test_matches_query_is_prefix() {
        let now = OffsetDateTime::now_utc();
        let dir = NewDirectory::plan_root(&course(false), None, "u", Visibility::Public, false)
            .unwrap()
            .root
            .into_directory(now);

        assert!(dir.matches_query("cse"));
        assert!(dir.matches_query("data"));
        assert!(dir.matches_query(""));
        assert!(!dir.matches_query("220"));
        assert!(!dir.matches_query("structures"));
    }
}
