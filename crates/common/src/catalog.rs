//! # Course catalog
//!
//! Read-only lookup of valid course codes. Directory creation consults the
//! catalog before inserting anything: unknown codes are rejected, the
//! canonical course name fills in a missing title, and `has_lab` decides
//! whether a Theory/Lab pair of subdirectories can be created.
//!
//! The catalog itself is maintained elsewhere. Deployments hand us a TOML
//! file shaped like:
//!
//! ```toml
//! [[courses]]
//! code = "CSE220"
//! name = "Data Structures"
//! has_lab = true
//! ```

use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::path::Path;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::directory::CourseCode;

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub code: CourseCode,
    pub name: String,
    #[serde(default)]
    pub has_lab: bool,
}

#[async_trait]
pub trait CourseCatalog: Send + Sync {
    type Error: Display + Debug + Send;

    /// Look up a course by its normalized code.
    async fn lookup(&self, code: &CourseCode) -> Result<Option<Course>, Self::Error>;
}

/// On-disk catalog format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub courses: Vec<Course>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogFileError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
}

impl CatalogFile {
    pub fn load(path: &Path) -> Result<Self, CatalogFileError> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, CatalogFileError> {
        Ok(toml::from_str(raw)?)
    }
}

/// In-memory catalog
#[derive(Debug, Clone, Default)]
pub struct MemoryCourseCatalog {
    courses: Arc<RwLock<HashMap<CourseCode, Course>>>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryCourseCatalogError {
    #[error("memory catalog error: {0}")]
    Internal(String),
}

impl MemoryCourseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, course: Course) -> Result<(), MemoryCourseCatalogError> {
        let mut courses = self.courses.write().map_err(|e| {
            MemoryCourseCatalogError::Internal(format!("failed to acquire write lock: {}", e))
        })?;
        courses.insert(course.code.clone(), course);
        Ok(())
    }
}

impl From<CatalogFile> for MemoryCourseCatalog {
    fn from(file: CatalogFile) -> Self {
        let courses = file
            .courses
            .into_iter()
            .map(|c| (c.code.clone(), c))
            .collect();
        Self {
            courses: Arc::new(RwLock::new(courses)),
        }
    }
}

#[async_trait]
impl CourseCatalog for MemoryCourseCatalog {
    type Error = MemoryCourseCatalogError;

    async fn lookup(&self, code: &CourseCode) -> Result<Option<Course>, Self::Error> {
        let courses = self.courses.read().map_err(|e| {
            MemoryCourseCatalogError::Internal(format!("failed to acquire read lock: {}", e))
        })?;
        Ok(courses.get(code).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
        [[courses]]
        code = "cse220"
        name = "Data Structures"
        has_lab = true

        [[courses]]
        code = "MAT120"
        name = "Calculus I"
    "#;

    #[test]
    fn test_parse_catalog_file() {
        let file = CatalogFile::parse(CATALOG).unwrap();
        assert_eq!(file.courses.len(), 2);
        // codes are normalized while parsing
        assert_eq!(file.courses[0].code.as_str(), "CSE220");
        assert!(file.courses[0].has_lab);
        assert!(!file.courses[1].has_lab);
    }

    #[test]
    fn test_parse_rejects_empty_code() {
        let result = CatalogFile::parse("[[courses]]\ncode = \" \"\nname = \"x\"\n");
        assert!(matches!(result, Err(CatalogFileError::Parse(_))));
    }

    #[tokio::test]
    async fn test_memory_lookup() {
        let catalog = MemoryCourseCatalog::from(CatalogFile::parse(CATALOG).unwrap());

        let code = CourseCode::parse("Cse220").unwrap();
        let course = catalog.lookup(&code).await.unwrap().unwrap();
        assert_eq!(course.name, "Data Structures");

        let missing = CourseCode::parse("PHY111").unwrap();
        assert!(catalog.lookup(&missing).await.unwrap().is_none());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(&path, CATALOG).unwrap();

        let file = CatalogFile::load(&path).unwrap();
        assert_eq!(file.courses.len(), 2);
        assert!(matches!(
            CatalogFile::load(&dir.path().join("missing.toml")),
            Err(CatalogFileError::Io(_))
        ));
    }
}
