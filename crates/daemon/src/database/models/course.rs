use async_trait::async_trait;
use sqlx::FromRow;

use common::prelude::{Course, CourseCatalog, CourseCode};

use crate::database::types::DText;
use crate::database::Database;

#[derive(FromRow)]
struct CourseRow {
    course_code: DText<CourseCode>,
    course_name: String,
    has_lab: bool,
}

impl From<CourseRow> for Course {
    fn from(row: CourseRow) -> Self {
        Course {
            code: row.course_code.into_inner(),
            name: row.course_name,
            has_lab: row.has_lab,
        }
    }
}

impl Database {
    /// Load catalog entries, replacing the name and lab flag of codes
    /// already present. Returns the number of entries written.
    pub async fn import_courses(&self, courses: &[Course]) -> Result<usize, sqlx::Error> {
        let mut tx = self.begin_write().await?;

        for course in courses {
            sqlx::query(
                r#"
                INSERT INTO courses (course_code, course_name, has_lab)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(course_code) DO UPDATE SET
                    course_name = excluded.course_name,
                    has_lab = excluded.has_lab
                "#,
            )
            .bind(DText(&course.code))
            .bind(&course.name)
            .bind(course.has_lab)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(courses.len())
    }

    pub async fn list_courses(&self) -> Result<Vec<Course>, sqlx::Error> {
        let rows = sqlx::query_as::<_, CourseRow>(
            "SELECT course_code, course_name, has_lab FROM courses ORDER BY course_code",
        )
        .fetch_all(&**self)
        .await?;
        Ok(rows.into_iter().map(Course::from).collect())
    }
}

#[async_trait]
impl CourseCatalog for Database {
    type Error = sqlx::Error;

    async fn lookup(&self, code: &CourseCode) -> Result<Option<Course>, Self::Error> {
        let row = sqlx::query_as::<_, CourseRow>(
            r#"
            SELECT course_code, course_name, has_lab
            FROM courses
            WHERE course_code = ?1
            "#,
        )
        .bind(DText(code))
        .fetch_optional(&**self)
        .await?;
        Ok(row.map(Course::from))
    }
}
