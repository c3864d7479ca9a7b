use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::directory::Directory;

pub const DEFAULT_PAGE_LIMIT: u32 = 12;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Ordering for directory listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectorySort {
    #[default]
    CodeAsc,
    CodeDesc,
    TitleAsc,
    TitleDesc,
    Newest,
    Oldest,
}

impl DirectorySort {
    pub fn compare(&self, a: &Directory, b: &Directory) -> Ordering {
        let by_code = || a.course_code.cmp(&b.course_code);
        let by_title = || a.title.to_lowercase().cmp(&b.title.to_lowercase());
        match self {
            DirectorySort::CodeAsc => by_code().then_with(by_title),
            DirectorySort::CodeDesc => by_code().reverse().then_with(by_title),
            DirectorySort::TitleAsc => by_title().then_with(by_code),
            DirectorySort::TitleDesc => by_title().reverse().then_with(by_code),
            DirectorySort::Newest => b.created_at.cmp(&a.created_at),
            DirectorySort::Oldest => a.created_at.cmp(&b.created_at),
        }
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("unknown sort order: {0}")]
pub struct UnknownSort(pub String);

impl FromStr for DirectorySort {
    type Err = UnknownSort;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "code_asc" => Ok(DirectorySort::CodeAsc),
            "code_desc" => Ok(DirectorySort::CodeDesc),
            "title_asc" => Ok(DirectorySort::TitleAsc),
            "title_desc" => Ok(DirectorySort::TitleDesc),
            "newest" => Ok(DirectorySort::Newest),
            "oldest" => Ok(DirectorySort::Oldest),
            other => Err(UnknownSort(other.to_string())),
        }
    }
}

/// Requested page, clamped to sane bounds on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Page numbers below 1 become 1; limits are clamped to `1..=100`.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(DEFAULT_PAGE_LIMIT)
                .clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }

    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len() as u64;
        let items = items
            .into_iter()
            .skip(self.offset())
            .take(self.limit as usize)
            .collect();
        Page {
            items,
            page: self.page,
            limit: self.limit,
            total,
            total_pages: total.div_ceil(self.limit as u64),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Course;
    use crate::directory::{CourseCode, NewDirectory, Visibility};
    use time::{Duration, OffsetDateTime};

    #[test]
    fn test_page_request_clamps() {
        assert_eq!(PageRequest::new(None, None), PageRequest::default());
        assert_eq!(PageRequest::new(Some(0), Some(0)), PageRequest { page: 1, limit: 1 });
        assert_eq!(PageRequest::new(Some(3), Some(500)).limit, MAX_PAGE_LIMIT);
    }

    #[test]
    fn test_paginate() {
        let page = PageRequest::new(Some(2), Some(4)).paginate((0..10).collect::<Vec<_>>());
        assert_eq!(page.items, vec![4, 5, 6, 7]);
        assert_eq!(page.total, 10);
        assert_eq!(page.total_pages, 3);

        let past_end = PageRequest::new(Some(9), Some(4)).paginate((0..10).collect::<Vec<_>>());
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total_pages, 3);

        let empty = PageRequest::default().paginate(Vec::<u8>::new());
        assert_eq!(empty.total_pages, 0);
    }

    fn dir(code: &str, title: &str, age_minutes: i64) -> Directory {
        let course = Course {
            code: CourseCode::parse(code).unwrap(),
            name: title.to_string(),
            has_lab: false,
        };
        NewDirectory::plan_root(&course, None, "u", Visibility::Public, false)
            .unwrap()
            .root
            .into_directory(OffsetDateTime::now_utc() - Duration::minutes(age_minutes))
    }

    #[test]
    fn test_sorts() {
        let dirs = vec![
            dir("MAT120", "calculus", 5),
            dir("CSE220", "Data Structures", 10),
            dir("CSE110", "Programming", 1),
        ];
        let sorted = |sort: DirectorySort| {
            let mut d = dirs.clone();
            d.sort_by(|a, b| sort.compare(a, b));
            d.into_iter()
                .map(|d| d.course_code.to_string())
                .collect::<Vec<_>>()
        };

        assert_eq!(sorted(DirectorySort::CodeAsc), ["CSE110", "CSE220", "MAT120"]);
        assert_eq!(sorted(DirectorySort::CodeDesc), ["MAT120", "CSE220", "CSE110"]);
        assert_eq!(sorted(DirectorySort::TitleAsc), ["MAT120", "CSE220", "CSE110"]);
        assert_eq!(sorted(DirectorySort::TitleDesc), ["CSE110", "CSE220", "MAT120"]);
        assert_eq!(sorted(DirectorySort::Newest), ["CSE110", "MAT120", "CSE220"]);
        assert_eq!(sorted(DirectorySort::Oldest), ["CSE220", "MAT120", "CSE110"]);
    }

    #[test]
    fn test_sort_parses_from_query_value() {
        let sort: DirectorySort = serde_json::from_str("\"title_desc\"").unwrap();
        assert_eq!(sort, DirectorySort::TitleDesc);
        assert_eq!("Newest".parse::<DirectorySort>().unwrap(), DirectorySort::Newest);
        assert!("popular".parse::<DirectorySort>().is_err());
    }
}
