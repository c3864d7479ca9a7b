//! # Resources
//!
//! A resource is either an uploaded file or a linked YouTube video attached
//! to a directory. File bytes live with an external storage provider; we
//! only keep the URL and metadata it hands back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use url::Url;
use uuid::Uuid;

use crate::vote::VoteSets;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("title is required")]
    MissingTitle,
    #[error("file url is required")]
    MissingFileUrl,
    #[error("a valid youtube url is required")]
    InvalidYoutubeUrl,
    #[error("unknown resource kind: {0}")]
    UnknownKind(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    File,
    Youtube,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::File => "file",
            ResourceKind::Youtube => "youtube",
        }
    }
}

impl AsRef<str> for ResourceKind {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(ResourceKind::File),
            "youtube" => Ok(ResourceKind::Youtube),
            other => Err(ResourceError::UnknownKind(other.to_string())),
        }
    }
}

/// Metadata returned by the storage provider for an uploaded file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YoutubeLink {
    pub url: String,
    pub video_id: String,
}

impl YoutubeLink {
    pub fn parse(url: &str) -> Result<Self, ResourceError> {
        let url = url.trim();
        let video_id = extract_youtube_id(url).ok_or(ResourceError::InvalidYoutubeUrl)?;
        Ok(Self {
            url: url.to_string(),
            video_id,
        })
    }
}

/// Pull the video id out of `youtu.be/<id>`, `youtube.com/watch?v=<id>` or
/// `youtube.com/shorts/<id>` links.
pub fn extract_youtube_id(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);

    let id = if host == "youtu.be" {
        url.path_segments()?.next().map(str::to_string)
    } else if host == "youtube.com" || host.ends_with(".youtube.com") {
        if url.path() == "/watch" {
            url.query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())
        } else {
            let mut segments = url.path_segments()?;
            match segments.next() {
                Some("shorts") => segments.next().map(str::to_string),
                _ => None,
            }
        }
    } else {
        None
    };

    id.filter(|id| !id.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResourceContent {
    File { file: FileAttachment },
    Youtube { youtube: YoutubeLink },
}

impl ResourceContent {
    /// Build content from loosely-typed request parts.
    ///
    /// Without an explicit kind, a present YouTube url selects
    /// [`ResourceKind::Youtube`] and anything else is treated as a file.
    pub fn from_parts(
        kind: Option<ResourceKind>,
        file: Option<FileAttachment>,
        youtube_url: Option<&str>,
    ) -> Result<Self, ResourceError> {
        let youtube_url = youtube_url.map(str::trim).filter(|u| !u.is_empty());
        let kind = kind.unwrap_or(if youtube_url.is_some() {
            ResourceKind::Youtube
        } else {
            ResourceKind::File
        });

        match kind {
            ResourceKind::File => {
                let file = file
                    .filter(|f| !f.url.trim().is_empty())
                    .ok_or(ResourceError::MissingFileUrl)?;
                Ok(ResourceContent::File { file })
            }
            ResourceKind::Youtube => {
                let url = youtube_url.ok_or(ResourceError::InvalidYoutubeUrl)?;
                Ok(ResourceContent::Youtube {
                    youtube: YoutubeLink::parse(url)?,
                })
            }
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceContent::File { .. } => ResourceKind::File,
            ResourceContent::Youtube { .. } => ResourceKind::Youtube,
        }
    }

    pub fn original_name(&self) -> Option<&str> {
        match self {
            ResourceContent::File { file } => file.original_name.as_deref(),
            ResourceContent::Youtube { .. } => None,
        }
    }
}

/// A resource that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResource {
    pub id: Uuid,
    pub directory_id: Uuid,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub content: ResourceContent,
}

impl NewResource {
    pub fn new(
        directory_id: Uuid,
        owner_id: &str,
        title: &str,
        description: Option<&str>,
        content: ResourceContent,
    ) -> Result<Self, ResourceError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ResourceError::MissingTitle);
        }
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        Ok(Self {
            id: Uuid::new_v4(),
            directory_id,
            owner_id: owner_id.to_string(),
            title: title.to_string(),
            description,
            content,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub directory_id: Uuid,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(flatten)]
    pub content: ResourceContent,
    #[serde(skip)]
    pub votes: VoteSets,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Resource {
    /// Case-insensitive prefix match against any word of the title, the
    /// description or the file's original name.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        let fields = [
            Some(self.title.as_str()),
            self.description.as_deref(),
            self.content.original_name(),
        ];
        fields.into_iter().flatten().any(|field| {
            field
                .to_lowercase()
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| word.starts_with(&query))
                || field.to_lowercase().starts_with(&query)
        })
    }
}

/// Listing order for a directory's resources: most upvoted first, then by
/// score, then newest.
pub fn compare_for_listing(a: &Resource, b: &Resource) -> std::cmp::Ordering {
    b.votes
        .up()
        .cmp(&a.votes.up())
        .then_with(|| b.votes.score().cmp(&a.votes.score()))
        .then_with(|| b.created_at.cmp(&a.created_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vote::Vote;
    use time::Duration;

    #[test]
    fn test_extract_youtube_id() {
        let cases = [
            ("https://youtu.be/dQw4w9WgXcQ", Some("dQw4w9WgXcQ")),
            ("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42", Some("dQw4w9WgXcQ")),
            ("https://m.youtube.com/watch?v=abc123", Some("abc123")),
            ("https://youtube.com/shorts/xyz789", Some("xyz789")),
            ("https://youtube.com/channel/abc", None),
            ("https://youtu.be/", None),
            ("https://vimeo.com/123", None),
            ("not a url", None),
        ];
        for (input, expected) in cases {
            assert_eq!(extract_youtube_id(input).as_deref(), expected, "{}", input);
        }
    }

    #[test]
    fn test_content_from_parts() {
        let content =
            ResourceContent::from_parts(None, None, Some("https://youtu.be/abc")).unwrap();
        assert_eq!(content.kind(), ResourceKind::Youtube);

        assert_eq!(
            ResourceContent::from_parts(None, None, None),
            Err(ResourceError::MissingFileUrl)
        );
        assert_eq!(
            ResourceContent::from_parts(
                Some(ResourceKind::Youtube),
                None,
                Some("https://example.com/video")
            ),
            Err(ResourceError::InvalidYoutubeUrl)
        );

        let file = FileAttachment {
            url: "https://cdn.example.com/notes.pdf".to_string(),
            original_name: Some("notes.pdf".to_string()),
            ..Default::default()
        };
        let content = ResourceContent::from_parts(Some(ResourceKind::File), Some(file), None)
            .unwrap();
        assert_eq!(content.original_name(), Some("notes.pdf"));
    }

    #[test]
    fn test_new_resource_trims() {
        let content =
            ResourceContent::from_parts(None, None, Some("https://youtu.be/abc")).unwrap();
        let dir = Uuid::new_v4();

        let resource =
            NewResource::new(dir, "u", "  Lecture 1 ", Some("   "), content.clone()).unwrap();
        assert_eq!(resource.title, "Lecture 1");
        assert_eq!(resource.description, None);

        assert_eq!(
            NewResource::new(dir, "u", " ", None, content),
            Err(ResourceError::MissingTitle)
        );
    }

    fn resource(title: &str, up: usize, down: usize, age_minutes: i64) -> Resource {
        let votes = (0..up)
            .map(|i| (format!("up{}", i), Vote::Up))
            .chain((0..down).map(|i| (format!("down{}", i), Vote::Down)));
        Resource {
            id: Uuid::new_v4(),
            directory_id: Uuid::new_v4(),
            owner_id: "owner".to_string(),
            title: title.to_string(),
            description: Some("Week two slides".to_string()),
            content: ResourceContent::File {
                file: FileAttachment {
                    url: "https://cdn.example.com/f".to_string(),
                    original_name: Some("graphs_intro.pdf".to_string()),
                    ..Default::default()
                },
            },
            votes: VoteSets::from_votes(votes),
            created_at: OffsetDateTime::now_utc() - Duration::minutes(age_minutes),
        }
    }

    #[test]
    fn test_matches_query() {
        let r = resource("Binary Trees", 0, 0, 0);
        assert!(r.matches_query("tree"));
        assert!(r.matches_query("BIN"));
        assert!(r.matches_query("slides"));
        assert!(r.matches_query("graphs"));
        assert!(!r.matches_query("inary"));
    }

    #[test]
    fn test_listing_order() {
        let mut items = vec![
            resource("old popular", 2, 0, 60),
            resource("new popular", 2, 0, 1),
            resource("controversial", 2, 2, 0),
            resource("quiet", 0, 0, 0),
            resource("top", 3, 1, 120),
        ];
        items.sort_by(compare_for_listing);
        let titles: Vec<_> = items.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            ["top", "new popular", "old popular", "controversial", "quiet"]
        );
    }
}
