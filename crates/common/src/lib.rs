/**
 * Course catalog lookup: canonical course codes,
 *  names and lab-section existence.
 */
pub mod catalog;
/**
 * Undirected "friend" edges between identities,
 *  plus the legacy mirrored email lists still
 *  found on older user records.
 */
pub mod connection;
/**
 * Folder entities scoping resources to a course
 *  and an owner, and how they are created.
 */
pub mod directory;
/**
 * Pagination and ordering for listings.
 */
pub mod page;
/**
 * Uploaded files and linked videos attached
 *  to a directory.
 */
pub mod resource;
/**
 * Helper for reporting build version information
 *  captured at compile time.
 */
pub mod version;
/**
 * Decides who may see a directory's contents.
 */
pub mod visibility;
/**
 * Single-vote-per-user up/down aggregation.
 */
pub mod vote;

pub mod prelude {
    pub use crate::catalog::{Course, CourseCatalog, MemoryCourseCatalog};
    pub use crate::connection::{ConnectionGraph, ConnectionStatus, MemoryConnectionGraph};
    pub use crate::directory::{
        CourseCode, Directory, DirectoryError, NewDirectory, SubdirectoryKind, Visibility,
    };
    pub use crate::page::{DirectorySort, Page, PageRequest};
    pub use crate::resource::{NewResource, Resource, ResourceContent, ResourceError, ResourceKind};
    pub use crate::version::build_info;
    pub use crate::visibility::VisibilityResolver;
    pub use crate::vote::{Vote, VoteAction, VoteSets, VoteTally};
}
