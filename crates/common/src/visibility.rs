use crate::connection::ConnectionGraph;
use crate::directory::{Directory, Visibility};

/// Decides whether a requester may see a directory's contents.
///
/// Rules, in order:
///
/// 1. the owner always sees their own directories
/// 2. `public` is visible to any authenticated requester
/// 3. `connections` is visible when the requester and the owner are
///    connected, either through an accepted edge or the legacy email lists
/// 4. anything else is denied
///
/// Subdirectories are checked against their parent's stored visibility, so
/// callers must hand in the parent when checking one. The resolver has no
/// side effects; graph lookup failures are returned to the caller.
pub struct VisibilityResolver<'g, G> {
    graph: &'g G,
}

impl<'g, G: ConnectionGraph> VisibilityResolver<'g, G> {
    pub fn new(graph: &'g G) -> Self {
        Self { graph }
    }

    pub async fn can_view(
        &self,
        directory: &Directory,
        parent: Option<&Directory>,
        requester_id: &str,
    ) -> Result<bool, G::Error> {
        if requester_id.is_empty() {
            return Ok(false);
        }
        if directory.owner_id == requester_id {
            return Ok(true);
        }

        match directory.effective_visibility(parent) {
            Visibility::Public => Ok(true),
            Visibility::Private => Ok(false),
            Visibility::Connections => {
                self.graph
                    .are_connected(requester_id, &directory.owner_id)
                    .await
            }
        }
    }

    /// Whether the requester may add resources to the directory.
    ///
    /// Public directories accept uploads from anyone; every other tier
    /// accepts them from the owner only.
    pub fn can_upload(
        &self,
        directory: &Directory,
        parent: Option<&Directory>,
        requester_id: &str,
    ) -> bool {
        if requester_id.is_empty() {
            return false;
        }
        directory.owner_id == requester_id
            || directory.effective_visibility(parent) == Visibility::Public
    }
}
