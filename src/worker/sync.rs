//! Background sync tags

/// Tag that refreshes the external resource list
pub const REFRESH_EXTERNAL_TAG: &str = "refresh-external";

/// Work triggered by a background sync event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTask {
    /// Refetch every external resource into the dynamic partition
    RefreshExternal,
}

impl SyncTask {
    /// Parse a sync tag; unknown tags are `None`
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            REFRESH_EXTERNAL_TAG => Some(Self::RefreshExternal),
            _ => None,
        }
    }
}
