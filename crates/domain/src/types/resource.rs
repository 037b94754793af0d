//! Marketplace resource collections exposed by the backend

use serde::{Deserialize, Serialize};

use crate::impl_wire_name_conversions;

/// REST collection a resource call targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Jobs,
    Gigs,
    Orders,
    Disputes,
    Notifications,
}

impl_wire_name_conversions!(Resource {
    Jobs => "jobs",
    Gigs => "gigs",
    Orders => "orders",
    Disputes => "disputes",
    Notifications => "notifications",
});

impl Resource {
    /// Collection path, e.g. `/jobs`.
    #[must_use]
    pub fn collection_path(self) -> String {
        format!("/{self}")
    }
}

/// Paginated list envelope returned by collection endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
}
