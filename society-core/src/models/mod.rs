//! Documents stored per society.

use uuid::Uuid;

/// A top-level document: addressable by id, owned by one society.
pub trait Document: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
    fn society_id(&self) -> &str;
}

/// `"<prefix>:<uuid>"`
pub fn new_id(prefix: &str) -> String {
    format!("{prefix}:{}", Uuid::new_v4())
}

macro_rules! impl_document {
    ($ty:ty) => {
        impl $crate::models::Document for $ty {
            fn id(&self) -> &str {
                &self.id
            }
            fn society_id(&self) -> &str {
                &self.society_id
            }
        }
    };
}

pub mod billing;
pub mod resident;
pub mod social;
pub mod society;
pub mod visitor;

pub use billing::{Bill, BillStatus, Charge, Frequency, ScheduledBill};
pub use resident::{FlatDetails, Resident, ResidentStatus};
pub use social::{AuthorModel, PostStatus, SocialComment, SocialPost};
pub use society::{ApartmentStructure, Flat, Floor, Society, Structure};
pub use visitor::{VisitorLog, VisitorStatus};
