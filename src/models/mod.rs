//! Record models
//!
//! [`Record`] binds a table through a [`Mapper`] and writes staged
//! [`Candidate`] data. Entity rules are [`BeforeWrite`] policies registered on
//! the record; [`User`] and [`ViewUser`] are the two shipped entities.

pub mod binding;
pub mod candidate;
pub mod mapper;
pub mod policy;
pub mod record;
pub mod user;
pub mod view_user;

pub use binding::Binding;
pub use candidate::Candidate;
pub use mapper::{ChangeTracking, Mapper, Persisted};
pub use policy::{BeforeWrite, PendingWrite, ReadOnly, WriteKind};
pub use record::Record;
pub use user::{User, UserPolicy};
pub use view_user::ViewUser;
