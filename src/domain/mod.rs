pub mod actor;
pub mod jsonld;
pub mod note;
pub mod record;
pub mod sort;

pub use actor::{Actor, FollowedActor, Image, DEFAULT_ICON};
pub use note::{Attachment, Note};
pub use record::{Activity, ActivityObject, Record};
pub use sort::Sort;
