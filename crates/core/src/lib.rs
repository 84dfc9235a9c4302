//! Shared data model, adapter traits, and error taxonomy for ReMind.
//!
//! Every other crate in the workspace depends on this one and on nothing
//! else in the workspace above it; it owns no business logic, only the
//! types and contracts the business crates agree on.

pub mod cache;
pub mod context_file;
pub mod conversation;
pub mod display;
pub mod error;
pub mod experience;
pub mod ids;
pub mod memory;
pub mod person;
pub mod traits;

pub use cache::CacheEntry;
pub use context_file::{normalize_key, normalize_topic, ContextEntry, ContextFile};
pub use conversation::{ConversationStats, ConversationTurn, Role};
pub use display::{DisplayMode, DisplayPacket};
pub use error::{RemindError, Result};
pub use experience::{Experience, SceneResult};
pub use ids::new_opaque_id;
pub use memory::{FileType, MemoryRecord, Orientation, ScoredMemory};
pub use person::{FaceCluster, FaceSourceRef, FaceSourceType, Person};
