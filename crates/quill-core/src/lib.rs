//! Story lifecycle core: the draft/publish state machine, content
//! inspection, scoped story lookup, and clap toggling, defined against an
//! abstract persistence port so the web and storage layers stay swappable.

pub mod claps;
pub mod collection;
pub mod content;
pub mod error;
pub mod port;
pub mod story;

pub use claps::ClapLedger;
pub use collection::StoryCollection;
pub use error::{Result, StoryError};
pub use port::{StoryStore, StoryUpdate};
pub use story::{CommentDraft, DraftEdits, PublishEdits, Story};
