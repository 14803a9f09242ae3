use std::sync::Arc;

use quill_types::models::ClapInfo;

use crate::error::Result;
use crate::port::StoryStore;

/// Per-(story, user) toggle-counter over the persistence port. A clap is
/// set membership, not a counter: the count is always the cardinality of
/// the relation, so it can never drift from the memberships.
pub struct ClapLedger {
    store: Arc<dyn StoryStore>,
}

impl ClapLedger {
    pub fn new(store: Arc<dyn StoryStore>) -> Self {
        Self { store }
    }

    /// Read-modify-write with no compare-and-swap: a user double-submitting
    /// the toggle concurrently can flip twice and land on either parity.
    /// Accepted for a clap feature; concurrent toggles from different users
    /// touch independent rows and are safe.
    pub async fn toggle(&self, story_id: &str, user_id: &str) -> Result<ClapInfo> {
        let current = self.store.clap_info(story_id, user_id).await?;

        if current.is_clapped {
            self.store.remove_clap(story_id, user_id).await?;
            Ok(ClapInfo {
                is_clapped: false,
                claps_count: current.claps_count - 1,
            })
        } else {
            self.store.add_clap(story_id, user_id).await?;
            Ok(ClapInfo {
                is_clapped: true,
                claps_count: current.claps_count + 1,
            })
        }
    }

    /// Standalone count, for listing pages that never resolve a full story.
    pub async fn count(&self, story_id: &str) -> Result<i64> {
        Ok(self.store.clap_count(story_id).await?)
    }
}
