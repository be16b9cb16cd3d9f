use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Group, User};

/// How many characters of the post text serve as its display title.
pub const TITLE_PREVIEW_CHARS: usize = 30;

/// Post entity - an authored text entry, optionally grouped and illustrated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
    pub text: String,
    /// Stored path or URL of an attached image, if any.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post.
    pub fn new(author_id: Uuid, group_id: Option<Uuid>, text: String, image: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            group_id,
            text,
            image,
            created_at: now,
            updated_at: now,
        }
    }

    /// First characters of the text, used as the post title.
    pub fn title_preview(&self) -> String {
        self.text.chars().take(TITLE_PREVIEW_CHARS).collect()
    }
}

/// Filter selecting which posts make up a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    /// Every post on the platform.
    All,
    /// Posts published into one group.
    Group(Uuid),
    /// Posts written by one author.
    Author(Uuid),
    /// Posts written by authors the given user follows.
    FollowedBy(Uuid),
}

/// A feed entry: the post with its author and group eagerly loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItem {
    pub post: Post,
    pub author: User,
    pub group: Option<Group>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_preview_truncates_on_char_boundary() {
        let post = Post::new(Uuid::new_v4(), None, "а".repeat(40), None);
        assert_eq!(post.title_preview().chars().count(), TITLE_PREVIEW_CHARS);

        let short = Post::new(Uuid::new_v4(), None, "hello".into(), None);
        assert_eq!(short.title_preview(), "hello");
    }
}
