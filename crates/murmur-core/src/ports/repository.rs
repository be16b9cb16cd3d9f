use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Comment, CommentItem, FeedItem, FeedScope, Follow, Group, Post, User};
use crate::error::RepoError;
use crate::pagination::Page;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity.
    async fn create(&self, entity: T) -> Result<T, RepoError>;

    /// Update an existing entity.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific lookups.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
}

/// Group repository.
#[async_trait]
pub trait GroupRepository: BaseRepository<Group, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError>;

    /// All groups, for the post form's group choices.
    async fn list(&self) -> Result<Vec<Group>, RepoError>;
}

/// Post repository: CRUD plus feed assembly.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// One page of the feed selected by `scope`, newest first, with
    /// authors and groups eagerly loaded. Out-of-range page numbers
    /// clamp to the nearest valid page.
    async fn feed_page(&self, scope: FeedScope, page: u64) -> Result<Page<FeedItem>, RepoError>;

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments on a post in insertion order, with authors loaded.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentItem>, RepoError>;
}

/// Follow repository - the directed follower/author edges.
#[async_trait]
pub trait FollowRepository: Send + Sync {
    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError>;

    /// Insert an edge. Returns `RepoError::Constraint` if it already
    /// exists or is a self-follow (backed by the schema constraints).
    async fn create(&self, follow: Follow) -> Result<Follow, RepoError>;

    /// Remove the edge. Returns `RepoError::NotFound` if absent.
    async fn delete(&self, user_id: Uuid, author_id: Uuid) -> Result<(), RepoError>;
}
