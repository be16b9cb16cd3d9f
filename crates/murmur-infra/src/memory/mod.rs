//! In-memory repository backend.
//!
//! Implements every repository port over one shared, locked store.
//! Used as the fallback when `DATABASE_URL` is not configured and as
//! the backend for the server's endpoint tests. Mirrors the schema
//! constraints (unique username/slug/follow pair, no self-follow) so
//! handler behavior matches the PostgreSQL backend.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use murmur_core::domain::{Comment, CommentItem, FeedItem, FeedScope, Follow, Group, Post, User};
use murmur_core::error::RepoError;
use murmur_core::pagination::{POSTS_PER_PAGE, Page, clamp_page};
use murmur_core::ports::{
    BaseRepository, CommentRepository, FollowRepository, GroupRepository, PostRepository,
    UserRepository,
};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    groups: Vec<Group>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    follows: Vec<Follow>,
}

/// Shared in-memory store behind all memory repositories.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

fn constraint(name: &str) -> RepoError {
    RepoError::Constraint(format!("unique constraint violation: {name}"))
}

/// User repository over the shared store.
pub struct MemoryUserRepository {
    store: Arc<MemoryStore>,
}

impl MemoryUserRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for MemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let inner = self.store.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, entity: User) -> Result<User, RepoError> {
        let mut inner = self.store.inner.write().await;
        if inner.users.iter().any(|u| u.username == entity.username) {
            return Err(constraint("users_username_key"));
        }
        inner.users.push(entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: User) -> Result<User, RepoError> {
        let mut inner = self.store.inner.write().await;
        let slot = inner
            .users
            .iter_mut()
            .find(|u| u.id == entity.id)
            .ok_or(RepoError::NotFound)?;
        *slot = entity.clone();
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut inner = self.store.inner.write().await;
        let before = inner.users.len();
        inner.users.retain(|u| u.id != id);
        if inner.users.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let inner = self.store.inner.read().await;
        Ok(inner.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let inner = self.store.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }
}

/// Group repository over the shared store.
pub struct MemoryGroupRepository {
    store: Arc<MemoryStore>,
}

impl MemoryGroupRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BaseRepository<Group, Uuid> for MemoryGroupRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, RepoError> {
        let inner = self.store.inner.read().await;
        Ok(inner.groups.iter().find(|g| g.id == id).cloned())
    }

    async fn create(&self, entity: Group) -> Result<Group, RepoError> {
        let mut inner = self.store.inner.write().await;
        if inner.groups.iter().any(|g| g.slug == entity.slug) {
            return Err(constraint("groups_slug_key"));
        }
        inner.groups.push(entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: Group) -> Result<Group, RepoError> {
        let mut inner = self.store.inner.write().await;
        let slot = inner
            .groups
            .iter_mut()
            .find(|g| g.id == entity.id)
            .ok_or(RepoError::NotFound)?;
        *slot = entity.clone();
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut inner = self.store.inner.write().await;
        let before = inner.groups.len();
        inner.groups.retain(|g| g.id != id);
        if inner.groups.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl GroupRepository for MemoryGroupRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let inner = self.store.inner.read().await;
        Ok(inner.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn list(&self) -> Result<Vec<Group>, RepoError> {
        let inner = self.store.inner.read().await;
        let mut groups = inner.groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }
}

/// Post repository over the shared store.
pub struct MemoryPostRepository {
    store: Arc<MemoryStore>,
}

impl MemoryPostRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for MemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let inner = self.store.inner.read().await;
        Ok(inner.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, entity: Post) -> Result<Post, RepoError> {
        let mut inner = self.store.inner.write().await;
        inner.posts.push(entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: Post) -> Result<Post, RepoError> {
        let mut inner = self.store.inner.write().await;
        let slot = inner
            .posts
            .iter_mut()
            .find(|p| p.id == entity.id)
            .ok_or(RepoError::NotFound)?;
        *slot = entity.clone();
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut inner = self.store.inner.write().await;
        let before = inner.posts.len();
        inner.posts.retain(|p| p.id != id);
        if inner.posts.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for MemoryPostRepository {
    async fn feed_page(&self, scope: FeedScope, page: u64) -> Result<Page<FeedItem>, RepoError> {
        let inner = self.store.inner.read().await;

        let mut posts: Vec<&Post> = match scope {
            FeedScope::All => inner.posts.iter().collect(),
            FeedScope::Group(group_id) => inner
                .posts
                .iter()
                .filter(|p| p.group_id == Some(group_id))
                .collect(),
            FeedScope::Author(author_id) => inner
                .posts
                .iter()
                .filter(|p| p.author_id == author_id)
                .collect(),
            FeedScope::FollowedBy(user_id) => {
                let followed: Vec<Uuid> = inner
                    .follows
                    .iter()
                    .filter(|f| f.user_id == user_id)
                    .map(|f| f.author_id)
                    .collect();
                inner
                    .posts
                    .iter()
                    .filter(|p| followed.contains(&p.author_id))
                    .collect()
            }
        };

        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let total_items = posts.len() as u64;
        let total_pages = total_items.div_ceil(POSTS_PER_PAGE);
        let number = clamp_page(page, total_pages);

        let start = ((number - 1) * POSTS_PER_PAGE) as usize;
        let items = posts
            .into_iter()
            .skip(start)
            .take(POSTS_PER_PAGE as usize)
            .map(|p| {
                let author = inner
                    .users
                    .iter()
                    .find(|u| u.id == p.author_id)
                    .cloned()
                    .ok_or_else(|| RepoError::Query(format!("author {} missing", p.author_id)))?;
                let group = p
                    .group_id
                    .and_then(|id| inner.groups.iter().find(|g| g.id == id).cloned());
                Ok(FeedItem {
                    post: p.clone(),
                    author,
                    group,
                })
            })
            .collect::<Result<Vec<_>, RepoError>>()?;

        Ok(Page {
            items,
            number,
            total_pages: total_pages.max(1),
            total_items,
        })
    }

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        let inner = self.store.inner.read().await;
        Ok(inner.posts.iter().filter(|p| p.author_id == author_id).count() as u64)
    }
}

/// Comment repository over the shared store.
pub struct MemoryCommentRepository {
    store: Arc<MemoryStore>,
}

impl MemoryCommentRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for MemoryCommentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        let inner = self.store.inner.read().await;
        Ok(inner.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn create(&self, entity: Comment) -> Result<Comment, RepoError> {
        let mut inner = self.store.inner.write().await;
        inner.comments.push(entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: Comment) -> Result<Comment, RepoError> {
        let mut inner = self.store.inner.write().await;
        let slot = inner
            .comments
            .iter_mut()
            .find(|c| c.id == entity.id)
            .ok_or(RepoError::NotFound)?;
        *slot = entity.clone();
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut inner = self.store.inner.write().await;
        let before = inner.comments.len();
        inner.comments.retain(|c| c.id != id);
        if inner.comments.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for MemoryCommentRepository {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentItem>, RepoError> {
        let inner = self.store.inner.read().await;
        inner
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| {
                let author = inner
                    .users
                    .iter()
                    .find(|u| u.id == c.author_id)
                    .cloned()
                    .ok_or_else(|| RepoError::Query(format!("author {} missing", c.author_id)))?;
                Ok(CommentItem {
                    comment: c.clone(),
                    author,
                })
            })
            .collect()
    }
}

/// Follow repository over the shared store.
pub struct MemoryFollowRepository {
    store: Arc<MemoryStore>,
}

impl MemoryFollowRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl FollowRepository for MemoryFollowRepository {
    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let inner = self.store.inner.read().await;
        Ok(inner
            .follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id))
    }

    async fn create(&self, follow: Follow) -> Result<Follow, RepoError> {
        let mut inner = self.store.inner.write().await;
        if follow.user_id == follow.author_id {
            return Err(RepoError::Constraint(
                "check constraint violation: follows_no_self_follow".to_string(),
            ));
        }
        if inner
            .follows
            .iter()
            .any(|f| f.user_id == follow.user_id && f.author_id == follow.author_id)
        {
            return Err(constraint("follows_user_id_author_id_key"));
        }
        inner.follows.push(follow.clone());
        Ok(follow)
    }

    async fn delete(&self, user_id: Uuid, author_id: Uuid) -> Result<(), RepoError> {
        let mut inner = self.store.inner.write().await;
        let before = inner.follows.len();
        inner
            .follows
            .retain(|f| !(f.user_id == user_id && f.author_id == author_id));
        if inner.follows.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
