//! PostgreSQL repository implementations.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use murmur_core::domain::{Comment, CommentItem, FeedItem, FeedScope, Follow, Group, Post, User};
use murmur_core::error::RepoError;
use murmur_core::pagination::{POSTS_PER_PAGE, Page, clamp_page};
use murmur_core::ports::{
    CommentRepository, FollowRepository, GroupRepository, PostRepository, UserRepository,
};

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::follow::{self, Entity as FollowEntity};
use super::entity::group::{self, Entity as GroupEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL group repository.
pub type PostgresGroupRepository = PostgresBaseRepository<GroupEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// PostgreSQL follow repository.
pub type PostgresFollowRepository = PostgresBaseRepository<FollowEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&*self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl GroupRepository for PostgresGroupRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let result = GroupEntity::find()
            .filter(group::Column::Slug.eq(slug))
            .one(&*self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<Group>, RepoError> {
        let result = GroupEntity::find()
            .order_by_asc(group::Column::Title)
            .all(&*self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

/// Batch-load authors and groups for a page of post rows.
async fn load_feed_refs(db: &DbConn, models: Vec<post::Model>) -> Result<Vec<FeedItem>, RepoError> {
    let author_ids: Vec<Uuid> = models
        .iter()
        .map(|m| m.author_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let group_ids: Vec<Uuid> = models
        .iter()
        .filter_map(|m| m.group_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let authors: HashMap<Uuid, User> = if author_ids.is_empty() {
        HashMap::new()
    } else {
        UserEntity::find()
            .filter(user::Column::Id.is_in(author_ids))
            .all(db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?
            .into_iter()
            .map(|m| (m.id, m.into()))
            .collect()
    };

    let groups: HashMap<Uuid, Group> = if group_ids.is_empty() {
        HashMap::new()
    } else {
        GroupEntity::find()
            .filter(group::Column::Id.is_in(group_ids))
            .all(db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?
            .into_iter()
            .map(|m| (m.id, m.into()))
            .collect()
    };

    models
        .into_iter()
        .map(|m| {
            let author = authors
                .get(&m.author_id)
                .cloned()
                .ok_or_else(|| RepoError::Query(format!("author {} missing", m.author_id)))?;
            let group = m.group_id.and_then(|id| groups.get(&id).cloned());
            Ok(FeedItem {
                post: Post::from(m),
                author,
                group,
            })
        })
        .collect()
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn feed_page(&self, scope: FeedScope, page: u64) -> Result<Page<FeedItem>, RepoError> {
        let mut select = PostEntity::find();

        match scope {
            FeedScope::All => {}
            FeedScope::Group(group_id) => {
                select = select.filter(post::Column::GroupId.eq(group_id));
            }
            FeedScope::Author(author_id) => {
                select = select.filter(post::Column::AuthorId.eq(author_id));
            }
            FeedScope::FollowedBy(user_id) => {
                select = select.filter(
                    post::Column::AuthorId.in_subquery(
                        Query::select()
                            .column(follow::Column::AuthorId)
                            .from(FollowEntity)
                            .and_where(follow::Column::UserId.eq(user_id))
                            .to_owned(),
                    ),
                );
            }
        }

        let paginator = select
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .paginate(&*self.db, POSTS_PER_PAGE);

        let totals = paginator
            .num_items_and_pages()
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        let number = clamp_page(page, totals.number_of_pages);
        let models = paginator
            .fetch_page(number - 1)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        let items = load_feed_refs(&*self.db, models).await?;

        Ok(Page {
            items,
            number,
            total_pages: totals.number_of_pages.max(1),
            total_items: totals.number_of_items,
        })
    }

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        PostEntity::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .count(&*self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentItem>, RepoError> {
        let models = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        let author_ids: Vec<Uuid> = models
            .iter()
            .map(|m| m.author_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let authors: HashMap<Uuid, User> = if author_ids.is_empty() {
            HashMap::new()
        } else {
            UserEntity::find()
                .filter(user::Column::Id.is_in(author_ids))
                .all(&*self.db)
                .await
                .map_err(|e| RepoError::Query(e.to_string()))?
                .into_iter()
                .map(|m| (m.id, m.into()))
                .collect()
        };

        models
            .into_iter()
            .map(|m| {
                let author = authors
                    .get(&m.author_id)
                    .cloned()
                    .ok_or_else(|| RepoError::Query(format!("author {} missing", m.author_id)))?;
                Ok(CommentItem {
                    comment: Comment::from(m),
                    author,
                })
            })
            .collect()
    }
}

#[async_trait]
impl FollowRepository for PostgresFollowRepository {
    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let count = FollowEntity::find()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .count(&*self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(count > 0)
    }

    async fn create(&self, entity: Follow) -> Result<Follow, RepoError> {
        let active_model: follow::ActiveModel = entity.into();
        let model = active_model.insert(&*self.db).await.map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn delete(&self, user_id: Uuid, author_id: Uuid) -> Result<(), RepoError> {
        let result = FollowEntity::delete_many()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .exec(&*self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}
