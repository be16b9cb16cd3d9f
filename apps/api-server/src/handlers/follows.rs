//! Follow graph handlers.

use actix_web::{HttpResponse, web};

use murmur_core::domain::{FeedScope, Follow};
use murmur_core::error::RepoError;
use murmur_shared::dto::FeedPage;

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

use super::{PageQuery, redirect};

/// GET /follow/
///
/// Feed restricted to posts by authors the current user follows.
pub async fn follow_index(
    identity: Identity,
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state
        .posts
        .feed_page(FeedScope::FollowedBy(identity.user_id), query.number())
        .await?;

    Ok(HttpResponse::Ok().json(FeedPage::from(&page)))
}

/// POST /profile/{username}/follow/
///
/// Idempotent: an existing edge or a self-follow is a no-op that lands
/// back on the global feed; a new edge lands on the follow feed.
pub async fn profile_follow(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let username = path.into_inner();
    let author = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user '{username}' not found")))?;

    if author.id == identity.user_id {
        return Ok(redirect("/"));
    }

    if state.follows.exists(identity.user_id, author.id).await? {
        return Ok(redirect("/"));
    }

    match state
        .follows
        .create(Follow::new(identity.user_id, author.id))
        .await
    {
        Ok(_) => {
            tracing::info!(follower = %identity.username, author = %author.username, "Follow created");
            Ok(redirect("/follow/"))
        }
        // Lost a race against a concurrent identical follow; the edge
        // exists either way.
        Err(RepoError::Constraint(_)) => Ok(redirect("/")),
        Err(e) => Err(e.into()),
    }
}

/// POST /profile/{username}/unfollow/
///
/// 404 when no edge exists.
pub async fn profile_unfollow(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let username = path.into_inner();
    let author = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user '{username}' not found")))?;

    state
        .follows
        .delete(identity.user_id, author.id)
        .await
        .map_err(|e| match e {
            RepoError::NotFound => {
                AppError::NotFound(format!("not following '{}'", author.username))
            }
            other => other.into(),
        })?;

    tracing::info!(follower = %identity.username, author = %author.username, "Follow removed");
    Ok(redirect("/"))
}
