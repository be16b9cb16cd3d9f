//! Author profile handler.

use actix_web::{HttpResponse, web};

use murmur_core::domain::FeedScope;
use murmur_shared::dto::{AuthorView, PageMeta, PostView, ProfilePage};

use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

use super::PageQuery;

/// GET /profile/{username}/
///
/// Public: guests see `following: false`.
pub async fn profile(
    identity: OptionalIdentity,
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let username = path.into_inner();
    let author = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user '{username}' not found")))?;

    let following = match identity.0 {
        Some(viewer) => state.follows.exists(viewer.user_id, author.id).await?,
        None => false,
    };

    let page = state
        .posts
        .feed_page(FeedScope::Author(author.id), query.number())
        .await?;
    let post_count = state.posts.count_by_author(author.id).await?;

    Ok(HttpResponse::Ok().json(ProfilePage {
        author: AuthorView::from(&author),
        post_count,
        following,
        page: PageMeta::from(&page),
        posts: page.items.iter().map(PostView::from).collect(),
    }))
}
