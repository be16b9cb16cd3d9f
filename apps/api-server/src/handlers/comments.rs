//! Comment handlers.

use actix_web::{HttpResponse, web};

use murmur_core::domain::Comment;
use murmur_shared::forms::CommentFormData;

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

use super::posts::parse_post_id;
use super::redirect;

/// POST /posts/{post_id}/comment/
///
/// Valid submissions land back on the detail page; invalid ones get
/// their field errors back instead of being silently dropped.
pub async fn add_comment(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Form<CommentFormData>,
) -> AppResult<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let post = state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {post_id} not found")))?;

    let valid = form.validate().map_err(AppError::Validation)?;

    let comment = Comment::new(post.id, identity.user_id, valid.text);
    state.comments.create(comment).await?;
    tracing::info!(post_id = %post.id, author = %identity.username, "Comment added");

    Ok(redirect(format!("/posts/{post_id}/")))
}
