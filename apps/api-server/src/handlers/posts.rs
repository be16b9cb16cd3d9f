//! Feed and post handlers.

use std::time::Duration;

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use murmur_core::domain::{FeedScope, Group, Post};
use murmur_shared::dto::{
    FeedPage, GroupChoice, GroupPage, GroupView, PageMeta, PostDetail, PostFormView, PostView,
};
use murmur_shared::forms::{FieldError, FieldErrors, PostFormData, ValidPost};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

use super::{PageQuery, redirect};

/// How long rendered pages of the global feed stay cached.
const INDEX_CACHE_TTL: Duration = Duration::from_secs(20);

/// GET /
///
/// The global feed. Whole pages are cached for a short window, so a
/// freshly created post may take up to the TTL to appear here.
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let number = query.number();
    let cache_key = format!("index:page:{number}");

    if let Some(cached) = state.cache.get(&cache_key).await {
        tracing::debug!(page = number, "Serving index feed from cache");
        return Ok(HttpResponse::Ok()
            .content_type("application/json")
            .body(cached));
    }

    let page = state.posts.feed_page(FeedScope::All, number).await?;
    let body = serde_json::to_string(&FeedPage::from(&page))?;

    if let Err(e) = state
        .cache
        .set(&cache_key, &body, Some(INDEX_CACHE_TTL))
        .await
    {
        tracing::warn!("Failed to cache index feed: {}", e);
    }

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(body))
}

/// GET /group/{slug}/
pub async fn group_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let group = state
        .groups
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("group '{slug}' not found")))?;

    let page = state
        .posts
        .feed_page(FeedScope::Group(group.id), query.number())
        .await?;

    Ok(HttpResponse::Ok().json(GroupPage {
        group: GroupView::from(&group),
        page: PageMeta::from(&page),
        posts: page.items.iter().map(PostView::from).collect(),
    }))
}

pub(crate) fn parse_post_id(raw: &str) -> AppResult<Uuid> {
    raw.parse::<Uuid>()
        .map_err(|_| AppError::NotFound(format!("post '{raw}' not found")))
}

/// GET /posts/{post_id}/
pub async fn post_detail(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let post = state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {post_id} not found")))?;

    let author = state
        .users
        .find_by_id(post.author_id)
        .await?
        .ok_or_else(|| AppError::Internal("post author missing".to_string()))?;
    let group = match post.group_id {
        Some(group_id) => state.groups.find_by_id(group_id).await?,
        None => None,
    };

    let author_post_count = state.posts.count_by_author(author.id).await?;
    let comments = state.comments.list_for_post(post.id).await?;

    let title = post.title_preview();
    let item = murmur_core::domain::FeedItem {
        post,
        author,
        group,
    };

    Ok(HttpResponse::Ok().json(PostDetail {
        post: PostView::from(&item),
        title,
        author_post_count,
        comments: comments.iter().map(Into::into).collect(),
        form: Default::default(),
    }))
}

async fn group_choices(state: &AppState) -> AppResult<Vec<GroupChoice>> {
    Ok(state
        .groups
        .list()
        .await?
        .iter()
        .map(GroupChoice::from)
        .collect())
}

fn form_view(
    is_edit: bool,
    data: &PostFormData,
    groups: Vec<GroupChoice>,
    errors: FieldErrors,
) -> PostFormView {
    PostFormView {
        is_edit,
        text: data.text.clone(),
        group: data.group.clone(),
        image: data.image.clone(),
        groups,
        errors,
    }
}

/// Validate the form and resolve the chosen group, if any.
async fn validate_submission(
    state: &AppState,
    data: &PostFormData,
) -> AppResult<Result<(ValidPost, Option<Group>), FieldErrors>> {
    let valid = match data.validate() {
        Ok(valid) => valid,
        Err(errors) => return Ok(Err(errors)),
    };

    let group = match valid.group_id {
        Some(group_id) => match state.groups.find_by_id(group_id).await? {
            Some(group) => Some(group),
            None => {
                return Ok(Err(vec![FieldError::new("group", "Select a valid group.")]));
            }
        },
        None => None,
    };

    Ok(Ok((valid, group)))
}

/// GET /create/
pub async fn post_create_form(
    _identity: Identity,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let groups = group_choices(&state).await?;
    Ok(HttpResponse::Ok().json(form_view(
        false,
        &PostFormData::default(),
        groups,
        FieldErrors::new(),
    )))
}

/// POST /create/
///
/// On success the author lands on their own profile.
pub async fn post_create(
    identity: Identity,
    state: web::Data<AppState>,
    form: web::Form<PostFormData>,
) -> AppResult<HttpResponse> {
    let data = form.into_inner();
    let (valid, group) = match validate_submission(&state, &data).await? {
        Ok(ok) => ok,
        Err(errors) => {
            let groups = group_choices(&state).await?;
            return Ok(HttpResponse::Ok().json(form_view(false, &data, groups, errors)));
        }
    };

    let post = Post::new(
        identity.user_id,
        group.as_ref().map(|g| g.id),
        valid.text,
        valid.image,
    );
    let post = state.posts.create(post).await?;
    tracing::info!(post_id = %post.id, author = %identity.username, "Post created");

    Ok(redirect(format!("/profile/{}/", identity.username)))
}

/// GET /posts/{post_id}/edit/
///
/// Only the author may edit; anyone else is sent to the read-only
/// detail page.
pub async fn post_edit_form(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let post = state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {post_id} not found")))?;

    if post.author_id != identity.user_id {
        return Ok(redirect(format!("/posts/{post_id}/")));
    }

    let groups = group_choices(&state).await?;
    let data = PostFormData {
        text: post.text.clone(),
        group: post.group_id.map(|id| id.to_string()),
        image: post.image.clone(),
    };
    Ok(HttpResponse::Ok().json(form_view(true, &data, groups, FieldErrors::new())))
}

/// POST /posts/{post_id}/edit/
///
/// Mutates text and group only; authorship and image are preserved.
pub async fn post_edit(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Form<PostFormData>,
) -> AppResult<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let mut post = state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {post_id} not found")))?;

    if post.author_id != identity.user_id {
        return Ok(redirect(format!("/posts/{post_id}/")));
    }

    let data = form.into_inner();
    let (valid, group) = match validate_submission(&state, &data).await? {
        Ok(ok) => ok,
        Err(errors) => {
            let groups = group_choices(&state).await?;
            return Ok(HttpResponse::Ok().json(form_view(true, &data, groups, errors)));
        }
    };

    post.text = valid.text;
    post.group_id = group.as_ref().map(|g| g.id);
    post.updated_at = chrono::Utc::now();
    state.posts.update(post).await?;
    tracing::info!(post_id = %post_id, author = %identity.username, "Post updated");

    Ok(redirect(format!("/posts/{post_id}/")))
}
