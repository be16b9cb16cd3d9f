//! View models serialized to clients in place of server-side templates.

use serde::{Deserialize, Serialize};

use murmur_core::domain::{CommentItem, FeedItem, Group, User};
use murmur_core::pagination::Page;

use crate::forms::FieldErrors;

/// Public author information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorView {
    pub username: String,
    pub full_name: String,
}

impl From<&User> for AuthorView {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            full_name: user.full_name(),
        }
    }
}

/// Public group information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupView {
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl From<&Group> for GroupView {
    fn from(group: &Group) -> Self {
        Self {
            title: group.title.clone(),
            slug: group.slug.clone(),
            description: group.description.clone(),
        }
    }
}

/// One post as shown in a feed or on its detail page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: String,
    pub author: AuthorView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupView>,
}

impl From<&FeedItem> for PostView {
    fn from(item: &FeedItem) -> Self {
        Self {
            id: item.post.id.to_string(),
            text: item.post.text.clone(),
            image: item.post.image.clone(),
            created_at: item.post.created_at.to_rfc3339(),
            author: AuthorView::from(&item.author),
            group: item.group.as_ref().map(GroupView::from),
        }
    }
}

/// Pagination metadata accompanying every feed page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    pub number: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> From<&Page<T>> for PageMeta {
    fn from(page: &Page<T>) -> Self {
        Self {
            number: page.number,
            total_pages: page.total_pages,
            total_items: page.total_items,
            has_next: page.has_next(),
            has_previous: page.has_previous(),
        }
    }
}

/// The global and follow feeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPage {
    pub page: PageMeta,
    pub posts: Vec<PostView>,
}

impl From<&Page<FeedItem>> for FeedPage {
    fn from(page: &Page<FeedItem>) -> Self {
        Self {
            page: PageMeta::from(page),
            posts: page.items.iter().map(PostView::from).collect(),
        }
    }
}

/// A group's feed page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupPage {
    pub group: GroupView,
    pub page: PageMeta,
    pub posts: Vec<PostView>,
}

/// An author's profile page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilePage {
    pub author: AuthorView,
    pub post_count: u64,
    /// Whether the requesting user follows this author (false for guests).
    pub following: bool,
    pub page: PageMeta,
    pub posts: Vec<PostView>,
}

/// One comment on the post detail page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: String,
    pub text: String,
    pub created_at: String,
    pub author: AuthorView,
}

impl From<&CommentItem> for CommentView {
    fn from(item: &CommentItem) -> Self {
        Self {
            id: item.comment.id.to_string(),
            text: item.comment.text.clone(),
            created_at: item.comment.created_at.to_rfc3339(),
            author: AuthorView::from(&item.author),
        }
    }
}

/// The comment form descriptor rendered under a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentFormView {
    pub text: String,
    pub errors: FieldErrors,
}

/// The post detail page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetail {
    pub post: PostView,
    /// First characters of the text, used as the page title.
    pub title: String,
    pub author_post_count: u64,
    pub comments: Vec<CommentView>,
    pub form: CommentFormView,
}

/// A selectable group choice on the post form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupChoice {
    pub id: String,
    pub title: String,
}

impl From<&Group> for GroupChoice {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id.to_string(),
            title: group.title.clone(),
        }
    }
}

/// The post create/edit form descriptor, re-rendered with errors on
/// invalid submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostFormView {
    pub is_edit: bool,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub groups: Vec<GroupChoice>,
    pub errors: FieldErrors,
}

/// The signup form descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupFormView {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub errors: FieldErrors,
}

/// The login form descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginFormView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    pub errors: FieldErrors,
}

/// Static about pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AboutPage {
    pub title: String,
    pub body: String,
}
