//! End-to-end endpoint tests running against the in-memory backend.

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::Duration;
use uuid::Uuid;

use api_server::handlers::configure_routes;
use api_server::state::AppState;
use murmur_core::domain::{Group, Post, User};
use murmur_core::ports::{PasswordService, TokenService};
use murmur_infra::{Argon2PasswordService, JwtConfig, JwtTokenService};
use murmur_shared::dto::{
    FeedPage, GroupPage, LoginFormView, PostDetail, PostFormView, ProfilePage, SignupFormView,
};
use murmur_shared::forms::{CommentFormData, LoginFormData, PostFormData, SignupFormData};

fn token_service() -> Arc<JwtTokenService> {
    Arc::new(JwtTokenService::new(JwtConfig {
        secret: "endpoint-test-secret".to_string(),
        expiration_hours: 1,
        issuer: "murmur-tests".to_string(),
    }))
}

macro_rules! init_app {
    ($state:expr, $tokens:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .app_data(web::Data::new($tokens.clone() as Arc<dyn TokenService>))
                .app_data(web::Data::new(
                    Arc::new(Argon2PasswordService::new()) as Arc<dyn PasswordService>
                ))
                .configure(configure_routes),
        )
        .await
    };
}

async fn seed_user(state: &AppState, username: &str) -> User {
    state
        .users
        .create(User::new(
            username.to_string(),
            format!("{username}@example.com"),
            String::new(),
            String::new(),
            "not-a-real-hash".to_string(),
        ))
        .await
        .unwrap()
}

async fn seed_group(state: &AppState, title: &str, slug: &str) -> Group {
    state
        .groups
        .create(Group::new(
            title.to_string(),
            slug.to_string(),
            "A test community".to_string(),
        ))
        .await
        .unwrap()
}

/// Create `count` posts with spread timestamps so ordering is stable.
async fn seed_posts(state: &AppState, author: &User, group: Option<&Group>, count: usize) -> Vec<Post> {
    let mut created = Vec::with_capacity(count);
    for i in 0..count {
        let mut post = Post::new(
            author.id,
            group.map(|g| g.id),
            format!("post number {i}"),
            None,
        );
        post.created_at += Duration::seconds(i as i64);
        post.updated_at = post.created_at;
        created.push(state.posts.create(post).await.unwrap());
    }
    created
}

fn bearer(tokens: &JwtTokenService, user: &User) -> (header::HeaderName, String) {
    let token = tokens.generate_token(user.id, &user.username).unwrap();
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

fn location(resp: &actix_web::dev::ServiceResponse) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .expect("redirect should carry a Location header")
        .to_str()
        .unwrap()
}

#[actix_web::test]
async fn index_paginates_thirteen_posts() {
    let state = AppState::in_memory();
    let tokens = token_service();
    let author = seed_user(&state, "writer").await;
    seed_posts(&state, &author, None, 13).await;
    let app = init_app!(state, tokens);

    let first: FeedPage =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(first.posts.len(), 10);
    assert_eq!(first.page.total_pages, 2);
    assert_eq!(first.page.total_items, 13);
    assert!(first.page.has_next);
    // Newest post leads the feed.
    assert_eq!(first.posts[0].text, "post number 12");

    let second: FeedPage = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/?page=2").to_request(),
    )
    .await;
    assert_eq!(second.posts.len(), 3);
    assert!(second.page.has_previous);
}

#[actix_web::test]
async fn group_and_profile_feeds_paginate() {
    let state = AppState::in_memory();
    let tokens = token_service();
    let author = seed_user(&state, "writer").await;
    let group = seed_group(&state, "Test group", "test-slug").await;
    seed_posts(&state, &author, Some(&group), 13).await;
    let app = init_app!(state, tokens);

    let group_page: GroupPage = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/group/test-slug/").to_request(),
    )
    .await;
    assert_eq!(group_page.posts.len(), 10);
    assert_eq!(group_page.group.slug, "test-slug");

    let profile_page: ProfilePage = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/profile/writer/?page=2")
            .to_request(),
    )
    .await;
    assert_eq!(profile_page.posts.len(), 3);
    assert_eq!(profile_page.post_count, 13);
    assert!(!profile_page.following);
}

#[actix_web::test]
async fn out_of_range_page_clamps_to_last() {
    let state = AppState::in_memory();
    let tokens = token_service();
    let author = seed_user(&state, "writer").await;
    seed_posts(&state, &author, None, 13).await;
    let app = init_app!(state, tokens);

    let page: FeedPage = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/?page=99").to_request(),
    )
    .await;
    assert_eq!(page.page.number, 2);
    assert_eq!(page.posts.len(), 3);

    let garbled: FeedPage = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/?page=banana").to_request(),
    )
    .await;
    assert_eq!(garbled.page.number, 1);
}

#[actix_web::test]
async fn group_feed_excludes_other_groups() {
    let state = AppState::in_memory();
    let tokens = token_service();
    let author = seed_user(&state, "writer").await;
    let group = seed_group(&state, "First", "first").await;
    let other = seed_group(&state, "Second", "second").await;
    seed_posts(&state, &author, Some(&group), 2).await;
    seed_posts(&state, &author, Some(&other), 1).await;
    let app = init_app!(state, tokens);

    let page: GroupPage = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/group/first/").to_request(),
    )
    .await;
    assert_eq!(page.page.total_items, 2);
    assert!(page.posts.iter().all(|p| p.group.as_ref().unwrap().slug == "first"));
}

#[actix_web::test]
async fn unknown_paths_and_lookups_return_not_found() {
    let state = AppState::in_memory();
    let tokens = token_service();
    let app = init_app!(state, tokens);

    let missing_post = format!("/posts/{}/", Uuid::new_v4());
    for uri in [
        "/unexisting_page/",
        "/group/nope/",
        "/profile/ghost/",
        missing_post.as_str(),
        "/posts/not-a-post/",
    ] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "expected 404 for {uri}");
    }
}

#[actix_web::test]
async fn create_requires_login() {
    let state = AppState::in_memory();
    let tokens = token_service();
    let app = init_app!(state, tokens);

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/create/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/create/");
}

#[actix_web::test]
async fn create_post_stores_record_and_redirects_to_profile() {
    let state = AppState::in_memory();
    let tokens = token_service();
    let author = seed_user(&state, "writer").await;
    let group = seed_group(&state, "Test group", "test-slug").await;
    let app = init_app!(state, tokens);

    let form = PostFormData {
        text: "A brand new post".to_string(),
        group: Some(group.id.to_string()),
        image: None,
    };
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/create/")
            .insert_header(bearer(&tokens, &author))
            .set_form(&form)
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/writer/");

    assert_eq!(state.posts.count_by_author(author.id).await.unwrap(), 1);
    let page = state
        .posts
        .feed_page(murmur_core::domain::FeedScope::All, 1)
        .await
        .unwrap();
    let item = &page.items[0];
    assert_eq!(item.post.text, "A brand new post");
    assert_eq!(item.post.author_id, author.id);
    assert_eq!(item.group.as_ref().unwrap().id, group.id);
}

#[actix_web::test]
async fn invalid_create_rerenders_form_with_errors() {
    let state = AppState::in_memory();
    let tokens = token_service();
    let author = seed_user(&state, "writer").await;
    let app = init_app!(state, tokens);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/create/")
            .insert_header(bearer(&tokens, &author))
            .set_form(&PostFormData::default())
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let form: PostFormView = test::read_body_json(resp).await;
    assert!(form.errors.iter().any(|e| e.field == "text"));
    assert_eq!(state.posts.count_by_author(author.id).await.unwrap(), 0);
}

#[actix_web::test]
async fn author_can_edit_text_and_group_only() {
    let state = AppState::in_memory();
    let tokens = token_service();
    let author = seed_user(&state, "writer").await;
    let group = seed_group(&state, "Old group", "old").await;
    let new_group = seed_group(&state, "New group", "new").await;
    let post = seed_posts(&state, &author, Some(&group), 1).await.remove(0);
    let app = init_app!(state, tokens);

    let form = PostFormData {
        text: "Edited text".to_string(),
        group: Some(new_group.id.to_string()),
        image: None,
    };
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{}/edit/", post.id))
            .insert_header(bearer(&tokens, &author))
            .set_form(&form)
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let stored = state.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "Edited text");
    assert_eq!(stored.group_id, Some(new_group.id));
    assert_eq!(stored.author_id, author.id);
    assert_eq!(state.posts.count_by_author(author.id).await.unwrap(), 1);
}

#[actix_web::test]
async fn non_author_edit_redirects_to_detail_and_changes_nothing() {
    let state = AppState::in_memory();
    let tokens = token_service();
    let author = seed_user(&state, "writer").await;
    let intruder = seed_user(&state, "intruder").await;
    let post = seed_posts(&state, &author, None, 1).await.remove(0);
    let app = init_app!(state, tokens);

    // Anonymous: login redirect with next.
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/posts/{}/edit/", post.id))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        location(&resp),
        format!("/auth/login/?next=/posts/{}/edit/", post.id)
    );

    // Authenticated non-author: sent to the read-only detail page.
    let form = PostFormData {
        text: "Hijacked".to_string(),
        group: None,
        image: None,
    };
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{}/edit/", post.id))
            .insert_header(bearer(&tokens, &intruder))
            .set_form(&form)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let stored = state.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "post number 0");
}

#[actix_web::test]
async fn post_detail_shows_title_preview_and_comments() {
    let state = AppState::in_memory();
    let tokens = token_service();
    let author = seed_user(&state, "writer").await;
    let long_text = "x".repeat(80);
    let post = state
        .posts
        .create(Post::new(author.id, None, long_text.clone(), None))
        .await
        .unwrap();
    let app = init_app!(state, tokens);

    let detail: PostDetail = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!("/posts/{}/", post.id))
            .to_request(),
    )
    .await;

    assert_eq!(detail.title, "x".repeat(30));
    assert_eq!(detail.post.text, long_text);
    assert_eq!(detail.author_post_count, 1);
    assert!(detail.comments.is_empty());
    assert!(detail.form.errors.is_empty());
}

#[actix_web::test]
async fn comments_require_login_and_attach_to_post() {
    let state = AppState::in_memory();
    let tokens = token_service();
    let author = seed_user(&state, "writer").await;
    let commenter = seed_user(&state, "commenter").await;
    let post = seed_posts(&state, &author, None, 1).await.remove(0);
    let app = init_app!(state, tokens);

    let comment_uri = format!("/posts/{}/comment/", post.id);
    let form = CommentFormData {
        text: "First!".to_string(),
    };

    // Anonymous commenters are sent to login.
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&comment_uri)
            .set_form(&form)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/auth/login/?next={comment_uri}"));
    assert!(state.comments.list_for_post(post.id).await.unwrap().is_empty());

    // Valid comment lands back on the detail page.
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&comment_uri)
            .insert_header(bearer(&tokens, &commenter))
            .set_form(&form)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let comments = state.comments.list_for_post(post.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].comment.text, "First!");
    assert_eq!(comments[0].author.username, "commenter");

    // Blank comment is rejected with field errors.
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&comment_uri)
            .insert_header(bearer(&tokens, &commenter))
            .set_form(&CommentFormData::default())
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(state.comments.list_for_post(post.id).await.unwrap().len(), 1);
}

#[actix_web::test]
async fn follow_is_idempotent_and_rejects_self_follow() {
    let state = AppState::in_memory();
    let tokens = token_service();
    let follower = seed_user(&state, "follower").await;
    let author = seed_user(&state, "author").await;
    let app = init_app!(state, tokens);

    // First follow creates the edge and lands on the follow feed.
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/profile/author/follow/")
            .insert_header(bearer(&tokens, &follower))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/follow/");
    assert!(state.follows.exists(follower.id, author.id).await.unwrap());

    // Second follow is a no-op back to the index.
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/profile/author/follow/")
            .insert_header(bearer(&tokens, &follower))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");

    // Self-follow never creates an edge.
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/profile/follower/follow/")
            .insert_header(bearer(&tokens, &follower))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    assert!(!state.follows.exists(follower.id, follower.id).await.unwrap());
}

#[actix_web::test]
async fn unfollow_removes_edge_and_missing_edge_is_not_found() {
    let state = AppState::in_memory();
    let tokens = token_service();
    let follower = seed_user(&state, "follower").await;
    let author = seed_user(&state, "author").await;
    state
        .follows
        .create(murmur_core::domain::Follow::new(follower.id, author.id))
        .await
        .unwrap();
    let app = init_app!(state, tokens);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/profile/author/unfollow/")
            .insert_header(bearer(&tokens, &follower))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    assert!(!state.follows.exists(follower.id, author.id).await.unwrap());

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/profile/author/unfollow/")
            .insert_header(bearer(&tokens, &follower))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn follow_feed_only_lists_followed_authors() {
    let state = AppState::in_memory();
    let tokens = token_service();
    let reader = seed_user(&state, "reader").await;
    let followed = seed_user(&state, "followed").await;
    let stranger = seed_user(&state, "stranger").await;
    seed_posts(&state, &followed, None, 1).await;
    seed_posts(&state, &stranger, None, 1).await;
    state
        .follows
        .create(murmur_core::domain::Follow::new(reader.id, followed.id))
        .await
        .unwrap();
    let app = init_app!(state, tokens);

    let feed: FeedPage = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/follow/")
            .insert_header(bearer(&tokens, &reader))
            .to_request(),
    )
    .await;
    assert_eq!(feed.page.total_items, 1);
    assert_eq!(feed.posts[0].author.username, "followed");

    // A user following nobody sees an empty follow feed.
    let empty: FeedPage = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/follow/")
            .insert_header(bearer(&tokens, &stranger))
            .to_request(),
    )
    .await;
    assert_eq!(empty.page.total_items, 0);
}

#[actix_web::test]
async fn profile_reports_follow_state() {
    let state = AppState::in_memory();
    let tokens = token_service();
    let reader = seed_user(&state, "reader").await;
    let author = seed_user(&state, "author").await;
    state
        .follows
        .create(murmur_core::domain::Follow::new(reader.id, author.id))
        .await
        .unwrap();
    let app = init_app!(state, tokens);

    let page: ProfilePage = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/profile/author/")
            .insert_header(bearer(&tokens, &reader))
            .to_request(),
    )
    .await;
    assert!(page.following);

    let anonymous: ProfilePage = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/profile/author/").to_request(),
    )
    .await;
    assert!(!anonymous.following);
}

#[actix_web::test]
async fn signup_creates_user_and_redirects_to_index() {
    let state = AppState::in_memory();
    let tokens = token_service();
    let app = init_app!(state, tokens);

    let form = SignupFormData {
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        username: "TestUser".to_string(),
        email: "test@example.com".to_string(),
        password1: "testpassword".to_string(),
        password2: "testpassword".to_string(),
    };
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/signup/")
            .set_form(&form)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    assert!(state.users.find_by_username("TestUser").await.unwrap().is_some());

    // Second signup with the same username re-renders with an error.
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/signup/")
            .set_form(&form)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let view: SignupFormView = test::read_body_json(resp).await;
    assert!(view.errors.iter().any(|e| e.field == "username"));
}

#[actix_web::test]
async fn signup_rejects_mismatched_passwords() {
    let state = AppState::in_memory();
    let tokens = token_service();
    let app = init_app!(state, tokens);

    let form = SignupFormData {
        username: "TestUser".to_string(),
        email: "test@example.com".to_string(),
        password1: "testpassword".to_string(),
        password2: "different".to_string(),
        ..Default::default()
    };
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/signup/")
            .set_form(&form)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let view: SignupFormView = test::read_body_json(resp).await;
    assert!(!view.errors.is_empty());
    assert!(state.users.find_by_username("TestUser").await.unwrap().is_none());
}

#[actix_web::test]
async fn login_sets_cookie_and_honors_next() {
    let state = AppState::in_memory();
    let tokens = token_service();

    let hasher = Argon2PasswordService::new();
    state
        .users
        .create(User::new(
            "writer".to_string(),
            "writer@example.com".to_string(),
            String::new(),
            String::new(),
            hasher.hash("testpassword").unwrap(),
        ))
        .await
        .unwrap();
    let app = init_app!(state, tokens);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/login/")
            .set_form(&LoginFormData {
                username: "writer".to_string(),
                password: "testpassword".to_string(),
                next: Some("/create/".to_string()),
            })
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/create/");

    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "auth")
        .expect("login should set the auth cookie");
    let token = cookie.value().to_string();

    // The cookie authenticates subsequent requests.
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/create/")
            .cookie(Cookie::new("auth", token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn login_with_bad_password_rerenders_with_error() {
    let state = AppState::in_memory();
    let tokens = token_service();

    let hasher = Argon2PasswordService::new();
    state
        .users
        .create(User::new(
            "writer".to_string(),
            "writer@example.com".to_string(),
            String::new(),
            String::new(),
            hasher.hash("testpassword").unwrap(),
        ))
        .await
        .unwrap();
    let app = init_app!(state, tokens);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/login/")
            .set_form(&LoginFormData {
                username: "writer".to_string(),
                password: "wrong".to_string(),
                next: None,
            })
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let view: LoginFormView = test::read_body_json(resp).await;
    assert!(view.errors.iter().any(|e| e.field == "__all__"));
}

#[actix_web::test]
async fn index_pages_are_cached_briefly() {
    let state = AppState::in_memory();
    let tokens = token_service();
    let author = seed_user(&state, "writer").await;
    seed_posts(&state, &author, None, 1).await;
    let app = init_app!(state, tokens);

    let before: FeedPage =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(before.page.total_items, 1);

    seed_posts(&state, &author, None, 1).await;

    // Within the TTL the cached page is still served.
    let cached: FeedPage =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(cached.page.total_items, 1);
}

#[actix_web::test]
async fn public_pages_are_reachable() {
    let state = AppState::in_memory();
    let tokens = token_service();
    let app = init_app!(state, tokens);

    for uri in [
        "/",
        "/about/author/",
        "/about/tech/",
        "/auth/signup/",
        "/auth/login/",
        "/auth/logout/",
        "/health",
    ] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "expected 200 for {uri}");
    }
}
