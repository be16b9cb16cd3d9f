use std::sync::Arc;

use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

use murmur_core::domain::Post;
use murmur_core::ports::{BaseRepository, UserRepository};

use crate::database::entity::{post, user};
use crate::database::postgres_repo::{PostgresPostRepository, PostgresUserRepository};

fn post_row(text: &str) -> post::Model {
    let now = chrono::Utc::now();
    post::Model {
        id: uuid::Uuid::new_v4(),
        author_id: uuid::Uuid::new_v4(),
        group_id: None,
        text: text.to_owned(),
        image: None,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

#[tokio::test]
async fn test_find_post_by_id() {
    let row = post_row("Test post");
    let post_id = row.id;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![row]])
        .into_connection();

    let repo = PostgresPostRepository::new(Arc::new(db));

    let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

    let post = result.unwrap();
    assert_eq!(post.text, "Test post");
    assert_eq!(post.id, post_id);
}

#[tokio::test]
async fn test_find_user_by_username() {
    let now = chrono::Utc::now();
    let row = user::Model {
        id: uuid::Uuid::new_v4(),
        username: "writer".to_owned(),
        email: "writer@example.com".to_owned(),
        first_name: String::new(),
        last_name: String::new(),
        password_hash: "hash".to_owned(),
        created_at: now.into(),
        updated_at: now.into(),
    };

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![row]])
        .into_connection();

    let repo = PostgresUserRepository::new(Arc::new(db));

    let user = repo.find_by_username("writer").await.unwrap().unwrap();
    assert_eq!(user.username, "writer");
}

#[tokio::test]
async fn test_delete_missing_post_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresPostRepository::new(Arc::new(db));

    let result =
        <PostgresPostRepository as BaseRepository<Post, uuid::Uuid>>::delete(&repo, uuid::Uuid::new_v4())
            .await;
    assert!(matches!(
        result,
        Err(murmur_core::error::RepoError::NotFound)
    ));
}
