//! Static about pages.

use actix_web::HttpResponse;

use murmur_shared::dto::AboutPage;

/// GET /about/author/
pub async fn author() -> HttpResponse {
    HttpResponse::Ok().json(AboutPage {
        title: "About the author".to_string(),
        body: "Murmur is maintained by a small team of writers who wanted \
               a quieter place to publish."
            .to_string(),
    })
}

/// GET /about/tech/
pub async fn tech() -> HttpResponse {
    HttpResponse::Ok().json(AboutPage {
        title: "Technology".to_string(),
        body: "Murmur is built in Rust on actix-web and SeaORM, backed by \
               PostgreSQL."
            .to_string(),
    })
}
