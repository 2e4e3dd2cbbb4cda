//! HTTP boundary: routes map 1:1 to the core operations, errors become wire
//! responses through `AppError`'s `ResponseError` impl.

pub mod auth;
pub mod messages;
pub mod posts;
pub mod search;
pub mod users;

use actix_web::{web, HttpResponse, Responder};

pub use auth::AuthContext;

async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "healthy" }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .service(
            web::scope("/posts")
                .route("", web::post().to(posts::create_post))
                .route("", web::get().to(posts::list_feed))
                .route("/{post_id}", web::get().to(posts::get_post))
                .route("/{post_id}", web::put().to(posts::edit_post))
                .route("/{post_id}", web::delete().to(posts::delete_post))
                .route("/{post_id}/repost", web::post().to(posts::toggle_repost))
                .route("/{post_id}/like", web::post().to(posts::toggle_like)),
        )
        .route(
            "/profiles/{user_id}/posts",
            web::get().to(posts::list_by_author),
        )
        .service(
            web::scope("/users")
                .route("/{user_id}", web::put().to(users::upsert_user))
                .route("/{user_id}/follow", web::post().to(users::toggle_follow))
                .route("/{user_id}/followers", web::get().to(users::followers))
                .route("/{user_id}/following", web::get().to(users::following)),
        )
        .service(
            web::scope("/search")
                .route("/posts", web::get().to(search::search_posts))
                .route("/users", web::get().to(search::search_users)),
        )
        .route(
            "/messages/{recipient_id}",
            web::post().to(messages::send_message),
        )
        .service(
            web::scope("/conversations")
                .route("", web::get().to(messages::list_conversations))
                .route(
                    "/{conversation_id}/messages",
                    web::get().to(messages::list_messages),
                ),
        );
}
