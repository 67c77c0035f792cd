//! Post handlers. List and detail are public; create, update and delete
//! require the authenticated author and answer with a redirect, the way a
//! form submission flow expects.

use actix_web::{HttpResponse, http::header, web};
use uuid::Uuid;

use quill_core::domain::Post;
use quill_shared::dto::{PostForm, PostResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn post_response(post: &Post) -> PostResponse {
    PostResponse {
        id: post.id.to_string(),
        author_id: post.author_id.to_string(),
        title: post.title.clone(),
        content: post.content.clone(),
        date_posted: post.date_posted.to_rfc3339(),
        url: post.detail_path(),
    }
}

/// Redirect to a post's detail view.
fn redirect_to_detail(post: &Post) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, post.detail_path()))
        .finish()
}

/// GET /api/posts - all posts, most recent first. Public.
pub async fn list_posts(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = state.posts.list().await?;
    let body: Vec<PostResponse> = posts.iter().map(post_response).collect();

    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/posts/{id} - one post. Public.
pub async fn get_post(state: web::Data<AppState>, id: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let post = state.posts.get(id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(post_response(&post)))
}

/// POST /api/posts - create a post authored by the caller.
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<PostForm>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    let post = state
        .posts
        .create(identity.user_id, &form.title, &form.content)
        .await?;

    tracing::info!(post_id = %post.id, author = %identity.username, "post created");
    Ok(redirect_to_detail(&post))
}

/// PUT /api/posts/{id} - update title/content of the caller's own post.
pub async fn update_post(
    state: web::Data<AppState>,
    identity: Identity,
    id: web::Path<Uuid>,
    body: web::Json<PostForm>,
) -> AppResult<HttpResponse> {
    let form = body.into_inner();
    let post = state
        .posts
        .update(identity.user_id, id.into_inner(), &form.title, &form.content)
        .await?;

    Ok(redirect_to_detail(&post))
}

/// DELETE /api/posts/{id} - delete the caller's own post.
pub async fn delete_post(
    state: web::Data<AppState>,
    identity: Identity,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state.posts.delete(identity.user_id, id.into_inner()).await?;

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, "/api/posts"))
        .finish())
}
