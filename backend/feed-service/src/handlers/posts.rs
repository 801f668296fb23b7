//! Post handlers - HTTP endpoints for the feed, likes and comments

use actix_multipart::Multipart;
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use futures::StreamExt;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::services::{PostForm, PostService, UploadStore};

/// Body limit for JSON post creation
const MAX_JSON_BODY_BYTES: usize = 256 * 1024;

#[derive(Debug, Deserialize)]
pub struct CreatePostJson {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: Option<String>,
}

async fn read_json_form(mut payload: web::Payload) -> Result<PostForm> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| AppError::Validation(format!("Invalid request body: {}", e)))?;
        if body.len() + chunk.len() > MAX_JSON_BODY_BYTES {
            return Err(AppError::Validation("Request body too large".to_string()));
        }
        body.extend_from_slice(&chunk);
    }

    if body.is_empty() {
        return Ok(PostForm::default());
    }

    let parsed: CreatePostJson = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Invalid request body: {}", e)))?;
    Ok(PostForm {
        text: parsed.text,
        image: None,
    })
}

/// Create a new post from a multipart form (`text`, optional `image`) or a JSON body
pub async fn create_post(
    user: CurrentUser,
    posts: web::Data<PostService>,
    uploads: web::Data<UploadStore>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse> {
    let is_multipart = matches!(
        req.mime_type(),
        Ok(Some(ref content_type)) if content_type.type_() == mime::MULTIPART
    );
    let form = if is_multipart {
        uploads
            .read_post_form(Multipart::new(req.headers(), payload))
            .await?
    } else {
        read_json_form(payload).await?
    };

    let post = posts.create(&user, form.text, form.image).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": "Post created successfully",
        "data": post,
    })))
}

/// Get the whole feed, newest first
pub async fn list_posts(posts: web::Data<PostService>) -> Result<HttpResponse> {
    let feed = posts.list_all().await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": feed.len(),
        "data": feed,
    })))
}

/// Get a post by ID
pub async fn get_post(
    posts: web::Data<PostService>,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let post = posts.get_by_id(&post_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": post,
    })))
}

/// Delete a post (owner only)
pub async fn delete_post(
    user: CurrentUser,
    posts: web::Data<PostService>,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    posts.delete(&post_id, user.id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Post deleted successfully",
    })))
}

/// Like a post, or unlike it if the caller already did
pub async fn toggle_like(
    user: CurrentUser,
    posts: web::Data<PostService>,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let (post, action) = posts.toggle_like(&post_id, &user).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": action.message(),
        "data": post,
    })))
}

pub async fn add_comment(
    user: CurrentUser,
    posts: web::Data<PostService>,
    post_id: web::Path<String>,
    req: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    let post = posts
        .add_comment(&post_id, &user, req.text.as_deref())
        .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": "Comment added successfully",
        "data": post,
    })))
}

/// Delete a comment (author only)
pub async fn delete_comment(
    user: CurrentUser,
    posts: web::Data<PostService>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let post = posts.delete_comment(&post_id, &comment_id, user.id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Comment deleted successfully",
        "data": post,
    })))
}
