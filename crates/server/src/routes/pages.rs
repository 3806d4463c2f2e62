use axum::{extract::State, response::Html};
use models::Post;
use service::remote::{StorageApi, TablesApi};
use tracing::warn;

use super::AppState;
use crate::errors::JsonApiError;
use crate::layout::{escape_html, page};

/// Index page: active posts inside the layout column; featured images use preview URLs.
pub async fn index<T: TablesApi, S: StorageApi>(
    State(svc): State<AppState<T, S>>,
) -> Result<Html<String>, JsonApiError> {
    let posts = svc.list_posts().await?;
    let mut body = String::from("<h1>Posts</h1>");
    if posts.rows.is_empty() {
        body.push_str("<p>No posts yet.</p>");
    }
    for post in &posts.rows {
        let image = post.featured_image.as_deref().and_then(|id| match svc.file_preview_url(id) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                warn!(slug = %post.slug, error = %e, "featured image preview unavailable");
                None
            }
        });
        body.push_str(&render_card(post, image.as_deref()));
    }
    Ok(Html(page("Posts", &body)))
}

fn render_card(post: &Post, image: Option<&str>) -> String {
    let img = image
        .map(|src| format!(r#"<img src="{}" alt="{}">"#, escape_html(src), escape_html(&post.title)))
        .unwrap_or_default();
    format!(
        r#"<article id="{}">{}<h2>{}</h2></article>"#,
        escape_html(&post.slug),
        img,
        escape_html(&post.title)
    )
}
