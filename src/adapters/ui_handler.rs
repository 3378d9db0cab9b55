use axum::{
    http::{header, StatusCode, Uri},
    response::IntoResponse,
};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "public"]
struct Asset;

pub struct UIHandler;

impl UIHandler {
    /// Serves the bundled chat page at `/`; any other unmatched path is 404
    pub async fn serve(uri: Uri) -> impl IntoResponse {
        let path = uri.path().trim_start_matches('/');
        if !path.is_empty() {
            return (StatusCode::NOT_FOUND, "Not found").into_response();
        }

        match Asset::get("index.html") {
            Some(content) => {
                let mime = mime_guess::from_path("index.html").first_or_octet_stream();
                ([(header::CONTENT_TYPE, mime.as_ref())], content.data).into_response()
            }
            None => (StatusCode::NOT_FOUND, "Not found").into_response(),
        }
    }
}
