//! A development server for the generated site. Routing mirrors what static
//! hosts such as GitHub Pages do with the output: `/` is `index.html`,
//! extensionless paths resolve to `.html` files, and anything else falls
//! back to the home page.

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// The port `issueblog serve` listens on by default.
pub const DEFAULT_PORT: u16 = 3000;

/// A router serving the files under `root`.
pub fn router(root: PathBuf) -> Router {
    Router::new().fallback(handle).with_state(Arc::new(root))
}

/// Serves `root` on `addr` until the process is interrupted.
pub async fn serve(root: PathBuf, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| Error::Bind { addr, err })?;
    info!("serving {} at http://{}", root.display(), addr);
    axum::serve(listener, router(root)).await.map_err(Error::Serve)
}

async fn handle(State(root): State<Arc<PathBuf>>, uri: Uri) -> Response {
    let file = match resolve(&root, uri.path()) {
        Some(file) => file,
        None => return fallback(&root).await,
    };

    match tokio::fs::read(&file).await {
        Ok(contents) => {
            debug!(path = %file.display(), "serving file");
            let mime = mime_guess::from_path(&file).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.to_string())], contents).into_response()
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => fallback(&root).await,
        Err(e) => {
            error!(path = %file.display(), %e, "failed to read file");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// Serves `index.html` for unknown paths, or a plain 404 when there is none.
async fn fallback(root: &Path) -> Response {
    match tokio::fs::read(root.join("index.html")).await {
        Ok(contents) => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            contents,
        )
            .into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            (StatusCode::NOT_FOUND, "404 Not Found").into_response()
        }
        Err(e) => {
            error!(%e, "failed to read index.html");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// Maps a request path onto a file under `root`. Returns `None` for paths
/// that can't be decoded or would leave `root`.
fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(request_path).ok()?;
    let relative = decoded.trim_start_matches('/');
    let relative = match relative {
        "" => String::from("index.html"),
        r if r.ends_with('/') => format!("{}index.html", r),
        r => r.to_owned(),
    };

    let mut file = root.to_path_buf();
    for component in Path::new(&relative).components() {
        match component {
            Component::Normal(part) => file.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if file.extension().is_none() {
        file.set_extension("html");
    }
    Some(file)
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure to run the development server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the listening socket can't be bound.
    #[error("binding {addr}: {err}")]
    Bind {
        addr: SocketAddr,
        err: std::io::Error,
    },

    /// Returned when the server stops with an error.
    #[error("serving: {0}")]
    Serve(std::io::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn get(root: &Path, uri: &str) -> (StatusCode, String, String) {
        let response = router(root.to_path_buf())
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_owned())
            .unwrap_or_default();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("posts")).unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("index.html"), "home").unwrap();
        std::fs::write(dir.path().join("archives.html"), "archives").unwrap();
        std::fs::write(dir.path().join("posts/1.html"), "post one").unwrap();
        std::fs::write(dir.path().join("assets/main.css"), "body{}").unwrap();
        std::fs::write(dir.path().join("search-data.json"), "[]").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_serves_files() {
        let dir = site();
        let (status, content_type, body) = get(dir.path(), "/").await;
        assert_eq!((StatusCode::OK, "home"), (status, body.as_str()));
        assert!(content_type.starts_with("text/html"));

        let (_, _, body) = get(dir.path(), "/posts/1.html").await;
        assert_eq!("post one", body);

        let (_, content_type, body) = get(dir.path(), "/assets/main.css").await;
        assert_eq!("body{}", body);
        assert!(content_type.starts_with("text/css"));

        let (_, content_type, _) = get(dir.path(), "/search-data.json").await;
        assert_eq!("application/json", content_type);
    }

    #[tokio::test]
    async fn test_extensionless_paths() {
        let dir = site();
        assert_eq!("archives", get(dir.path(), "/archives").await.2);
        assert_eq!("post one", get(dir.path(), "/posts/1").await.2);
    }

    #[tokio::test]
    async fn test_falls_back_to_index() {
        let dir = site();
        let (status, content_type, body) = get(dir.path(), "/no/such/page").await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!("text/html; charset=utf-8", content_type);
        assert_eq!("home", body);
    }

    #[tokio::test]
    async fn test_not_found_without_index() {
        let dir = tempfile::tempdir().unwrap();
        let (status, content_type, body) = get(dir.path(), "/missing.html").await;
        assert_eq!(StatusCode::NOT_FOUND, status);
        assert!(content_type.starts_with("text/plain"));
        assert_eq!("404 Not Found", body);
    }

    #[test]
    fn test_resolve() {
        let root = Path::new("/site");
        assert_eq!(Some(root.join("index.html")), resolve(root, "/"));
        assert_eq!(Some(root.join("categories/bo-ke.html")), resolve(root, "/categories/bo-ke"));
        assert_eq!(Some(root.join("posts/index.html")), resolve(root, "/posts/"));
        assert_eq!(Some(root.join("a b.html")), resolve(root, "/a%20b.html"));
        assert_eq!(None, resolve(root, "/../etc/passwd"));
        assert_eq!(None, resolve(root, "/assets/%2e%2e/%2e%2e/secret"));
    }
}
