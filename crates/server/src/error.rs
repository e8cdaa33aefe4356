//! Page error types.

use crate::metrics::record_store_error;
use crate::render::error_view;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Response};
use txtpages_store::StoreError;

/// Errors that end a request with an error page.
///
/// Recoverable form errors (validation, slug conflicts, wrong secrets) never
/// reach this type; handlers re-render the form for those.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("page not found: {0}")]
    NotFound(String),

    #[error("store error during {operation}: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
}

impl PageError {
    /// Build a `map_err` adapter tagging a store failure with its operation.
    pub fn store(operation: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| match source {
            StoreError::NotFound(what) => Self::NotFound(what),
            source => Self::Store { operation, source },
        }
    }

    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Store { .. } => "store_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// What an error page says, attached to the response for
/// [`error_page_middleware`] to render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorPage {
    pub title: &'static str,
    pub message: String,
}

impl ErrorPage {
    pub fn render(&self, site_name: &str) -> String {
        error_view(site_name, self.title, &self.message)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let page = match self {
            Self::NotFound(what) => ErrorPage {
                title: "Not found",
                message: format!("Page not found: {what}"),
            },
            Self::Store { operation, source } => {
                tracing::error!(operation = %operation, error = %source, "Page store failure");
                record_store_error(operation);
                ErrorPage {
                    title: "Server error",
                    message: "Something went wrong. Please try again later.".to_string(),
                }
            }
        };
        let mut response = status.into_response();
        response.extensions_mut().insert(page);
        response
    }
}

/// Fill in the body of error responses, titled with the configured site name.
pub async fn error_page_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    match response.extensions_mut().remove::<ErrorPage>() {
        Some(page) => (response.status(), Html(page.render(state.site_name()))).into_response(),
        None => response,
    }
}

/// Result type for page handlers.
pub type PageResult<T> = std::result::Result<T, PageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_becomes_404() {
        let err = PageError::store("get_page")(StoreError::NotFound("page 'x'".to_string()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn store_failure_hides_cause() {
        let err = PageError::store("create_page")(StoreError::Internal(
            "disk on fire".to_string(),
        ));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(matches!(
            err,
            PageError::Store {
                operation: "create_page",
                ..
            }
        ));
    }

    #[test]
    fn store_failure_page_omits_details() {
        let err = PageError::store("create_page")(StoreError::Internal(
            "disk on fire".to_string(),
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let page = response
            .extensions()
            .get::<ErrorPage>()
            .expect("error page attached");
        let body = page.render("notes");
        assert!(!body.contains("disk on fire"));
        assert!(body.contains("Something went wrong"));
        assert!(body.contains("<meta property=\"og:site_name\" content=\"notes\">"));
    }
}
