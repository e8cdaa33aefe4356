//! Page endpoints: create, show and edit.

use crate::error::{PageError, PageResult};
use crate::forms::{FormIssue, PageForm};
use crate::metrics::{PAGES_CREATED, PAGES_EDITED, TOUCH_FAILURES, record_page_view};
use crate::render::{self, FormKind};
use crate::state::AppState;
use axum::Form;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use txtpages_store::{PageRepo, StoreError};

/// Map a store error from a form submission to the issue shown inline.
///
/// Returns the original error when it is not something the user can fix.
fn form_issue(err: StoreError, form: &PageForm) -> Result<(StatusCode, FormIssue), StoreError> {
    match err {
        StoreError::Validation(message) => {
            let missing = form.missing_fields();
            let issue = if missing.is_empty() {
                FormIssue::Invalid(message)
            } else {
                FormIssue::Missing(missing)
            };
            Ok((StatusCode::BAD_REQUEST, issue))
        }
        StoreError::SlugExists(_) => Ok((StatusCode::CONFLICT, FormIssue::SlugExists)),
        StoreError::WrongSecret => Ok((StatusCode::FORBIDDEN, FormIssue::WrongSecret)),
        other => Err(other),
    }
}

fn edit_action(slug: &str) -> String {
    format!("/{slug}/edit")
}

/// GET / - Blank form for a new page.
pub async fn new_page_form(State(state): State<AppState>) -> Html<String> {
    Html(render::page_form(
        state.site_name(),
        FormKind::Create,
        "/",
        &PageForm::default(),
        None,
    ))
}

/// POST / - Create a page and show its link and edit secret once.
pub async fn create_page(
    State(state): State<AppState>,
    Form(form): Form<PageForm>,
) -> PageResult<Response> {
    let form = form.trimmed();

    let missing = form.missing_fields();
    if !missing.is_empty() {
        let html = render::page_form(
            state.site_name(),
            FormKind::Create,
            "/",
            &form,
            Some(&FormIssue::Missing(missing)),
        );
        return Ok((StatusCode::BAD_REQUEST, Html(html)).into_response());
    }

    let page = match state.store.create_page(&form.to_new_page()).await {
        Ok(page) => page,
        Err(err) => {
            let (status, issue) = form_issue(err, &form).map_err(PageError::store("create_page"))?;
            let html =
                render::page_form(state.site_name(), FormKind::Create, "/", &form, Some(&issue));
            return Ok((status, Html(html)).into_response());
        }
    };

    PAGES_CREATED.inc();
    tracing::info!(page_id = page.id, slug = %page.slug, "Page created");

    Ok(Html(render::created_view(state.site_name(), &page)).into_response())
}

/// GET /{slug} - Render a stock page or a stored page.
///
/// Viewing a stored page records the read so the sweeper keeps it.
pub async fn show_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> PageResult<Response> {
    if let Some(stock) = state.stock.get(&slug) {
        record_page_view("stock");
        return Ok(Html(render::stock_view(state.site_name(), stock)).into_response());
    }

    let page = state
        .store
        .get_page_by_slug(&slug)
        .await
        .map_err(PageError::store("get_page_by_slug"))?
        .ok_or_else(|| PageError::NotFound(slug.clone()))?;

    match state.store.touch_page(&slug).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::debug!(slug = %slug, "Page disappeared before its read was recorded");
        }
        Err(e) => {
            TOUCH_FAILURES.inc();
            tracing::warn!(slug = %slug, error = %e, "Failed to record page read");
        }
    }

    record_page_view("stored");
    Ok(Html(render::page_view(state.site_name(), &page)).into_response())
}

/// GET /{slug}/edit - Edit form prefilled with the page, minus its secret.
pub async fn edit_page_form(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> PageResult<Response> {
    if state.stock.contains(&slug) {
        return Err(PageError::NotFound(slug));
    }

    let page = state
        .store
        .get_page_by_slug(&slug)
        .await
        .map_err(PageError::store("get_page_by_slug"))?
        .ok_or_else(|| PageError::NotFound(slug.clone()))?;

    Ok(Html(render::page_form(
        state.site_name(),
        FormKind::Edit,
        &edit_action(&slug),
        &PageForm::from_page(&page),
        None,
    ))
    .into_response())
}

/// POST /{slug}/edit - Apply an edit and redirect to the page.
///
/// The secret is checked before the fields, so a wrong secret never learns
/// anything about the page.
pub async fn save_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Form(form): Form<PageForm>,
) -> PageResult<Response> {
    if state.stock.contains(&slug) {
        return Err(PageError::NotFound(slug));
    }

    let page = state
        .store
        .get_page_by_slug(&slug)
        .await
        .map_err(PageError::store("get_page_by_slug"))?
        .ok_or_else(|| PageError::NotFound(slug.clone()))?;

    let mut form = form.trimmed();
    let edited = match state
        .store
        .edit_page(page.id, &form.to_edit(), &form.editcode)
        .await
    {
        Ok(edited) => edited,
        Err(err) => {
            let (status, issue) = form_issue(err, &form).map_err(PageError::store("edit_page"))?;
            if issue == FormIssue::WrongSecret {
                form.editcode.clear();
            }
            let html = render::page_form(
                state.site_name(),
                FormKind::Edit,
                &edit_action(&slug),
                &form,
                Some(&issue),
            );
            return Ok((status, Html(html)).into_response());
        }
    };

    PAGES_EDITED.inc();
    Ok(Redirect::to(&format!("/{}", edited.slug)).into_response())
}
