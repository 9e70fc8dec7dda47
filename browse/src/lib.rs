use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use axum::{
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use importer::{SqliteStore, Store, StoreError};
use maud::{Markup, PreEscaped};
use vocab_data::{CategoryId, StoredWord};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("error in reading the word store: {0}")]
    StoreError(#[from] StoreError),
    #[error("no category with id {0}")]
    NotFound(CategoryId),
}

/// Read-only views of the categories and words in the database at `db`.
pub fn serve(db: &std::path::Path) -> Result<axum::Router, Error> {
    let store = SqliteStore::open(db)?;
    let s = Arc::new(Mutex::new(Browser { store }));
    Ok(axum::Router::new()
        .route("/", get(|| async { Redirect::to("/categories/") }))
        .route("/categories/", get(list_categories))
        .route("/categories/:id/", get(render_category))
        .route("/style.css", get(css))
        .with_state(s))
}

struct Browser {
    store: SqliteStore,
}

async fn css() -> impl IntoResponse {
    static CSS_CONTENT: &str = include_str!("style.css");
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/css")],
        CSS_CONTENT.to_owned(),
    )
}

fn respond(result: Result<Markup, Error>) -> Response {
    match result {
        Ok(v) => v.into_response(),
        Err(e @ Error::NotFound(_)) => (StatusCode::NOT_FOUND, e.to_string()).into_response(),
        Err(e) => {
            tracing::error!("{e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("unexpected error: {e}"),
            )
                .into_response()
        }
    }
}

async fn list_categories(State(browser): State<Arc<Mutex<Browser>>>) -> Response {
    let mut browser = browser.lock().unwrap_or_else(PoisonError::into_inner);
    respond(browser.list_categories())
}

/// Words of one category; `?letters=ab` keeps words starting with `a` or `b`.
async fn render_category(
    State(browser): State<Arc<Mutex<Browser>>>,
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mut browser = browser.lock().unwrap_or_else(PoisonError::into_inner);
    respond(browser.render_category(CategoryId(id), params.get("letters").map(String::as_str)))
}

fn nav(individual: bool) -> PreEscaped<String> {
    let path = if individual { "../.." } else { ".." };
    maud::html!(
        nav { ul class="menu" {
            li { a href=(format!("{path}/categories/")) { "Categories" } }
        } }
    )
}

/// Whether `word` starts with one of `letters`, ignoring case.
fn starts_with_any(word: &str, letters: &str) -> bool {
    match word.chars().next() {
        Some(first) => letters
            .chars()
            .any(|l| l.to_lowercase().eq(first.to_lowercase())),
        None => false,
    }
}

impl Browser {
    fn list_categories(&mut self) -> Result<Markup, Error> {
        let categories = self.store.categories()?;
        let total: u64 = categories.iter().map(|c| c.word_count).sum();

        Ok(maud::html! {
            head { link rel="stylesheet" href="/style.css"; }
            body {
                (nav(false))
                main {
                h3 { (format!("{} categories, {total} words", categories.len())) }
                @for category in &categories {
                div class="summary" {
                    h3 class="tile-title" {
                        span class="swatch" style=(format!("background: {}", category.color)) {}
                        a href=(format!("{}/", category.id)) { (category.name) }
                        span { (format!("{} words", category.word_count)) }
                    }
                }
                }
            } }
        })
    }

    fn render_category(&mut self, id: CategoryId, letters: Option<&str>) -> Result<Markup, Error> {
        let category = self.store.category(id)?.ok_or(Error::NotFound(id))?;
        let mut words = self.store.words(&category.name)?;
        let letters = letters.unwrap_or("");
        if !letters.is_empty() {
            words.retain(|w| starts_with_any(&w.word.english, letters));
        }

        fn render_row(word: &StoredWord) -> PreEscaped<String> {
            maud::html!( tr {
                    td { (word.word.english) }
                    td { (word.word.turkish) }
                    td { (word.created_at.format("%Y-%m-%d").to_string()) }
                }
            )
        }

        Ok(maud::html! {
            head { link rel="stylesheet" href="/style.css"; }
            body {
                (nav(true))
                main {
                    div class="summary" {
                        h3 class="tile-title" {
                            span class="swatch" style=(format!("background: {}", category.color)) {}
                            a { (category.name) }
                            span { (format!("{} of {} words", words.len(), category.word_count)) }
                        }
                        form method="GET" {
                            label for="letters" { "First letters: " }
                            input type="text" id="letters" name="letters" value=(letters);
                            button type="submit" { "Filter" }
                        }
                    }
                    table {
                        tr { th { "English" } th { "Turkish" } th { "Added" } }
                        @for word in &words { (render_row(word)) }
                    }
                }
            }
        })
    }
}
