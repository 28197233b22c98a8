//! # ul-ui
//!
//! Plain-text screens for the list controller's state, rendered with askama.

use askama::Template;
use thiserror::Error;
use ul_core::controller::{DisplayMode, ListState};
use ul_core::error::ErrorInfo;
use ul_core::models::Profile;

const TITLE: &str = "Users";
const GRID_COLUMNS: usize = 3;
const LOADING_MORE: &str = "Loading more users...";

#[derive(Error, Debug)]
pub enum UiError {
    #[error("template rendering failed: {0}")]
    Render(#[from] askama::Error),
}

struct Row {
    index: usize,
    name: String,
    born: String,
    thumbnail: String,
}

/// One grid cell, padded to the grid's column width.
struct Cell {
    label: String,
    picture: String,
}

#[derive(Template)]
#[template(path = "list.txt")]
struct ListTemplate<'a> {
    title: &'a str,
    rows: Vec<Row>,
    footer: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "grid.txt")]
struct GridTemplate<'a> {
    title: &'a str,
    lines: Vec<Vec<Cell>>,
    footer: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "detail.txt")]
struct DetailTemplate<'a> {
    name: String,
    picture: &'a str,
    birth_date: String,
    age: u32,
}

#[derive(Template)]
#[template(path = "error.txt")]
struct ErrorTemplate {
    message: String,
}

/// Renders the main screen for whatever the controller currently holds.
pub fn render(state: &ListState) -> Result<String, UiError> {
    if let Some(error) = &state.last_error {
        return render_error(error);
    }
    if state.profiles.is_empty() {
        let text = if state.is_loading {
            "Loading users..."
        } else {
            "No users loaded."
        };
        return Ok(format!("{TITLE}\n{text}\n"));
    }

    let footer = state.is_loading.then_some(LOADING_MORE);
    let rendered = match state.display_mode {
        DisplayMode::List => ListTemplate {
            title: TITLE,
            rows: rows(&state.profiles),
            footer,
        }
        .render()?,
        DisplayMode::Grid => GridTemplate {
            title: TITLE,
            lines: grid(&state.profiles),
            footer,
        }
        .render()?,
    };
    Ok(rendered)
}

pub fn render_detail(profile: &Profile) -> Result<String, UiError> {
    Ok(DetailTemplate {
        name: profile.full_name(),
        picture: &profile.picture.large,
        birth_date: profile.dob.formatted_date(),
        age: profile.dob.age,
    }
    .render()?)
}

pub fn render_error(error: &ErrorInfo) -> Result<String, UiError> {
    Ok(ErrorTemplate {
        message: error.user_message(),
    }
    .render()?)
}

fn rows(profiles: &[Profile]) -> Vec<Row> {
    profiles
        .iter()
        .enumerate()
        .map(|(i, p)| Row {
            index: i + 1,
            name: p.full_name(),
            born: p.dob.medium_date(),
            thumbnail: p.picture.thumbnail.clone(),
        })
        .collect()
}

fn grid(profiles: &[Profile]) -> Vec<Vec<Cell>> {
    let labels: Vec<(String, &str)> = profiles
        .iter()
        .enumerate()
        .map(|(i, p)| (format!("[{}] {}", i + 1, p.full_name()), p.picture.medium.as_str()))
        .collect();
    let width = labels
        .iter()
        .map(|(label, picture)| label.chars().count().max(picture.chars().count()))
        .max()
        .unwrap_or(0)
        + 2;

    labels
        .chunks(GRID_COLUMNS)
        .map(|chunk| {
            chunk
                .iter()
                .map(|(label, picture)| Cell {
                    label: format!("{label:<width$}"),
                    picture: format!("{picture:<width$}"),
                })
                .collect()
        })
        .collect()
}
