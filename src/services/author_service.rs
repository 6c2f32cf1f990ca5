//! Author Service

use std::collections::HashMap;

use serde::Deserialize;

use super::{
    ActionDef, ActionOutcome, ActionRequest, CSV_ACTION, Changelist, DELETE_ACTION,
    available_actions, export_csv, resolve_action,
};
use crate::domain::changelist::{DEFAULT_PER_PAGE, SEARCH_PARAM, page_number};
use crate::domain::site::{self, ModelPerms};
use crate::domain::validation::check_required_text;
use crate::domain::{DomainError, FieldErrors};
use crate::infrastructure::AppState;
use crate::models::author;

pub const AUTHOR_ACTIONS: [ActionDef; 2] = [CSV_ACTION, DELETE_ACTION];

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorForm {
    pub name: String,
}

fn clean(form: AuthorForm) -> Result<String, DomainError> {
    let name = form.name.trim().to_string();
    let mut errors = FieldErrors::new();
    check_required_text(&mut errors, "name", &name);
    errors.into_result()?;
    Ok(name)
}

pub async fn changelist(
    state: &AppState,
    params: &HashMap<String, String>,
    perms: &ModelPerms,
) -> Result<Changelist<author::Model>, DomainError> {
    let page = page_number(params, DEFAULT_PER_PAGE)?;
    let search = params.get(SEARCH_PARAM).map(String::as_str);

    let full_result_count = state.author_repo.find_all(None).await?.len() as u64;
    let rows = state.author_repo.find_all(search).await?;

    Ok(Changelist::paged(
        &site::AUTHOR,
        rows,
        full_result_count,
        page,
        DEFAULT_PER_PAGE,
        available_actions(&AUTHOR_ACTIONS, perms),
    ))
}

pub async fn get_author(state: &AppState, id: i32) -> Result<author::Model, DomainError> {
    state
        .author_repo
        .find_by_id(id)
        .await?
        .ok_or(DomainError::NotFound)
}

pub async fn add_author(state: &AppState, form: AuthorForm) -> Result<author::Model, DomainError> {
    let name = clean(form)?;
    let author = state.author_repo.create(name).await?;
    tracing::info!("Author {} created: {}", author.id, author.name);
    Ok(author)
}

pub async fn change_author(
    state: &AppState,
    id: i32,
    form: AuthorForm,
) -> Result<author::Model, DomainError> {
    let name = clean(form)?;
    state.author_repo.update(id, name).await
}

pub async fn delete_author(state: &AppState, id: i32) -> Result<(), DomainError> {
    get_author(state, id).await?;
    state.author_repo.delete_many(&[id]).await?;
    Ok(())
}

pub async fn run_action(
    state: &AppState,
    perms: &ModelPerms,
    request: ActionRequest,
) -> Result<ActionOutcome, DomainError> {
    let def = resolve_action(&AUTHOR_ACTIONS, &request.action)?;
    if !def.requires.granted(perms) {
        return Err(DomainError::PermissionDenied);
    }

    let authors = state.author_repo.find_many(&request.ids).await?;
    if def.name == super::DOWNLOAD_AS_CSV {
        return Ok(ActionOutcome::Csv(export_csv(&site::AUTHOR, &authors)?));
    }

    let ids: Vec<i32> = authors.iter().map(|a| a.id).collect();
    let count = state.author_repo.delete_many(&ids).await?;
    Ok(ActionOutcome::Deleted { count })
}
