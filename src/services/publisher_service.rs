//! Publisher Service
//!
//! The postal code and phone number arrive as the boxes of their composite
//! widgets and are recombined before validation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{
    ActionDef, ActionOutcome, ActionRequest, CSV_ACTION, Changelist, DELETE_ACTION,
    available_actions, export_csv, resolve_action,
};
use crate::domain::changelist::{DEFAULT_PER_PAGE, SEARCH_PARAM, page_number};
use crate::domain::site::{self, ModelPerms};
use crate::domain::validation::{
    PREFECTURES, check_optional_text, check_required_text, is_valid_phone_number,
    is_valid_postal_code, is_valid_prefecture,
};
use crate::domain::widgets::{PHONE_NUMBER_WIDGET, POSTAL_CODE_WIDGET};
use crate::domain::{DomainError, FieldErrors, PublisherInput};
use crate::infrastructure::AppState;
use crate::models::publisher;

pub const PUBLISHER_ACTIONS: [ActionDef; 2] = [CSV_ACTION, DELETE_ACTION];

/// Submitted publisher form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublisherForm {
    pub name: String,
    #[serde(default)]
    pub postal_code: Vec<Option<String>>,
    pub prefecture: Option<String>,
    pub address_1: Option<String>,
    pub address_2: Option<String>,
    #[serde(default)]
    pub phone_number: Vec<Option<String>>,
}

/// Change view payload: the stored values plus the widget boxes.
#[derive(Debug, Clone, Serialize)]
pub struct PublisherDetail {
    #[serde(flatten)]
    pub publisher: publisher::Model,
    pub postal_code_parts: Vec<Option<String>>,
    pub phone_number_parts: Vec<Option<String>>,
    pub prefecture_choices: &'static [&'static str],
}

impl From<publisher::Model> for PublisherDetail {
    fn from(publisher: publisher::Model) -> Self {
        Self {
            postal_code_parts: POSTAL_CODE_WIDGET.decompress(publisher.postal_code.as_deref()),
            phone_number_parts: PHONE_NUMBER_WIDGET.decompress(publisher.phone_number.as_deref()),
            prefecture_choices: &PREFECTURES,
            publisher,
        }
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Widget boxes with surrounding whitespace removed, so a box holding only
/// spaces counts as empty.
fn trimmed_boxes(boxes: &[Option<String>]) -> Vec<Option<&str>> {
    boxes.iter().map(|b| b.as_deref().map(str::trim)).collect()
}

fn box_holds(boxes: &[Option<&str>], separator: char) -> bool {
    boxes.iter().flatten().any(|b| b.contains(separator))
}

/// Recombine the widgets and validate every field.
pub fn clean(form: PublisherForm) -> Result<PublisherInput, DomainError> {
    let postal_boxes = trimmed_boxes(&form.postal_code);
    let phone_boxes = trimmed_boxes(&form.phone_number);

    let mut errors = FieldErrors::new();
    if box_holds(&postal_boxes, POSTAL_CODE_WIDGET.separator) {
        errors.add("postal_code", "Enter a postal code in the form 123-4567.");
    }
    if box_holds(&phone_boxes, PHONE_NUMBER_WIDGET.separator) {
        errors.add("phone_number", "Enter a phone number in the form 03-1234-5678.");
    }

    let input = PublisherInput {
        name: form.name.trim().to_string(),
        postal_code: POSTAL_CODE_WIDGET.compose(&postal_boxes),
        prefecture: blank_to_none(form.prefecture),
        address_1: blank_to_none(form.address_1),
        address_2: blank_to_none(form.address_2),
        phone_number: PHONE_NUMBER_WIDGET.compose(&phone_boxes),
    };

    check_required_text(&mut errors, "name", &input.name);
    check_optional_text(&mut errors, "address_1", input.address_1.as_deref());
    check_optional_text(&mut errors, "address_2", input.address_2.as_deref());

    if let Some(code) = &input.postal_code
        && !is_valid_postal_code(code)
    {
        errors.add("postal_code", "Enter a postal code in the form 123-4567.");
    }
    if let Some(prefecture) = &input.prefecture
        && !is_valid_prefecture(prefecture)
    {
        errors.add(
            "prefecture",
            format!(
                "Select a valid choice. {} is not one of the available choices.",
                prefecture
            ),
        );
    }
    if let Some(phone) = &input.phone_number
        && !is_valid_phone_number(phone)
    {
        errors.add("phone_number", "Enter a phone number in the form 03-1234-5678.");
    }

    errors.into_result()?;
    Ok(input)
}

pub async fn changelist(
    state: &AppState,
    params: &HashMap<String, String>,
    perms: &ModelPerms,
) -> Result<Changelist<publisher::Model>, DomainError> {
    let page = page_number(params, DEFAULT_PER_PAGE)?;
    let search = params.get(SEARCH_PARAM).map(String::as_str);

    let full_result_count = state.publisher_repo.find_all(None).await?.len() as u64;
    let rows = state.publisher_repo.find_all(search).await?;

    Ok(Changelist::paged(
        &site::PUBLISHER,
        rows,
        full_result_count,
        page,
        DEFAULT_PER_PAGE,
        available_actions(&PUBLISHER_ACTIONS, perms),
    ))
}

pub async fn get_publisher(state: &AppState, id: i32) -> Result<PublisherDetail, DomainError> {
    state
        .publisher_repo
        .find_by_id(id)
        .await?
        .map(PublisherDetail::from)
        .ok_or(DomainError::NotFound)
}

pub async fn add_publisher(
    state: &AppState,
    form: PublisherForm,
) -> Result<PublisherDetail, DomainError> {
    let input = clean(form)?;
    let publisher = state.publisher_repo.create(input).await?;
    tracing::info!("Publisher {} created: {}", publisher.id, publisher.name);
    Ok(publisher.into())
}

pub async fn change_publisher(
    state: &AppState,
    id: i32,
    form: PublisherForm,
) -> Result<PublisherDetail, DomainError> {
    let input = clean(form)?;
    Ok(state.publisher_repo.update(id, input).await?.into())
}

pub async fn delete_publisher(state: &AppState, id: i32) -> Result<(), DomainError> {
    if state.publisher_repo.find_by_id(id).await?.is_none() {
        return Err(DomainError::NotFound);
    }
    state.publisher_repo.delete_many(&[id]).await?;
    Ok(())
}

pub async fn run_action(
    state: &AppState,
    perms: &ModelPerms,
    request: ActionRequest,
) -> Result<ActionOutcome, DomainError> {
    let def = resolve_action(&PUBLISHER_ACTIONS, &request.action)?;
    if !def.requires.granted(perms) {
        return Err(DomainError::PermissionDenied);
    }

    let publishers = state.publisher_repo.find_many(&request.ids).await?;
    if def.name == super::DOWNLOAD_AS_CSV {
        return Ok(ActionOutcome::Csv(export_csv(&site::PUBLISHER, &publishers)?));
    }

    let ids: Vec<i32> = publishers.iter().map(|p| p.id).collect();
    let count = state.publisher_repo.delete_many(&ids).await?;
    Ok(ActionOutcome::Deleted { count })
}
