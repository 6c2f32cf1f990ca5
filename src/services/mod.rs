//! Services Layer
//!
//! Admin operations without the HTTP layer. Handlers parse requests, check
//! permissions and call into these functions.

pub mod address_service;
pub mod author_service;
pub mod book_service;
pub mod employee_service;
pub mod export;
pub mod import;
pub mod publisher_service;
pub mod stock_service;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::domain::site::{ModelAdmin, ModelPerms};
pub use export::{CSV_CONTENT_TYPE, CsvExport, CsvRow, export_csv};

pub const DOWNLOAD_AS_CSV: &str = "download_as_csv";
pub const PUBLISH_TODAY: &str = "publish_today";
pub const DELETE_SELECTED: &str = "delete_selected";

/// Body of `POST .../actions/`.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    #[serde(default)]
    pub ids: Vec<i32>,
}

/// Result of a bulk action.
#[derive(Debug)]
pub enum ActionOutcome {
    Csv(CsvExport),
    Updated { count: u64, message: String },
    Deleted { count: u64 },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ActionChoice {
    pub name: &'static str,
    pub description: &'static str,
}

/// Permission a bulk action needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPerm {
    View,
    Change,
    Delete,
}

impl ActionPerm {
    pub fn granted(&self, perms: &ModelPerms) -> bool {
        match self {
            ActionPerm::View => perms.view,
            ActionPerm::Change => perms.change,
            ActionPerm::Delete => perms.delete,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            ActionPerm::View => "view",
            ActionPerm::Change => "change",
            ActionPerm::Delete => "delete",
        }
    }
}

/// An action a changelist offers.
#[derive(Debug, Clone, Copy)]
pub struct ActionDef {
    pub name: &'static str,
    pub description: &'static str,
    pub requires: ActionPerm,
}

pub const CSV_ACTION: ActionDef = ActionDef {
    name: DOWNLOAD_AS_CSV,
    description: "Download selected as CSV",
    requires: ActionPerm::View,
};

pub const PUBLISH_TODAY_ACTION: ActionDef = ActionDef {
    name: PUBLISH_TODAY,
    description: "Set publish date to today",
    requires: ActionPerm::Change,
};

pub const DELETE_ACTION: ActionDef = ActionDef {
    name: DELETE_SELECTED,
    description: "Delete selected",
    requires: ActionPerm::Delete,
};

/// Actions of `defs` the caller may run, in declaration order.
pub fn available_actions(defs: &[ActionDef], perms: &ModelPerms) -> Vec<ActionChoice> {
    defs.iter()
        .filter(|d| d.requires.granted(perms))
        .map(|d| ActionChoice {
            name: d.name,
            description: d.description,
        })
        .collect()
}

/// Changelist response of the models without custom columns.
#[derive(Debug, Clone, Serialize)]
pub struct Changelist<T> {
    pub model: &'static str,
    pub verbose_name: &'static str,
    pub rows: Vec<T>,
    pub result_count: u64,
    pub full_result_count: u64,
    pub page: u64,
    pub num_pages: u64,
    pub actions: Vec<ActionChoice>,
}

impl<T> Changelist<T> {
    /// Slice one page out of already filtered rows.
    pub fn paged(
        model: &ModelAdmin,
        rows: Vec<T>,
        full_result_count: u64,
        page: u64,
        per_page: u64,
        actions: Vec<ActionChoice>,
    ) -> Self {
        let result_count = rows.len() as u64;
        let per_page = per_page.max(1);
        let rows = rows
            .into_iter()
            .skip(usize::try_from(page.saturating_mul(per_page)).unwrap_or(usize::MAX))
            .take(per_page as usize)
            .collect();
        Self {
            model: model.object_name,
            verbose_name: model.verbose_name,
            rows,
            result_count,
            full_result_count,
            page,
            num_pages: num_pages(result_count, per_page),
            actions,
        }
    }
}

pub fn num_pages(result_count: u64, per_page: u64) -> u64 {
    result_count.div_ceil(per_page.max(1)).max(1)
}

/// Find the requested action among `defs`; unknown names are a 400.
pub fn resolve_action(defs: &[ActionDef], name: &str) -> Result<ActionDef, DomainError> {
    defs.iter().copied().find(|d| d.name == name).ok_or_else(|| {
        DomainError::field("action", format!("Unknown action {:?}.", name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_follow_permissions() {
        let defs = [CSV_ACTION, PUBLISH_TODAY_ACTION, DELETE_ACTION];
        let view_only = ModelPerms {
            view: true,
            ..Default::default()
        };
        let names: Vec<_> = available_actions(&defs, &view_only)
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec![DOWNLOAD_AS_CSV]);

        let all = ModelPerms {
            view: true,
            add: true,
            change: true,
            delete: true,
        };
        assert_eq!(available_actions(&defs, &all).len(), 3);
    }

    #[test]
    fn paging_slices_rows() {
        let rows: Vec<i32> = (1..=25).collect();
        let page = Changelist::paged(&crate::domain::site::AUTHOR, rows, 30, 2, 10, Vec::new());
        assert_eq!(page.rows, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.result_count, 25);
        assert_eq!(page.full_result_count, 30);
        assert_eq!(page.num_pages, 3);
    }

    #[test]
    fn paging_past_the_end_is_empty() {
        let page = Changelist::paged(&crate::domain::site::AUTHOR, vec![1, 2], 2, u64::MAX, 100, Vec::new());
        assert!(page.rows.is_empty());
        assert_eq!(page.page, u64::MAX);
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert!(resolve_action(&[CSV_ACTION], PUBLISH_TODAY).is_err());
        assert_eq!(
            resolve_action(&[CSV_ACTION], DOWNLOAD_AS_CSV).unwrap().name,
            DOWNLOAD_AS_CSV
        );
    }
}
