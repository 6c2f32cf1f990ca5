//! Admin site registry and app/model ordering.
//!
//! The registry lists every model the admin exposes, in registration order.
//! `APP_MODEL_ORDER` is consulted when building the index: named apps come
//! first in table order, their named models first in table order, everything
//! else keeps registration order behind them.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelAdmin {
    pub app_label: &'static str,
    pub object_name: &'static str,
    /// Lowercase model name used in URLs and permission codenames.
    pub model_name: &'static str,
    pub verbose_name: &'static str,
}

impl ModelAdmin {
    /// `"<app>.<model>"`, the qualified name used for export filenames.
    pub fn label(&self) -> String {
        format!("{}.{}", self.app_label, self.model_name)
    }

    pub fn codename(&self, action: &str) -> String {
        format!("{}_{}", action, self.model_name)
    }

    pub fn changelist_url(&self) -> String {
        format!("/admin/{}/{}/", self.app_label, self.model_name)
    }
}

pub const SITE_HEADER: &str = "Bookshop administration";
pub const INDEX_TITLE: &str = "Home";

pub const EMPLOYEE: ModelAdmin = ModelAdmin {
    app_label: "accounts",
    object_name: "Employee",
    model_name: "employee",
    verbose_name: "employee",
};
pub const DEPARTMENT: ModelAdmin = ModelAdmin {
    app_label: "accounts",
    object_name: "Department",
    model_name: "department",
    verbose_name: "department",
};
pub const ADDRESS: ModelAdmin = ModelAdmin {
    app_label: "addresses",
    object_name: "Address",
    model_name: "address",
    verbose_name: "address",
};
pub const PUBLISHER: ModelAdmin = ModelAdmin {
    app_label: "shop",
    object_name: "Publisher",
    model_name: "publisher",
    verbose_name: "publisher",
};
pub const AUTHOR: ModelAdmin = ModelAdmin {
    app_label: "shop",
    object_name: "Author",
    model_name: "author",
    verbose_name: "author",
};
pub const BOOK: ModelAdmin = ModelAdmin {
    app_label: "shop",
    object_name: "Book",
    model_name: "book",
    verbose_name: "book",
};
pub const PUBLISHED_BOOK: ModelAdmin = ModelAdmin {
    app_label: "shop",
    object_name: "PublishedBook",
    model_name: "publishedbook",
    verbose_name: "book (on sale)",
};
pub const UNPUBLISHED_BOOK: ModelAdmin = ModelAdmin {
    app_label: "shop",
    object_name: "UnpublishedBook",
    model_name: "unpublishedbook",
    verbose_name: "book (upcoming)",
};
pub const BOOK_STOCK: ModelAdmin = ModelAdmin {
    app_label: "shop",
    object_name: "BookStock",
    model_name: "bookstock",
    verbose_name: "stock",
};

pub const REGISTRY: [ModelAdmin; 9] = [
    ADDRESS,
    PUBLISHER,
    AUTHOR,
    BOOK,
    PUBLISHED_BOOK,
    UNPUBLISHED_BOOK,
    BOOK_STOCK,
    DEPARTMENT,
    EMPLOYEE,
];

pub const APP_MODEL_ORDER: [(&str, &[&str]); 2] = [
    ("accounts", &["Employee", "Department"]),
    ("shop", &["Book", "Author", "Publisher"]),
];

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ModelEntry {
    pub object_name: &'static str,
    pub name: &'static str,
    pub admin_url: String,
    pub perms: ModelPerms,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ModelPerms {
    pub view: bool,
    pub add: bool,
    pub change: bool,
    pub delete: bool,
}

impl ModelPerms {
    pub fn any(&self) -> bool {
        self.view || self.add || self.change || self.delete
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AppEntry {
    pub app_label: &'static str,
    pub app_url: String,
    pub models: Vec<ModelEntry>,
}

/// Build the index app list for a caller. `perms_for` reports what the caller
/// may do with each model; models with no permission at all are hidden.
pub fn build_app_list<F>(perms_for: F) -> Vec<AppEntry>
where
    F: Fn(&ModelAdmin) -> ModelPerms,
{
    let mut apps: Vec<AppEntry> = Vec::new();

    for model in REGISTRY.iter() {
        let perms = perms_for(model);
        if !perms.any() {
            continue;
        }

        let entry = ModelEntry {
            object_name: model.object_name,
            name: model.verbose_name,
            admin_url: model.changelist_url(),
            perms,
        };

        match apps.iter_mut().find(|a| a.app_label == model.app_label) {
            Some(app) => app.models.push(entry),
            None => apps.push(AppEntry {
                app_label: model.app_label,
                app_url: format!("/admin/{}/", model.app_label),
                models: vec![entry],
            }),
        }
    }

    sort_app_list(&mut apps);
    apps
}

/// Reorder apps and their models by `APP_MODEL_ORDER`. Stable, so unnamed
/// entries keep their relative order.
pub fn sort_app_list(apps: &mut [AppEntry]) {
    let app_rank = |label: &str| {
        APP_MODEL_ORDER
            .iter()
            .position(|(app, _)| *app == label)
            .unwrap_or(APP_MODEL_ORDER.len())
    };
    apps.sort_by_key(|app| app_rank(app.app_label));

    for app in apps.iter_mut() {
        let names: &[&str] = APP_MODEL_ORDER
            .iter()
            .find(|(label, _)| *label == app.app_label)
            .map(|(_, names)| *names)
            .unwrap_or(&[]);
        app.models.sort_by_key(|m| {
            names
                .iter()
                .position(|n| *n == m.object_name)
                .unwrap_or(names.len())
        });
    }
}

pub fn find_model(app_label: &str, model_name: &str) -> Option<&'static ModelAdmin> {
    REGISTRY
        .iter()
        .find(|m| m.app_label == app_label && m.model_name == model_name)
}
