//! # Navigation
//!
//! Sidebar entries and the role filter applied to them.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::Role;

/// One sidebar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NavItem {
    pub title: String,
    pub href: String,
    pub icon: String,
    /// `None` means any authenticated user may see the entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_role: Option<Role>,
}

impl NavItem {
    fn open(title: &str, href: &str, icon: &str) -> Self {
        NavItem {
            title: title.to_string(),
            href: href.to_string(),
            icon: icon.to_string(),
            required_role: None,
        }
    }

    fn restricted(title: &str, href: &str, icon: &str, role: Role) -> Self {
        NavItem {
            required_role: Some(role),
            ..NavItem::open(title, href, icon)
        }
    }
}

/// The dashboard sidebar.
pub fn default_navigation() -> Vec<NavItem> {
    vec![
        NavItem::open("Tableau de bord", "/dashboard", "layout-grid"),
        NavItem::open("Ventes", "/sales", "shopping-cart"),
        NavItem::open("Produits", "/products", "package"),
        NavItem::open("Stock", "/stock", "boxes"),
        NavItem::restricted("Imprimantes", "/printers", "printer", Role::Admin),
        NavItem::restricted("Utilisateurs", "/users", "users", Role::Admin),
        NavItem::restricted("Paramètres", "/settings", "settings", Role::Admin),
    ]
}

/// Entries `role` may see: everything for an admin, otherwise only entries
/// without a role restriction.
pub fn visible_items(role: Role, items: &[NavItem]) -> Vec<NavItem> {
    if role.is_admin() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| item.required_role.is_none())
        .cloned()
        .collect()
}
