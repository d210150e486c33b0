use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashSet},
    path::Path,
    sync::Arc,
};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{guard::RouteGuard, models::Role};

#[derive(Debug, Error)]
pub enum MenuError {
    #[error("role {0} has no menu entries and no fallback role is configured")]
    MissingRole(Role),
    #[error("fallback role {0} has no menu entries of its own")]
    UnknownFallback(Role),
    #[error("menu entry '{label}' has an invalid path '{path}'")]
    InvalidEntry { label: String, path: String },
    #[error("cannot read menu configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("menu configuration is malformed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// MenuEntry
///
/// One link of the navigation menu.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[ts(export)]
pub struct MenuEntry {
    pub label: String,
    pub path: String,
}

impl MenuEntry {
    pub fn new(label: &str, path: &str) -> Self {
        Self {
            label: label.to_string(),
            path: path.to_string(),
        }
    }
}

/// MenuTable
///
/// Role-specific entry lists plus the shared public list. Every role must have a list,
/// unless a `fallback` role is configured explicitly, in which case roles without one
/// borrow the fallback's list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuTable {
    public: Vec<MenuEntry>,
    roles: BTreeMap<Role, Vec<MenuEntry>>,
    #[serde(default)]
    fallback: Option<Role>,
}

/// MenuState
///
/// The shared, validated menu table injected into the router.
pub type MenuState = Arc<MenuTable>;

impl MenuTable {
    pub fn new(
        public: Vec<MenuEntry>,
        roles: BTreeMap<Role, Vec<MenuEntry>>,
        fallback: Option<Role>,
    ) -> Result<Self, MenuError> {
        let table = Self {
            public,
            roles,
            fallback,
        };
        table.validate()?;
        Ok(table)
    }

    /// Parses and validates a JSON menu configuration:
    /// `{ "public": [...], "roles": { "trainer": [...], ... }, "fallback": "trainer" }`.
    pub fn from_json(raw: &str) -> Result<Self, MenuError> {
        let table: MenuTable = serde_json::from_str(raw)?;
        table.validate()?;
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self, MenuError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// The gym console's built-in menus.
    pub fn standard() -> Self {
        let public = vec![MenuEntry::new("Inicio", "/"), MenuEntry::new("Ayuda", "/ayuda")];

        let roles = BTreeMap::from([
            (
                Role::Administrator,
                vec![
                    MenuEntry::new("Dashboard", "/dashboard"),
                    MenuEntry::new("Usuarios", "/usuarios"),
                    MenuEntry::new("Entrenadores", "/entrenadores"),
                    MenuEntry::new("Clientes", "/clientes"),
                    MenuEntry::new("Membresías", "/membresias"),
                    MenuEntry::new("Pagos", "/pagos"),
                    MenuEntry::new("Productos", "/productos"),
                    MenuEntry::new("Contabilidad", "/contabilidad"),
                ],
            ),
            (
                Role::Receptionist,
                vec![
                    MenuEntry::new("Dashboard", "/dashboard"),
                    MenuEntry::new("Clientes", "/clientes"),
                    MenuEntry::new("Membresías", "/membresias"),
                    MenuEntry::new("Pagos", "/pagos"),
                    MenuEntry::new("Productos", "/productos"),
                    MenuEntry::new("Clases", "/clases"),
                    MenuEntry::new("Consultas", "/consultas"),
                ],
            ),
            (
                Role::Trainer,
                vec![
                    MenuEntry::new("Dashboard", "/dashboard"),
                    MenuEntry::new("Clases", "/clases"),
                    MenuEntry::new("Rutinas", "/rutinas"),
                    MenuEntry::new("Consultas", "/consultas"),
                ],
            ),
            (
                Role::Anonymous,
                vec![MenuEntry::new("Dashboard", "/dashboard")],
            ),
        ]);

        Self {
            public,
            roles,
            fallback: None,
        }
    }

    pub fn validate(&self) -> Result<(), MenuError> {
        if let Some(fallback) = self.fallback {
            if !self.roles.contains_key(&fallback) {
                return Err(MenuError::UnknownFallback(fallback));
            }
        }
        for role in Role::ALL {
            if !self.roles.contains_key(&role) && self.fallback.is_none() {
                return Err(MenuError::MissingRole(role));
            }
        }
        for entry in self.public.iter().chain(self.roles.values().flatten()) {
            if entry.label.trim().is_empty() || !entry.path.starts_with('/') {
                return Err(MenuError::InvalidEntry {
                    label: entry.label.clone(),
                    path: entry.path.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn public_entries(&self) -> &[MenuEntry] {
        &self.public
    }

    fn role_entries(&self, role: Role) -> &[MenuEntry] {
        self.roles
            .get(&role)
            .or_else(|| self.fallback.and_then(|fallback| self.roles.get(&fallback)))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Role entries first, then the public entries, in declared order. Repeated paths keep
    /// their first occurrence. No session (`None`) sees only the public entries.
    pub fn build(&self, role: Option<Role>) -> Vec<MenuEntry> {
        let specific = role.map(|role| self.role_entries(role)).unwrap_or(&[]);
        let mut seen = HashSet::new();
        specific
            .iter()
            .chain(self.public.iter())
            .filter(|entry| seen.insert(entry.path.clone()))
            .cloned()
            .collect()
    }

    /// Entries a role would see but the guard would not let it render.
    pub fn unreachable_entries(&self, guard: &RouteGuard) -> Vec<(Role, MenuEntry)> {
        Role::ALL
            .into_iter()
            .flat_map(|role| {
                self.build(Some(role))
                    .into_iter()
                    .filter(move |entry| !guard.permits(role, &entry.path))
                    .map(move |entry| (role, entry))
            })
            .collect()
    }
}
