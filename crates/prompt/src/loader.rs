//! Department and role profile loading.

use crate::types::{DepartmentProfile, ProfileSet, RoleProfile};
use pipewrench_core::{AppError, AppResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Built-in profiles, compiled into the binary.
const BUILTIN_PROFILES: &str = include_str!("../data/profiles.yaml");

/// Department used when none is requested or the requested one is unknown.
pub const DEFAULT_DEPARTMENT_ID: &str = "general_public_works";

/// Read-only table of department and role profiles.
#[derive(Debug, Clone)]
pub struct ProfileCatalog {
    departments: BTreeMap<String, DepartmentProfile>,
    roles: BTreeMap<String, RoleProfile>,
    generic: DepartmentProfile,
}

impl ProfileCatalog {
    /// Catalog containing only the built-in profiles.
    pub fn builtin() -> AppResult<Self> {
        let set = parse_profiles(BUILTIN_PROFILES)
            .map_err(|e| AppError::Prompt(format!("Invalid built-in profiles: {}", e)))?;

        let mut catalog = Self {
            departments: BTreeMap::new(),
            roles: BTreeMap::new(),
            generic: generic_department(),
        };
        catalog.merge(set);
        Ok(catalog)
    }

    /// Built-in profiles plus every `*.yml` / `*.yaml` file under
    /// `<workspace>/.pipewrench/profiles/`.
    ///
    /// Files are applied in file-name order; a file that cannot be read or
    /// parsed is logged and skipped.
    ///
    /// # Example
    /// ```no_run
    /// use pipewrench_prompt::ProfileCatalog;
    /// use std::path::Path;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let catalog = ProfileCatalog::load(Path::new("."))?;
    /// let department = catalog.resolve_department(Some("stormwater"));
    /// println!("Using department: {}", department.display_name);
    /// # Ok(())
    /// # }
    /// ```
    pub fn load(workspace_path: &Path) -> AppResult<Self> {
        let mut catalog = Self::builtin()?;

        for path in list_profile_files(workspace_path) {
            tracing::debug!("Loading profiles from: {:?}", path);

            let contents = match std::fs::read_to_string(&path) {
                Ok(contents) => contents,
                Err(e) => {
                    tracing::warn!("Skipping unreadable profile file {:?}: {}", path, e);
                    continue;
                }
            };

            match parse_profiles(&contents) {
                Ok(set) => {
                    tracing::info!(
                        "Loaded {} departments and {} roles from {:?}",
                        set.departments.len(),
                        set.roles.len(),
                        path
                    );
                    catalog.merge(set);
                }
                Err(e) => tracing::warn!("Skipping invalid profile file {:?}: {}", path, e),
            }
        }

        Ok(catalog)
    }

    /// Add profiles, replacing existing entries with the same id.
    pub fn merge(&mut self, set: ProfileSet) {
        for department in set.departments {
            self.departments.insert(department.id.clone(), department);
        }
        for role in set.roles {
            self.roles.insert(role.id.clone(), role);
        }
    }

    /// Look up a department, falling back to the default one.
    pub fn resolve_department(&self, id: Option<&str>) -> &DepartmentProfile {
        if let Some(id) = id {
            if let Some(department) = self.departments.get(id) {
                return department;
            }
            tracing::debug!(
                "Unknown department '{}', using '{}'",
                id,
                DEFAULT_DEPARTMENT_ID
            );
        }

        self.departments
            .get(DEFAULT_DEPARTMENT_ID)
            .unwrap_or(&self.generic)
    }

    /// Look up a role. Unknown ids resolve to no role.
    pub fn resolve_role(&self, id: Option<&str>) -> Option<&RoleProfile> {
        let id = id?;
        let role = self.roles.get(id);
        if role.is_none() {
            tracing::debug!("Unknown role '{}', continuing without role context", id);
        }
        role
    }

    /// All departments, sorted by id.
    pub fn departments(&self) -> impl Iterator<Item = &DepartmentProfile> {
        self.departments.values()
    }

    /// All roles, sorted by id.
    pub fn roles(&self) -> impl Iterator<Item = &RoleProfile> {
        self.roles.values()
    }

    pub fn department_count(&self) -> usize {
        self.departments.len()
    }

    pub fn role_count(&self) -> usize {
        self.roles.len()
    }
}

fn parse_profiles(contents: &str) -> AppResult<ProfileSet> {
    let set: ProfileSet = serde_yaml::from_str(contents)?;
    validate_profiles(&set)?;
    Ok(set)
}

fn validate_profiles(set: &ProfileSet) -> AppResult<()> {
    for department in &set.departments {
        if department.id.trim().is_empty() {
            return Err(AppError::Prompt("Department id cannot be empty".to_string()));
        }
    }

    for role in &set.roles {
        if role.id.trim().is_empty() {
            return Err(AppError::Prompt("Role id cannot be empty".to_string()));
        }
    }

    Ok(())
}

/// Profile files directly under `.pipewrench/profiles/`, sorted by name.
fn list_profile_files(workspace_path: &Path) -> Vec<PathBuf> {
    let profiles_dir = workspace_path.join(".pipewrench/profiles");

    if !profiles_dir.exists() {
        return Vec::new();
    }

    walkdir::WalkDir::new(&profiles_dir)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.is_file()
                && matches!(
                    path.extension().and_then(|s| s.to_str()),
                    Some("yml") | Some("yaml")
                )
        })
        .collect()
}

fn generic_department() -> DepartmentProfile {
    DepartmentProfile {
        id: DEFAULT_DEPARTMENT_ID.to_string(),
        display_name: "General Public Works".to_string(),
        prompt_fragment: "You are assisting municipal Department of Public Works personnel."
            .to_string(),
    }
}
