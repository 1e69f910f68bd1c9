//! Profiles command handler.

use super::{load_profiles, print_json};
use clap::Args;
use pipewrench_core::{config::AppConfig, AppResult};
use pipewrench_prompt::DEFAULT_DEPARTMENT_ID;

/// List department and role profiles
#[derive(Args, Debug)]
pub struct ProfilesCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ProfilesCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing profiles command");

        let catalog = load_profiles(config)?;

        if self.json {
            let output = serde_json::json!({
                "defaultDepartment": DEFAULT_DEPARTMENT_ID,
                "departments": catalog
                    .departments()
                    .map(|d| serde_json::json!({ "id": d.id, "name": d.display_name }))
                    .collect::<Vec<_>>(),
                "roles": catalog
                    .roles()
                    .map(|r| serde_json::json!({
                        "id": r.id,
                        "name": r.display_name,
                        "focusAreas": r.focus_areas,
                    }))
                    .collect::<Vec<_>>(),
            });
            return print_json(&output);
        }

        println!("Departments:");
        for department in catalog.departments() {
            let default = if department.id == DEFAULT_DEPARTMENT_ID {
                " (default)"
            } else {
                ""
            };
            println!("  {:<24} {}{}", department.id, department.display_name, default);
        }

        println!("\nRoles:");
        for role in catalog.roles() {
            println!("  {:<24} {}", role.id, role.display_name);
        }

        Ok(())
    }
}
