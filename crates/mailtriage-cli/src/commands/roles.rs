//! `mailtriage roles` — list role definitions and their step bindings.

use mailtriage_core::{RoleRegistry, StepId};

use super::truncate;

pub fn list(roles_dir: Option<&str>) -> Result<(), String> {
    let mut registry = RoleRegistry::builtin();
    if let Some(dir) = roles_dir {
        let count = registry.load_dir(dir).map_err(|e| e.to_string())?;
        println!("Loaded {} role override(s) from '{}'", count, dir);
        println!();
    }

    println!("┌──────────────────────┬────────────────────────────┬──────────────────────────────┐");
    println!("│ Capability           │ Role                       │ Steps                        │");
    println!("├──────────────────────┼────────────────────────────┼──────────────────────────────┤");

    for kind in mailtriage_core::RoleKind::all() {
        let def = registry
            .get(kind)
            .ok_or_else(|| format!("missing role definition for '{}'", kind))?;
        let steps: Vec<&str> = StepId::all()
            .iter()
            .filter(|s| s.role() == kind)
            .map(|s| s.as_str())
            .collect();
        println!(
            "│ {:<20} │ {:<26} │ {:<28} │",
            truncate(kind.as_str(), 20),
            truncate(&def.role, 26),
            truncate(&steps.join(", "), 28)
        );
    }

    println!("└──────────────────────┴────────────────────────────┴──────────────────────────────┘");
    Ok(())
}
