//! High-level command orchestration for the CLI.
//!
//! Each function here corresponds to a subcommand in `main.rs`. Handlers build
//! the selected file units from the built-in catalog, run them through the
//! unit engine in `crate::unit`, and report through `crate::ui`.

use anyhow::{Context, Result, bail};
use std::fs;

use crate::fs_utils::{Copier, exists};
use crate::paths::Paths;
use crate::settings::Settings;
use crate::state::{LockedState, State};
use crate::ui::Ui;
use crate::unit::{FileUnit, validate_name};
use crate::units::BuiltinUnit;

/// Build the file units for a selection of built-in units
pub fn build_units(
    paths: &Paths,
    settings: &Settings,
    selection: &[BuiltinUnit],
) -> Result<Vec<FileUnit>> {
    selection
        .iter()
        .map(|unit| unit.file_unit(paths, settings))
        .collect()
}

/// Snapshot the live files of every unit into a profile
pub fn save(
    paths: &Paths,
    units: &[FileUnit],
    copier: &dyn Copier,
    profile: &str,
    ui: &Ui,
) -> Result<()> {
    validate_name(profile).context("Invalid profile name")?;
    paths.ensure_dirs()?;

    let mut locked = LockedState::lock(&paths.state_file)?;

    for unit in units {
        unit.save(copier, profile, paths.location())
            .with_context(|| {
                format!("Failed to save unit '{}' to profile '{}'", unit.name(), profile)
            })?;
        ui.ok(format!("Saved {}", unit.name()));
    }

    locked.update(|s| s.last_saved = Some(profile.to_string()))?;

    ui.newline();
    ui.println(format!(
        "Profile '{}' stored in {}",
        ui.bold(profile),
        paths.profile_dir(profile).display()
    ));
    Ok(())
}

/// Restore the live files of every unit from a profile
pub fn load(
    paths: &Paths,
    units: &[FileUnit],
    copier: &dyn Copier,
    profile: &str,
    ui: &Ui,
) -> Result<()> {
    validate_name(profile).context("Invalid profile name")?;

    if !paths.profile_dir(profile).is_dir() {
        bail!(
            "Profile '{}' does not exist in {}.\nHint: Create it with 'netprof save {}'.",
            profile,
            paths.location().display(),
            profile
        );
    }

    let mut locked = LockedState::lock(&paths.state_file)?;
    if let Some(previous) = &locked.state().last_loaded {
        tracing::debug!(previous = %previous, profile, "switching profile");
    }

    for unit in units {
        unit.load(copier, profile, paths.location())
            .with_context(|| {
                format!("Failed to load unit '{}' from profile '{}'", unit.name(), profile)
            })?;
        ui.ok(format!("Loaded {}", unit.name()));
    }

    locked.update(|s| s.last_loaded = Some(profile.to_string()))?;

    ui.newline();
    ui.println(format!("Active profile: {}", ui.bold(profile)));
    Ok(())
}

/// Show, per tracked file, whether the live file and its backup exist
pub fn status(paths: &Paths, units: &[FileUnit], profile: &str, ui: &Ui) -> Result<()> {
    validate_name(profile).context("Invalid profile name")?;

    ui.section(format!("Profile: {}", profile));
    if !paths.profile_dir(profile).is_dir() {
        ui.warn(format!("No snapshot stored for '{}' yet.", profile));
    }
    ui.newline();

    let mut table = ui.table();
    table.set_header(vec![
        ui.header_cell("Unit"),
        ui.header_cell("Live file"),
        ui.header_cell("Live"),
        ui.header_cell("Backup"),
        ui.header_cell("Root"),
    ]);

    for unit in units {
        for file in unit.files() {
            let backup = unit.backup_path(paths.location(), profile, file)?;

            let live_cell = ui.presence_cell(exists(&file.path), "present", "missing");
            let backup_cell = if exists(&backup) {
                let size = fs::metadata(&backup)
                    .with_context(|| format!("Failed to read metadata for {}", backup.display()))?
                    .len();
                ui.cell(format_bytes(size))
            } else {
                ui.presence_cell(false, "", "none")
            };
            let root = if file.requires_privilege { "yes" } else { "-" };

            table.add_row(vec![
                ui.cell(unit.name()),
                ui.cell(file.path.display().to_string()),
                live_cell,
                backup_cell,
                ui.cell(root),
            ]);
        }
    }

    ui.println(table.to_string());
    Ok(())
}

/// Show the most recently saved and loaded profiles
pub fn current(paths: &Paths, ui: &Ui) -> Result<()> {
    let state = State::read(&paths.state_file)?;

    ui.section("Current Profile");
    ui.newline();

    let mut table = ui.simple_table();
    let none = || ui.dim("(none)");
    table.add_row(vec![
        ui.cell("Last loaded:"),
        match &state.last_loaded {
            Some(profile) => ui.header_cell(profile),
            None => ui.cell(none()),
        },
    ]);
    table.add_row(vec![
        ui.cell("Last saved:"),
        ui.cell(state.last_saved.clone().unwrap_or_else(none)),
    ]);
    if let Some(updated) = &state.updated_at {
        table.add_row(vec![
            ui.cell("Updated:"),
            ui.cell(updated.format("%Y-%m-%d %H:%M:%S").to_string()),
        ]);
    }
    table.add_row(vec![
        ui.cell("Storage:"),
        ui.cell(paths.location().display().to_string()),
    ]);

    ui.println(table.to_string());
    Ok(())
}

/// List the built-in units and the files they track
pub fn units(paths: &Paths, ui: &Ui) -> Result<()> {
    ui.section("Units");
    ui.newline();

    let mut table = ui.table();
    table.set_header(vec![
        ui.header_cell("Unit"),
        ui.header_cell("Description"),
        ui.header_cell("Files"),
        ui.header_cell("After load"),
    ]);

    for unit in BuiltinUnit::all() {
        let files = unit
            .tracked_files(paths)
            .iter()
            .map(|f| {
                if f.requires_privilege {
                    format!("{} (root)", f.path.display())
                } else {
                    f.path.display().to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        let after = unit
            .service()
            .map(|s| format!("restart {}", s))
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            ui.cell(unit.name()),
            ui.cell(unit.display_name()),
            ui.cell(files),
            ui.cell(after),
        ]);
    }

    ui.println(table.to_string());
    Ok(())
}

/// Format bytes as human-readable string
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
