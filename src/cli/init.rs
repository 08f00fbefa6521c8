use std::error::Error;
use std::path::Path;

use crate::core::config::data::path_display;
use crate::core::config::{Config, Preferences};
use crate::core::persona::{persona_dir, write_default_assets, AssetKind};

/// Write a starter `config.toml` and the default asset files for the
/// configured persona. Existing files are left alone unless `force` is set.
pub fn run_init(config_path: &Path, prefs: &Preferences, force: bool) -> Result<(), Box<dyn Error>> {
    for line in init_files(config_path, prefs, force)? {
        println!("{line}");
    }
    Ok(())
}

fn init_files(
    config_path: &Path,
    prefs: &Preferences,
    force: bool,
) -> Result<Vec<String>, Box<dyn Error>> {
    let mut report = Vec::new();

    if config_path.exists() && !force {
        report.push(format!(
            "Keeping existing config at {} (use --force to overwrite)",
            path_display(config_path)
        ));
    } else {
        Config::starter().save_to_path(config_path)?;
        report.push(format!("Wrote {}", path_display(config_path)));
    }

    let written = write_default_assets(
        &prefs.assets_dir,
        &prefs.persona,
        prefs.model.as_deref(),
        force,
    )?;
    for path in &written {
        report.push(format!("Wrote {}", path_display(path)));
    }

    let model_id = persona_dir(&prefs.assets_dir, &prefs.persona).join(AssetKind::ModelId.file_name());
    if !model_id.exists() {
        report.push(format!(
            "No model configured: put the model identifier in {} or pass --model",
            path_display(&model_id)
        ));
    }
    Ok(report)
}
