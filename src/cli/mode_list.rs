use crate::core::commands::all_modes;
use crate::core::config::Preferences;

pub fn list_modes(prefs: &Preferences) {
    println!("{}", format_modes(prefs));
}

fn format_modes(prefs: &Preferences) -> String {
    let mut out = String::from("Available modes:\n\n");
    for mode in all_modes() {
        let mark = if mode.setting == prefs.default_mode {
            "*"
        } else {
            " "
        };
        out.push_str(&format!(
            "  {} {:<22} temperature {:.2}\n",
            mark, mode.key, mode.setting.temperature
        ));
    }
    out.push_str(&format!("\nDefault: {}", prefs.default_mode.label));
    out
}
