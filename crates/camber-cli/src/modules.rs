//! Recognition module registry and `--modules` matching.
//!
//! Selection is by substring: a token enables every module whose name
//! contains it, so `holes` enables `recognize_holes`. Tokens that match
//! nothing are reported back for a warning.

use camber_features::RecognizerConfig;

pub const MODULES: [(&str, &str, &str); 6] = [
    (
        "aag_dump",
        "graph",
        "Build and export the attributed adjacency graph",
    ),
    (
        "recognize_holes",
        "recognizer",
        "Detect drilled holes (simple, counterbored)",
    ),
    (
        "recognize_shafts",
        "recognizer",
        "Detect cylindrical shafts and bosses",
    ),
    (
        "recognize_fillets",
        "recognizer",
        "Detect edge blends and rounds",
    ),
    (
        "recognize_chamfers",
        "recognizer",
        "Detect beveled edge faces",
    ),
    (
        "recognize_cavities",
        "recognizer",
        "Detect pockets, slots, and cavities",
    ),
];

/// The thin-wall recognizer is listed with the recognizers even though
/// its selection token is longer.
pub const THIN_WALL_MODULE: (&str, &str, &str) = (
    "recognize_thin_walls",
    "recognizer",
    "Detect thin-walled regions (sheets, webs, walls)",
);

/// Module registry as JSON, for `--list-modules`.
pub fn registry_json() -> serde_json::Value {
    let mut entries: Vec<serde_json::Value> = MODULES
        .iter()
        .map(|(name, kind, description)| {
            serde_json::json!({ "name": name, "type": kind, "description": description })
        })
        .collect();
    entries.push(serde_json::json!({
        "name": THIN_WALL_MODULE.0,
        "type": THIN_WALL_MODULE.1,
        "description": THIN_WALL_MODULE.2,
    }));
    serde_json::json!({ "modules": entries })
}

/// Resolve a `--modules` string into recognizer switches. Returns the
/// config and any tokens that matched no module.
pub fn resolve_modules(modules: &str) -> (RecognizerConfig, Vec<String>) {
    let mut config = RecognizerConfig::default();
    if modules.trim() == "all" {
        return (config, Vec::new());
    }

    let tokens: Vec<&str> = modules
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    let enabled = |name: &str| tokens.iter().any(|t| name.contains(t));
    config.holes = enabled("recognize_holes");
    config.shafts = enabled("recognize_shafts");
    config.fillets = enabled("recognize_fillets");
    config.chamfers = enabled("recognize_chamfers");
    config.cavities = enabled("recognize_cavities");
    config.thin_walls = enabled("recognize_thin_walls");

    let all_names: Vec<&str> = MODULES
        .iter()
        .map(|(n, _, _)| *n)
        .chain(std::iter::once(THIN_WALL_MODULE.0))
        .collect();
    let unmatched = tokens
        .into_iter()
        .filter(|t| !all_names.iter().any(|n| n.contains(t)))
        .map(str::to_string)
        .collect();

    (config, unmatched)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_enables_everything() {
        let (config, unmatched) = resolve_modules("all");
        assert!(config.holes && config.fillets && config.cavities && config.thin_walls);
        assert!(unmatched.is_empty());
    }

    #[test]
    fn test_substring_over_matching() {
        // "holes" matches recognize_holes; nothing else.
        let (config, unmatched) = resolve_modules("holes");
        assert!(config.holes);
        assert!(!config.fillets && !config.cavities);
        assert!(unmatched.is_empty());
    }

    #[test]
    fn test_recognize_prefix_matches_all_recognizers() {
        let (config, _) = resolve_modules("recognize");
        assert!(config.holes && config.shafts && config.fillets);
        assert!(config.chamfers && config.cavities && config.thin_walls);
    }

    #[test]
    fn test_unknown_token_is_reported() {
        let (config, unmatched) = resolve_modules("holes,bogus");
        assert!(config.holes);
        assert_eq!(unmatched, vec!["bogus".to_string()]);
    }
}
