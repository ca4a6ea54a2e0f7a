use once_cell::sync::Lazy;
use regex::Regex;

use crate::catalog::GameMetadata;

/// Ordered on purpose, platform names are matched by substring and the first
/// hit wins, so overlapping names resolve the same way on every run.
const MANUFACTURERS: &[(&str, &str)] = &[
    ("windows", "Microsoft"),
    ("pc", "Microsoft"),
    ("xbox", "Microsoft"),
    ("playstation", "Sony"),
    ("switch", "Nintendo"),
    ("nintendo", "Nintendo"),
    ("wii", "Nintendo"),
    ("gamecube", "Nintendo"),
    ("linux", "Linux"),
    ("mac", "Apple"),
    ("ios", "Apple"),
    ("android", "Google"),
    ("steam deck", "Valve"),
];

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static PATH_ILLEGAL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static NON_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s\-.()\[\]&']").unwrap());

/// Builds the category path `Games/<Manufacturer>/<Platform>/<Title> (<Year>)`
/// with an optional `/<Subcategory>` suffix for updates, DLC and the like.
///
/// The platform segment is inserted verbatim and may be empty when the group
/// carries no platform.
pub fn derive_category(metadata: Option<&GameMetadata>) -> Option<String> {
    let metadata = metadata?;

    let platform = metadata.group.platform.as_deref().unwrap_or("").trim();
    let title = metadata.group.name.as_deref().unwrap_or("Unknown Game");
    let year = metadata.group.year.as_deref().unwrap_or("Unknown");

    let manufacturer = manufacturer_for(platform);
    let title = clean_title(title);
    let subcategory = subcategory_for(metadata.torrent.game_dox_type.as_deref());

    Some(format!(
        "Games/{}/{}/{} ({}){}",
        manufacturer, platform, title, year, subcategory
    ))
}

pub fn manufacturer_for(platform: &str) -> &'static str {
    let platform = platform.to_lowercase();
    MANUFACTURERS
        .iter()
        .find(|(key, _)| platform.contains(*key))
        .map(|(_, manufacturer)| *manufacturer)
        .unwrap_or("Unknown")
}

// update/dlc/patch get a fixed label, any other marker is used as-is once
// path-illegal characters are stripped
fn subcategory_for(dox_type: Option<&str>) -> String {
    let dox_type = match dox_type.map(str::trim) {
        Some(d) if !d.is_empty() => d,
        _ => return String::new(),
    };

    match dox_type.to_lowercase().as_str() {
        "update" => "/Update".to_string(),
        "dlc" => "/DLC".to_string(),
        "patch" => "/Patch".to_string(),
        _ => format!("/{}", PATH_ILLEGAL.replace_all(dox_type, "")),
    }
}

/// Strips a remote game title down to something usable as a path segment:
/// HTML entities decoded, tag remnants and path-illegal characters removed,
/// whitespace collapsed, and anything outside alphanumerics, whitespace and
/// `- . ( ) [ ] & '` dropped.
pub fn clean_title(raw: &str) -> String {
    let decoded = html_escape::decode_html_entities(raw);
    let no_tags = HTML_TAG.replace_all(&decoded, "");
    let no_illegal = PATH_ILLEGAL.replace_all(&no_tags, "");
    let collapsed = WHITESPACE_RUN.replace_all(&no_illegal, " ");
    NON_TITLE.replace_all(collapsed.trim(), "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{GameGroup, GameRelease};

    fn metadata(platform: &str, name: &str, year: &str) -> GameMetadata {
        GameMetadata {
            group: GameGroup {
                platform: Some(platform.to_string()),
                name: Some(name.to_string()),
                year: Some(year.to_string()),
            },
            torrent: GameRelease::default(),
        }
    }

    #[test]
    fn playstation_platforms_resolve_to_sony() {
        assert_eq!("Sony", manufacturer_for("PlayStation 4"));
        assert_eq!("Sony", manufacturer_for("playstation vita"));
        assert_eq!("Sony", manufacturer_for("PLAYSTATION PORTABLE"));
    }

    #[test]
    fn every_table_entry_resolves() {
        assert_eq!("Microsoft", manufacturer_for("Windows"));
        assert_eq!("Microsoft", manufacturer_for("Xbox 360"));
        assert_eq!("Nintendo", manufacturer_for("Nintendo Switch"));
        assert_eq!("Nintendo", manufacturer_for("Wii U"));
        assert_eq!("Nintendo", manufacturer_for("GameCube"));
        assert_eq!("Apple", manufacturer_for("macOS"));
        assert_eq!("Apple", manufacturer_for("iOS"));
        assert_eq!("Google", manufacturer_for("Android"));
        assert_eq!("Valve", manufacturer_for("Steam Deck"));
        assert_eq!("Linux", manufacturer_for("Arch Linux"));
    }

    #[test]
    fn unknown_platform_resolves_to_unknown() {
        assert_eq!("Unknown", manufacturer_for("Commodore 64"));
        assert_eq!("Unknown", manufacturer_for(""));
    }

    #[test]
    fn cleaned_title_has_no_illegal_characters() {
        let cleaned = clean_title("  <b>Half/Life</b>: &quot;Blue\\Shift&quot;  *?|  ");

        for c in ['<', '>', '"', ':', '/', '\\', '|', '?', '*'] {
            assert!(!cleaned.contains(c), "{:?} still contains {:?}", cleaned, c);
        }
        assert!(!cleaned.contains("&quot;"));
        assert_eq!("HalfLife BlueShift", cleaned);
    }

    #[test]
    fn cleaned_title_keeps_basic_punctuation() {
        assert_eq!(
            "Foo - Bar (Director's Cut) [NTSC] & more v1.2",
            clean_title("Foo - Bar (Director's Cut) [NTSC] & more v1.2")
        );
    }

    #[test]
    fn derives_playstation_category_with_decoded_entities() {
        let meta = metadata("PlayStation 4", "Foo &#39;Bar&#39;", "2019");

        assert_eq!(
            Some("Games/Sony/PlayStation 4/Foo 'Bar' (2019)".to_string()),
            derive_category(Some(&meta))
        );
    }

    #[test]
    fn dlc_marker_maps_to_fixed_label_in_any_case() {
        for dox in ["dlc", "DLC", "Dlc"] {
            let mut meta = metadata("Windows", "Foo", "2020");
            meta.torrent.game_dox_type = Some(dox.to_string());

            let category = derive_category(Some(&meta)).unwrap();
            assert!(category.ends_with("/DLC"), "unexpected category {:?}", category);
        }
    }

    #[test]
    fn update_and_patch_markers_map_to_fixed_labels() {
        let mut meta = metadata("Windows", "Foo", "2020");

        meta.torrent.game_dox_type = Some("Update".to_string());
        assert!(derive_category(Some(&meta)).unwrap().ends_with("/Update"));

        meta.torrent.game_dox_type = Some("PATCH".to_string());
        assert!(derive_category(Some(&meta)).unwrap().ends_with("/Patch"));
    }

    #[test]
    fn other_release_markers_are_sanitized_and_kept() {
        let mut meta = metadata("Windows", "Foo", "2020");
        meta.torrent.game_dox_type = Some("Guide/Book?".to_string());

        assert!(derive_category(Some(&meta)).unwrap().ends_with("/GuideBook"));
    }

    #[test]
    fn empty_release_marker_adds_no_suffix() {
        let mut meta = metadata("Windows", "Foo", "2020");
        meta.torrent.game_dox_type = Some("  ".to_string());

        assert_eq!(
            Some("Games/Microsoft/Windows/Foo (2020)".to_string()),
            derive_category(Some(&meta))
        );
    }

    #[test]
    fn absent_metadata_produces_no_category() {
        assert_eq!(None, derive_category(None));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let meta = GameMetadata::default();

        assert_eq!(
            Some("Games/Unknown//Unknown Game (Unknown)".to_string()),
            derive_category(Some(&meta))
        );
    }

    #[test]
    fn derivation_is_deterministic() {
        let meta = metadata("Nintendo Switch", "Zelda &amp; Friends", "2017");

        assert_eq!(derive_category(Some(&meta)), derive_category(Some(&meta)));
    }
}
