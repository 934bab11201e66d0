//! Tests for styles, their inheritance chains, and style variables.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use stylepak_packages::{CorridorKind, PackageError, Style, StyleChain, StyleVar, SuggestKind};
use stylepak_types::{Keyvalues, ObjectId};

fn id(raw: &str) -> ObjectId {
    ObjectId::new(raw)
}

fn get_style<'a>(set: &'a stylepak_packages::PackagesSet, style_id: &str) -> &'a Style {
    set.by_id::<Style>(style_id)
        .unwrap_or_else(|| panic!("style {style_id} should be loaded"))
}

fn chain<'a>(chains: &'a [StyleChain], style_id: &str) -> &'a StyleChain {
    chains
        .iter()
        .find(|chain| chain.id == id(style_id))
        .unwrap_or_else(|| panic!("no chain for {style_id}"))
}

// ── Parsing ─────────────────────────────────────────────────────

#[test]
fn style_reads_folder_and_metadata() {
    let pkg = PackageBuilder::new("BEE2_CLEAN_STYLE")
        .file("styles/clean/items.txt", Keyvalues::root(vec![leaf("ItemData", "clean")]))
        .file(
            "styles/clean/vbsp_config.cfg",
            Keyvalues::root(vec![block("Options", vec![leaf("staticPan", "1")])]),
        )
        .info(block(
            "Style",
            vec![
                leaf("ID", "CLEAN"),
                leaf("Name", "Clean"),
                leaf("Authors", "Valve"),
                leaf("Folder", "clean"),
                leaf("vpk_name", "CLEAN_VPK"),
                block(
                    "Suggested",
                    vec![leaf("quote", "QUOTE_CAVE"), leaf("Elev", "ELEVATOR_CLEAN")],
                ),
                block(
                    "Corridors",
                    vec![
                        leaf("icon_folder", "clean"),
                        block(
                            "sp_entry",
                            vec![
                                block("1", vec![leaf("name", "Entry One"), leaf("Desc", "First.")]),
                                leaf("2", "Entry Two"),
                            ],
                        ),
                    ],
                ),
            ],
        ))
        .build();
    let set = load(vec![pkg]).unwrap();
    let style = get_style(&set, "clean");

    assert_eq!(style.selitem.name, "Clean");
    assert!(style.selitem.authors.contains("Valve"));
    assert_eq!(style.editor.get("ItemData"), Some("clean"));
    assert_eq!(style.config.find_key("Options").and_then(|opt| opt.get("staticPan")), Some("1"));
    assert!(style.has_video);
    assert_eq!(style.vpk_name, "clean_vpk");
    assert_eq!(style.base_style(), None);
    assert_eq!(style.bases(), &[id("CLEAN")]);

    assert_eq!(style.suggested(SuggestKind::Quote).collect::<Vec<_>>(), vec!["QUOTE_CAVE"]);
    assert_eq!(style.suggested(SuggestKind::Elevator).collect::<Vec<_>>(), vec!["ELEVATOR_CLEAN"]);
    // Unset kinds get their defaults.
    assert_eq!(style.suggested(SuggestKind::Skybox).collect::<Vec<_>>(), vec!["SKY_BLACK"]);
    assert_eq!(style.suggested(SuggestKind::Music).collect::<Vec<_>>(), vec!["<NONE>"]);

    let first = style.corridor(CorridorKind::SpEntry, 1).unwrap();
    assert_eq!(first.name, "Entry One");
    assert_eq!(first.desc, "First.");
    assert_eq!(first.icon.as_deref(), Some("BEE2_CLEAN_STYLE:corr/clean/sp_entry/1.jpg"));
    assert_eq!(style.corridor(CorridorKind::SpEntry, 2).unwrap().name, "Entry Two");
    assert_eq!(style.corridor(CorridorKind::CoopExit, 4).unwrap().name, "");
    assert!(style.corridor(CorridorKind::SpExit, 5).is_none());
}

#[test]
fn primary_style_needs_a_folder() {
    let pkg = PackageBuilder::new("EXTRA")
        .info(block("Style", vec![leaf("ID", "FOLDERLESS"), leaf("Name", "No folder")]))
        .build();
    let err = load(vec![pkg]).unwrap_err();
    assert!(
        matches!(err.root_cause(), PackageError::MissingField { field: "folder", .. }),
        "unexpected error: {err}"
    );
    assert!(err.to_string().contains("FOLDERLESS"));
}

#[test]
fn missing_style_folder_is_fatal() {
    let pkg = PackageBuilder::new("EXTRA")
        .info(block("Style", vec![leaf("ID", "GHOST"), leaf("Folder", "ghost")]))
        .build();
    let err = load(vec![pkg]).unwrap_err();
    assert!(matches!(err.root_cause(), PackageError::Fs(fs) if fs.is_not_found()));
}

#[test]
fn unknown_suggestion_kinds_warn() {
    let pkg = clean_package()
        .info(block(
            "Style",
            vec![
                leaf("ID", "ODD"),
                leaf("Folder", "clean"),
                block("Suggested", vec![leaf("weather", "RAIN")]),
            ],
        ))
        .build();
    let set = load(vec![pkg]).unwrap();
    assert_eq!(
        set.warnings(),
        &["BEE2_CLEAN_STYLE: Unknown suggestion type for style ODD: weather".to_string()]
    );
}

#[test]
fn style_override_merges_into_primary() {
    let extra = PackageBuilder::new("EXTRA")
        .file("styles/clean_extra/items.txt", Keyvalues::root(vec![leaf("Extra", "1")]))
        .file(
            "styles/clean_extra/vbsp_config.cfg",
            Keyvalues::root(vec![leaf("extra_option", "1")]),
        )
        .info(block(
            "Overrides",
            vec![
                block(
                    "Style",
                    vec![
                        leaf("ID", "CLEAN"),
                        leaf("Authors", "Carl"),
                        leaf("Folder", "clean_extra"),
                        block("Suggested", vec![leaf("music", "MUSIC_EXTRA")]),
                    ],
                ),
                block("Style", vec![leaf("ID", "CLEAN"), leaf("Description", "Extra notes.")]),
            ],
        ))
        .build();
    let set = load(vec![clean_package().build(), extra]).unwrap();
    let style = get_style(&set, "CLEAN");

    assert_eq!(style.editor.get("style"), Some("CLEAN"));
    assert_eq!(style.editor.get("Extra"), Some("1"));
    assert_eq!(style.config.get("extra_option"), Some("1"));
    assert!(style.selitem.authors.contains("Carl"));
    assert_eq!(style.selitem.desc, "Extra notes.");
    assert!(style.selitem.packages.contains(&id("EXTRA")));
    assert_eq!(style.suggested(SuggestKind::Music).collect::<Vec<_>>(), vec!["MUSIC_EXTRA"]);
}

#[test]
fn override_without_primary_is_fatal() {
    let extra = PackageBuilder::new("EXTRA")
        .info(block("Overrides", vec![block("Style", vec![leaf("ID", "WARTIME")])]))
        .build();
    let err = load(vec![clean_package().build(), extra]).unwrap_err();
    match err {
        PackageError::OverrideWithoutPrimary { obj_id, pak_id, .. } => {
            assert_eq!(obj_id, id("WARTIME"));
            assert_eq!(pak_id, id("EXTRA"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ── Inheritance chains ──────────────────────────────────────────

#[test]
fn bases_walk_to_the_root() {
    let pkg = clean_package()
        .style("1950S", Some("CLEAN"))
        .style("1950S_RETRO", Some("1950s"))
        .build();
    let set = load(vec![pkg]).unwrap();

    assert_eq!(
        get_style(&set, "1950S_RETRO").bases(),
        &[id("1950S_RETRO"), id("1950S"), id("CLEAN")]
    );
    assert_eq!(get_style(&set, "1950S").base_style(), Some(&id("CLEAN")));

    let chains = set.style_chains();
    let ids: Vec<&ObjectId> = chains.iter().map(|chain| &chain.id).collect();
    assert_eq!(ids, vec![&id("1950S"), &id("1950S_RETRO"), &id("CLEAN")]);
}

#[test]
fn unknown_base_ends_the_chain() {
    let pkg = clean_package().style("ORPHAN", Some("GONE")).build();
    let set = load(vec![pkg]).unwrap();

    assert_eq!(get_style(&set, "ORPHAN").bases(), &[id("ORPHAN")]);
    assert_eq!(set.warnings(), &["BEE2_CLEAN_STYLE: Unknown style \"GONE\"".to_string()]);
}

#[test]
fn base_loops_are_fatal() {
    let pkg = clean_package()
        .style("LOOP_A", Some("LOOP_B"))
        .style("LOOP_B", Some("LOOP_A"))
        .build();
    let err = load(vec![pkg]).unwrap_err();
    assert!(
        matches!(err, PackageError::StyleLoop(ref style) if *style == id("LOOP_A")),
        "unexpected error: {err}"
    );

    let pkg = clean_package().style("NARCISSUS", Some("NARCISSUS")).build();
    let err = load(vec![pkg]).unwrap_err();
    assert!(matches!(err, PackageError::StyleLoop(ref style) if *style == id("NARCISSUS")));
}

// ── Style variables ─────────────────────────────────────────────

fn stylevar(id: &str, extra: Vec<Keyvalues>) -> Keyvalues {
    let mut children = vec![leaf("ID", id), leaf("Name", "")];
    children.extend(extra);
    block("StyleVar", children)
}

#[test]
fn stylevar_applies_to_listed_styles() {
    let pkg = clean_package()
        .style("1950S", Some("CLEAN"))
        .style("BTS", None)
        .info(stylevar(
            "CAVE_PORTRAIT",
            vec![leaf("Name", "Cave portrait"), leaf("Style", "CLEAN"), leaf("Enabled", "1")],
        ))
        .info(stylevar(
            "STRICT",
            vec![leaf("Style", "CLEAN"), leaf("Inherit", "0")],
        ))
        .info(stylevar("EVERYWHERE", vec![leaf("Unstyled", "1"), leaf("Style", "BTS")]))
        .build();
    let set = load(vec![pkg]).unwrap();
    let chains = set.style_chains();

    let cave = set.by_id::<StyleVar>("CAVE_PORTRAIT").unwrap();
    assert!(cave.default);
    assert!(cave.inherit);
    assert!(cave.applies_to(chain(&chains, "CLEAN")));
    assert!(cave.applies_to(chain(&chains, "1950S")));
    assert!(!cave.applies_to(chain(&chains, "BTS")));
    assert!(!cave.applies_to_all(chains.iter()));

    let strict = set.by_id::<StyleVar>("STRICT").unwrap();
    assert!(!strict.default);
    assert!(strict.applies_to(chain(&chains, "CLEAN")));
    assert!(!strict.applies_to(chain(&chains, "1950S")));

    let everywhere = set.by_id::<StyleVar>("EVERYWHERE").unwrap();
    assert!(everywhere.is_unstyled());
    assert!(everywhere.applies_to_all(chains.iter()));
}

#[test]
fn stylevar_declarations_merge() {
    let first = clean_package()
        .style("1950S", Some("CLEAN"))
        .info(stylevar(
            "MULTIVERSE",
            vec![leaf("Style", "CLEAN"), leaf("Description", "Caves everywhere.")],
        ))
        .build();
    let second = PackageBuilder::new("EXTRA")
        .info(stylevar(
            "MULTIVERSE",
            vec![
                leaf("Name", "Multiverse Cave"),
                leaf("Style", "1950S"),
                leaf("Description", "Also in the fifties."),
            ],
        ))
        .build();
    let set = load(vec![first, second]).unwrap();
    let var = set.by_id::<StyleVar>("multiverse").unwrap();

    assert_eq!(var.name, "Multiverse Cave");
    assert_eq!(var.styles, Some(vec![id("CLEAN"), id("1950S")]));
    assert_eq!(var.desc, "Caves everywhere.\n\nAlso in the fifties.");
}

#[test]
fn unstyled_stylevar_wins_merges() {
    let builtin = StyleVar::unstyled("MULTIVERSE", "Multiverse Cave", true, "Caves everywhere.");
    assert!(builtin.is_unstyled());
    assert!(builtin.default);

    let first = clean_package()
        .info(stylevar("MULTIVERSE", vec![leaf("Style", "CLEAN")]))
        .build();
    let second = PackageBuilder::new("EXTRA")
        .info(stylevar("MULTIVERSE", vec![leaf("Unstyled", "1")]))
        .build();
    let set = load(vec![first, second]).unwrap();
    assert!(set.by_id::<StyleVar>("MULTIVERSE").unwrap().is_unstyled());
}
