//! Tests for flattening a loaded package set into export data.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use stylepak_export::{
    ExportError, ExportOutput, ExportSelection, ItemDefault, ItemDefaults, export_items,
};
use stylepak_packages::{Item, PackagesSet};
use stylepak_types::{Keyvalues, ObjectId};

fn export(selection: &ExportSelection) -> ExportOutput {
    init_tracing();
    export_items(&load_scenario(), selection).unwrap()
}

fn names(conf: &Keyvalues) -> Vec<&str> {
    conf.children().iter().map(Keyvalues::real_name).collect()
}

fn defaults_for(item_id: &str, default: ItemDefault) -> ItemDefaults {
    let mut defaults = ItemDefaults::default();
    defaults.set(item_id, default);
    defaults
}

// ── Items and palette ───────────────────────────────────────────

#[test]
fn every_item_is_exported_in_id_order() {
    let output = export(&ExportSelection::new("CLEAN"));

    let ids: Vec<&str> = output.items.iter().map(|item| item.item_id.as_str()).collect();
    assert_eq!(ids, vec!["ITEM_BUTTON", "ITEM_TIMER"]);
    for subtype in output.editor_items().flat_map(|editor| &editor.subtypes) {
        assert_eq!(subtype.pal_pos, None);
        assert_eq!(subtype.pal_name, None);
        assert_eq!(subtype.pal_icon, None);
    }
    assert!(output.warnings.is_empty(), "unexpected warnings: {:?}", output.warnings);
}

#[test]
fn editor_id_is_the_item_id() {
    let output = export(&ExportSelection::new("CLEAN"));
    let button = output.item("item_button").unwrap();
    assert_eq!(button.editor[0].id, "ITEM_BUTTON");
    assert_eq!(button.version, ObjectId::new("VER_DEFAULT"));
}

#[test]
fn palette_slots_are_stamped_in_order() {
    let selection = ExportSelection::new("CLEAN")
        .with_slot("ITEM_TIMER", 0)
        .with_slot("ITEM_BUTTON", 0)
        .with_slot("ITEM_TIMER", 2);
    let output = export(&selection);

    let timer = &output.item("ITEM_TIMER").unwrap().editor[0];
    assert_eq!(timer.subtypes[0].pal_pos, Some((0, 0)));
    assert_eq!(timer.subtypes[0].pal_name.as_deref(), Some("TIMER0"));
    assert_eq!(timer.subtypes[1].pal_pos, None);
    assert_eq!(timer.subtypes[1].pal_name, None);
    assert_eq!(timer.subtypes[2].pal_pos, Some((2, 0)));
    assert_eq!(timer.subtypes[2].pal_name.as_deref(), Some("TIMER2"));

    let button = &output.item("ITEM_BUTTON").unwrap().editor[0];
    assert_eq!(button.subtypes[0].pal_pos, Some((1, 0)));
    assert_eq!(button.subtypes[0].pal_icon.as_deref(), Some("palette/button.png"));
}

#[test]
fn palette_wraps_after_four_slots() {
    let selection = ExportSelection::new("CLEAN")
        .with_slot("ITEM_BUTTON", 0)
        .with_slot("ITEM_TIMER", 0)
        .with_slot("ITEM_TIMER", 1)
        .with_slot("ITEM_TIMER", 2)
        .with_slot("ITEM_GHOST", 0);
    let output = export(&selection);

    let timer = &output.item("ITEM_TIMER").unwrap().editor[0];
    assert_eq!(timer.subtypes[2].pal_pos, Some((3, 0)));
    assert_eq!(output.warnings, vec!["Palette refers to unknown item ITEM_GHOST".to_string()]);
}

#[test]
fn single_slot_of_grouped_item_uses_group_palette() {
    let output = export(&ExportSelection::new("CLEAN").with_slot("ITEM_TIMER", 1));

    let timer = &output.item("ITEM_TIMER").unwrap().editor[0];
    assert_eq!(timer.subtypes[1].pal_pos, Some((0, 0)));
    assert_eq!(timer.subtypes[1].pal_name.as_deref(), Some("Timer"));
    assert_eq!(timer.subtypes[1].pal_icon.as_deref(), Some("palette/timer_all.vtf"));
    assert_eq!(timer.subtypes[0].pal_pos, None);
}

#[test]
fn single_subtype_items_are_never_grouped() {
    let output = export(&ExportSelection::new("CLEAN").with_slot("ITEM_BUTTON", 0));
    let button = &output.item("ITEM_BUTTON").unwrap().editor[0];
    assert_eq!(button.subtypes[0].pal_name.as_deref(), Some("BUTTON"));
}

#[test]
fn missing_subtype_slot_is_reported() {
    let output = export(&ExportSelection::new("CLEAN").with_slot("ITEM_BUTTON", 4));
    assert_eq!(output.warnings, vec!["Item ITEM_BUTTON has no subtype 4".to_string()]);
}

#[test]
fn export_does_not_touch_resolved_data() {
    let set = load_scenario();
    let timer_variant = |set: &PackagesSet| {
        let timer = set.by_id::<Item>("ITEM_TIMER").unwrap();
        Arc::clone(timer.variant(&ObjectId::new("CLEAN"), "VER_DEFAULT").unwrap())
    };
    let before = timer_variant(&set);

    let selection = ExportSelection::new("CLEAN")
        .with_slot("ITEM_TIMER", 1)
        .with_defaults(defaults_for(
            "ITEM_TIMER",
            ItemDefault {
                version: None,
                defaults: [("TimerDelay".to_string(), "30".to_string())].into(),
            },
        ));
    export_items(&set, &selection).unwrap();

    let after = timer_variant(&set);
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(after.editor.id, "ITEM_TIMER");
    assert_eq!(after.editor.subtypes[1].pal_pos, Some((1, 0)));
    assert_eq!(after.editor.subtypes[1].pal_name.as_deref(), Some("TIMER1"));
    assert_eq!(after.editor.property("TimerDelay").unwrap().default, "3");
}

#[test]
fn extra_blocks_follow_the_item() {
    let pkg = scenario()
        .folder(
            "laser_clean",
            vec![
                editor_block("ITEM_LASER", &["Laser"]),
                editor_block("ITEM_LASER_CATCHER", &["Catcher"]),
            ],
            vec![],
            vec![],
        )
        .info(item("ITEM_LASER", vec![version("VER_DEFAULT", &[("CLEAN", "laser_clean")])]))
        .build();
    let set = load(vec![pkg]).unwrap();
    let output =
        export_items(&set, &ExportSelection::new("CLEAN").with_slot("ITEM_LASER", 0)).unwrap();

    let laser = output.item("ITEM_LASER").unwrap();
    let ids: Vec<&str> = laser.editor.iter().map(|editor| editor.id.as_str()).collect();
    assert_eq!(ids, vec!["ITEM_LASER", "ITEM_LASER_CATCHER"]);
    assert_eq!(laser.editor[1].subtypes[0].pal_pos, None);

    let all: Vec<&str> = output.editor_items().map(|editor| editor.id.as_str()).collect();
    assert_eq!(all, vec!["ITEM_BUTTON", "ITEM_LASER", "ITEM_LASER_CATCHER", "ITEM_TIMER"]);
}

// ── Versions and styles ─────────────────────────────────────────

#[test]
fn chosen_version_is_used() {
    let selection = ExportSelection::new("CLEAN").with_defaults(defaults_for(
        "ITEM_BUTTON",
        ItemDefault {
            version: Some("ver_alt".to_string()),
            ..ItemDefault::default()
        },
    ));
    let output = export(&selection);

    let button = output.item("ITEM_BUTTON").unwrap();
    assert_eq!(button.version, ObjectId::new("VER_ALT"));
    assert_eq!(names(&button.config), vec!["AllOption", "AltOption"]);
    assert!(output.warnings.is_empty());
}

#[test]
fn stale_version_falls_back_to_default() {
    let selection = ExportSelection::new("CLEAN").with_defaults(defaults_for(
        "ITEM_BUTTON",
        ItemDefault {
            version: Some("VER_GONE".to_string()),
            ..ItemDefault::default()
        },
    ));
    let output = export(&selection);

    assert_eq!(output.item("ITEM_BUTTON").unwrap().version, ObjectId::new("VER_DEFAULT"));
    assert_eq!(
        output.warnings,
        vec!["Version ID VER_GONE is not valid for item ITEM_BUTTON".to_string()]
    );
}

#[test]
fn child_style_exports_inherited_data() {
    let output = export(&ExportSelection::new("1950S").with_slot("ITEM_BUTTON", 0));

    let button = output.item("ITEM_BUTTON").unwrap();
    assert_eq!(button.editor[0].subtypes[0].pal_pos, Some((0, 0)));
    assert_eq!(output.config.children()[0], leaf("StyleOption", "fifties"));
}

#[test]
fn unknown_style_is_an_error() {
    init_tracing();
    let err = export_items(&load_scenario(), &ExportSelection::new("PORTAL3")).unwrap_err();
    assert!(matches!(
        err,
        ExportError::UnknownStyle(ref style) if *style == ObjectId::new("PORTAL3")
    ));
    assert_eq!(err.to_string(), "style \"PORTAL3\" is not loaded");
}

#[test]
fn load_errors_convert_into_export_errors() {
    fn load_and_export() -> stylepak_export::Result<ExportOutput> {
        let pkg = PackageBuilder::new("BROKEN")
            .info(item(
                "ITEM_NOWHERE",
                vec![version("VER_DEFAULT", &[("CLEAN", "missing_folder")])],
            ))
            .build();
        let set = load(vec![scenario().build(), pkg])?;
        export_items(&set, &ExportSelection::new("CLEAN"))
    }

    assert!(matches!(load_and_export(), Err(ExportError::Packages(_))));
}

// ── User defaults ───────────────────────────────────────────────

#[test]
fn user_defaults_apply_to_allowed_properties() {
    let selection = ExportSelection::new("CLEAN").with_defaults(defaults_for(
        "ITEM_TIMER",
        ItemDefault {
            version: None,
            defaults: [
                ("timerdelay".to_string(), "10".to_string()),
                ("ConnectionCount".to_string(), "5".to_string()),
                ("Colour".to_string(), "red".to_string()),
            ]
            .into(),
        },
    ));
    let output = export(&selection);

    let timer = &output.item("ITEM_TIMER").unwrap().editor[0];
    assert_eq!(timer.property("TimerDelay").unwrap().default, "10");
    assert_eq!(timer.property("ConnectionCount").unwrap().default, "0");
    assert_eq!(
        output.warnings,
        vec![
            "Item ITEM_TIMER has no property Colour".to_string(),
            "Property ConnectionCount of item ITEM_TIMER does not allow user defaults".to_string(),
        ]
    );
}

// ── Config trees ────────────────────────────────────────────────

#[test]
fn config_starts_with_style_then_items() {
    let output = export(&ExportSelection::new("CLEAN"));

    assert_eq!(names(&output.config), vec!["StyleOption", "AllOption", "Conditions", "Percent"]);
    let button = output.item("ITEM_BUTTON").unwrap();
    assert_eq!(names(&button.config), vec!["AllOption", "Conditions", "Percent"]);
    assert!(output.item("ITEM_TIMER").unwrap().config.children().is_empty());
}

#[test]
fn replacements_are_applied_and_removed() {
    let output = export(&ExportSelection::new("CLEAN"));
    let button = output.item("ITEM_BUTTON").unwrap();

    assert!(!button.config.contains("Replacements"));
    assert_eq!(
        button.config.find_key("Conditions").unwrap(),
        &block("Conditions", vec![leaf("Speed", "150")])
    );
    assert_eq!(button.config.get("Percent"), Some("100%"));
}

#[test]
fn unknown_variable_is_an_error() {
    let pkg = scenario()
        .folder(
            "broken_clean",
            vec![editor_block("ITEM_BROKEN", &["Broken"])],
            vec![],
            vec![block("Conditions", vec![leaf("%Target%", "1")])],
        )
        .info(item("ITEM_BROKEN", vec![version("VER_DEFAULT", &[("CLEAN", "broken_clean")])]))
        .build();
    let set = load(vec![pkg]).unwrap();

    let err = export_items(&set, &ExportSelection::new("CLEAN")).unwrap_err();
    match err {
        ExportError::UnresolvedVariable { source_desc, var, valid } => {
            assert_eq!(source_desc, "ITEM_BROKEN");
            assert_eq!(var, "Target");
            assert!(valid.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn item_config_objects_follow_the_item_config() {
    let aux = PackageBuilder::new("EXTRA_CONF")
        .file(
            "items/aux_clean.cfg",
            Keyvalues::root(vec![
                block("Replacements", vec![leaf("mode", "clean")]),
                leaf("AuxStyle", "%MODE%"),
            ]),
        )
        .info(block(
            "ItemConfig",
            vec![
                leaf("ID", "ITEM_BUTTON"),
                block("all_conf", vec![leaf("AuxAll", "1")]),
                block(
                    "Version",
                    vec![
                        leaf("ID", "VER_DEFAULT"),
                        block("Styles", vec![leaf("CLEAN", "aux_clean")]),
                    ],
                ),
            ],
        ))
        .build();
    let set = load(vec![scenario().build(), aux]).unwrap();

    let output = export_items(&set, &ExportSelection::new("1950S")).unwrap();
    let button = output.item("ITEM_BUTTON").unwrap();
    assert_eq!(
        names(&button.config),
        vec!["AllOption", "Conditions", "Percent", "AuxAll", "AuxStyle"]
    );
    assert_eq!(button.config.get("AuxStyle"), Some("clean"));

    // Only the default version has per-style aux config.
    let alt = ExportSelection::new("1950S").with_defaults(defaults_for(
        "ITEM_BUTTON",
        ItemDefault {
            version: Some("VER_ALT".to_string()),
            ..ItemDefault::default()
        },
    ));
    let output = export_items(&set, &alt).unwrap();
    let button = output.item("ITEM_BUTTON").unwrap();
    assert_eq!(button.config.get("AuxAll"), Some("1"));
    assert_eq!(button.config.get("AuxStyle"), None);
}
