use std::fs;

use serde::{Deserialize, Serialize};
use tempfile::tempdir;
use toml::Table;

use crate::{Config, ConfigKind, ErrorKind, extract_diff, merge};

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
struct PatrolConfig {
    name: String,
    laps: u32,
    route: RouteConfig,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
struct RouteConfig {
    speed: f64,
    reverse: bool,
}

impl Config for PatrolConfig {
    const PATH: &'static str = "patrol.toml";
}

const MAIN: &str = r#"
name = "main"
laps = 3

[route]
speed = 0.5
reverse = false
"#;

#[test]
fn test_load_main() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("patrol.toml"), MAIN).unwrap();

    let config = PatrolConfig::load(dir.path()).unwrap();
    assert_eq!(config.name, "main");
    assert_eq!(config.laps, 3);
    assert!(!config.route.reverse);
}

#[test]
fn test_overlay_takes_precedence() {
    let main = tempdir().unwrap();
    let overlay = tempdir().unwrap();
    fs::write(main.path().join("patrol.toml"), MAIN).unwrap();
    fs::write(
        overlay.path().join("patrol.toml"),
        "laps = 7\n[route]\nreverse = true\n",
    )
    .unwrap();

    let config = PatrolConfig::load_with_overlay(main.path(), overlay.path()).unwrap();
    assert_eq!(config.name, "main");
    assert_eq!(config.laps, 7);
    assert!((config.route.speed - 0.5).abs() < f64::EPSILON);
    assert!(config.route.reverse);
}

#[test]
fn test_missing_overlay_reports_overlay_kind() {
    let main = tempdir().unwrap();
    let overlay = tempdir().unwrap();
    fs::write(main.path().join("patrol.toml"), MAIN).unwrap();

    let error = PatrolConfig::load_with_overlay(main.path(), overlay.path()).unwrap_err();
    assert_eq!(error.name, "patrol.toml");
    assert!(matches!(
        error.kind,
        ErrorKind::Load {
            config_kind: ConfigKind::Overlay,
            ..
        }
    ));
}

#[test]
fn test_unknown_key_is_rejected() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("patrol.toml"),
        format!("{MAIN}\n[extra]\nvalue = 1\n"),
    )
    .unwrap();

    let error = PatrolConfig::load(dir.path()).unwrap_err();
    assert!(matches!(error.kind, ErrorKind::Deserialize(_)));
}

#[test]
fn test_invalid_toml_is_a_parse_error() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("patrol.toml"), "laps = = 3").unwrap();

    let error = PatrolConfig::load(dir.path()).unwrap_err();
    assert!(matches!(
        error.kind,
        ErrorKind::Parse {
            config_kind: ConfigKind::Main,
            ..
        }
    ));
}

#[test]
fn test_extract_diff() {
    let main: Table = MAIN.parse().unwrap();
    let changed: Table = r#"
        name = "main"
        laps = 4

        [route]
        speed = 0.5
        reverse = true
    "#
    .parse()
    .unwrap();

    let diff = extract_diff(&main, &changed);
    assert!(!diff.contains_key("name"));
    assert_eq!(diff["laps"].as_integer(), Some(4));

    let route = diff["route"].as_table().unwrap();
    assert!(!route.contains_key("speed"));
    assert_eq!(route["reverse"].as_bool(), Some(true));
}

#[test]
fn test_merge_keeps_overlay_only_keys() {
    let main: Table = "a = 1\n[t]\nb = 2\n".parse().unwrap();
    let overlay: Table = "c = 3\n[t]\nd = 4\n".parse().unwrap();

    let merged = merge(main, overlay);
    assert_eq!(merged["a"].as_integer(), Some(1));
    assert_eq!(merged["c"].as_integer(), Some(3));
    assert_eq!(merged["t"]["b"].as_integer(), Some(2));
    assert_eq!(merged["t"]["d"].as_integer(), Some(4));
}

#[test]
fn test_save_as_overlay_round_trip() {
    let main_dir = tempdir().unwrap();
    let overlay_dir = tempdir().unwrap();
    fs::write(main_dir.path().join("patrol.toml"), MAIN).unwrap();

    let main = PatrolConfig::load(main_dir.path()).unwrap();
    let mut tuned = main.clone();
    tuned.route.speed = 0.8;

    tuned.save_as_overlay(&main, overlay_dir.path()).unwrap();

    let written: Table = fs::read_to_string(overlay_dir.path().join("patrol.toml"))
        .unwrap()
        .parse()
        .unwrap();
    assert!(!written.contains_key("name"));
    assert!(!written.contains_key("laps"));

    let reloaded = PatrolConfig::load_with_overlay(main_dir.path(), overlay_dir.path()).unwrap();
    assert_eq!(reloaded, tuned);
}

#[test]
fn test_store_creates_directories() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("deployed").join("config");

    let config = PatrolConfig {
        name: "stored".to_string(),
        laps: 1,
        route: RouteConfig {
            speed: 1.0,
            reverse: false,
        },
    };
    config.store(&nested).unwrap();

    assert_eq!(PatrolConfig::load(&nested).unwrap(), config);
}
