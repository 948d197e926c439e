// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    rust       = { "rust", Language::Compiled },
    rust_upper = { "Rust", Language::Compiled },
    js         = { "js", Language::Interpreted },
    javascript = { "javascript", Language::Interpreted },
)]
fn language_parses(input: &str, expected: Language) {
    assert_eq!(input.parse::<Language>().unwrap(), expected);
}

#[test]
fn unknown_language_is_rejected() {
    let err = "go".parse::<Language>().unwrap_err();
    assert_eq!(err, UnknownLanguage("go".to_string()));
}

#[test]
fn language_uses_original_type_tags_on_the_wire() {
    assert_eq!(serde_json::to_string(&Language::Compiled).unwrap(), "\"rust\"");
    assert_eq!(serde_json::to_string(&Language::Interpreted).unwrap(), "\"js\"");
}

#[yare::parameterized(
    compiled    = { Language::Compiled, ExtractionMode::Preserve, "Cargo.toml" },
    interpreted = { Language::Interpreted, ExtractionMode::StripRoot, "package.json" },
)]
fn language_selects_extraction_and_manifest(
    language: Language,
    mode: ExtractionMode,
    manifest: &str,
) {
    assert_eq!(language.extraction_mode(), mode);
    assert_eq!(language.manifest_file(), manifest);
}

#[test]
fn profile_tags() {
    assert_eq!(BuildProfile::from_release(false).tag(), "BUILD");
    assert_eq!(BuildProfile::from_release(true).tag(), "RELEASE");
    assert_eq!(BuildProfile::Release.target_dir(), "release");
    assert_eq!(BuildProfile::Build.target_dir(), "debug");
}

#[test]
fn generated_plugin_ids_are_uuids() {
    let id = PluginId::generate();
    assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());
    assert_ne!(id, PluginId::generate());
}

#[test]
fn record_reads_legacy_last_hash_field() {
    let json = r#"{"plugin_id":"p1","filename":"demo","language":"js","last_hash":"abcd"}"#;
    let record: PluginRecord = serde_json::from_str(json).unwrap();
    assert_eq!(record.language, Language::Interpreted);
    assert_eq!(record.last_fingerprint.as_ref().map(|f| f.as_str()), Some("abcd"));
    assert_eq!(record.last_artifact, None);
}

#[test]
fn fingerprints_are_tracked_per_profile() {
    let mut record = PluginRecord::new(PluginId::from("p1"), "demo", Language::Compiled);
    let fp = Fingerprint::of(b"archive");
    record.set_fingerprint(BuildProfile::Build, fp.clone());

    assert_eq!(record.fingerprint_for(BuildProfile::Build), Some(&fp));
    assert_eq!(record.fingerprint_for(BuildProfile::Release), None);
    assert_eq!(record.binaries(), vec![ArtifactKey::binary(&fp, BuildProfile::Build)]);

    record.set_fingerprint(BuildProfile::Release, fp.clone());
    assert_eq!(
        record.binaries(),
        vec![
            ArtifactKey::binary(&fp, BuildProfile::Build),
            ArtifactKey::binary(&fp, BuildProfile::Release),
        ]
    );
    let json = serde_json::to_string(&record).unwrap();
    assert!(json.contains("\"last_release_hash\""));
}
