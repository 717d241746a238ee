use artiflow_core::buildinfo::{Artifact, BuildInfo, Checksum, Dependency, ModuleType, Partial};

#[test]
fn test_artifact_dedup_key() {
    let artifact = Artifact {
        name: "app.jar".to_string(),
        checksum: Checksum {
            sha1: "s1".to_string(),
            md5: "m5".to_string(),
            sha256: "ignored".to_string(),
        },
        ..Default::default()
    };
    assert_eq!(artifact.dedup_key(), "app.jar-s1-m5");
}

#[test]
fn test_dependency_dedup_key_includes_scopes() {
    let dep = Dependency {
        id: "org.slf4j:slf4j-api:2.0.9".to_string(),
        scopes: vec!["compile".to_string(), "runtime".to_string()],
        checksum: Checksum {
            sha1: "s1".to_string(),
            md5: "m5".to_string(),
            ..Default::default()
        },
        ..Default::default()
    };
    assert_eq!(dep.dedup_key(), "org.slf4j:slf4j-api:2.0.9-s1-m5-compile,runtime");
}

#[test]
fn test_dependency_parses_requested_by_and_checksums() {
    let json = r#"{
        "id": "lodash:4.17.21",
        "sha1": "abc",
        "requestedBy": [["express:4.18.2", "app:1.0.0"], ["app:1.0.0"]]
    }"#;
    let dep: Dependency = serde_json::from_str(json).unwrap();
    assert_eq!(dep.checksum.sha1, "abc");
    assert_eq!(
        dep.direct_parents().collect::<Vec<_>>(),
        vec!["express:4.18.2", "app:1.0.0"]
    );
}

#[test]
fn test_partial_omits_absent_payloads() {
    let partial = Partial {
        timestamp: 7,
        module_type: ModuleType::Generic,
        vcs_list: Some(vec![]),
        ..Default::default()
    };
    let json = serde_json::to_value(&partial).unwrap();
    assert_eq!(json["moduleType"], "generic");
    assert!(json.get("artifacts").is_none());
    assert!(json["vcs"].as_array().unwrap().is_empty());
}

#[test]
fn test_build_info_from_json() {
    let json = r#"{
        "name": "npm-build",
        "number": "3",
        "modules": [{"type": "npm", "id": "app:1.0.0", "dependencies": [{"id": "a:1"}]}]
    }"#;
    let info = BuildInfo::from_json(json).unwrap();
    assert_eq!(info.modules[0].module_type, ModuleType::Npm);
    assert_eq!(info.modules[0].dependencies[0].id, "a:1");
    assert!(BuildInfo::from_json("{").is_err());
}
