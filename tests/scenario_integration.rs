//! ---
//! osp_section: "15-testing-qa-runbook"
//! osp_subsection: "integration-tests"
//! osp_type: "test"
//! osp_scope: "code"
//! osp_description: "Scenarios written against the quarter-truck system structure."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
use std::path::PathBuf;

use osp_scenario::{EventAction, OspEvent, OspScenario};
use osp_system_structure::OspSystemStructure;

fn quarter_truck() -> OspSystemStructure {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("files")
        .join("OspSystemStructure_QT_for_parsing_testing.xml");
    OspSystemStructure::from_xml_file(path).expect("fixture loads")
}

fn bump_scenario() -> OspScenario {
    let mut scenario = OspScenario::new("Road bump (rear)", 10.0, "Wheel hits a 5 cm bump");
    scenario.add_event(OspEvent::new(2.0, "ground", "zRoad", EventAction::Override, 0.05));
    scenario.add_event(OspEvent::new(2.5, "ground", "zRoad", EventAction::Reset, 0.0));
    scenario.add_event(OspEvent::new(4.0, "chassis", "C.mChassis", EventAction::Bias, 50.0));
    scenario
}

#[test]
fn scenario_events_target_known_simulators() {
    let model = quarter_truck();
    for event in &bump_scenario().events {
        assert!(
            model.simulator(&event.model).is_some(),
            "unknown simulator {}",
            event.model
        );
    }
}

#[test]
fn scenario_file_sits_next_to_the_system_structure() {
    let dir = tempfile::tempdir().expect("temp dir");
    let model = quarter_truck();
    model
        .write_xml_file(dir.path().join("OspSystemStructure.xml"), &Default::default())
        .expect("system structure written");

    let scenario = bump_scenario();
    let path = scenario.write_to_dir(dir.path()).expect("scenario written");
    assert_eq!(
        path.file_name().and_then(|name| name.to_str()),
        Some("Road_bump_(rear).json")
    );

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("readable")).expect("json");
    assert_eq!(raw["end"], serde_json::json!(10));
    assert_eq!(raw["events"][1]["action"], "reset");
    assert_eq!(raw["events"][2]["value"], serde_json::json!(50));

    let loaded = OspScenario::read_file(&path).expect("scenario reloads");
    assert_eq!(loaded.events, scenario.events);
    let reloaded_model = OspSystemStructure::from_xml_file(dir.path().join("OspSystemStructure.xml"))
        .expect("system structure reloads");
    assert_eq!(reloaded_model, model);
}
