//! ---
//! osp_section: "15-testing-qa-runbook"
//! osp_subsection: "integration-tests"
//! osp_type: "test"
//! osp_scope: "code"
//! osp_description: "JSON round trips of randomly generated scenarios."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
use osp_scenario::{EventAction, OspEvent, OspScenario};
use rand::seq::SliceRandom;
use rand::Rng;

fn random_str(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
        .collect()
}

fn random_event(model: &str, variable: &str) -> OspEvent {
    let mut rng = rand::thread_rng();
    let action = *EventAction::ALL.choose(&mut rng).unwrap();
    OspEvent::new(
        rng.gen::<f64>() * 100.0,
        model,
        variable,
        action,
        rng.gen::<f64>() * 10.0,
    )
}

fn random_scenario() -> OspScenario {
    let mut rng = rand::thread_rng();
    let models: Vec<(String, Vec<String>)> = (1..=3)
        .map(|i| {
            let variables = (0..rng.gen_range(1..=5)).map(|_| random_str(7)).collect();
            (format!("model {i}"), variables)
        })
        .collect();
    let mut scenario = OspScenario::new("Test scenario", 100.0, random_str(50));
    for _ in 0..rng.gen_range(1..=10) {
        let (model, variables) = models.choose(&mut rng).unwrap();
        let variable = variables.choose(&mut rng).unwrap();
        scenario.add_event(random_event(model, variable));
    }
    scenario
}

#[test]
fn dict_contains_every_event() {
    let scenario = random_scenario();
    let dict = scenario.to_dict().unwrap();
    assert_eq!(dict["end"], serde_json::json!(100));
    let events = dict["events"].as_array().unwrap();
    assert_eq!(events.len(), scenario.events.len());
    for event in &scenario.events {
        assert!(events.contains(&serde_json::to_value(event).unwrap()));
    }
}

#[test]
fn json_round_trip_restores_scenario() {
    let scenario = random_scenario();
    let text = scenario.to_json().unwrap();
    assert!(text.starts_with("{\n  \"description\""));

    let mut reloaded = OspScenario::new(scenario.name.clone(), 0.0, "");
    reloaded.from_json(&text).unwrap();
    assert_eq!(reloaded, scenario);
}

#[test]
fn file_round_trip_uses_sanitised_name() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = random_scenario();
    let path = scenario.write_to_dir(dir.path()).unwrap();
    assert_eq!(path.file_name().unwrap(), "Test_scenario.json");

    let loaded = OspScenario::read_file(&path).unwrap();
    assert_eq!(loaded.name, "Test_scenario");
    assert_eq!(loaded.events, scenario.events);
    assert_eq!(loaded.description, scenario.description);
}
