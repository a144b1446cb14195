//! ---
//! osp_section: "15-testing-qa-runbook"
//! osp_subsection: "integration-tests"
//! osp_type: "test"
//! osp_scope: "code"
//! osp_description: "XML round trips of the system structure root."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
use osp_system_structure::{
    Algorithm, DictXml, EncodeOptions, ModelError, OspInitialValue, OspLinearTransformationFunction,
    OspSignalConnection, OspSignalEndpoint, OspSimulator, OspSystemStructure,
    OspValue, OspVariableConnection, OspVariableEndpoint, XmlSchema,
};

fn sample() -> OspSystemStructure {
    let mut structure = OspSystemStructure::builder()
        .base_step_size(0.01)
        .simulator(
            OspSimulator::builder()
                .name("chassis")
                .source_path("fmus/chassis.fmu")
                .initial_value(OspInitialValue::new("C.mChassis", 400.0))
                .initial_value(OspInitialValue::new("C.label", "front"))
                .build()
                .unwrap(),
        )
        .simulator(
            OspSimulator::builder()
                .name("wheel")
                .source("wheel.fmu")
                .step_size(0.001)
                .initial_value(OspInitialValue::new("W.enabled", true))
                .initial_value(OspInitialValue::new("W.spokes", 5_i32))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();
    structure.add_function(OspLinearTransformationFunction::new("gain", 2.0, 0.5));
    structure.add_connection(OspVariableConnection::new(
        OspVariableEndpoint::new("chassis", "p.e"),
        OspVariableEndpoint::new("wheel", "p1.e"),
    ));
    structure.add_connection(OspSignalConnection::new(
        OspVariableEndpoint::new("wheel", "p1.f"),
        OspSignalEndpoint::new("gain", "u"),
    ));
    structure
}

#[test]
fn xml_text_round_trip_preserves_the_model() {
    let structure = sample();
    let xml = structure.to_xml_string().unwrap();
    assert!(xml.contains(r#"<Simulator name="chassis" source="fmus/chassis.fmu">"#));
    assert!(xml.contains("<Algorithm>fixedStep</Algorithm>"));

    let decoded = OspSystemStructure::from_xml_str(&xml).unwrap();
    assert_eq!(decoded, structure);
    assert_eq!(decoded.to_dict_xml(), structure.to_dict_xml());
    assert_eq!(decoded.algorithm(), Algorithm::FixedStep);
}

#[test]
fn decode_encode_decode_is_stable() {
    let schema = XmlSchema::osp_system_structure();
    let first = schema.decode(&sample().to_xml_string().unwrap()).unwrap();
    let model = OspSystemStructure::from_dict_xml(&first).unwrap();
    let second = schema.decode(&model.to_xml_string().unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("OspSystemStructure.xml");
    let structure = sample();
    structure
        .write_xml_file(&path, &EncodeOptions::default())
        .unwrap();
    assert_eq!(OspSystemStructure::from_xml_file(&path).unwrap(), structure);
}

#[test]
fn empty_aggregates_stay_off_the_wire() {
    let mut structure = OspSystemStructure::new();
    structure.add_simulator(OspSimulator::new("only", "only.fmu"));
    let dict = structure.to_dict_xml();
    assert!(!dict.contains_key("Functions"));
    assert!(!dict.contains_key("Connections"));
    let xml = structure.to_xml_string().unwrap();
    assert!(!xml.contains("Functions"));
    assert!(!xml.contains("Connections"));
    structure.validate().unwrap();
}

#[test]
fn schema_violations_surface_as_xml_errors() {
    sample().validate().unwrap();

    let text = r#"<OspSystemStructure xmlns="http://opensimulationplatform.com/MSMI/OSPSystemStructure">
        <Simulators/>
        <Functions><Sum name="s" inputCount="-2"/></Functions>
    </OspSystemStructure>"#;
    assert!(matches!(
        OspSystemStructure::from_xml_str(text).unwrap_err(),
        ModelError::Xml(_)
    ));

    let unsupported = r#"<OspSystemStructure xmlns="http://opensimulationplatform.com/MSMI/OSPSystemStructure">
        <Algorithm>variableStep</Algorithm>
        <Simulators/>
    </OspSystemStructure>"#;
    assert!(OspSystemStructure::from_xml_str(unsupported).is_err());
}

#[test]
fn non_finite_doubles_survive_the_xml_round_trip() {
    let text = r#"<OspSystemStructure xmlns="http://opensimulationplatform.com/MSMI/OSPSystemStructure" version="0.1">
        <StartTime>-INF</StartTime>
        <Simulators>
          <Simulator name="source" source="source.fmu">
            <InitialValues>
              <InitialValue variable="limit"><Real value="INF"/></InitialValue>
              <InitialValue variable="unset"><Real value="NaN"/></InitialValue>
            </InitialValues>
          </Simulator>
        </Simulators>
        <Functions><LinearTransformation name="gain" factor="INF" offset="NaN"/></Functions>
    </OspSystemStructure>"#;
    let schema = XmlSchema::osp_system_structure();
    let decoded = schema.decode(text).unwrap();
    let model = OspSystemStructure::from_dict_xml(&decoded).unwrap();
    assert_eq!(model.start_time, Some(f64::NEG_INFINITY));
    let source = model.simulator("source").unwrap();
    assert_eq!(
        source.initial_value("limit").map(|initial| &initial.value),
        Some(&OspValue::Real(f64::INFINITY))
    );
    let gain = &model.functions.linear_transformations[0];
    assert_eq!(gain.factor, f64::INFINITY);
    assert!(gain.offset.is_nan());

    assert_eq!(model.to_dict_xml(), decoded);
    let xml = model.to_xml_string().unwrap();
    assert!(xml.contains(r#"<Real value="INF"/>"#));
    assert!(xml.contains(r#"factor="INF" offset="NaN""#));
    assert_eq!(schema.decode(&xml).unwrap(), decoded);
}

#[test]
fn built_non_finite_values_encode() {
    let mut structure = sample();
    structure.add_function(OspLinearTransformationFunction::new("clip", f64::NAN, f64::INFINITY));
    structure.simulators[0].add_initial_value(OspInitialValue::new("C.max", f64::NEG_INFINITY));
    structure.validate().unwrap();

    let xml = structure.to_xml_string().unwrap();
    assert!(xml.contains(r#"<Real value="-INF"/>"#));
    let reloaded = OspSystemStructure::from_xml_str(&xml).unwrap();
    assert_eq!(reloaded.to_dict_xml(), structure.to_dict_xml());
}
