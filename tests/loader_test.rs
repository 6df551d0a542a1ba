// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end loader tests using inline STEP content.

use std::sync::Arc;

use ifc_tape::{
    schema, Error, IfcLoader, IfcSchema, IfcTokenType, IfcValue, LoaderSettings, ModelManager,
    RawLineData,
};

const MINIMAL_FILE: &str = r#"ISO-10303-21;
HEADER; FILE_DESCRIPTION(('x'),'2;1'); FILE_NAME('n','',(''),(''),'t'); FILE_SCHEMA(('IFC2X3')); ENDSEC;
DATA;
#1= IFCPROJECT('g',$,'p',$,$,$,$,(#2),#3);
#2= IFCGEOMETRICREPRESENTATIONCONTEXT($,$,3,1.0E-5,$,$);
#3= IFCUNITASSIGNMENT((#4));
#4= IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
ENDSEC; END-ISO-10303-21;
"#;

fn load(content: &str) -> IfcLoader {
    IfcLoader::open(
        content.as_bytes(),
        LoaderSettings::default(),
        Arc::new(IfcSchema::new()),
    )
    .unwrap()
}

#[test]
fn test_minimal_file_loads_and_scales() {
    let loader = load(MINIMAL_FILE);

    assert_eq!(loader.num_lines(), 4);
    assert_eq!(loader.express_ids_with_type(schema::IFCPROJECT), vec![1]);
    assert_eq!(loader.all_express_ids(), vec![1, 2, 3, 4]);
    assert_eq!(loader.linear_scaling_factor(), 0.001);
}

#[test]
fn test_minimal_file_line_decodes() {
    let mut loader = load(MINIMAL_FILE);

    let unit = loader.get_line(4).unwrap();
    assert_eq!(unit.ifc_type, schema::IFCSIUNIT);
    assert_eq!(
        unit.arguments,
        vec![
            IfcValue::Unknown,
            IfcValue::Enum("LENGTHUNIT".into()),
            IfcValue::Enum("MILLI".into()),
            IfcValue::Enum("METRE".into()),
        ]
    );

    let project = loader.get_line(1).unwrap();
    assert_eq!(project.arguments.len(), 9);
    assert_eq!(project.arguments[7], IfcValue::Set(vec![IfcValue::Ref(2)]));
    assert_eq!(project.arguments[8], IfcValue::Ref(3));
}

#[test]
fn test_unit_without_prefix_is_metres() {
    let loader = load(
        r#"DATA;
#1= IFCPROJECT('g',$,'p',$,$,$,$,(#2),#3);
#2= IFCGEOMETRICREPRESENTATIONCONTEXT($,$,3,1.0E-5,$,$);
#3= IFCUNITASSIGNMENT((#4));
#4= IFCSIUNIT(*,.LENGTHUNIT.,$,.METRE.);
ENDSEC;
"#,
    );
    assert_eq!(loader.linear_scaling_factor(), 1.0);
}

#[test]
fn test_missing_project_defaults_to_metres() {
    let loader = load("#1=IFCWALL($);");
    assert_eq!(loader.linear_scaling_factor(), 1.0);
}

#[test]
fn test_rel_voids_preserve_file_order() {
    let loader = load(
        r#"DATA;
#10=IFCWALL('w',$,$,$,$,$,$,$);
#20=IFCOPENINGELEMENT('o1',$,$,$,$,$,$,$);
#21=IFCOPENINGELEMENT('o2',$,$,$,$,$,$,$);
#30=IFCRELVOIDSELEMENT('r1',$,$,$,#10,#20);
#31=IFCRELVOIDSELEMENT('r2',$,$,$,#10,#21);
ENDSEC;
"#,
    );
    assert_eq!(loader.rel_voids()[&10], vec![20, 21]);
    assert_eq!(loader.skipped_rel_lines(), 0);
}

#[test]
fn test_rel_aggregates_collect_children() {
    let loader = load(
        r#"#1=IFCBUILDING('b',$,$,$,$,$,$,$,$,$,$,$);
#2=IFCBUILDINGSTOREY('s1',$,$,$,$,$,$,$,$,$);
#3=IFCBUILDINGSTOREY('s2',$,$,$,$,$,$,$,$,$);
#9=IFCRELAGGREGATES('r',$,$,$,#1,(#2,#3));
"#,
    );
    assert_eq!(loader.rel_aggregates()[&1], vec![2, 3]);
}

#[test]
fn test_styled_items_pair_item_with_assignments() {
    let loader = load(
        r#"#30=IFCEXTRUDEDAREASOLID($,$,$,1.0);
#40=IFCPRESENTATIONSTYLEASSIGNMENT(($));
#41=IFCPRESENTATIONSTYLEASSIGNMENT(($));
#50=IFCSTYLEDITEM(#30,(#40,#41),$);
"#,
    );
    assert_eq!(loader.styled_items()[&30], vec![(50, 40), (50, 41)]);
}

#[test]
fn test_styled_item_without_item_ref_is_skipped() {
    let loader = load("#50=IFCSTYLEDITEM($,(#40),$);\n");
    assert!(loader.styled_items().is_empty());
    assert_eq!(loader.skipped_rel_lines(), 1);
}

#[test]
fn test_rel_materials_and_definitions() {
    let loader = load(
        r#"#7=IFCWALL('w1',$,$,$,$,$,$,$);
#8=IFCWALL('w2',$,$,$,$,$,$,$);
#9=IFCMATERIAL('concrete');
#11=IFCRELASSOCIATESMATERIAL('r',$,$,$,(#7,#8),#9);
#12=IFCSTYLEDREPRESENTATION($,$,$,$);
#13=IFCMATERIALDEFINITIONREPRESENTATION($,$,(#12),#9);
"#,
    );
    assert_eq!(loader.rel_materials()[&7], vec![(11, 9)]);
    assert_eq!(loader.rel_materials()[&8], vec![(11, 9)]);
    assert_eq!(loader.material_definitions()[&9], vec![(13, 12)]);
}

#[test]
fn test_malformed_relationship_line_is_counted_not_fatal() {
    // building-element argument is $ instead of a ref
    let loader = load("#30=IFCRELVOIDSELEMENT('r',$,$,$,$,#20);\n#31=IFCWALL($);\n");
    assert!(loader.rel_voids().is_empty());
    assert_eq!(loader.skipped_rel_lines(), 1);
    assert_eq!(loader.num_lines(), 2);
}

#[test]
fn test_write_new_line_and_read_back() {
    let mut loader = load(MINIMAL_FILE);

    let arguments = vec![
        IfcValue::String("gid".into()),
        IfcValue::Empty,
        IfcValue::String("name".into()),
        IfcValue::Empty,
        IfcValue::Set(vec![IfcValue::Ref(1), IfcValue::Ref(2)]),
    ];
    loader
        .write_raw_line(999, schema::IFCPROPERTYSET, &arguments)
        .unwrap();

    let read_back = loader.get_line(999).unwrap();
    assert_eq!(read_back.express_id, 999);
    assert_eq!(read_back.ifc_type, schema::IFCPROPERTYSET);
    assert_eq!(read_back.arguments, arguments);
    assert_eq!(
        loader.express_ids_with_type(schema::IFCPROPERTYSET),
        vec![999]
    );
    assert_eq!(loader.all_express_ids(), vec![1, 2, 3, 4, 999]);
}

#[test]
fn test_overwrite_line_repoints_without_duplicating() {
    let mut loader = load("#1=IFCWALL('old',$);");
    loader
        .write_raw_line(1, schema::IFCWALL, &[IfcValue::String("new".into())])
        .unwrap();

    assert_eq!(loader.num_lines(), 1);
    let line = loader.get_line(1).unwrap();
    assert_eq!(line.arguments, vec![IfcValue::String("new".into())]);
    assert_eq!(loader.express_ids_with_type(schema::IFCWALL), vec![1]);
}

#[test]
fn test_write_unknown_type_code_fails() {
    let mut loader = load("#1=IFCWALL($);");
    let err = loader.write_raw_line(2, 9999, &[]).unwrap_err();
    assert!(matches!(err, Error::UnknownType(9999)));
    assert_eq!(loader.num_lines(), 1);
}

#[test]
fn test_escaped_quote_survives_load_and_dump() {
    let mut loader = load("#1=IFCWALL(('it''s'));");
    let line = loader.get_line(1).unwrap();
    assert_eq!(
        line.arguments,
        vec![IfcValue::Set(vec![IfcValue::String("it's".into())])]
    );

    let dumped = loader.dump_as_ifc();
    assert!(dumped.contains("'it''s'"));
}

#[test]
fn test_real_round_trips_through_dump() {
    let mut loader = load("#1=X(1.23456789012345);");
    let dumped = loader.dump_as_ifc();

    let mut reloaded = load(&dumped);
    let line = reloaded.get_line(1).unwrap();
    assert_eq!(line.arguments, vec![IfcValue::Real(1.23456789012345)]);
}

#[test]
fn test_unknown_label_is_indexed_but_untyped() {
    let mut loader = load("#1=XNOTINSCHEMA(1.0);");
    let line = loader.get_line(1).unwrap();
    assert_eq!(line.ifc_type, 0);
    assert_eq!(loader.express_ids_with_type(schema::IFCWALL), Vec::<u32>::new());
}

#[test]
fn test_unbalanced_set_aborts_load() {
    let result = IfcLoader::open(
        b"#1=X((1,2);",
        LoaderSettings::default(),
        Arc::new(IfcSchema::new()),
    );
    assert!(matches!(result, Err(Error::Parse { .. })));
}

#[test]
fn test_empty_model_round_trips_header() {
    let mut loader = load(
        "ISO-10303-21;\nHEADER; FILE_SCHEMA(('IFC2X3')); ENDSEC;\nDATA;\nENDSEC; END-ISO-10303-21;\n",
    );
    assert_eq!(loader.num_lines(), 0);

    let dumped = loader.dump_as_ifc();
    let reloaded = load(&dumped);
    assert_eq!(reloaded.num_lines(), 0);
}

#[test]
fn test_dangling_reference_is_allowed_until_lookup() {
    let mut loader = load("#1=IFCWALL(#999);");
    let line = loader.get_line(1).unwrap();
    assert_eq!(line.arguments, vec![IfcValue::Ref(999)]);
    assert!(matches!(loader.get_line(999), Err(Error::UnknownLine(999))));
}

#[test]
fn test_max_length_string_is_preserved() {
    let long = "y".repeat(255);
    let mut loader = load(&format!("#1=IFCWALL(('{long}'));"));
    let line = loader.get_line(1).unwrap();
    assert_eq!(line.arguments, vec![IfcValue::Set(vec![IfcValue::String(long)])]);
}

#[test]
fn test_oversized_string_fails_open() {
    let long = "y".repeat(256);
    let result = IfcLoader::open(
        format!("#1=IFCWALL(('{long}'));").as_bytes(),
        LoaderSettings::default(),
        Arc::new(IfcSchema::new()),
    );
    assert!(matches!(result, Err(Error::TokenTooLong { .. })));
}

#[test]
fn test_line_offsets_satisfy_token_invariants() {
    let mut loader = load(MINIMAL_FILE);
    let lines: Vec<_> = loader.lines().to_vec();
    let tape = loader.tape_mut();

    for line in lines {
        tape.move_to(line.tape_offset);
        assert_eq!(
            IfcTokenType::from_byte(tape.read_u8()),
            Some(IfcTokenType::SetBegin)
        );
        tape.move_to(line.tape_end - 1);
        assert_eq!(
            IfcTokenType::from_byte(tape.read_u8()),
            Some(IfcTokenType::LineEnd)
        );
    }
}

#[test]
fn test_handle_index_agrees_with_line_table() {
    let loader = load(MINIMAL_FILE);
    for line in loader.lines() {
        assert_eq!(loader.line_id_of(line.express_id), Some(line.line_index));
    }
    for (ifc_type, express_ids) in [
        (schema::IFCPROJECT, vec![1]),
        (schema::IFCUNITASSIGNMENT, vec![3]),
    ] {
        assert_eq!(loader.express_ids_with_type(ifc_type), express_ids);
        for &line_id in loader.line_ids_with_type(ifc_type) {
            assert_eq!(loader.lines()[line_id as usize].ifc_type, ifc_type);
        }
    }
}

#[test]
fn test_copy_line_tape_matches_token_range() {
    let loader = load("#1=IFCWALL('a',$);");
    let bytes = loader.copy_line_tape(1).unwrap();
    // REF tag + u32, LABEL tag + len + "IFCWALL", then the argument list
    assert_eq!(bytes[0], IfcTokenType::Ref as u8);
    assert_eq!(u32::from_le_bytes(bytes[1..5].try_into().unwrap()), 1);
    assert_eq!(bytes[5], IfcTokenType::Label as u8);
    assert_eq!(&bytes[7..14], b"IFCWALL");
    assert_eq!(*bytes.last().unwrap(), IfcTokenType::LineEnd as u8);
}

#[test]
fn test_full_model_round_trip() {
    let mut first = load(MINIMAL_FILE);
    let dumped = first.dump_as_ifc();
    let mut second = load(&dumped);

    assert_eq!(second.num_lines(), first.num_lines());
    assert_eq!(second.all_express_ids(), first.all_express_ids());
    assert_eq!(second.linear_scaling_factor(), first.linear_scaling_factor());
    for express_id in first.all_express_ids() {
        assert_eq!(
            second.get_line(express_id).unwrap(),
            first.get_line(express_id).unwrap()
        );
    }
    // a second dump is a fixed point
    assert_eq!(second.dump_as_ifc(), dumped);
}

#[test]
fn test_manager_surface_end_to_end() {
    let mut manager = ModelManager::new();
    let model = manager
        .open_model(MINIMAL_FILE.as_bytes(), LoaderSettings::default())
        .unwrap();

    assert_eq!(
        manager.get_line_ids_with_type(model, schema::IFCPROJECT).unwrap(),
        vec![1]
    );
    assert_eq!(manager.get_all_lines(model).unwrap(), vec![1, 2, 3, 4]);

    let raw = RawLineData {
        express_id: 77,
        ifc_type: schema::IFCPROPERTYSET,
        arguments: vec![IfcValue::String("ps".into()), IfcValue::Empty],
    };
    manager.write_line(model, &raw).unwrap();
    assert_eq!(manager.get_line(model, 77).unwrap(), raw);

    let exported = manager.export_file_as_ifc(model).unwrap();
    assert!(exported.contains("IFCPROPERTYSET('ps',$)"));

    manager.close_model(model).unwrap();
    assert!(!manager.is_model_open(model));
}
