//! End-to-end: records arrive as camelCase JSON, the engine renders them,
//! and navigation works over the result.

use kintree::prelude::*;

const FAMILY_JSON: &str = r#"[
    {"id": "A", "name": "Alice", "parentId": "", "generation": 1,
     "photoUrl": "https://example.com/alice.png"},
    {"id": "B", "name": "Bob", "parentId": "A", "generation": 2},
    {"id": "C", "name": "Cara", "parentId": "A", "generation": 2}
]"#;

fn parse_members() -> Vec<MemberRecord> {
    serde_json::from_str(FAMILY_JSON).expect("fixture parses")
}

#[test]
fn json_records_render_and_navigate() {
    let mut engine = Engine::new(
        FamilyId::new("demo"),
        Size::new(1200.0, 600.0),
        SceneHandlers::noop(),
    );
    engine.render(parse_members()).unwrap();

    let scene = engine.scene().unwrap();
    assert_eq!(scene.nodes().len(), 3);
    assert_eq!(scene.edges().len(), 2);

    assert_eq!(
        engine.show_lineage(&MemberId::new("B")).unwrap(),
        vec!["Bob".to_string(), "Alice".to_string()]
    );
    let gen2: Vec<&str> = engine.show_cohort(2).iter().map(|r| r.name.as_str()).collect();
    assert_eq!(gen2, vec!["Bob", "Cara"]);
}

#[test]
fn empty_parent_id_string_means_root() {
    let members = parse_members();
    assert!(members[0].parent_id.is_none());
    assert_eq!(members[1].parent_id.as_ref().unwrap(), &MemberId::new("A"));
}

#[test]
fn cyclic_json_is_rejected_with_structural_error() {
    let cyclic: Vec<MemberRecord> = serde_json::from_str(
        r#"[
            {"id": "A", "name": "Alice", "parentId": "B", "generation": 1},
            {"id": "B", "name": "Bob", "parentId": "A", "generation": 2}
        ]"#,
    )
    .unwrap();

    let mut engine = Engine::new(
        FamilyId::new("demo"),
        Size::new(1200.0, 600.0),
        SceneHandlers::noop(),
    );
    let err = engine.render(cyclic).unwrap_err();
    assert!(matches!(
        err,
        Error::Structural(StructuralError::CycleDetected { .. })
    ));
    assert!(engine.scene().is_none());
}
