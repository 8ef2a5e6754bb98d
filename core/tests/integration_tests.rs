use product_schema_core::{
    Breakpoints, DataFieldDraft, DataFieldDraftProps, DataFieldModification, DataFieldType,
    DataSectionDraft, DataSectionDraftProps, ErrorKind, GranularityLevel, Layout, LayoutPatch,
    LayoutProps, MoveDirection, OrganizationId, SectionId, SectionType, Template, TemplateDraft,
    TemplateDraftProps, UserId, validate_draft,
};
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn laptop() -> TemplateDraft {
    TemplateDraft::create(TemplateDraftProps {
        name: "Laptop".into(),
        description: "Portable computers".into(),
        sectors: vec!["ELECTRONICS".into()],
        organization_id: OrganizationId::from("org-1"),
        user_id: UserId::from("user-1"),
    })
}

fn section(name: &str, section_type: SectionType, level: Option<GranularityLevel>) -> DataSectionDraft {
    DataSectionDraft::create(DataSectionDraftProps {
        name: name.into(),
        section_type,
        layout: Layout::full_width(),
        granularity_level: level,
    })
    .unwrap()
}

fn field(name: &str, field_type: DataFieldType) -> DataFieldDraft {
    DataFieldDraft::create(DataFieldDraftProps {
        name: name.into(),
        field_type,
        options: None,
        layout: Layout::full_width(),
        granularity_level: GranularityLevel::Model,
    })
}

// ---------------------------------------------------------------------------
// Authoring and publishing
// ---------------------------------------------------------------------------

#[test]
fn test_laptop_publish_twice() {
    let mut draft = laptop();
    let specs = section("Specs", SectionType::Group, Some(GranularityLevel::Model));
    let specs_id = specs.id().clone();
    draft.add_section(specs).unwrap();

    let processor = field("Processor", DataFieldType::TextField);
    let processor_id = processor.id().clone();
    draft.add_data_field_to_section(&specs_id, processor).unwrap();

    let first = draft.publish(UserId::from("user-x")).unwrap();
    assert_eq!(first.version().to_string(), "1.0.0");
    assert_eq!(first.sections()[0].id(), &specs_id);
    assert_eq!(first.sections()[0].data_fields()[0].id(), &processor_id);

    draft
        .modify_data_field(
            &specs_id,
            &processor_id,
            DataFieldModification {
                name: Some("CPU".into()),
                options: json!({"maxLength": 40}).as_object().cloned(),
                layout: None,
            },
        )
        .unwrap();

    let second = draft.publish(UserId::from("user-x")).unwrap();
    assert_eq!(second.version().to_string(), "2.0.0");
    assert_ne!(first.id(), second.id());
    assert_eq!(second.sections()[0].data_fields()[0].id(), &processor_id);
    assert_eq!(second.sections()[0].data_fields()[0].name(), "CPU");
    assert_eq!(first.sections()[0].data_fields()[0].name(), "Processor");

    let history: Vec<String> = draft
        .publications()
        .iter()
        .map(|p| p.version.to_string())
        .collect();
    assert_eq!(history, vec!["1.0.0", "2.0.0"]);
    assert!(validate_draft(&draft).is_empty());
}

#[test]
fn test_repeatable_cannot_be_nested() {
    let mut draft = laptop();
    let parent = section("Parent", SectionType::Group, None);
    let parent_id = parent.id().clone();
    draft.add_section(parent).unwrap();

    let nested = section("Nested", SectionType::Repeatable, Some(GranularityLevel::Item));
    let err = draft.add_sub_section(&parent_id, nested).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Repeater section can only be added as root section"
    );
    assert_eq!(draft.sections().len(), 1);
    assert!(validate_draft(&draft).is_empty());
}

#[test]
fn test_template_serialization_round_trip() {
    let mut draft = laptop();
    let specs = section("Specs", SectionType::Group, None);
    let specs_id = specs.id().clone();
    draft.add_section(specs).unwrap();
    draft
        .add_sub_section(&specs_id, section("Display", SectionType::Group, None))
        .unwrap();
    draft
        .add_data_field_to_section(&specs_id, field("Link", DataFieldType::ProductPassportLink))
        .unwrap();

    let template = draft.publish(UserId::from("u")).unwrap();
    let value = serde_json::to_value(&template).unwrap();
    assert_eq!(value["version"], json!("1.0.0"));
    assert_eq!(value["sections"][0]["type"], json!("GROUP"));
    assert_eq!(
        value["sections"][0]["dataFields"][0]["type"],
        json!("PRODUCT_PASSPORT_LINK")
    );
    assert_eq!(value["sections"][1]["parentId"], json!(specs_id.as_str()));
    assert!(value.get("publications").is_none());

    let back: Template = serde_json::from_value(value).unwrap();
    assert_eq!(back, template);
}

#[test]
fn test_persisted_layout_is_validated() {
    let draft = laptop();
    let mut value = serde_json::to_value(&draft).unwrap();
    value["sections"] = json!([{
        "id": "s1",
        "name": "Bad",
        "type": "GROUP",
        "layout": {
            "colStart": {"sm": 0},
            "colSpan": {"sm": 12},
            "rowStart": {"sm": 1},
            "rowSpan": {"sm": 1}
        }
    }]);
    assert!(serde_json::from_value::<TemplateDraft>(value).is_err());
}

#[test]
fn test_edit_operations_report_kinds() {
    let mut draft = laptop();
    let a = section("A", SectionType::Group, None);
    let a_id = a.id().clone();
    draft.add_section(a).unwrap();

    let missing = SectionId::from("missing");
    let err = draft.move_section(&missing, MoveDirection::Up).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let props = LayoutProps {
        cols: None,
        col_start: Breakpoints::sm(1),
        col_span: Breakpoints::sm(6).with_md(4),
        row_start: Breakpoints::sm(1),
        row_span: Breakpoints::sm(1),
    };
    let layout = Layout::create(props).unwrap();
    assert_eq!(layout.col_span().md, Some(4));

    let err = draft
        .modify_section(
            &a_id,
            product_schema_core::SectionModification {
                name: None,
                layout: Some(LayoutPatch {
                    row_span: Some(Breakpoints::default().with_md(2)),
                    ..Default::default()
                }),
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}
