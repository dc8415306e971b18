use serde_json::json;

use form_spec::{
    EntityKind, FieldId, FieldOrder, FieldType, FieldWriteSpec, FormError, FormId, FormStore,
    FormWriteRequest, OptionsInput, ResponseId, ResponseOrder, ResponsePolicy,
    ResponseWriteRequest,
};

fn event_form(store: &mut FormStore) -> (FormId, FieldId) {
    let request: FormWriteRequest = serde_json::from_value(json!({
        "title": "Event",
        "fields": [{
            "field_type": "select",
            "label": "Meal",
            "position": 0,
            "options": "Veg|veg\nMeat|meat"
        }]
    }))
    .expect("deserialize");
    let form_id = store.create_form(&request).expect("create form");
    let field_id = store.fields(form_id, FieldOrder::Position).unwrap()[0].id;
    (form_id, field_id)
}

fn profile_form(store: &mut FormStore) -> (FormId, Vec<FieldId>) {
    let request = FormWriteRequest::new("Profile")
        .with_field(FieldWriteSpec::create(FieldType::Number, "Age", 1))
        .with_field(FieldWriteSpec::create(FieldType::Input, "Name", 0))
        .with_field(
            FieldWriteSpec::create(FieldType::Select, "Country", 2)
                .with_options(OptionsInput::Text("Romania\nItalia|it".into())),
        );
    let form_id = store.create_form(&request).expect("create form");
    let ids = store
        .fields(form_id, FieldOrder::Creation)
        .unwrap()
        .into_iter()
        .map(|field| field.id)
        .collect();
    (form_id, ids)
}

#[test]
fn event_response_round_trip() {
    let mut store = FormStore::new();
    let (form_id, meal) = event_form(&mut store);

    let request: ResponseWriteRequest = serde_json::from_value(json!({
        "form_id": form_id,
        "answers": [{ "field_id": meal, "value": "veg" }]
    }))
    .expect("deserialize");
    let response_id = store
        .submit_response(&request, &ResponsePolicy::default())
        .expect("submit");

    let answers = store.answers(response_id).unwrap();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].value, "veg");
    assert_eq!(answers[0].field_id, meal);
}

#[test]
fn blank_value_rejects_the_whole_response() {
    let mut store = FormStore::new();
    let (form_id, meal) = event_form(&mut store);

    let request = ResponseWriteRequest::new(form_id).with_answer(meal, "");
    let err = store
        .submit_response(&request, &ResponsePolicy::default())
        .unwrap_err();

    let errors = err.validation_errors().expect("validation error");
    assert_eq!(errors.on("answers[0]", "value").unwrap().code, "blank");
    assert_eq!(store.counts().responses, 0);
    assert_eq!(store.counts().answers, 0);
}

#[test]
fn number_answers_are_checked() {
    let mut store = FormStore::new();
    let (form_id, ids) = profile_form(&mut store);
    let policy = ResponsePolicy::default();

    for value in ["42", "-3.5", "3.14", "-10"] {
        let request = ResponseWriteRequest::new(form_id).with_answer(ids[0], value);
        assert!(store.submit_response(&request, &policy).is_ok(), "{value}");
    }

    let request = ResponseWriteRequest::new(form_id)
        .with_answer(ids[1], "Ana")
        .with_answer(ids[0], "abc");
    let err = store.submit_response(&request, &policy).unwrap_err();
    let errors = err.validation_errors().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.on("answers[1]", "value").unwrap().message, "must be a number");
    assert_eq!(store.counts().responses, 4);
}

#[test]
fn all_answer_failures_are_reported() {
    let mut store = FormStore::new();
    let (form_id, ids) = profile_form(&mut store);

    let request = ResponseWriteRequest::new(form_id)
        .with_answer(ids[0], "old")
        .with_answer(ids[1], "   ")
        .with_answer(ids[2], "Romania");
    let err = store
        .submit_response(&request, &ResponsePolicy::default())
        .unwrap_err();
    let errors = err.validation_errors().unwrap();
    assert_eq!(errors.len(), 2);
    assert!(errors.on("answers[0]", "value").is_some());
    assert!(errors.on("answers[1]", "value").is_some());
}

#[test]
fn select_values_are_trusted_unless_strict() {
    let mut store = FormStore::new();
    let (form_id, meal) = event_form(&mut store);
    let request = ResponseWriteRequest::new(form_id).with_answer(meal, "fish");

    let strict = ResponsePolicy {
        strict_select: true,
    };
    let err = store.submit_response(&request, &strict).unwrap_err();
    assert_eq!(
        err.validation_errors().unwrap().on("answers[0]", "value").unwrap().code,
        "not_an_option"
    );

    assert!(
        store
            .submit_response(&request, &ResponsePolicy::default())
            .is_ok()
    );
}

#[test]
fn unknown_field_is_a_reference_error() {
    let mut store = FormStore::new();
    let (form_id, meal) = event_form(&mut store);

    let request = ResponseWriteRequest::new(form_id)
        .with_answer(meal, "veg")
        .with_answer(FieldId(404), "x");
    let err = store
        .submit_response(&request, &ResponsePolicy::default())
        .unwrap_err();
    assert!(matches!(
        err,
        FormError::Reference {
            kind: EntityKind::Field,
            id: 404
        }
    ));
    assert_eq!(store.counts().responses, 0);
}

#[test]
fn unknown_form_is_a_reference_error() {
    let mut store = FormStore::new();
    let err = store
        .submit_response(&ResponseWriteRequest::new(FormId(3)), &ResponsePolicy::default())
        .unwrap_err();
    assert!(matches!(
        err,
        FormError::Reference {
            kind: EntityKind::Form,
            id: 3
        }
    ));
}

#[test]
fn answers_must_target_the_responses_form() {
    let mut store = FormStore::new();
    let (event, _) = event_form(&mut store);
    let (_, profile_fields) = profile_form(&mut store);

    let request = ResponseWriteRequest::new(event).with_answer(profile_fields[1], "Ana");
    let err = store
        .submit_response(&request, &ResponsePolicy::default())
        .unwrap_err();
    assert_eq!(
        err.validation_errors()
            .unwrap()
            .on("answers[0]", "field_id")
            .unwrap()
            .code,
        "field_form_mismatch"
    );
}

#[test]
fn a_field_is_answered_at_most_once() {
    let mut store = FormStore::new();
    let (form_id, meal) = event_form(&mut store);

    let request = ResponseWriteRequest::new(form_id)
        .with_answer(meal, "veg")
        .with_answer(meal, "meat");
    let err = store
        .submit_response(&request, &ResponsePolicy::default())
        .unwrap_err();
    assert_eq!(
        err.validation_errors()
            .unwrap()
            .on("answers[1]", "field_id")
            .unwrap()
            .code,
        "duplicate_answer"
    );
}

#[test]
fn responses_are_listed_newest_first() {
    let mut store = FormStore::new();
    let (form_id, meal) = event_form(&mut store);
    let policy = ResponsePolicy::default();
    let submitted: Vec<ResponseId> = ["veg", "meat", "veg"]
        .into_iter()
        .map(|value| {
            store
                .submit_response(
                    &ResponseWriteRequest::new(form_id).with_answer(meal, value),
                    &policy,
                )
                .unwrap()
        })
        .collect();

    let newest: Vec<_> = store
        .responses(form_id, ResponseOrder::NewestFirst)
        .unwrap()
        .into_iter()
        .map(|response| response.id)
        .collect();
    assert_eq!(newest, vec![submitted[2], submitted[1], submitted[0]]);

    let oldest: Vec<_> = store
        .responses(form_id, ResponseOrder::OldestFirst)
        .unwrap()
        .into_iter()
        .map(|response| response.id)
        .collect();
    assert_eq!(oldest, submitted);
}

#[test]
fn response_detail_lists_answers_in_field_order() {
    let mut store = FormStore::new();
    let (form_id, ids) = profile_form(&mut store);

    let request = ResponseWriteRequest::new(form_id)
        .with_answer(ids[2], "it")
        .with_answer(ids[0], "30")
        .with_answer(ids[1], "Ana");
    let response_id = store
        .submit_response(&request, &ResponsePolicy::default())
        .unwrap();

    let detail = store
        .response_detail(form_id, response_id)
        .unwrap();
    assert_eq!(detail.form_title, "Profile");
    let rows: Vec<_> = detail
        .answers
        .iter()
        .map(|answer| (answer.label.as_str(), answer.field_type, answer.value.as_str()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("Name", FieldType::Input, "Ana"),
            ("Age", FieldType::Number, "30"),
            ("Country", FieldType::Select, "it"),
        ]
    );
}

#[test]
fn responses_are_scoped_by_form() {
    let mut store = FormStore::new();
    let (event, meal) = event_form(&mut store);
    let (profile, _) = profile_form(&mut store);
    let response_id = store
        .submit_response(
            &ResponseWriteRequest::new(event).with_answer(meal, "veg"),
            &ResponsePolicy::default(),
        )
        .unwrap();

    let err = store
        .response_detail(profile, response_id)
        .unwrap_err();
    assert!(matches!(
        err,
        FormError::NotFound {
            kind: EntityKind::Response,
            ..
        }
    ));
    assert!(store.response_detail(event, ResponseId(99)).is_err());
}

#[test]
fn blank_response_has_one_answer_per_field() {
    let mut store = FormStore::new();
    let (form_id, ids) = profile_form(&mut store);

    let template = store.blank_response(form_id).unwrap();
    assert_eq!(template.form_id, form_id);
    let field_ids: Vec<_> = template.answers.iter().map(|answer| answer.field_id).collect();
    assert_eq!(field_ids, vec![ids[1], ids[0], ids[2]]);
    assert!(template.answers.iter().all(|answer| answer.value.is_empty()));
}

#[test]
fn deleting_a_response_keeps_its_siblings() {
    let mut store = FormStore::new();
    let (form_id, meal) = event_form(&mut store);
    let policy = ResponsePolicy::default();
    let first = store
        .submit_response(&ResponseWriteRequest::new(form_id).with_answer(meal, "veg"), &policy)
        .unwrap();
    let second = store
        .submit_response(&ResponseWriteRequest::new(form_id).with_answer(meal, "meat"), &policy)
        .unwrap();

    store.delete_response(form_id, first).expect("delete");

    assert!(store.response(first).is_err());
    assert_eq!(store.answers(second).unwrap().len(), 1);
    assert_eq!(store.counts().answers, 1);
    assert_eq!(store.counts().fields, 1);
}
