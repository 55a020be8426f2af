mod common;

use common::{autofill, Call, RecordingSurface};
use job_autofill::form::{
    scrape_form_fields, ChangeEvent, FieldKind, FillError, FormControl, FormFiller, FormSurface,
    HtmlForm, SelectOption,
};
use job_autofill::page::PageDocument;
use pretty_assertions::assert_eq;

fn first_form(markup: &str) -> HtmlForm {
    PageDocument::parse("https://careers.example.com/apply", markup)
        .forms()
        .remove(0)
}

#[test]
fn fills_name_id_and_placeholder_fields() {
    let mut form = first_form(
        r#"<html><body><form>
            <input name="email">
            <input id="phone-number">
            <input placeholder="Full Name">
        </form></body></html>"#,
    );
    let data = autofill(&[
        ("email", "x@y.com"),
        ("phone", "555-1234"),
        ("name", "Jane Doe"),
    ]);

    let outcome = FormFiller::new().fill(&mut form, &data);

    assert_eq!(outcome.filled_count, 3);
    assert!(outcome.errors.is_empty());
    let values: Vec<&str> = form.controls().iter().map(|c| c.value.as_str()).collect();
    assert_eq!(values, vec!["x@y.com", "555-1234", "Jane Doe"]);
    assert_eq!(outcome.message(), "Successfully filled 3 fields");

    // input then change for every text field, and a highlight on each
    assert_eq!(form.events().len(), 6);
    assert_eq!(form.events()[0], (0, ChangeEvent::Input));
    assert_eq!(form.events()[1], (0, ChangeEvent::Change));
    assert_eq!(form.highlighted(), vec![0, 1, 2]);
}

#[test]
fn one_unmatched_and_one_throwing_field() {
    let controls = vec![
        FormControl::input("email").with_name("email"),
        FormControl::input("text").with_name("favourite_colour"),
        FormControl::input("tel").with_name("phone"),
        FormControl::input("text").with_name("first_name"),
    ];
    let mut surface = RecordingSurface::new(controls).failing_at(2, FillError::Detached(2));
    let data = autofill(&[
        ("email", "x@y.com"),
        ("phone", "555-1234"),
        ("first_name", "Jane"),
    ]);

    let outcome = FormFiller::without_highlight().fill(&mut surface, &data);

    assert_eq!(outcome.filled_count, 2);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].field_ref, "Input 3");
    assert!(outcome.errors[0].message.contains("no longer attached"));
    assert_eq!(surface.value(1), "");
    assert_eq!(surface.value(3), "Jane");
    assert!(outcome
        .skipped
        .iter()
        .any(|s| s.field_ref == "Input 2" && s.reason == "No matching data found"));
    assert!(!surface.calls.iter().any(|c| matches!(c, Call::Highlight(_))));
}

#[test]
fn detached_html_control_is_isolated() {
    let mut form = first_form(
        r#"<form>
            <input name="email">
            <input name="phone">
        </form>"#,
    );
    form.detach(0);

    let outcome = FormFiller::new().fill(
        &mut form,
        &autofill(&[("email", "x@y.com"), ("phone", "555")]),
    );

    assert_eq!(outcome.filled_count, 1);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].field_ref, "Input 1");
    assert_eq!(form.controls()[1].value, "555");
}

#[test]
fn checkbox_only_accepts_affirmative_values() {
    let controls = vec![
        FormControl::input("checkbox").with_name("relocate"),
        FormControl::input("checkbox").with_name("newsletter"),
    ];
    let mut surface = RecordingSurface::new(controls);
    let outcome = FormFiller::new().fill(
        &mut surface,
        &autofill(&[("relocate", "YES"), ("newsletter", "no")]),
    );

    assert!(surface.checked(0));
    assert!(!surface.checked(1));
    assert_eq!(outcome.filled_count, 1);
    assert!(outcome.errors.is_empty());
    assert_eq!(
        surface.calls,
        vec![
            Call::SetChecked(0, true),
            Call::Notify(0, ChangeEvent::Change),
            Call::Highlight(0),
        ]
    );
}

#[test]
fn select_matches_value_or_text_and_never_throws_on_miss() {
    let mut form = first_form(
        r#"<form>
            <select name="country">
                <option value="">Choose</option>
                <option value="fr">France</option>
                <option value="de">Germany</option>
            </select>
            <select name="experience">
                <option value="junior">0-2 years</option>
                <option value="senior">5+ years</option>
            </select>
        </form>"#,
    );
    let outcome = FormFiller::new().fill(
        &mut form,
        &autofill(&[("country", "germany"), ("experience", "ten years")]),
    );

    assert_eq!(form.controls()[0].value, "de");
    assert_eq!(form.controls()[1].value, "junior");
    assert_eq!(outcome.filled_count, 1);
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.skipped[0].reason, "No matching option");
}

#[test]
fn radio_group_is_filled_once() {
    let mut form = first_form(
        r#"<form>
            <input type="radio" name="remote" value="yes">
            <input type="radio" name="remote" value="no">
            <input type="radio" name="remote" value="hybrid">
            <input type="hidden" name="token" value="abc">
            <input type="submit" value="Send">
        </form>"#,
    );
    let outcome = FormFiller::new().fill(&mut form, &autofill(&[("remote", "Hybrid"), ("token", "x")]));

    let checked: Vec<bool> = form.controls().iter().take(3).map(|c| c.checked).collect();
    assert_eq!(checked, vec![false, false, true]);
    assert_eq!(form.controls()[3].value, "abc");
    assert_eq!(outcome.filled_count, 1);
    let reasons: Vec<&str> = outcome.skipped.iter().map(|s| s.reason.as_str()).collect();
    assert_eq!(
        reasons,
        vec![
            "Radio group already filled",
            "Radio group already filled",
            "Ignored input type",
            "Ignored input type",
        ]
    );
}

#[test]
fn descriptors_cover_every_form_in_order() {
    let page = PageDocument::parse(
        "https://example.com/apply",
        r#"<form>
               <label for="fn">First name</label><input id="fn" required>
               <textarea placeholder="Why us?"></textarea>
           </form>
           <form><select name="source"><option>Friend</option></select></form>"#,
    );
    let fields = scrape_form_fields(&page.forms());

    assert_eq!(fields.len(), 3);
    assert_eq!(fields[0].name, "fn");
    assert_eq!(fields[0].label, "First name");
    assert!(fields[0].required);
    assert_eq!(fields[1].name, "field_1");
    assert_eq!(fields[1].kind, FieldKind::Textarea);
    assert_eq!((fields[2].form_index, fields[2].input_index), (1, 0));
}

#[test]
fn select_surface_write_uses_option_value() {
    let select = FormControl::select(vec![
        SelectOption {
            value: "m".into(),
            text: "Medium".into(),
        },
        SelectOption {
            value: "l".into(),
            text: "Large".into(),
        },
    ])
    .with_name("size");
    let mut surface = RecordingSurface::new(vec![select]);
    FormFiller::without_highlight().fill(&mut surface, &autofill(&[("size", "LARGE")]));
    assert_eq!(surface.value(0), "l");
    assert_eq!(surface.controls()[0].kind(), FieldKind::Select);
}
