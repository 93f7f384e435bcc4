use super::*;
use scraper::{Html, Selector};
use shared::{
    domain::DocId,
    protocol::{Choice, ReviewRow},
};

use crate::view::MemoryPage;

fn row(id: &str, description: &str, choices: &[&str], confirmed: Option<usize>) -> ReviewRow {
    ReviewRow {
        match_id: MatchId::new(id),
        description: description.to_string(),
        choices: choices.iter().map(|c| Choice::from(*c)).collect(),
        confirmed,
    }
}

fn three_row_payload() -> ReviewPayload {
    ReviewPayload {
        doc_id: DocId::new("7"),
        rows: vec![
            row("101", "Hex bolt M8", &["BOLT-M8", "BOLT-M10", "BOLT-M6"], None),
            row("102", "Flat washer", &["WASHER-A", "WASHER-B", "WASHER-C"], Some(1)),
            row("103", "Nylon nut", &["NUT-1", "NUT-2", "NUT-3", "NUT-4"], Some(3)),
        ],
    }
}

fn selector(raw: &str) -> Selector {
    Selector::parse(raw).expect("selector")
}

#[test]
fn builds_table_with_preselected_confirmed_choice() {
    let mut page = MemoryPage::new();
    page.processing_visible = true;
    let mut renderer = ReviewRenderer::new(three_row_payload()).expect("renderer");

    let mode = renderer.render(&mut page).expect("render");
    assert_eq!(mode, RenderMode::Built);
    assert!(!page.processing_visible);

    let markup = page
        .review
        .as_ref()
        .and_then(|section| section.markup.clone())
        .expect("mounted markup");
    let html = Html::parse_fragment(&markup);

    let selects: Vec<_> = html.select(&selector("select")).collect();
    assert_eq!(selects.len(), 3);
    let second_options: Vec<_> = selects[1].select(&selector("option")).collect();
    assert_eq!(second_options.len(), 3);
    assert!(second_options[0].value().attr("selected").is_none());
    assert!(second_options[1].value().attr("selected").is_some());
    assert_eq!(selects[1].value().attr("name"), Some("102"));

    let badge = html
        .select(&selector("#confidence-102"))
        .next()
        .expect("badge");
    assert_eq!(badge.text().collect::<String>().trim(), "95%");
    assert_eq!(
        page.confidence.get(&MatchId::new("102")).map(|tier| tier.label()),
        Some("95%".to_string())
    );
    assert_eq!(
        page.confidence.get(&MatchId::new("103")).map(|tier| tier.label()),
        Some("70%".to_string())
    );

    let form = html.select(&selector("form#confirm-form")).next().expect("form");
    assert_eq!(form.value().attr("action"), Some("/confirm/7"));
    let header = html.select(&selector(".review-header p")).next().expect("header");
    assert!(header.text().collect::<String>().contains("Found 3 line items"));

    let positions: Vec<String> = html
        .select(&selector(".badge.bg-primary"))
        .map(|badge| badge.text().collect())
        .collect();
    assert_eq!(positions, vec!["1", "2", "3"]);
}

#[test]
fn row_text_is_escaped_in_markup() {
    let payload = ReviewPayload {
        doc_id: DocId::new("1"),
        rows: vec![row(
            "9",
            "<script>alert('x')</script> & co",
            &["<b>BOLD</b>", "\"quoted\""],
            None,
        )],
    };
    let renderer = ReviewRenderer::new(payload).expect("renderer");
    let markup = renderer.markup().expect("markup");

    assert!(!markup.contains("<script>"));
    assert!(!markup.contains("<b>BOLD</b>"));

    let html = Html::parse_fragment(&markup);
    let description = html.select(&selector(".fw-medium")).next().expect("description");
    assert_eq!(
        description.text().collect::<String>(),
        "<script>alert('x')</script> & co"
    );
    let labels: Vec<String> = html
        .select(&selector("option"))
        .map(|option| option.text().collect())
        .collect();
    assert_eq!(labels, vec!["<b>BOLD</b>", "\"quoted\""]);
}

#[test]
fn enhances_server_rendered_table_without_rebuilding() {
    let mut page = MemoryPage::with_server_review(vec![
        SelectionControl {
            match_id: MatchId::new("101"),
            selected: 2,
            options: 3,
        },
        SelectionControl {
            match_id: MatchId::new("102"),
            selected: 0,
            options: 3,
        },
    ]);
    page.processing_visible = true;
    let mut renderer = ReviewRenderer::new(three_row_payload()).expect("renderer");

    assert_eq!(renderer.render(&mut page).expect("render"), RenderMode::Enhanced);
    assert!(!page.processing_visible);
    assert!(page.review.as_ref().expect("section").markup.is_none());
    assert_eq!(renderer.bound_controls(), 2);
    assert_eq!(
        page.confidence.get(&MatchId::new("101")).map(|tier| tier.label()),
        Some("85%".to_string())
    );
}

#[test]
fn repeated_enhancement_does_not_duplicate_listeners() {
    let mut page = MemoryPage::new();
    let mut renderer = ReviewRenderer::new(three_row_payload()).expect("renderer");
    renderer.render(&mut page).expect("render");
    assert_eq!(renderer.enhance(&mut page), 0);
    assert_eq!(renderer.enhance(&mut page), 0);
    assert_eq!(renderer.render(&mut page).expect("re-render"), RenderMode::Enhanced);

    let id = MatchId::new("101");
    let before = page.confidence_updates_for(&id);
    let tier = renderer.handle_change(&mut page, &id, 2).expect("change");

    assert_eq!(tier.label(), "85%");
    assert_eq!(page.confidence_updates_for(&id), before + 1);
    assert_eq!(renderer.selection(&id), Some(2));
}

#[test]
fn selection_changes_redraw_tier_each_time() {
    let mut page = MemoryPage::new();
    let mut renderer = ReviewRenderer::new(three_row_payload()).expect("renderer");
    renderer.render(&mut page).expect("render");

    let id = MatchId::new("103");
    for (index, label) in [(0, "100%"), (1, "95%"), (2, "85%"), (3, "70%"), (1, "95%")] {
        renderer.handle_change(&mut page, &id, index).expect("change");
        assert_eq!(page.confidence.get(&id).map(|tier| tier.label()), Some(label.to_string()));
    }

    let control = page
        .review_controls()
        .and_then(|controls| controls.into_iter().find(|c| c.match_id == id))
        .expect("control");
    assert_eq!(control.selected, 1);
}

#[test]
fn rejects_unknown_controls_and_out_of_range_choices() {
    let mut page = MemoryPage::new();
    let mut renderer = ReviewRenderer::new(three_row_payload()).expect("renderer");
    renderer.render(&mut page).expect("render");

    let err = renderer
        .handle_change(&mut page, &MatchId::new("999"), 0)
        .expect_err("unknown");
    assert!(matches!(err, ReviewError::UnknownControl(_)));

    let err = renderer
        .handle_change(&mut page, &MatchId::new("101"), 3)
        .expect_err("out of range");
    assert!(matches!(err, ReviewError::OptionOutOfRange { options: 3, .. }));
}

#[test]
fn confirm_form_carries_current_selections() {
    let mut page = MemoryPage::new();
    let mut renderer = ReviewRenderer::new(three_row_payload()).expect("renderer");
    renderer.render(&mut page).expect("render");
    renderer
        .handle_change(&mut page, &MatchId::new("101"), 1)
        .expect("change");

    let form = renderer.confirm_form();
    assert_eq!(form.action, "/confirm/7");
    assert_eq!(
        form.fields,
        vec![
            ("101".to_string(), "1".to_string()),
            ("102".to_string(), "1".to_string()),
            ("103".to_string(), "3".to_string()),
        ]
    );
}

#[test]
fn invalid_payload_is_rejected_up_front() {
    let payload = ReviewPayload {
        doc_id: DocId::new("1"),
        rows: vec![row("1", "a", &["x"], Some(4))],
    };
    assert!(matches!(
        ReviewRenderer::new(payload),
        Err(ReviewError::Payload(PayloadError::ConfirmedOutOfRange { .. }))
    ));
}
