mod common;

use std::time::{Duration, Instant};

use agentic_forms::locator::{build_strategies, locate, Tier};
use agentic_forms::{EngineConfig, FormFiller, WidgetType};

use common::{el, fast_config, FrameSlot, MockDom, MockPage, ROOT};

fn syns(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn strategies_are_tier_major() {
    let strategies = build_strategies(&syns(&["First name", "Given name"]), &EngineConfig::default());
    let tiers: Vec<Tier> = strategies.iter().map(|s| s.tier).collect();

    let mut sorted = tiers.clone();
    sorted.sort();
    assert_eq!(tiers, sorted, "tiers must never interleave");
    assert_eq!(tiers.first(), Some(&Tier::RoleName));
    assert_eq!(tiers.last(), Some(&Tier::NameAttr));
    assert!(!tiers.contains(&Tier::Phone));

    let labels: Vec<&str> = strategies
        .iter()
        .filter(|s| s.tier == Tier::Label)
        .map(|s| s.synonym.as_str())
        .collect();
    assert_eq!(labels, vec!["First name", "Given name"]);
}

#[test]
fn phone_heuristic_only_for_phone_synonyms() {
    let strategies = build_strategies(&syns(&["Email", "Mobile number", "Téléphone"]), &EngineConfig::default());
    let phone: Vec<&str> = strategies
        .iter()
        .filter(|s| s.tier == Tier::Phone)
        .map(|s| s.synonym.as_str())
        .collect();
    assert_eq!(phone, vec!["Mobile number", "Mobile number", "Téléphone", "Téléphone"]);
}

#[test]
fn no_synonyms_no_strategies() {
    assert!(build_strategies(&[], &EngineConfig::default()).is_empty());
}

#[tokio::test]
async fn earlier_tier_beats_earlier_document_position() {
    let dom = MockDom::new();
    let by_name = dom.add(ROOT, el("input").attr("name", "candidate_email_address"));
    let by_label = dom.add(ROOT, el("input").attr("aria-label", "Email"));
    let ctx = dom.context("main");
    let config = fast_config();

    let strategies = build_strategies(&syns(&["Email"]), &config);
    let found = locate(&ctx, &strategies, &config).await.unwrap();
    assert_eq!(found.tier, Tier::RoleName);
    assert_eq!(found.element.describe(), dom.handle(by_label).describe());
    assert_ne!(found.element.describe(), dom.handle(by_name).describe());
}

#[tokio::test]
async fn hidden_matches_are_skipped() {
    let dom = MockDom::new();
    dom.add(ROOT, el("input").attr("placeholder", "City").hidden());
    let visible = dom.add(ROOT, el("input").attr("name", "city"));
    let ctx = dom.context("main");
    let config = fast_config();

    let found = locate(&ctx, &build_strategies(&syns(&["city"]), &config), &config)
        .await
        .unwrap();
    assert_eq!(found.tier, Tier::NameAttr);
    assert_eq!(found.element.describe(), dom.handle(visible).describe());
}

#[tokio::test]
async fn label_hop_reaches_nested_control() {
    let dom = MockDom::new();
    let label = dom.add(ROOT, el("label").text("Country"));
    let select = dom.add(label, el("select").id("country-select"));
    let ctx = dom.context("main");
    let config = fast_config();

    let found = locate(&ctx, &build_strategies(&syns(&["Country"]), &config), &config)
        .await
        .unwrap();
    assert_eq!(found.element.describe(), dom.handle(select).describe());
}

#[tokio::test]
async fn identity_attribute_and_labelled_wrapper() {
    let dom = MockDom::new();
    dom.add(ROOT, el("input").attr("formcontrolname", "lastName"));
    let wrapper = dom.add(ROOT, el("mat-form-field"));
    dom.add(wrapper, el("mat-label").text("Phone number *"));
    let phone = dom.add(wrapper, el("input").attr("matinput", ""));
    let ctx = dom.context("main");
    let config = fast_config();

    let last = locate(&ctx, &build_strategies(&syns(&["lastName"]), &config), &config)
        .await
        .unwrap();
    assert_eq!(last.tier, Tier::Identity);

    let found = locate(&ctx, &build_strategies(&syns(&["Phone number"]), &config), &config)
        .await
        .unwrap();
    assert_eq!(found.tier, Tier::Phone);
    assert_eq!(found.element.describe(), dom.handle(phone).describe());
}

#[tokio::test]
async fn synonym_order_does_not_change_the_outcome() {
    let dom = MockDom::new();
    dom.add(ROOT, el("label").attr("for", "gn").text("Given name"));
    let input = dom.add(ROOT, el("input").id("gn"));
    let page = dom.page();
    let filler = FormFiller::new(fast_config());

    let orders = [
        syns(&["First name", "Given name", "Prénom"]),
        syns(&["Prénom", "First name", "Given name"]),
        syns(&["Given name", "Prénom", "First name"]),
    ];
    for synonyms in orders {
        let field = filler.resolve(&page, "first_name", &synonyms).await;
        assert!(field.is_found(), "{synonyms:?}");
        assert_eq!(field.widget(), WidgetType::Textbox);
        assert_eq!(field.element().unwrap().describe(), dom.handle(input).describe());
    }
}

#[tokio::test]
async fn frames_are_searched_after_main_and_bad_frames_are_skipped() {
    let main = MockDom::new();
    main.add(ROOT, el("input").attr("name", "search"));

    let frame = MockDom::new();
    frame.add(ROOT, el("label").attr("for", "mail").text("Email"));
    let email = frame.add(ROOT, el("input").id("mail").attr("type", "email"));

    let page = MockPage::new(main)
        .frame(FrameSlot::Refused)
        .frame(FrameSlot::Hanging)
        .frame(FrameSlot::Ready(frame.clone()));
    let filler = FormFiller::new(fast_config());

    let started = Instant::now();
    let field = filler.resolve(&page, "email", &syns(&["Email"])).await;
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(field.is_found());
    assert_eq!(field.context().unwrap().describe(), "frame#2");
    assert_eq!(field.element().unwrap().describe(), frame.handle(email).describe());
}

#[tokio::test]
async fn absence_is_a_sentinel() {
    let dom = MockDom::new();
    dom.add(ROOT, el("input").attr("name", "city"));
    let filler = FormFiller::new(fast_config());

    let field = filler.resolve(&dom.page(), "salary", &syns(&["Salary expectations"])).await;
    assert!(!field.is_found());
    assert_eq!(field.widget(), WidgetType::NotFound);
    assert!(field.element().is_none());
}
