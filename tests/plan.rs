use std::collections::HashSet;

use agentic_forms::{detect_country, CountryKeywords, Error, FieldSpec, FieldValue, FillPlan};

const PLAN: &str = r#"{
  "countries": [
    { "country": "FR", "keywords": ["france", "paris"] },
    { "country": "US", "keywords": ["united states", "new york"] }
  ],
  "fields": [
    { "key": "country_phone_code", "value": "+33", "synonyms": ["Country code", "Indicatif"] },
    { "key": "phone_number", "value": "+33 6 12 34 56 78",
      "substitute": { "when_found": "country_phone_code", "value": "6 12 34 56 78" } },
    { "key": "relocation", "value": true },
    { "key": "sponsorship", "value": "no", "by_country": { "US": "yes" } }
  ]
}"#;

#[test]
fn parses_a_plan_file() {
    let plan = FillPlan::from_json(PLAN).unwrap();
    assert_eq!(plan.fields.len(), 4);
    assert_eq!(plan.countries.entries().len(), 2);
    assert_eq!(plan.fields[2].value, FieldValue::Flag(true));
    assert_eq!(plan.fields[0].effective_synonyms(), vec!["Country code", "Indicatif"]);
    assert_eq!(plan.fields[1].effective_synonyms(), vec!["phone number"]);
    assert_eq!(
        plan.fields[3].by_country.get("US"),
        Some(&FieldValue::Text("yes".to_string()))
    );
}

#[test]
fn built_plan_matches_parsed_plan() {
    let parsed = FillPlan::from_json(PLAN).unwrap();
    let mut built = FillPlan::new(vec![
        FieldSpec::new("country_phone_code", "+33")
            .synonym("Country code")
            .synonym("Indicatif"),
        FieldSpec::new("phone_number", "+33 6 12 34 56 78").substitute("country_phone_code", "6 12 34 56 78"),
        FieldSpec::new("relocation", true),
        FieldSpec::new("sponsorship", "no").for_country("US", "yes"),
    ]);
    built.countries = CountryKeywords::new()
        .with("FR", ["france", "paris"])
        .with("US", ["united states", "new york"]);
    assert_eq!(built, parsed);
}

#[test]
fn value_precedence() {
    let spec = FieldSpec::new("phone_number", "+1 555 0100")
        .substitute("country_phone_code", "555 0100")
        .for_country("FR", "+33 6 12 34 56 78");
    let none = HashSet::new();
    let found: HashSet<String> = ["country_phone_code".to_string()].into();

    assert_eq!(spec.value_for(None, &none).as_text(), "+1 555 0100");
    assert_eq!(spec.value_for(Some("US"), &none).as_text(), "+1 555 0100");
    assert_eq!(spec.value_for(Some("FR"), &none).as_text(), "+33 6 12 34 56 78");
    assert_eq!(spec.value_for(Some("FR"), &found).as_text(), "555 0100");
}

#[test]
fn rejects_invalid_plans() {
    let duplicate = r#"{ "fields": [ { "key": "a", "value": "1" }, { "key": "a", "value": "2" } ] }"#;
    assert!(matches!(FillPlan::from_json(duplicate), Err(Error::Plan(_))));

    let empty_key = r#"{ "fields": [ { "key": " ", "value": "1" } ] }"#;
    assert!(matches!(FillPlan::from_json(empty_key), Err(Error::Plan(_))));

    let forward = r#"{ "fields": [
        { "key": "b", "value": "1", "substitute": { "when_found": "a", "value": "2" } },
        { "key": "a", "value": "3" }
    ] }"#;
    assert!(matches!(FillPlan::from_json(forward), Err(Error::Plan(_))));

    assert!(matches!(FillPlan::from_json("{ not json"), Err(Error::Json(_))));
}

#[test]
fn country_with_most_keyword_hits_wins() {
    let table = CountryKeywords::new()
        .with("FR", ["France", "Paris"])
        .with("DE", ["Germany", "Berlin", "Munich"]);

    let text = "Offices in Paris and Berlin. Relocation to Berlin or Munich, Germany.";
    assert_eq!(detect_country(text, &table), Some("DE"));
    assert_eq!(detect_country("Based in PARIS, france", &table), Some("FR"));
    assert_eq!(detect_country("Remote, worldwide", &table), None);
}

#[test]
fn earlier_country_wins_a_tie() {
    let table = CountryKeywords::new()
        .with("FR", ["paris"])
        .with("DE", ["berlin"]);
    assert_eq!(detect_country("Paris or Berlin", &table), Some("FR"));
    assert_eq!(detect_country("anything", &CountryKeywords::new()), None);
}
