use std::cmp::Ordering;

use bagrut_coach::error::CoachError;
use bagrut_coach::pipelines::modify::ModificationKind;
use bagrut_coach::problems::bank::{bank, year_display_name, year_display_order};
use bagrut_coach::problems::problem::Problem;

#[test]
fn test_bank_loads_all_modules() {
    assert_eq!(bank().module_keys(), vec!["801", "802", "803"]);
}

#[test]
fn test_year_keys_in_display_order() {
    assert_eq!(
        bank().year_keys("801"),
        vec!["2025", "2024_Winter", "2024_B", "2024"]
    );
    assert_eq!(bank().year_keys("802"), vec!["2025", "2024_Winter", "2024"]);
    assert_eq!(bank().year_keys("803"), vec!["2025", "2024_B", "2024"]);

    // Unknown module yields no years rather than an error
    assert!(bank().year_keys("999").is_empty());
}

#[test]
fn test_year_display_order_rules() {
    assert_eq!(year_display_order("2025", "2024"), Ordering::Less);
    assert_eq!(year_display_order("2024_Winter", "2024_B"), Ordering::Less);
    assert_eq!(year_display_order("2024_B", "2024"), Ordering::Less);
    assert_eq!(year_display_order("2024", "2024"), Ordering::Equal);
    assert_eq!(year_display_order("2023_Winter", "2024"), Ordering::Greater);
}

#[test]
fn test_year_display_names() {
    assert_eq!(year_display_name("2025"), "2025");
    assert_eq!(year_display_name("2024_B"), "2024 (מועד ב)");
    assert_eq!(year_display_name("2024_Winter"), "2024 (חורף)");
}

#[test]
fn test_lookup_is_one_based() {
    let first = bank().get("801", "2025", 1).unwrap();
    assert_eq!(first.id, "801-2025-1");
    let third = bank().get("801", "2025", 3).unwrap();
    assert_eq!(third.id, "801-2025-3");
}

#[test]
fn test_lookup_misses_are_not_found() {
    assert!(matches!(bank().get("801", "2025", 0), Err(CoachError::NotFound(_))));
    assert!(matches!(bank().get("801", "2025", 99), Err(CoachError::NotFound(_))));
    assert!(matches!(bank().get("801", "1999", 1), Err(CoachError::NotFound(_))));
    assert!(matches!(bank().get("805", "2025", 1), Err(CoachError::NotFound(_))));

    let err = bank().get("801", "2025", 99).unwrap_err();
    assert!(format!("{}", err).contains("module 801, year 2025, question 99"));
}

#[test]
fn test_question_counts() {
    assert_eq!(bank().question_count("801", "2025"), 3);
    assert_eq!(bank().question_count("801", "2024_B"), 1);
    assert_eq!(bank().question_count("805", "2025"), 0);
}

#[test]
fn test_bank_problems_carry_optional_fields() {
    // 801-2024-2 is an image-based problem with no reference answer
    let problem = bank().get("801", "2024", 2).unwrap();
    assert_eq!(problem.id, "801-2024-2");
    assert!(problem.answer.is_none());
    assert!(problem.image_url.is_some());
}

#[test]
fn test_problem_parse_defaults() {
    let problem: Problem =
        serde_json::from_str(r#"{"id": "x-1", "question": "מה זה נגזרת?"}"#).unwrap();
    assert_eq!(problem.topic, "מתמטיקה");
    assert!(problem.answer.is_none());
    assert!(problem.difficulty.is_none());
    assert!(!problem.mikud);
    assert!(problem.origin_id.is_none());
}

#[test]
fn test_derive_simplified_copy() {
    let original = bank().get("801", "2025", 1).unwrap();
    let derived = original.derive_modified(
        ModificationKind::Simplify,
        "גרסה קלה יותר של השאלה.".to_string(),
    );

    assert_eq!(derived.id, "801-2025-1-simplify");
    assert_eq!(derived.question, "גרסה קלה יותר של השאלה.");
    assert_eq!(derived.difficulty.as_deref(), Some("מפושטת"));
    assert_eq!(derived.origin_id.as_deref(), Some("801-2025-1"));
    // Everything not replaced travels with the copy
    assert_eq!(derived.answer, original.answer);
    assert_eq!(derived.topic, original.topic);
    assert_eq!(derived.mikud, original.mikud);
}

#[test]
fn test_derive_harder_copy_chains_ids() {
    let original = bank().get("801", "2025", 1).unwrap();
    let harder = original.derive_modified(ModificationKind::MakeHarder, "קשה".to_string());
    assert_eq!(harder.id, "801-2025-1-makeHarder");
    assert_eq!(harder.difficulty.as_deref(), Some("מורכבת"));

    // Deriving from a derived copy points at the immediate parent
    let harder_again = harder.derive_modified(ModificationKind::MakeHarder, "קשה מאוד".to_string());
    assert_eq!(harder_again.id, "801-2025-1-makeHarder-makeHarder");
    assert_eq!(harder_again.origin_id.as_deref(), Some("801-2025-1-makeHarder"));
}
