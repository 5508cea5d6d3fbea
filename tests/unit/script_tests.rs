/*!
 * Tests for ad script construction
 */

use promobot::script::build_script;

#[test]
fn test_build_script_withBulgarianInputs_shouldStartWithHeader() {
    let script = build_script("Кафе", "млади професионалисти", "забавен", 20);
    assert!(script.starts_with("Кратка видео реклама (20s) за 'Кафе'."));
}

#[test]
fn test_build_script_shouldContainEveryInputVerbatim() {
    let script = build_script("Running shoes", "marathon runners", "bold & loud", 45);

    assert!(script.contains("(45s)"));
    assert!(script.contains("'Running shoes'"));
    assert!(script.contains("Целева аудитория: marathon runners."));
    assert!(script.contains("Тон: bold & loud."));
}

#[test]
fn test_build_script_shouldAskForScenesCtaAndSubtitles() {
    let script = build_script("A", "B", "C", 10);

    assert!(script.contains("3–4 динамични сцени"));
    assert!(script.contains("CTA"));
    assert!(script.contains("субтитри"));
}

#[test]
fn test_build_script_withDifferentInputs_shouldDiffer() {
    assert_ne!(build_script("A", "B", "C", 10), build_script("A", "B", "C", 11));
    assert_ne!(build_script("A", "B", "C", 10), build_script("A", "B", "D", 10));
}
