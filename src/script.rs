/*!
 * Ad script construction.
 *
 * The rendering service receives a short natural-language brief. Building it is
 * a pure function of the campaign parameters.
 */

/// Build the narrative brief sent to the rendering service as `prompt`.
///
/// Same inputs always yield the same string; the output names the duration,
/// product, audience and tone verbatim.
pub fn build_script(product: &str, audience: &str, tone: &str, duration_seconds: u32) -> String {
    format!(
        "Кратка видео реклама ({duration_seconds}s) за '{product}'. \
         Целева аудитория: {audience}. Тон: {tone}. \
         3–4 динамични сцени, фокус върху ключови ползи и силен CTA в края \
         (\"Поръчай сега\" или \"Виж повече\"). Добави четливи субтитри."
    )
}
