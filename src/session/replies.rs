//! Reply texts sent to the user.

use crate::errors::truncate_chars;

/// Longest reply we send; Telegram rejects messages above 4096 characters
pub const MAX_REPLY_CHARS: usize = 4_000;

/// Instructions shown on /start and /help
pub const INTRO: &str = "Изпрати ред във формат:\n\
<продукт/услуга> | <аудитория> | <тон> | <секунди> | <аспект>\n\
Пример: кафе|млади професионалисти|забавен|20|9:16\n\
След това прати линкове към лого/снимки (по един на ред). Напиши /go когато си готов.\n\
Команди: /start /help /reset";

pub const SESSION_CLEARED: &str = "Сесията е изчистена. /start за нова.";

pub const MISSING_FIELDS: &str =
    "Липсват полета. Изпрати: продукт|аудитория|тон|секунди|аспект, после /go.";

pub const TOO_FEW_FIELDS: &str =
    "Минимум: продукт|аудитория|тон. Пример: кафе|млади професионалисти|забавен";

pub const INVALID_VALUES: &str = "Невалидни стойности. Опитай отново.";

pub const PARAMETERS_ACCEPTED: &str = "Ок. Прати линкове към лого/снимки (по един на ред) или /go.";

pub const ASSET_ADDED: &str = "Добавих асет. Можеш още линкове или /go.";

pub const NOT_A_URL: &str = "Това не изглежда като URL. Прати валиден линк или /go.";

pub const START_FIRST: &str = "Напиши /start за инструкции.";

pub const JOB_STARTING: &str = "Стартирам видео задание…";

/// Success message carrying the video URL
pub fn job_done(url: &str) -> String {
    truncate_chars(&format!("Готово ✅\n{}", url), MAX_REPLY_CHARS)
}

/// Failure message carrying the error description
///
/// Long error texts (e.g. a full status payload) are cut to `MAX_REPLY_CHARS`.
pub fn job_failed(error: &dyn std::fmt::Display) -> String {
    truncate_chars(&format!("❌ Грешка: {}", error), MAX_REPLY_CHARS)
}
