use serde_json::{Map, Value};
use std::str::FromStr;

use crate::error::PollError;

/// Review state reported by the API. The set is closed: anything else is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeworkStatus {
    Approved,
    Reviewing,
    Rejected,
}

impl HomeworkStatus {
    pub const ALL: [HomeworkStatus; 3] = [
        HomeworkStatus::Approved,
        HomeworkStatus::Reviewing,
        HomeworkStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HomeworkStatus::Approved => "approved",
            HomeworkStatus::Reviewing => "reviewing",
            HomeworkStatus::Rejected => "rejected",
        }
    }

    /// Sentence shown to the student for this status.
    pub fn verdict(&self) -> &'static str {
        match self {
            HomeworkStatus::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            HomeworkStatus::Reviewing => "Работа взята на проверку ревьюером.",
            HomeworkStatus::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

impl FromStr for HomeworkStatus {
    type Err = PollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HomeworkStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| PollError::UnknownStatus(s.to_string()))
    }
}

pub fn render_message(homework_name: &str, status: HomeworkStatus) -> String {
    format!(
        "Изменился статус проверки работы \"{}\". {}",
        homework_name,
        status.verdict()
    )
}

/// Extract name and status from a homework record and render the notification text.
pub fn parse_status(homework: &Map<String, Value>) -> Result<String, PollError> {
    let name = string_field(homework, "homework_name")?;
    let status: HomeworkStatus = string_field(homework, "status")?.parse()?;
    Ok(render_message(name, status))
}

fn string_field<'a>(
    homework: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a str, PollError> {
    match homework.get(key) {
        None => Err(PollError::MissingKey(key)),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(PollError::NotAString(key)),
    }
}
