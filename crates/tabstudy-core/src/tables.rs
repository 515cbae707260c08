//! Injected categorical response tables and the word-association corpus.
//!
//! The tables are external configuration: a partial JSON file overrides
//! individual tables while the rest keep their compiled-in defaults.

use crate::domain::ResponseType;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResponseTables {
    #[serde(rename = "yesNoMaybe", default = "default_yes_no_maybe")]
    yes_no_maybe: BTreeMap<String, i64>,
    #[serde(rename = "timeOnTask", default = "default_time_on_task")]
    time_on_task: BTreeMap<String, i64>,
    #[serde(rename = "satisfactionScale", default = "default_satisfaction_scale")]
    satisfaction_scale: BTreeMap<String, i64>,
    #[serde(rename = "wordAssociation", default = "default_word_corpus")]
    word_corpus: Vec<String>,
}

impl ResponseTables {
    pub fn new(
        yes_no_maybe: BTreeMap<String, i64>,
        time_on_task: BTreeMap<String, i64>,
        satisfaction_scale: BTreeMap<String, i64>,
        word_corpus: Vec<String>,
    ) -> Self {
        Self {
            yes_no_maybe,
            time_on_task,
            satisfaction_scale,
            word_corpus,
        }
    }

    /// The lookup table backing a categorical response type, if it has one.
    pub fn categorical(&self, response_type: ResponseType) -> Option<&BTreeMap<String, i64>> {
        match response_type {
            ResponseType::YesNoMaybe => Some(&self.yes_no_maybe),
            ResponseType::TimeOnTask => Some(&self.time_on_task),
            ResponseType::SatisfactionScale => Some(&self.satisfaction_scale),
            ResponseType::AgreementScale | ResponseType::WordAssociation | ResponseType::None => {
                None
            }
        }
    }

    pub fn word_corpus(&self) -> &[String] {
        &self.word_corpus
    }
}

impl Default for ResponseTables {
    fn default() -> Self {
        Self {
            yes_no_maybe: default_yes_no_maybe(),
            time_on_task: default_time_on_task(),
            satisfaction_scale: default_satisfaction_scale(),
            word_corpus: default_word_corpus(),
        }
    }
}

fn table_from(entries: &[(&str, i64)]) -> BTreeMap<String, i64> {
    entries
        .iter()
        .map(|(response, value)| (response.to_string(), *value))
        .collect()
}

fn default_yes_no_maybe() -> BTreeMap<String, i64> {
    table_from(&[("Yes", 1), ("Maybe", 0), ("No", -1)])
}

fn default_time_on_task() -> BTreeMap<String, i64> {
    table_from(&[
        ("Less than a minute", 1),
        ("1-2 minutes", 2),
        ("2-5 minutes", 3),
        ("5-10 minutes", 4),
        ("More than 10 minutes", 5),
    ])
}

fn default_satisfaction_scale() -> BTreeMap<String, i64> {
    table_from(&[
        ("Very dissatisfied", 1),
        ("Dissatisfied", 2),
        ("Neutral", 3),
        ("Satisfied", 4),
        ("Very satisfied", 5),
    ])
}

fn default_word_corpus() -> Vec<String> {
    [
        "fast",
        "slow",
        "easy",
        "hard",
        "simple",
        "confusing",
        "clean",
        "cluttered",
        "modern",
        "dated",
        "reliable",
        "frustrating",
    ]
    .iter()
    .map(|word| word.to_string())
    .collect()
}
