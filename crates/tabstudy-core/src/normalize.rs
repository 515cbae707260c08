//! Per-cell response normalization: quote scrubbing, the `:::` clip-reference
//! micro-format, and response-type-specific value transformation.

use crate::domain::{
    CellValue, ClipReference, ImportError, ImportResult, ParticipantId, ResponseType, Task,
};
use crate::tables::ResponseTables;
use regex::{Regex, RegexBuilder};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Literal separator joining a timecode and a clip URL inside one cell.
pub const CLIP_MARKER: &str = ":::";

/// Strip every double-quote character from a raw cell.
pub fn scrub_response(raw: &str) -> String {
    raw.replace('"', "")
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedResponse {
    /// `None` is a missing value (unrecognized categorical response).
    pub value: Option<CellValue>,
    pub word_note: Option<WordMatchNote>,
}

/// Diagnostic record for one word-association cell. A miss (empty match
/// map) is surfaced for manual review; matches are reported under verbose
/// output.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct WordMatchNote {
    pub participant: ParticipantId,
    pub task_id: String,
    pub response: String,
    pub matches: BTreeMap<String, usize>,
}

impl WordMatchNote {
    pub fn is_miss(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn render_line(&self) -> String {
        if self.is_miss() {
            format!(
                "no words matched in response \"{}\" @ {} | {}",
                self.response, self.participant, self.task_id
            )
        } else {
            let matched = self
                .matches
                .iter()
                .map(|(word, count)| format!("{}:{}", word, count))
                .collect::<Vec<_>>()
                .join(" ");
            format!(
                "words matched: \"{}\" == {} @ {} | {}",
                self.response, matched, self.participant, self.task_id
            )
        }
    }
}

pub struct ResponseNormalizer<'a> {
    tables: &'a ResponseTables,
    word_patterns: Vec<(String, Regex)>,
}

impl<'a> ResponseNormalizer<'a> {
    /// Compile the word-association corpus once for the whole run. The
    /// corpus words are escaped, so compilation only fails on a corrupted
    /// pattern, which is an internal error rather than bad input.
    pub fn new(tables: &'a ResponseTables) -> ImportResult<Self> {
        let word_patterns = tables
            .word_corpus()
            .iter()
            .map(|word| {
                RegexBuilder::new(&format!(r"\b{}\b", regex::escape(word)))
                    .case_insensitive(true)
                    .build()
                    .map(|pattern| (word.clone(), pattern))
                    .map_err(|source| {
                        ImportError::internal(
                            "SYS.WORD_PATTERN",
                            format!(
                                "failed to compile pattern for corpus word '{}': {}",
                                word, source
                            ),
                        )
                    })
            })
            .collect::<ImportResult<Vec<_>>>()?;

        Ok(Self {
            tables,
            word_patterns,
        })
    }

    /// Normalize one raw cell. Never fails: malformed clip references fall
    /// back to their first segment, unrecognized categorical responses
    /// become missing values, everything else passes through.
    pub fn normalize(
        &self,
        raw: &str,
        task: Option<&Task>,
        participant: &str,
    ) -> NormalizedResponse {
        let staged = apply_clip_reference(scrub_response(raw));

        let Some(task) = task else {
            return NormalizedResponse {
                value: Some(staged),
                word_note: None,
            };
        };

        match task.response_type {
            ResponseType::YesNoMaybe
            | ResponseType::TimeOnTask
            | ResponseType::SatisfactionScale => {
                let table = self.tables.categorical(task.response_type);
                let value = match (&staged, table) {
                    (CellValue::Text(text), Some(table)) => {
                        table.get(text).copied().map(CellValue::Number)
                    }
                    _ => None,
                };
                if value.is_none() {
                    debug!(
                        task = %task.id,
                        participant,
                        "unrecognized categorical response; value treated as missing"
                    );
                }
                NormalizedResponse {
                    value,
                    word_note: None,
                }
            }
            ResponseType::AgreementScale => {
                let value = match staged {
                    CellValue::Text(text) => match text.trim().parse::<i64>() {
                        Ok(number) => CellValue::Number(number),
                        Err(_) => CellValue::Text(text),
                    },
                    other => other,
                };
                NormalizedResponse {
                    value: Some(value),
                    word_note: None,
                }
            }
            ResponseType::WordAssociation => {
                let text = match &staged {
                    CellValue::Text(text) => text.as_str(),
                    _ => "",
                };
                let matches = self.count_word_matches(text);
                let note = WordMatchNote {
                    participant: participant.to_string(),
                    task_id: task.id.clone(),
                    response: text.to_string(),
                    matches: matches.clone(),
                };
                if note.is_miss() {
                    warn!(
                        task = %task.id,
                        participant, response = text, "no corpus words matched"
                    );
                }
                NormalizedResponse {
                    value: Some(CellValue::Words(matches)),
                    word_note: Some(note),
                }
            }
            ResponseType::None => NormalizedResponse {
                value: Some(staged),
                word_note: None,
            },
        }
    }

    fn count_word_matches(&self, text: &str) -> BTreeMap<String, usize> {
        self.word_patterns
            .iter()
            .filter_map(|(word, pattern)| {
                let count = pattern.find_iter(text).count();
                (count > 0).then(|| (word.clone(), count))
            })
            .collect()
    }
}

/// Step 2 of normalization: resolve the `:::` clip micro-format. Both parts
/// must decode for a structured value; otherwise the cell degrades to its
/// first segment so the text is never silently lost.
fn apply_clip_reference(value: String) -> CellValue {
    let Some((timecode, url)) = value.split_once(CLIP_MARKER) else {
        return CellValue::Text(value);
    };

    match (clip_duration_seconds(timecode), clip_offset_seconds(url)) {
        (Some(duration_seconds), Some(offset_seconds)) => CellValue::Clip(ClipReference {
            offset_seconds,
            duration_seconds,
        }),
        _ => CellValue::Text(timecode.to_string()),
    }
}

/// A `mm:ss` timecode is valid only when the first colon sits after exactly
/// two characters and both halves parse as unsigned integers.
fn clip_duration_seconds(timecode: &str) -> Option<u32> {
    if timecode.find(':') != Some(2) {
        return None;
    }
    let mut parts = timecode.split(':');
    let minutes: u32 = parts.next()?.parse().ok()?;
    let seconds: u32 = parts.next()?.parse().ok()?;
    Some(minutes * 60 + seconds)
}

/// The clip URL must start with `http` and carry a `start=` query value;
/// the offset is the leading unsigned integer of whatever follows it.
fn clip_offset_seconds(url: &str) -> Option<u32> {
    if !url.starts_with("http") {
        return None;
    }
    let (_, after) = url.split_once("start=")?;
    leading_u32(after)
}

fn leading_u32(text: &str) -> Option<u32> {
    let end = text
        .find(|character: char| !character.is_ascii_digit())
        .unwrap_or(text.len());
    if end == 0 {
        return None;
    }
    text[..end].parse().ok()
}
