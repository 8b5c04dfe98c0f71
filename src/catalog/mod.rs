//! Question catalog and answer records.
//!
//! This module provides the versioned data model persisted by the answer
//! store: questions, notes (answer records), and the catalog snapshot that
//! groups them.


use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// Current catalog schema version. Bumped on structural changes so `load()`
/// can detect catalogs written by a newer build.
pub const CATALOG_VERSION: u32 = 1;

/// Metadata key marking a note as populated outside the conversational flow
/// and awaiting explicit user confirmation. Value is [`META_TRUE`].
pub const META_NEEDS_REVIEW: &str = "needs_review";
/// Metadata key recording where a non-conversational answer came from
/// (e.g. "device_discovery").
pub const META_PROVENANCE: &str = "provenance";
/// Metadata key holding the display label derived from an address answer.
pub const META_DISPLAY_NAME: &str = "display_name";
/// Canonical truthy metadata value.
pub const META_TRUE: &str = "true";

/// Question category. Closed set; unknown strings fail to parse rather than
/// being silently reclassified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Facts about the home itself (address, layout, systems).
    HouseInfo,
    /// Facts about the residents.
    Personal,
    /// Upkeep and service history.
    Maintenance,
    /// Resident preferences (units, schedules).
    Preferences,
    /// Recurring reminders.
    Reminders,
    /// Anything that fits nowhere else.
    #[default]
    Other,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::HouseInfo => write!(f, "house_info"),
            Category::Personal => write!(f, "personal"),
            Category::Maintenance => write!(f, "maintenance"),
            Category::Preferences => write!(f, "preferences"),
            Category::Reminders => write!(f, "reminders"),
            Category::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "house_info" => Ok(Category::HouseInfo),
            "personal" => Ok(Category::Personal),
            "maintenance" => Ok(Category::Maintenance),
            "preferences" => Ok(Category::Preferences),
            "reminders" => Ok(Category::Reminders),
            "other" => Ok(Category::Other),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// A single intake question. Immutable after creation; removal is the only
/// permitted change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique, opaque identifier.
    pub id: String,
    /// Prompt text presented to the user.
    pub text: String,
    /// Question category, drives answer derivation.
    pub category: Category,
    /// Default ask order. Unique within a catalog, not necessarily contiguous.
    pub display_order: i64,
    /// Required questions gate flow completion.
    pub is_required: bool,
    /// Optional helper text; no effect on flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl Question {
    /// Create a new question with a generated ID
    pub fn new(text: impl Into<String>, category: Category, display_order: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            category,
            display_order,
            is_required: false,
            hint: None,
        }
    }

    /// Create a seeded question with a fixed ID
    pub fn seeded(
        id: impl Into<String>,
        text: impl Into<String>,
        category: Category,
        display_order: i64,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            category,
            display_order,
            is_required: false,
            hint: None,
        }
    }

    /// Mark as required
    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    /// Set helper text
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// A persisted answer record. At most one note exists per question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// The question this note answers.
    pub question_id: String,
    /// Free-text answer. Whitespace-only answers do not count as answered.
    pub answer: String,
    /// When the note was first committed.
    pub created_at: DateTime<Utc>,
    /// When the note was last written. Strictly increases on every update.
    pub last_modified: DateTime<Utc>,
    /// Flow bookkeeping (review flags, provenance, derived labels).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl Note {
    /// Create a new note for a question
    pub fn new(question_id: impl Into<String>, answer: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            question_id: question_id.into(),
            answer: answer.into(),
            created_at: now,
            last_modified: now,
            metadata: None,
        }
    }

    /// Set metadata
    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Whether this note satisfies its question. Whitespace-only answers
    /// never count.
    pub fn is_answered(&self) -> bool {
        !self.answer.trim().is_empty()
    }

    /// Whether this note awaits explicit user confirmation.
    pub fn needs_review(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(META_NEEDS_REVIEW))
            .map(|v| v == META_TRUE)
            .unwrap_or(false)
    }

    /// Flag this note as populated outside the conversational flow.
    pub fn mark_needs_review(&mut self) {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(META_NEEDS_REVIEW.to_string(), META_TRUE.to_string());
    }

    /// Clear the review flag after an explicit user confirmation.
    pub fn confirm(&mut self) {
        if let Some(metadata) = self.metadata.as_mut() {
            metadata.remove(META_NEEDS_REVIEW);
            if metadata.is_empty() {
                self.metadata = None;
            }
        }
    }

    /// Replace the answer in place, keeping `created_at` and advancing
    /// `last_modified` past its previous value even when the wall clock has
    /// not moved.
    pub fn record_update(&mut self, answer: impl Into<String>) {
        self.answer = answer.into();
        self.last_modified = next_timestamp(self.last_modified);
    }

    /// Fetch a metadata value
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(key))
            .map(String::as_str)
    }
}

/// Next write timestamp after `prev`: the wall clock when it advanced,
/// otherwise `prev` + 1 microsecond. Keeps `last_modified` strictly
/// monotonic under rapid successive writes.
pub(crate) fn next_timestamp(prev: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > prev {
        now
    } else {
        prev + Duration::microseconds(1)
    }
}

/// The full intake state: question set, answer records, and schema version.
///
/// Immutable snapshots of this type are what the gateway publishes to
/// subscribers; all mutation goes through the methods here so the
/// one-note-per-question and no-dangling-note invariants hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Schema/content version, bumped on structural changes.
    pub version: u32,
    /// Questions, unique ids, ordered by insertion.
    pub questions: Vec<Question>,
    /// Answer records keyed by question ID. Zero or one per question.
    pub notes: BTreeMap<String, Note>,
}

impl Catalog {
    /// Create an empty catalog at the current version
    pub fn empty() -> Self {
        Self {
            version: CATALOG_VERSION,
            questions: Vec::new(),
            notes: BTreeMap::new(),
        }
    }

    /// Create a catalog seeded with the predefined home-intake question set
    pub fn seeded() -> Self {
        Self {
            version: CATALOG_VERSION,
            questions: seed_questions(),
            notes: BTreeMap::new(),
        }
    }

    /// Look up a question by ID
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Look up a question by its prompt text
    pub fn question_by_text(&self, text: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.text == text)
    }

    /// Look up the note for a question
    pub fn note(&self, question_id: &str) -> Option<&Note> {
        self.notes.get(question_id)
    }

    /// Whether a question has an answered note.
    pub fn is_answered(&self, question_id: &str) -> bool {
        self.notes
            .get(question_id)
            .map(Note::is_answered)
            .unwrap_or(false)
    }

    /// Create or replace the note for a question. On update the original
    /// `created_at` is kept and `last_modified` advances strictly.
    ///
    /// Fails with [`StoreError::QuestionNotFound`] if the question does not
    /// exist, so a dangling note can never be introduced through this path.
    pub fn upsert_note(
        &mut self,
        question_id: &str,
        answer: impl Into<String>,
        metadata: Option<BTreeMap<String, String>>,
    ) -> StoreResult<&Note> {
        if self.question(question_id).is_none() {
            return Err(StoreError::QuestionNotFound {
                question_id: question_id.to_string(),
            });
        }

        match self.notes.get_mut(question_id) {
            Some(existing) => {
                existing.record_update(answer);
                existing.metadata = metadata;
            }
            None => {
                let mut note = Note::new(question_id, answer);
                note.metadata = metadata;
                self.notes.insert(question_id.to_string(), note);
            }
        }

        Ok(&self.notes[question_id])
    }

    /// Delete the note for a question, returning it if present
    pub fn remove_note(&mut self, question_id: &str) -> Option<Note> {
        self.notes.remove(question_id)
    }

    /// Add a question. Fails if a question with the same ID already exists.
    pub fn add_question(&mut self, question: Question) -> StoreResult<()> {
        if self.question(&question.id).is_some() {
            return Err(StoreError::Corruption {
                message: format!("duplicate question id: {}", question.id),
            });
        }
        self.questions.push(question);
        Ok(())
    }

    /// Delete a question and its note, if any. Removing the note alongside
    /// the question keeps the no-dangling-note invariant.
    pub fn remove_question(&mut self, question_id: &str) -> Option<Question> {
        let index = self.questions.iter().position(|q| q.id == question_id)?;
        self.notes.remove(question_id);
        Some(self.questions.remove(index))
    }

    /// Discard all notes, leaving the question set untouched
    pub fn clear_notes(&mut self) {
        self.notes.clear();
    }

    /// Check structural invariants. A note keyed by a question ID that no
    /// longer exists is a corruption condition.
    pub fn validate(&self) -> StoreResult<()> {
        for question_id in self.notes.keys() {
            if self.question(question_id).is_none() {
                return Err(StoreError::Corruption {
                    message: format!("dangling note for question: {}", question_id),
                });
            }
        }
        Ok(())
    }
}

/// Seeded question IDs, fixed so notes survive a reinstall that re-seeds
/// the catalog.
pub mod seed_ids {
    /// The home's street address (drives address derivation).
    pub const HOME_ADDRESS: &str = "home-address";
    /// Display name for the home.
    pub const HOME_NAME: &str = "home-name";
    /// Primary resident's name.
    pub const RESIDENT_NAME: &str = "resident-name";
    /// Last heating service date.
    pub const HEATING_SERVICE: &str = "heating-service";
    /// Fahrenheit or Celsius.
    pub const TEMPERATURE_UNIT: &str = "temperature-unit";
    /// Daily reminder time.
    pub const REMINDER_TIME: &str = "reminder-time";
    /// Free-form closing question.
    pub const ADDITIONAL_NOTES: &str = "additional-notes";
}

fn seed_questions() -> Vec<Question> {
    vec![
        Question::seeded(
            seed_ids::HOME_ADDRESS,
            "What is your home's street address?",
            Category::HouseInfo,
            1,
        )
        .required()
        .with_hint("Street, city, region postal code, country"),
        Question::seeded(
            seed_ids::HOME_NAME,
            "What should we call your home?",
            Category::Preferences,
            2,
        )
        .with_hint("A short display name, like \"Lake House\""),
        Question::seeded(
            seed_ids::RESIDENT_NAME,
            "What is your name?",
            Category::Personal,
            3,
        )
        .required(),
        Question::seeded(
            seed_ids::HEATING_SERVICE,
            "When was your heating system last serviced?",
            Category::Maintenance,
            4,
        ),
        Question::seeded(
            seed_ids::TEMPERATURE_UNIT,
            "Do you prefer Fahrenheit or Celsius?",
            Category::Preferences,
            5,
        )
        .required(),
        Question::seeded(
            seed_ids::REMINDER_TIME,
            "What time would you like your daily reminders?",
            Category::Reminders,
            6,
        ),
        Question::seeded(
            seed_ids::ADDITIONAL_NOTES,
            "Anything else we should know about your home?",
            Category::Other,
            7,
        ),
    ]
}
