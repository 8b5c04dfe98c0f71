//! Flow coordination: which question is current, and how answers commit.
//!
//! The coordinator owns the conversation's [`SessionState`], holds a
//! reference to the process-wide [`StoreGateway`], and applies the
//! category-specific derivation rules when an answer is accepted.

pub mod derive;

pub use derive::{AddressComponents, Derivation};

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::catalog::{Catalog, Question, META_DISPLAY_NAME};
use crate::error::{FlowError, FlowResult};
use crate::gateway::StoreGateway;
use crate::session::SessionState;

/// Stateful selector of the current question and orchestrator of answer
/// commits for one conversation.
pub struct FlowCoordinator {
    gateway: StoreGateway,
    session: SessionState,
    current_question: Option<Question>,
    has_completed_all_questions: bool,
    last_derivation: Option<Derivation>,
}

impl FlowCoordinator {
    /// Create an idle coordinator. Call [`load_next_question`] to start the
    /// conversation.
    ///
    /// [`load_next_question`]: FlowCoordinator::load_next_question
    pub fn new(gateway: StoreGateway) -> Self {
        Self {
            gateway,
            session: SessionState::new(),
            current_question: None,
            has_completed_all_questions: false,
            last_derivation: None,
        }
    }

    /// The question currently being asked, if any
    pub fn current_question(&self) -> Option<&Question> {
        self.current_question.as_ref()
    }

    /// True once every required question has a confirmed answer
    pub fn has_completed_all_questions(&self) -> bool {
        self.has_completed_all_questions
    }

    /// The conversation's draft state
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Mutable access for the conversation driver (transcript updates, UI
    /// flags)
    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    /// Auxiliary data derived from the most recent committed answer,
    /// consumed by downstream collaborators
    pub fn last_derivation(&self) -> Option<&Derivation> {
        self.last_derivation.as_ref()
    }

    /// Recompute the current question and reset the session for it.
    ///
    /// Questions whose notes are flagged for review are surfaced first, in
    /// display order; then questions with no answered note, in display
    /// order. With nothing pending the current question clears. The
    /// completion flag tracks required questions only: each must hold an
    /// answered note that is not awaiting review.
    pub async fn load_next_question(&mut self) -> FlowResult<Option<Question>> {
        let catalog = self.gateway.read().await;

        let next = select_next_question(&catalog);
        self.has_completed_all_questions = required_questions_complete(&catalog);
        self.current_question = next.cloned();
        self.session
            .activate(self.current_question.as_ref().map(|q| q.id.clone()));

        match &self.current_question {
            Some(question) => {
                debug!(
                    question_id = %question.id,
                    display_order = question.display_order,
                    "Loaded next question"
                );
            }
            None => {
                info!(
                    completed = self.has_completed_all_questions,
                    "No pending questions"
                );
            }
        }

        Ok(self.current_question.clone())
    }

    /// Look up the committed answer for a question by its prompt text.
    /// Returns the answer only when the note satisfies the answered
    /// invariant.
    pub async fn get_answer(&self, question_text: &str) -> Option<String> {
        let catalog = self.gateway.read().await;
        let question = catalog.question_by_text(question_text)?;
        catalog
            .note(&question.id)
            .filter(|note| note.is_answered())
            .map(|note| note.answer.clone())
    }

    /// Validate and commit an answer for the current question, then advance.
    ///
    /// Empty-after-trimming input fails with [`FlowError::EmptyAnswer`] and
    /// changes nothing: the current question stays displayed and the draft
    /// is kept for correction. A storage failure surfaces to the caller
    /// with the session back in its drafting state; re-issuing the call
    /// retries the commit.
    pub async fn save_answer(
        &mut self,
        text: &str,
        metadata: Option<BTreeMap<String, String>>,
    ) -> FlowResult<()> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(FlowError::EmptyAnswer);
        }

        let question = self
            .current_question
            .clone()
            .ok_or(FlowError::NoActiveQuestion)?;

        self.session.begin_saving_answer();
        let committed = self.commit(&question, trimmed, metadata).await;
        self.session.end_saving_answer();
        committed?;

        info!(question_id = %question.id, "Answer committed");

        self.load_next_question().await?;
        Ok(())
    }

    async fn commit(
        &mut self,
        question: &Question,
        answer: &str,
        metadata: Option<BTreeMap<String, String>>,
    ) -> FlowResult<()> {
        let derivation = derive::for_category(question.category, answer);

        let mut metadata = metadata.unwrap_or_default();
        if let Some(display_name) = derivation.as_ref().and_then(Derivation::display_name) {
            metadata.insert(META_DISPLAY_NAME.to_string(), display_name.to_string());
        }
        let metadata = if metadata.is_empty() {
            None
        } else {
            Some(metadata)
        };

        // A conversational commit is the user's explicit confirmation; the
        // replaced metadata carries no review flag.
        self.gateway
            .save_or_update_note(&question.id, answer, metadata)
            .await?;

        self.last_derivation = derivation;
        Ok(())
    }
}

/// Pick the question to ask next: review-needed notes first, then
/// unanswered questions, each in display order.
fn select_next_question(catalog: &Catalog) -> Option<&Question> {
    let needs_review = catalog
        .questions
        .iter()
        .filter(|q| {
            catalog
                .note(&q.id)
                .map(|note| note.needs_review())
                .unwrap_or(false)
        })
        .min_by_key(|q| q.display_order);

    if needs_review.is_some() {
        return needs_review;
    }

    catalog
        .questions
        .iter()
        .filter(|q| !catalog.is_answered(&q.id))
        .min_by_key(|q| q.display_order)
}

/// Every required question holds an answered note that is not awaiting
/// review.
fn required_questions_complete(catalog: &Catalog) -> bool {
    catalog
        .questions
        .iter()
        .filter(|q| q.is_required)
        .all(|q| {
            catalog
                .note(&q.id)
                .map(|note| note.is_answered() && !note.needs_review())
                .unwrap_or(false)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{seed_ids, Category};

    fn catalog_with_notes(answers: &[(&str, &str)]) -> Catalog {
        let mut catalog = Catalog::seeded();
        for &(id, answer) in answers {
            catalog.upsert_note(id, answer, None).unwrap();
        }
        catalog
    }

    #[test]
    fn test_select_follows_display_order() {
        let catalog = catalog_with_notes(&[]);
        let next = select_next_question(&catalog).unwrap();
        assert_eq!(next.id, seed_ids::HOME_ADDRESS);

        let catalog = catalog_with_notes(&[(seed_ids::HOME_ADDRESS, "12 Elm St, Portland")]);
        let next = select_next_question(&catalog).unwrap();
        assert_eq!(next.id, seed_ids::HOME_NAME);
    }

    #[test]
    fn test_select_skips_whitespace_answers() {
        let catalog = catalog_with_notes(&[(seed_ids::HOME_ADDRESS, "   ")]);
        let next = select_next_question(&catalog).unwrap();
        assert_eq!(next.id, seed_ids::HOME_ADDRESS);
    }

    #[test]
    fn test_review_needed_preempts_order() {
        let mut catalog = catalog_with_notes(&[
            (seed_ids::HOME_ADDRESS, "12 Elm St, Portland"),
            (seed_ids::TEMPERATURE_UNIT, "Celsius"),
        ]);
        catalog
            .notes
            .get_mut(seed_ids::TEMPERATURE_UNIT)
            .unwrap()
            .mark_needs_review();

        // home-name (order 2) is unanswered, but the review-flagged
        // temperature-unit (order 5) wins
        let next = select_next_question(&catalog).unwrap();
        assert_eq!(next.id, seed_ids::TEMPERATURE_UNIT);
    }

    #[test]
    fn test_completion_ignores_optional_questions() {
        let catalog = catalog_with_notes(&[
            (seed_ids::HOME_ADDRESS, "12 Elm St, Portland"),
            (seed_ids::RESIDENT_NAME, "Alex"),
            (seed_ids::TEMPERATURE_UNIT, "Celsius"),
        ]);

        // All required questions answered; optional ones still pending
        assert!(required_questions_complete(&catalog));
        assert!(select_next_question(&catalog).is_some());
    }

    #[test]
    fn test_review_needed_defers_completion() {
        let mut catalog = catalog_with_notes(&[
            (seed_ids::HOME_ADDRESS, "12 Elm St, Portland"),
            (seed_ids::RESIDENT_NAME, "Alex"),
            (seed_ids::TEMPERATURE_UNIT, "Celsius"),
        ]);
        assert!(required_questions_complete(&catalog));

        catalog
            .notes
            .get_mut(seed_ids::HOME_ADDRESS)
            .unwrap()
            .mark_needs_review();
        assert!(!required_questions_complete(&catalog));
    }

    #[test]
    fn test_empty_catalog_is_complete_and_exhausted() {
        let catalog = Catalog {
            version: 1,
            questions: Vec::new(),
            notes: Default::default(),
        };
        assert!(required_questions_complete(&catalog));
        assert!(select_next_question(&catalog).is_none());
    }

    #[test]
    fn test_added_question_joins_selection() {
        let mut catalog = Catalog::seeded();
        for q in catalog.questions.clone() {
            catalog.upsert_note(&q.id, "answered", None).unwrap();
        }
        let q = Question::new("Front door code?", Category::HouseInfo, 0);
        let q_id = q.id.clone();
        catalog.add_question(q).unwrap();

        let next = select_next_question(&catalog).unwrap();
        assert_eq!(next.id, q_id);
    }
}
