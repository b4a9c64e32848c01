//! Resolving ambiguous station names.
//!
//! When a station name matches several stations, the source answers with a
//! form holding one `<select>` per ambiguous name. The client fills in the
//! form and posts it back. Which candidate gets picked is up to a
//! [`DisambiguationPolicy`].

use std::fmt::Debug;

use tracing::debug;

use super::error::ProviderError;

/// One `<option>` of a station choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    /// Value posted back to the source
    pub value: String,
    /// Station name shown to the user
    pub label: String,
}

/// One ambiguous name and its candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationChoice {
    /// Form field name
    pub field: String,
    /// Candidates in the order the source lists them
    pub options: Vec<SelectOption>,
}

/// The disambiguation form as found on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisambiguationForm {
    /// Form action URL, possibly relative
    pub action: String,
    /// Input fields to echo back
    pub fields: Vec<(String, String)>,
    /// Ambiguous names
    pub choices: Vec<StationChoice>,
}

impl DisambiguationForm {
    /// Build the form submission, resolving every choice with `policy`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::FormatChanged` if the policy finds no
    /// acceptable candidate for a choice.
    pub fn resolve(
        &self,
        policy: &dyn DisambiguationPolicy,
    ) -> Result<Vec<(String, String)>, ProviderError> {
        let mut submission = self.fields.clone();
        for choice in &self.choices {
            let option = policy
                .choose(choice)
                .ok_or_else(|| ProviderError::format_changed("station candidates"))?;
            debug!(field = %choice.field, station = %option.label, "resolved ambiguous station");
            submission.push((choice.field.clone(), option.value.clone()));
        }
        Ok(submission)
    }
}

/// Strategy for picking a station among several candidates.
pub trait DisambiguationPolicy: Debug + Send + Sync {
    /// Pick one of `choice.options`, or `None` if none is acceptable.
    fn choose<'a>(&self, choice: &'a StationChoice) -> Option<&'a SelectOption>;
}

/// Always picks the first candidate the source offers.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstCandidate;

impl DisambiguationPolicy for FirstCandidate {
    fn choose<'a>(&self, choice: &'a StationChoice) -> Option<&'a SelectOption> {
        choice.options.first()
    }
}
