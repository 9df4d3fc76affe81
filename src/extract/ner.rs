//! Candidate-name extraction through an external named-entity recognizer.
//!
//! The recognizer is a black box: text in, labelled spans out. Callers build
//! the handle once and pass it in; [`LazyRecognizer`] defers an expensive
//! model load to first use and then serves concurrent readers.

use std::sync::OnceLock;

use super::patterns::PATTERNS;
use super::{ExtractOptions, Extraction, scan};
use crate::text_repair::repair;

#[cfg_attr(not(test), allow(dead_code))]
pub const PERSON_LABEL: &str = "PERSON";

#[cfg_attr(not(test), allow(dead_code))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpan {
    pub text: String,
    pub label: String,
}

#[cfg_attr(not(test), allow(dead_code))]
pub trait EntityRecognizer {
    fn recognize(&self, text: &str) -> Vec<EntitySpan>;
}

impl<R: EntityRecognizer + ?Sized> EntityRecognizer for &R {
    fn recognize(&self, text: &str) -> Vec<EntitySpan> {
        (**self).recognize(text)
    }
}

#[cfg_attr(not(test), allow(dead_code))]
pub struct LazyRecognizer<R, F> {
    loader: F,
    model: OnceLock<R>,
}

#[cfg_attr(not(test), allow(dead_code))]
impl<R, F> LazyRecognizer<R, F>
where
    R: EntityRecognizer,
    F: Fn() -> R,
{
    pub fn new(loader: F) -> Self {
        Self {
            loader,
            model: OnceLock::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    fn model(&self) -> &R {
        self.model.get_or_init(&self.loader)
    }
}

impl<R, F> EntityRecognizer for LazyRecognizer<R, F>
where
    R: EntityRecognizer,
    F: Fn() -> R,
{
    fn recognize(&self, text: &str) -> Vec<EntitySpan> {
        self.model().recognize(text)
    }
}

#[cfg_attr(not(test), allow(dead_code))]
/// Same context machine as [`super::extract_with`], with names taken from
/// the first person entity of each candidate line.
pub fn extract_with_recognizer<S: AsRef<str>>(
    lines: &[S],
    options: &ExtractOptions,
    recognizer: &dyn EntityRecognizer,
) -> Extraction {
    scan(lines, options, |text| candidate_name(recognizer, text))
}

#[cfg_attr(not(test), allow(dead_code))]
fn candidate_name(recognizer: &dyn EntityRecognizer, text: &str) -> String {
    let person = recognizer
        .recognize(text)
        .into_iter()
        .find(|span| span.label == PERSON_LABEL)
        .map(|span| repair(&span.text))
        .filter(|name| !name.is_empty());

    person.unwrap_or_else(|| repair(PATTERNS.leading_name(text)))
}
