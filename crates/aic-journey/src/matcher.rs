use std::{fmt, sync::Arc};

use crate::error::AssertionFailure;

type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A described predicate over `T`.
///
/// Every callback, response and error assertion is a `Matcher`; composite matchers are built
/// with [`Matcher::and`] and [`Matcher::all_of`], so a failing match always reports the full
/// description of what was expected.
pub struct Matcher<T: ?Sized + 'static> {
    description: String,
    predicate: Predicate<T>,
}

impl<T: ?Sized + 'static> Clone for Matcher<T> {
    fn clone(&self) -> Self {
        Self {
            description: self.description.clone(),
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<T: ?Sized + 'static> fmt::Debug for Matcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Matcher").field(&self.description).finish()
    }
}

impl<T: ?Sized + 'static> Matcher<T> {
    #[allow(missing_docs)]
    pub fn new(
        description: impl Into<String>,
        predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Matches every candidate.
    pub fn anything() -> Self {
        Self::new("anything", |_| true)
    }

    /// Matches no candidate.
    pub fn nothing(description: impl Into<String>) -> Self {
        Self::new(description, |_| false)
    }

    #[allow(missing_docs)]
    pub fn matches(&self, candidate: &T) -> bool {
        (self.predicate)(candidate)
    }

    #[allow(missing_docs)]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Both `self` and `other` must match.
    pub fn and(self, other: Matcher<T>) -> Self {
        let description = format!("({} and {})", self.description, other.description);
        Self::new(description, move |candidate| {
            self.matches(candidate) && other.matches(candidate)
        })
    }

    /// Every matcher must match. An empty list matches anything.
    pub fn all_of(matchers: Vec<Matcher<T>>) -> Self {
        let description = matchers
            .iter()
            .map(|m| m.description.as_str())
            .collect::<Vec<_>>()
            .join(" and ");
        let description = if description.is_empty() {
            "anything".to_owned()
        } else {
            format!("({description})")
        };

        Self::new(description, move |candidate| {
            matchers.iter().all(|m| m.matches(candidate))
        })
    }
}

impl<T: fmt::Debug + ?Sized + 'static> Matcher<T> {
    /// Check `candidate`, describing the mismatch under `reason` when it fails.
    pub fn check(&self, reason: &str, candidate: &T) -> Result<(), AssertionFailure> {
        if self.matches(candidate) {
            return Ok(());
        }

        Err(AssertionFailure {
            reason: reason.to_owned(),
            expected: self.description.clone(),
            actual: format!("{candidate:#?}"),
        })
    }
}
