//! Wait conditions
//!
//! [`Predicate`] covers the conditions the harness needs against a live
//! document. Anything else can be polled through [`from_fn`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{WaitError, WaitResult};
use crate::handle::{is_truthy, Handle, HandleError};
use crate::locator::Locator;

/// Result of a single evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    NotYet,
    Ready(T),
}

impl<T> Outcome<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Outcome::Ready(_))
    }
}

/// Something a [`Poller`](crate::Poller) can evaluate repeatedly.
///
/// Conditions may keep state between evaluations, so one instance belongs
/// to exactly one poll; the poller consumes it.
pub trait Condition<H: ?Sized> {
    type Output;

    fn evaluate(&mut self, handle: &H) -> WaitResult<Outcome<Self::Output>>;

    /// Human-readable description used in timeout errors.
    fn describe(&self) -> String;
}

/// What to do when a predicate's element cannot be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingElement {
    /// Fail the wait with [`WaitError::Lookup`].
    #[default]
    Error,
    /// Keep polling; the element may not have rendered yet.
    NotYet,
}

/// Value produced by a satisfied [`Predicate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Match<E> {
    /// The element the predicate observed.
    Element(E),
    /// The element is gone.
    Gone,
    /// Truthy script result.
    Value(Value),
}

impl<E> Match<E> {
    pub fn into_element(self) -> Option<E> {
        match self {
            Match::Element(element) => Some(element),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredicateKind<E> {
    /// Attribute `attribute` of the element contains the whitespace
    /// separated `token`.
    HasAttributeValue {
        locator: Locator,
        attribute: String,
        token: String,
    },
    /// The same element is found on two consecutive evaluations.
    Unchanged {
        locator: Locator,
        last: Option<E>,
    },
    /// The element has no `disabled` attribute.
    NotDisabled { locator: Locator },
    /// Nothing matches the locator.
    Absent { locator: Locator },
    /// The script returns a truthy value.
    ScriptResultTruthy { script: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate<E> {
    kind: PredicateKind<E>,
    on_missing: MissingElement,
}

impl<E> Predicate<E> {
    pub fn new(kind: PredicateKind<E>) -> Self {
        Self {
            kind,
            on_missing: MissingElement::default(),
        }
    }

    pub fn has_attribute_value(
        locator: Locator,
        attribute: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self::new(PredicateKind::HasAttributeValue {
            locator,
            attribute: attribute.into(),
            token: token.into(),
        })
    }

    pub fn has_class(locator: Locator, class: impl Into<String>) -> Self {
        Self::has_attribute_value(locator, "class", class)
    }

    pub fn unchanged(locator: Locator) -> Self {
        Self::new(PredicateKind::Unchanged { locator, last: None })
    }

    pub fn not_disabled(locator: Locator) -> Self {
        Self::new(PredicateKind::NotDisabled { locator })
    }

    pub fn absent(locator: Locator) -> Self {
        Self::new(PredicateKind::Absent { locator })
    }

    pub fn script_truthy(script: impl Into<String>) -> Self {
        Self::new(PredicateKind::ScriptResultTruthy {
            script: script.into(),
        })
    }

    /// Choose how a missing element is treated. Ignored by `Absent`, where
    /// a missing element is the success case.
    pub fn on_missing(mut self, policy: MissingElement) -> Self {
        self.on_missing = policy;
        self
    }

    pub fn kind(&self) -> &PredicateKind<E> {
        &self.kind
    }
}

impl<H: Handle + ?Sized> Condition<H> for Predicate<H::Element> {
    type Output = Match<H::Element>;

    fn evaluate(&mut self, handle: &H) -> WaitResult<Outcome<Self::Output>> {
        let on_missing = self.on_missing;
        match &mut self.kind {
            PredicateKind::HasAttributeValue {
                locator,
                attribute,
                token,
            } => {
                let Some(element) = locate(handle, locator, on_missing)? else {
                    return Ok(Outcome::NotYet);
                };
                let value = read_attribute(handle, locator, &element, attribute)?;
                let matched = value
                    .as_deref()
                    .map(|v| v.split_whitespace().any(|t| t == token.as_str()))
                    .unwrap_or(false);
                Ok(if matched {
                    Outcome::Ready(Match::Element(element))
                } else {
                    Outcome::NotYet
                })
            }
            PredicateKind::Unchanged { locator, last } => {
                let Some(element) = locate(handle, locator, on_missing)? else {
                    *last = None;
                    return Ok(Outcome::NotYet);
                };
                if last.as_ref() == Some(&element) {
                    return Ok(Outcome::Ready(Match::Element(element)));
                }
                *last = Some(element);
                Ok(Outcome::NotYet)
            }
            PredicateKind::NotDisabled { locator } => {
                let Some(element) = locate(handle, locator, on_missing)? else {
                    return Ok(Outcome::NotYet);
                };
                match read_attribute(handle, locator, &element, "disabled")? {
                    None => Ok(Outcome::Ready(Match::Element(element))),
                    Some(_) => Ok(Outcome::NotYet),
                }
            }
            PredicateKind::Absent { locator } => match handle.is_present(locator) {
                Ok(false) => Ok(Outcome::Ready(Match::Gone)),
                Ok(true) => Ok(Outcome::NotYet),
                Err(source) => Err(WaitError::Lookup {
                    locator: locator.clone(),
                    source,
                }),
            },
            PredicateKind::ScriptResultTruthy { script } => match handle.execute(script) {
                Ok(value) if is_truthy(&value) => Ok(Outcome::Ready(Match::Value(value))),
                Ok(_) => Ok(Outcome::NotYet),
                Err(source) => Err(WaitError::Probe {
                    script: script.clone(),
                    source,
                }),
            },
        }
    }

    fn describe(&self) -> String {
        match &self.kind {
            PredicateKind::HasAttributeValue {
                locator,
                attribute,
                token,
            } => format!("{} to have {} \"{}\"", locator, attribute, token),
            PredicateKind::Unchanged { locator, .. } => {
                format!("{} to stay the same between polls", locator)
            }
            PredicateKind::NotDisabled { locator } => format!("{} to be enabled", locator),
            PredicateKind::Absent { locator } => format!("{} to disappear", locator),
            PredicateKind::ScriptResultTruthy { script } => {
                format!("`{}` to return a truthy value", script.trim())
            }
        }
    }
}

fn locate<H: Handle + ?Sized>(
    handle: &H,
    locator: &Locator,
    on_missing: MissingElement,
) -> WaitResult<Option<H::Element>> {
    match handle.locate(locator) {
        Ok(element) => Ok(Some(element)),
        Err(HandleError::NotFound(_)) if on_missing == MissingElement::NotYet => Ok(None),
        Err(source) => Err(WaitError::Lookup {
            locator: locator.clone(),
            source,
        }),
    }
}

fn read_attribute<H: Handle + ?Sized>(
    handle: &H,
    locator: &Locator,
    element: &H::Element,
    name: &str,
) -> WaitResult<Option<String>> {
    handle
        .attribute(element, name)
        .map_err(|source| WaitError::Lookup {
            locator: locator.clone(),
            source,
        })
}

/// A condition backed by a closure.
pub struct FnCondition<F> {
    description: String,
    f: F,
}

/// Wrap a closure as a [`Condition`].
pub fn from_fn<H, T, F>(description: impl Into<String>, f: F) -> FnCondition<F>
where
    H: ?Sized,
    F: FnMut(&H) -> WaitResult<Outcome<T>>,
{
    FnCondition {
        description: description.into(),
        f,
    }
}

impl<H, T, F> Condition<H> for FnCondition<F>
where
    H: ?Sized,
    F: FnMut(&H) -> WaitResult<Outcome<T>>,
{
    type Output = T;

    fn evaluate(&mut self, handle: &H) -> WaitResult<Outcome<T>> {
        (self.f)(handle)
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}
