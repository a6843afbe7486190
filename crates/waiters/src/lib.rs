//! MolView condition waiters
//!
//! Bounded polling of state that lives somewhere else and changes on its own
//! schedule, typically a browser session driven over WebDriver.
//!
//! A [`Predicate`] describes one observable fact ("has class `active`",
//! "element is gone", "script returns true"). A [`Poller`] evaluates it
//! against a [`Handle`] at a fixed cadence until it holds or the deadline
//! passes.
//!
//! ```text
//! ┌────────────┐   evaluate(&handle)   ┌────────────────┐
//! │   Poller   │ ────────────────────▶ │   Predicate    │
//! │ (deadline, │ ◀──────────────────── │ (owns "last    │
//! │  interval) │  NotYet | Ready(T)    │  seen" state)  │
//! └────────────┘                       └───────┬────────┘
//!                                              │ locate / attribute /
//!                                              │ is_present / execute
//!                                              ▼
//!                                      ┌────────────────┐
//!                                      │  Handle (live  │
//!                                      │  browser, fake)│
//!                                      └────────────────┘
//! ```

pub mod error;
pub mod handle;
pub mod locator;
pub mod poller;
pub mod predicate;

pub use error::{WaitError, WaitResult};
pub use handle::{is_truthy, Handle, HandleError};
pub use locator::Locator;
pub use poller::{poll, Poller, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT};
pub use predicate::{from_fn, Condition, Match, MissingElement, Outcome, Predicate, PredicateKind};
