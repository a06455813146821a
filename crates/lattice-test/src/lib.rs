//! Minimal test harness for Lattice object models
//!
//! A [`TestSuite`] runs named cases, each a closure returning
//! `anyhow::Result<()>`, and tallies them into a [`Summary`]. A case that has
//! nothing to check yet returns [`empty_case()`] and is counted separately
//! from passes and failures.
//!
//! ```
//! use lattice_test::{assert_that, TestSuite};
//!
//! let mut suite = TestSuite::new("arith");
//! suite.case("adds", || assert_that(1 + 1 == 2));
//! assert_eq!(suite.summary().passed, 1);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

use std::fmt;

use tracing::{debug, info, warn};

/// Sentinel error marking a case with no assertions yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyCase;

impl fmt::Display for EmptyCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("empty test case")
    }
}

impl std::error::Error for EmptyCase {}

/// Return value for a case that has not been written yet
pub fn empty_case() -> anyhow::Result<()> {
    Err(EmptyCase.into())
}

/// Fails with "Assertion failed" unless `condition` holds
pub fn assert_that(condition: bool) -> anyhow::Result<()> {
    if condition {
        Ok(())
    } else {
        anyhow::bail!("Assertion failed")
    }
}

/// How a single case ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The case returned `Ok`
    Passed,
    /// The case returned an error; holds its message
    Failed(String),
    /// The case returned [`EmptyCase`]
    Empty,
}

/// Counts of case outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Cases that passed
    pub passed: usize,
    /// Cases that failed
    pub failed: usize,
    /// Cases that were empty
    pub empty: usize,
}

impl Summary {
    /// True when no case failed
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} empty",
            self.passed, self.failed, self.empty
        )
    }
}

/// A named group of cases
#[derive(Debug)]
pub struct TestSuite {
    name: String,
    results: Vec<(String, Outcome)>,
}

impl TestSuite {
    /// Create an empty suite
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            results: Vec::new(),
        }
    }

    /// Suite name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `thunk` as the case `name` and record its outcome
    pub fn case<F>(&mut self, name: impl Into<String>, thunk: F) -> &Outcome
    where
        F: FnOnce() -> anyhow::Result<()>,
    {
        let name = name.into();
        let outcome = match thunk() {
            Ok(()) => {
                debug!(suite = %self.name, case = %name, "passed");
                Outcome::Passed
            }
            Err(err) if err.downcast_ref::<EmptyCase>().is_some() => {
                info!(suite = %self.name, case = %name, "empty");
                Outcome::Empty
            }
            Err(err) => {
                let message = format!("{:#}", err);
                warn!(suite = %self.name, case = %name, error = %message, "failed");
                Outcome::Failed(message)
            }
        };
        self.results.push((name, outcome));
        &self.results[self.results.len() - 1].1
    }

    /// Recorded outcomes in run order
    pub fn results(&self) -> &[(String, Outcome)] {
        &self.results
    }

    /// Tally outcomes recorded so far
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for (_, outcome) in &self.results {
            match outcome {
                Outcome::Passed => summary.passed += 1,
                Outcome::Failed(_) => summary.failed += 1,
                Outcome::Empty => summary.empty += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_classifies_outcomes() {
        let mut suite = TestSuite::new("unit");
        assert_eq!(*suite.case("ok", || Ok(())), Outcome::Passed);
        assert_eq!(*suite.case("todo", empty_case), Outcome::Empty);
        assert_eq!(
            *suite.case("bad", || assert_that(false)),
            Outcome::Failed("Assertion failed".to_string())
        );

        let summary = suite.summary();
        assert_eq!(
            summary,
            Summary {
                passed: 1,
                failed: 1,
                empty: 1
            }
        );
        assert!(!summary.is_success());
        assert_eq!(summary.to_string(), "1 passed, 1 failed, 1 empty");
    }

    #[test]
    fn test_failure_message_keeps_context() {
        let mut suite = TestSuite::new("unit");
        let outcome = suite.case("ctx", || {
            assert_that(false).context("checking totals")
        });
        assert_eq!(
            *outcome,
            Outcome::Failed("checking totals: Assertion failed".to_string())
        );
    }

    #[test]
    fn test_empty_case_with_context_is_still_empty() {
        let mut suite = TestSuite::new("unit");
        let outcome = suite.case("wrapped", || empty_case().context("later"));
        assert_eq!(*outcome, Outcome::Empty);
    }

    #[test]
    fn test_object_model_cases() {
        use lattice_core::{ClassError, Public, TypeBuilder, Value};

        let counter = TypeBuilder::new("Counter")
            .member("Count", Public::member(0))
            .build()
            .unwrap();

        let mut suite = TestSuite::new("lattice");
        suite.case("fields start at their declared value", || {
            let c = counter.construct(&[])?;
            assert_that(c.get("Count")? == Value::from(0))
        });
        suite.case("unknown members fail", || {
            let c = counter.construct(&[])?;
            c.get("Missing")?;
            Ok(())
        });

        let summary = suite.summary();
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        match &suite.results()[1].1 {
            Outcome::Failed(message) => assert_eq!(
                *message,
                ClassError::UnknownMember {
                    type_name: "Counter".to_string(),
                    member: "Missing".to_string()
                }
                .to_string()
            ),
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}
