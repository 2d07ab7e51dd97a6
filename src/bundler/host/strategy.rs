//! Ordered fallback chains.
//!
//! A chain is a fixed list of distinct strategies tried in priority order.
//! Each attempt reports a [`StrategyOutcome`]; the chain stops at the first
//! `Satisfied`. No strategy is ever retried.

use std::{fmt, future::Future};

/// Result of attempting one strategy.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StrategyOutcome {
    /// The requirement now holds.
    Satisfied,
    /// The strategy does not apply to this host.
    NotApplicable(String),
    /// The strategy applied but did not satisfy the requirement.
    Failed(String),
}

/// Every strategy in a chain came up short.
#[derive(Clone, Debug, Default)]
pub struct ChainFailure {
    /// Strategy name and its outcome, in attempt order.
    pub attempts: Vec<(String, StrategyOutcome)>,
}

impl fmt::Display for ChainFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attempts.is_empty() {
            return f.write_str("no strategies configured");
        }
        let parts: Vec<String> = self
            .attempts
            .iter()
            .map(|(name, outcome)| match outcome {
                StrategyOutcome::Satisfied => format!("{name}: satisfied"),
                StrategyOutcome::NotApplicable(reason) => {
                    format!("{name}: not applicable ({reason})")
                }
                StrategyOutcome::Failed(reason) => format!("{name}: failed ({reason})"),
            })
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Walks `chain` in order, returning the first satisfied strategy.
pub async fn drive<'a, S, F, Fut>(chain: &'a [S], mut attempt: F) -> Result<&'a S, ChainFailure>
where
    S: fmt::Display,
    F: FnMut(&'a S) -> Fut,
    Fut: Future<Output = StrategyOutcome>,
{
    let mut failure = ChainFailure::default();

    for strategy in chain {
        let outcome = attempt(strategy).await;
        match &outcome {
            StrategyOutcome::Satisfied => {
                log::info!("✓ {}", strategy);
                return Ok(strategy);
            }
            StrategyOutcome::NotApplicable(reason) => {
                log::debug!("{} not applicable: {}", strategy, reason);
            }
            StrategyOutcome::Failed(reason) => {
                log::warn!("{} failed: {}", strategy, reason);
            }
        }
        failure.attempts.push((strategy.to_string(), outcome));
    }

    Err(failure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stops_at_first_satisfied() {
        let chain = ["probe", "link", "package", "layer"];
        let mut attempted = Vec::new();

        let chosen = drive(&chain, |name| {
            attempted.push(*name);
            let outcome = match *name {
                "probe" => StrategyOutcome::Failed("import failed".into()),
                "link" => StrategyOutcome::NotApplicable("no venv".into()),
                _ => StrategyOutcome::Satisfied,
            };
            async move { outcome }
        })
        .await
        .unwrap();

        assert_eq!(*chosen, "package");
        assert_eq!(attempted, ["probe", "link", "package"]);
    }

    #[tokio::test]
    async fn reports_every_attempt_when_exhausted() {
        let chain = ["probe", "link"];
        let failure = drive(&chain, |name| {
            let outcome = if *name == "probe" {
                StrategyOutcome::Failed("no module".into())
            } else {
                StrategyOutcome::NotApplicable("no venv".into())
            };
            async move { outcome }
        })
        .await
        .unwrap_err();

        assert_eq!(failure.attempts.len(), 2);
        assert_eq!(
            failure.to_string(),
            "probe: failed (no module); link: not applicable (no venv)"
        );
    }
}
