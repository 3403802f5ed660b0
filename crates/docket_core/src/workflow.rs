//! Status workflow: legal transitions between entity statuses.
//!
//! The transition graph is configuration, not code: deployments describe
//! their workflow as `status → targets` rows and the graph answers
//! legality and path queries over whatever shape was configured. Legality
//! of `A → B` is membership in `A`'s outgoing edge set — reachability
//! never leaks into it. Path queries (keyboard "jump N steps" shortcuts)
//! run BFS over the same edges.

use crate::entity::Status;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// One row of a workflow configuration: a status and its legal targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRule {
    /// Source status.
    pub from: Status,
    /// Statuses reachable in one legal transition. Empty for terminal
    /// statuses.
    #[serde(default)]
    pub to: Vec<Status>,
}

/// Serializable description of a deployment's workflow.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Transition rules, one per status.
    pub transitions: Vec<TransitionRule>,
}

impl WorkflowConfig {
    /// The standard legal-practice workflow.
    ///
    /// `new → accepted → investigation`, which branches into preparation
    /// and negotiation tracks that converge on `trial` and `completed`;
    /// `completed` is terminal.
    #[must_use]
    pub fn legal_practice() -> Self {
        fn rule(from: &str, to: &[&str]) -> TransitionRule {
            TransitionRule {
                from: Status::from(from),
                to: to.iter().copied().map(Status::from).collect(),
            }
        }

        Self {
            transitions: vec![
                rule("new", &["accepted"]),
                rule("accepted", &["investigation"]),
                rule("investigation", &["preparation", "negotiation"]),
                rule("preparation", &["negotiation", "trial"]),
                rule("negotiation", &["trial", "completed"]),
                rule("trial", &["completed"]),
                rule("completed", &[]),
            ],
        }
    }
}

/// Directed graph of legal status transitions.
#[derive(Debug, Clone)]
pub struct TransitionGraph {
    edges: HashMap<Status, BTreeSet<Status>>,
}

impl TransitionGraph {
    /// Builds a graph from configuration.
    ///
    /// Every status named as a target must also appear as a source row
    /// (possibly with no targets), so that `legal_targets` is total over
    /// the configured status set.
    pub fn from_config(config: &WorkflowConfig) -> CoreResult<Self> {
        let mut edges: HashMap<Status, BTreeSet<Status>> = HashMap::new();
        for rule in &config.transitions {
            edges
                .entry(rule.from.clone())
                .or_default()
                .extend(rule.to.iter().cloned());
        }
        for rule in &config.transitions {
            for target in &rule.to {
                if !edges.contains_key(target) {
                    return Err(CoreError::unknown_status(target.as_str()));
                }
            }
        }
        Ok(Self { edges })
    }

    /// Builds the standard legal-practice graph.
    #[must_use]
    pub fn legal_practice() -> Self {
        Self::from_config(&WorkflowConfig::legal_practice())
            .unwrap_or_else(|_| unreachable!("built-in workflow config is closed over its statuses"))
    }

    /// Returns true if the status is part of the configured workflow.
    #[must_use]
    pub fn contains(&self, status: &Status) -> bool {
        self.edges.contains_key(status)
    }

    /// Returns all configured statuses.
    #[must_use]
    pub fn statuses(&self) -> BTreeSet<Status> {
        self.edges.keys().cloned().collect()
    }

    /// Returns true if `from → to` is a legal transition.
    ///
    /// Membership in the outgoing edge set, never reachability: a status
    /// two hops away is not a legal direct transition.
    #[must_use]
    pub fn is_legal(&self, from: &Status, to: &Status) -> bool {
        self.edges
            .get(from)
            .is_some_and(|targets| targets.contains(to))
    }

    /// Returns the statuses legally reachable in one transition.
    #[must_use]
    pub fn legal_targets(&self, from: &Status) -> BTreeSet<Status> {
        self.edges.get(from).cloned().unwrap_or_default()
    }

    /// Returns true if the status has no outgoing transitions.
    #[must_use]
    pub fn is_terminal(&self, status: &Status) -> bool {
        self.edges
            .get(status)
            .is_some_and(|targets| targets.is_empty())
    }

    /// Shortest legal transition sequence from `from` to `to`, inclusive
    /// of both endpoints.
    ///
    /// BFS over the transition edges. Returns `None` when `to` is
    /// unreachable; the graph is not guaranteed connected, and terminal
    /// statuses have no outgoing edges by design. `from == to` yields a
    /// single-element path.
    #[must_use]
    pub fn shortest_path(&self, from: &Status, to: &Status) -> Option<Vec<Status>> {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }
        if from == to {
            return Some(vec![from.clone()]);
        }

        let mut predecessor: HashMap<Status, Status> = HashMap::new();
        let mut queue = VecDeque::from([from.clone()]);

        while let Some(current) = queue.pop_front() {
            for next in self.legal_targets(&current) {
                if next == *from || predecessor.contains_key(&next) {
                    continue;
                }
                predecessor.insert(next.clone(), current.clone());
                if next == *to {
                    let mut path = vec![next];
                    while let Some(prev) = predecessor.get(path.last().unwrap_or(to)) {
                        path.push(prev.clone());
                        if prev == from {
                            break;
                        }
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }
        None
    }
}

impl Default for TransitionGraph {
    fn default() -> Self {
        Self::legal_practice()
    }
}
