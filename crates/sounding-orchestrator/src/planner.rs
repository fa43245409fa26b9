//! Query planning between waves
//!
//! A [`Planner`] turns the session agenda and the latest gaps into the next
//! wave's queries. The session then fits the plan to the depth policy's probe
//! bounds with [`fit_to_bounds`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sounding_domain::{DepthPolicy, Gap, ProviderId};
use std::collections::HashSet;

/// A keyed research question on the session agenda
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Stable key, unique within a session
    pub key: String,
    /// Query text sent to providers
    pub query: String,
}

impl Topic {
    /// Create a topic
    pub fn new(key: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            query: query.into(),
        }
    }
}

/// One query to dispatch in the next wave
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlannedQuery {
    /// Agenda topic key
    pub topic: String,
    /// Query text
    pub query: String,
    /// Target provider
    pub provider: ProviderId,
}

impl PlannedQuery {
    /// Create a planned query
    pub fn new(topic: impl Into<String>, query: impl Into<String>, provider: ProviderId) -> Self {
        Self {
            topic: topic.into(),
            query: query.into(),
            provider,
        }
    }
}

/// Everything a planner may look at
#[derive(Debug)]
pub struct PlanningContext<'a> {
    /// Ordinal of the wave being planned
    pub wave: u32,
    /// Probe budget
    pub policy: &'a DepthPolicy,
    /// Session agenda, in insertion order
    pub agenda: &'a [Topic],
    /// Gaps from the last checkpoint (empty before wave 1)
    pub gaps: &'a [Gap],
    /// Providers still enabled, in registry order
    pub providers: &'a [ProviderId],
    /// (topic, provider) pairs already dispatched this session
    pub asked: &'a HashSet<(String, ProviderId)>,
}

impl PlanningContext<'_> {
    /// Whether a provider has already been asked about a topic
    pub fn was_asked(&self, topic: &str, provider: &ProviderId) -> bool {
        self.asked.contains(&(topic.to_string(), provider.clone()))
    }

    /// Look up an agenda topic by key
    pub fn topic(&self, key: &str) -> Option<&Topic> {
        self.agenda.iter().find(|t| t.key == key)
    }
}

/// Produces the queries for the next wave
///
/// An empty plan means there is nothing left worth asking; the session then
/// ends as exhausted.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Plan the next wave
    async fn plan(&self, context: &PlanningContext<'_>) -> Vec<PlannedQuery>;
}

/// Default planner
///
/// Wave 1 covers every agenda topic. Later waves target open gap topics by
/// priority (contradicted, then unanswered, then low-confidence), breaking
/// ties by agenda order. Each target gets providers that have not yet been
/// asked about it, dealt round-robin across targets until the wave's probe
/// ceiling is reached.
#[derive(Debug, Clone, Copy, Default)]
pub struct AgendaPlanner;

impl AgendaPlanner {
    /// Create the default planner
    pub fn new() -> Self {
        Self
    }

    fn targets<'a>(&self, context: &PlanningContext<'a>) -> Vec<&'a Topic> {
        let agenda: &'a [Topic] = context.agenda;
        if context.wave <= 1 || context.gaps.is_empty() {
            return agenda.iter().collect();
        }

        let mut open: Vec<(usize, &Gap)> = context
            .gaps
            .iter()
            .filter(|g| g.is_open())
            .filter_map(|g| {
                let position = agenda.iter().position(|t| t.key == g.topic)?;
                Some((position, g))
            })
            .collect();
        open.sort_by_key(|(position, gap)| (gap.reason, *position));

        let mut targets: Vec<&'a Topic> = Vec::new();
        for (position, _) in open {
            let topic = &agenda[position];
            if !targets.iter().any(|t| t.key == topic.key) {
                targets.push(topic);
            }
        }
        targets
    }
}

#[async_trait]
impl Planner for AgendaPlanner {
    async fn plan(&self, context: &PlanningContext<'_>) -> Vec<PlannedQuery> {
        let ceiling = context.policy.max_probes_per_wave;
        let queues: Vec<(&Topic, Vec<&ProviderId>)> = self
            .targets(context)
            .into_iter()
            .map(|topic| {
                let fresh = context
                    .providers
                    .iter()
                    .filter(|p| !context.was_asked(&topic.key, p))
                    .collect();
                (topic, fresh)
            })
            .collect();

        let mut plan = Vec::new();
        let deepest = queues.iter().map(|(_, q)| q.len()).max().unwrap_or(0);
        'rounds: for round in 0..deepest {
            for (topic, providers) in &queues {
                if plan.len() == ceiling {
                    break 'rounds;
                }
                if let Some(provider) = providers.get(round) {
                    plan.push(PlannedQuery::new(
                        topic.key.clone(),
                        topic.query.clone(),
                        (*provider).clone(),
                    ));
                }
            }
        }
        plan
    }
}

/// Fit a plan to the policy's probe bounds
///
/// Plans above the ceiling are truncated; non-empty plans below the floor are
/// cycled until they reach it. An empty plan stays empty.
pub fn fit_to_bounds(mut plan: Vec<PlannedQuery>, policy: &DepthPolicy) -> Vec<PlannedQuery> {
    plan.truncate(policy.max_probes_per_wave);
    if plan.is_empty() {
        return plan;
    }
    let original = plan.len();
    let mut next = 0;
    while plan.len() < policy.min_probes_per_wave {
        plan.push(plan[next % original].clone());
        next += 1;
    }
    plan
}
