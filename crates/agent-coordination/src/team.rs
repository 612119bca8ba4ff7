//! Ephemeral teams
//!
//! A team exists for the duration of one multi-agent execution. Records
//! are only ever removed through `destroy_team`; [`TeamGuard`] makes sure
//! that happens however the strategy ends.

use agent_core::TeamSettings;
use agent_runtime::MergeStrategy;
use agent_telemetry::{OrchestrationEvent, TelemetryCollector};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::merge::{self, Aggregator, DefaultAggregator};
use crate::{CoordinationError, Result};

/// One enrolled member
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub agent_id: String,
    pub metadata: Value,
    /// Ids of tasks assigned so far
    pub assigned_tasks: Vec<String>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub team_id: String,
    pub members: Vec<TeamMember>,
    pub max_agents: usize,
    pub created_at: DateTime<Utc>,
}

impl Team {
    pub fn member(&self, agent_id: &str) -> Option<&TeamMember> {
        self.members.iter().find(|m| m.agent_id == agent_id)
    }

    pub fn member_ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.agent_id.clone()).collect()
    }
}

/// Creates, tracks and tears down teams
pub struct TeamCoordinator {
    settings: TeamSettings,
    teams: DashMap<String, Team>,
    aggregator: Arc<dyn Aggregator>,
    telemetry: TelemetryCollector,
}

impl TeamCoordinator {
    pub fn new(settings: TeamSettings, telemetry: TelemetryCollector) -> Self {
        Self {
            settings,
            teams: DashMap::new(),
            aggregator: Arc::new(DefaultAggregator),
            telemetry,
        }
    }

    /// Replace the reducer used by the `aggregate` merge
    pub fn with_aggregator(mut self, aggregator: Arc<dyn Aggregator>) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn settings(&self) -> &TeamSettings {
        &self.settings
    }

    /// Create an empty team, replacing any record with the same id
    pub fn create_team(&self, team_id: impl Into<String>, max_agents: usize) -> Team {
        let team = Team {
            team_id: team_id.into(),
            members: Vec::new(),
            max_agents,
            created_at: Utc::now(),
        };

        if self.teams.insert(team.team_id.clone(), team.clone()).is_some() {
            tracing::warn!("Team {} already existed; replaced", team.team_id);
        }
        tracing::info!("Created team {} (max {} agents)", team.team_id, max_agents);
        self.telemetry
            .emit(OrchestrationEvent::team_created(team.team_id.clone(), max_agents));
        team
    }

    /// Enroll an agent; joining again only refreshes its metadata
    pub fn join_team(&self, team_id: &str, agent_id: &str, metadata: Value) -> Result<()> {
        let mut team = self
            .teams
            .get_mut(team_id)
            .ok_or_else(|| CoordinationError::TeamNotFound(team_id.to_string()))?;

        if let Some(member) = team.members.iter_mut().find(|m| m.agent_id == agent_id) {
            member.metadata = metadata;
            return Ok(());
        }
        if team.members.len() >= team.max_agents {
            return Err(CoordinationError::TeamFull {
                team_id: team_id.to_string(),
                max_agents: team.max_agents,
            });
        }

        team.members.push(TeamMember {
            agent_id: agent_id.to_string(),
            metadata,
            assigned_tasks: Vec::new(),
            joined_at: Utc::now(),
        });
        tracing::debug!("Agent {} joined team {}", agent_id, team_id);
        Ok(())
    }

    /// Note that `task_id` is going to `agent_id`; nothing is executed
    pub fn assign_task(&self, team_id: &str, agent_id: &str, task_id: &str) -> Result<()> {
        let mut team = self
            .teams
            .get_mut(team_id)
            .ok_or_else(|| CoordinationError::TeamNotFound(team_id.to_string()))?;

        let member = team
            .members
            .iter_mut()
            .find(|m| m.agent_id == agent_id)
            .ok_or_else(|| CoordinationError::AgentNotFound(agent_id.to_string()))?;
        member.assigned_tasks.push(task_id.to_string());
        Ok(())
    }

    /// Merge results produced by a team
    pub fn merge_results(
        &self,
        team_id: &str,
        results: Vec<Value>,
        strategy: MergeStrategy,
    ) -> Result<Value> {
        if !self.teams.contains_key(team_id) {
            return Err(CoordinationError::TeamNotFound(team_id.to_string()));
        }
        tracing::debug!("Merging {} result(s) for team {} with {}", results.len(), team_id, strategy);
        Ok(merge::merge(results, strategy, self.aggregator.as_ref()))
    }

    /// Remove a team record; returns whether one existed
    pub fn destroy_team(&self, team_id: &str) -> bool {
        match self.teams.remove(team_id) {
            Some(_) => {
                tracing::info!("Destroyed team {}", team_id);
                self.telemetry
                    .emit(OrchestrationEvent::team_destroyed(team_id));
                true
            }
            None => false,
        }
    }

    pub fn get_team(&self, team_id: &str) -> Option<Team> {
        self.teams.get(team_id).map(|team| team.clone())
    }

    pub fn active_teams(&self) -> Vec<String> {
        self.teams.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Create a team that is destroyed when the guard drops
    pub fn scoped_team(&self, team_id: impl Into<String>, max_agents: usize) -> TeamGuard<'_> {
        let team = self.create_team(team_id, max_agents);
        TeamGuard {
            coordinator: self,
            team_id: team.team_id,
        }
    }
}

impl std::fmt::Debug for TeamCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeamCoordinator")
            .field("settings", &self.settings)
            .field("active_teams", &self.teams.len())
            .finish()
    }
}

/// Destroys its team on drop, including when the owning future is cancelled
pub struct TeamGuard<'a> {
    coordinator: &'a TeamCoordinator,
    team_id: String,
}

impl TeamGuard<'_> {
    pub fn team_id(&self) -> &str {
        &self.team_id
    }
}

impl Drop for TeamGuard<'_> {
    fn drop(&mut self) {
        self.coordinator.destroy_team(&self.team_id);
    }
}
