//! Scope resolution: which metrics run, and against which partition.

use huddle_core::TeamId;

use super::catalog::{Availability, Bundle, MetricDef};

/// Data partition an analytics request aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// A single team.
    Team(TeamId),
    /// Every team in the installation.
    Installation,
}

impl Scope {
    /// Team partition, or `None` for installation scope.
    #[must_use]
    pub const fn team(self) -> Option<TeamId> {
        match self {
            Self::Team(team) => Some(team),
            Self::Installation => None,
        }
    }
}

impl Availability {
    /// Whether a metric with this availability runs in `scope`.
    #[must_use]
    pub const fn allows(self, scope: Scope) -> bool {
        match self {
            Self::AnyScope => true,
            Self::InstallationOnly => matches!(scope, Scope::Installation),
        }
    }
}

/// A metric scheduled for evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedMetric {
    pub def: &'static MetricDef,
    pub scope: Scope,
}

/// Ordered evaluation plan for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricPlan(Vec<PlannedMetric>);

impl MetricPlan {
    pub fn iter(&self) -> std::slice::Iter<'_, PlannedMetric> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Plan the metrics of `bundle` for `scope`, preserving catalog order.
///
/// Metrics not defined for `scope` are dropped, not replaced with zero.
#[must_use]
pub fn resolve(bundle: Bundle, scope: Scope) -> MetricPlan {
    MetricPlan(
        bundle
            .metrics()
            .iter()
            .filter(|def| def.availability.allows(scope))
            .map(|def| PlannedMetric { def, scope })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planned_names(plan: &MetricPlan) -> Vec<&'static str> {
        plan.iter().map(|p| p.def.name).collect()
    }

    #[test]
    fn test_team_scope_drops_team_count() {
        let team = TeamId::new_v4();
        let plan = resolve(Bundle::Standard, Scope::Team(team));

        assert_eq!(
            planned_names(&plan),
            [
                "channel_open_count",
                "channel_private_count",
                "post_count",
                "unique_user_count"
            ]
        );
        assert!(plan.iter().all(|p| p.scope == Scope::Team(team)));
    }

    #[test]
    fn test_installation_scope_keeps_everything() {
        let plan = resolve(Bundle::Standard, Scope::Installation);
        assert_eq!(plan.len(), Bundle::Standard.metrics().len());
        assert_eq!(plan.iter().last().map(|p| p.def.name), Some("team_count"));
    }

    #[test]
    fn test_extra_counts_identical_in_both_scopes() {
        let team = resolve(Bundle::ExtraCounts, Scope::Team(TeamId::new_v4()));
        let installation = resolve(Bundle::ExtraCounts, Scope::Installation);
        assert_eq!(planned_names(&team), planned_names(&installation));
    }
}
