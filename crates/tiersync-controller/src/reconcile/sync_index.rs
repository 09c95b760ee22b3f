//! Sync index snapshots and the convergence check.

use std::collections::BTreeMap;

use tiersync_core::MasterUserRecord;

/// Sync index per target cluster, for the accounts provisioned with `tier_name`.
///
/// When a cluster appears twice the later account wins.
pub fn snapshot(tier_name: &str, mur: &MasterUserRecord) -> BTreeMap<String, String> {
    mur.spec
        .user_accounts
        .iter()
        .filter(|ua| ua.tier_name() == Some(tier_name))
        .map(|ua| (ua.target_cluster.clone(), ua.sync_index.clone()))
        .collect()
}

/// First baseline entry that still holds its captured value in `current`.
pub fn first_unchanged<'a>(
    baseline: &'a BTreeMap<String, String>,
    current: &BTreeMap<String, String>,
) -> Option<(&'a str, &'a str)> {
    baseline
        .iter()
        .find(|(cluster, index)| current.get(*cluster) == Some(*index))
        .map(|(cluster, index)| (cluster.as_str(), index.as_str()))
}

/// True once every baseline cluster either moved to a new sync index or no
/// longer has an account on the tier.
pub fn converged(baseline: &BTreeMap<String, String>, current: &BTreeMap<String, String>) -> bool {
    first_unchanged(baseline, current).is_none()
}
