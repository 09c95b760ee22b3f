//! Rewrites an account record's namespace template references.

use std::collections::BTreeMap;

use tiersync_core::{
    CoreError, MasterUserRecord, NSTemplateSetClusterResources, NSTemplateSetNamespace,
    TemplateUpdateRequestSpec, compute_template_hash, namespace_type, tier_hash_label_key,
};
use tracing::info;

/// Applies the request's templates to every account provisioned with its tier.
///
/// Each matching account gets exactly one namespace per namespace type found
/// in the request (the last one wins), ordered by type, and the request's
/// cluster resources ref, or none. The new template hash is stored in the
/// tier hash label. Returns the number of accounts rewritten.
///
/// Only `mur` is changed; persisting it is up to the caller.
pub fn update_template_refs(
    request: &TemplateUpdateRequestSpec,
    mur: &mut MasterUserRecord,
) -> Result<usize, CoreError> {
    let tier_name = request.tier_name.as_str();
    let desired = desired_namespaces(&request.namespaces)?;
    let mut updated = 0;

    for account in &mut mur.spec.user_accounts {
        let Some(set) = account
            .spec
            .nstemplate_set
            .as_mut()
            .filter(|set| set.tier_name == tier_name)
        else {
            continue;
        };
        info!(tier = %tier_name, target_cluster = %account.target_cluster, "updating template refs");

        set.namespaces = desired.values().cloned().collect();
        set.cluster_resources = request
            .cluster_resources
            .as_ref()
            .map(|cr| NSTemplateSetClusterResources::new(cr.template_ref.clone()));

        let hash = compute_template_hash(set)?;
        mur.metadata
            .labels
            .insert(tier_hash_label_key(tier_name), hash);
        updated += 1;
    }

    Ok(updated)
}

fn desired_namespaces(
    namespaces: &[NSTemplateSetNamespace],
) -> Result<BTreeMap<&str, NSTemplateSetNamespace>, CoreError> {
    let mut by_type = BTreeMap::new();
    for ns in namespaces {
        by_type.insert(namespace_type(&ns.template_ref)?, ns.clone());
    }
    Ok(by_type)
}
