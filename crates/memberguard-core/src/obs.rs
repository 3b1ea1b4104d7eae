//! Structured log events for policy construction.
//!
//! Events use a stable `event` field so log pipelines can filter on them:
//! `policy.selector_ignored` (debug), `policy.built` (info) and
//! `policy.rejected` (warn).

use tracing::{debug, info, warn};

use crate::error::SyntaxError;
use crate::policy::BuildReport;
use crate::selector::ResolutionFailure;

/// Emit event: a whitelist entry was dropped because it did not resolve.
pub fn emit_selector_ignored(failure: &ResolutionFailure) {
    debug!(
        event = "policy.selector_ignored",
        entry = %failure.entry,
        upper_bound = failure.upper_bound.as_ref().map(|t| t.name()).unwrap_or("-"),
        cause = %failure.cause,
        "member selector ignored due to error"
    );
}

/// Emit event: registries populated and the policy is ready to serve.
pub fn emit_policy_built(report: &BuildReport) {
    info!(
        event = "policy.built",
        methods = report.methods,
        constructors = report.constructors,
        fields = report.fields,
        ignored = report.ignored.len(),
    );
}

/// Emit event: a whitelist batch was refused because of a malformed entry.
pub fn emit_whitelist_rejected(error: &SyntaxError) {
    warn!(
        event = "policy.rejected",
        entry = %error.entry,
        reason = %error.reason,
    );
}
