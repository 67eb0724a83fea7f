//! Per-pattern conflict policy overrides (SPEC_FULL.md §11)
//!
//! Grounded on the teacher's `conflict::rules::ConflictRuleSet` (glob rules
//! evaluated first-match-wins, falling back to a default strategy),
//! generalized from the teacher's `ConflictResolution` enum to this crate's
//! `ConflictPolicy`, so a module can declare e.g. "conflicts under
//! `*.generated`: server-wins" while the rest of the tree uses the default
//! policy passed to `SyncExecutor`.

use crate::sync::conflict::ConflictPolicy;
use globset::{Glob, GlobMatcher};

/// One glob pattern paired with the policy to use for matching paths.
#[derive(Debug, Clone)]
pub struct ConflictRule {
	pattern: String,
	matcher: GlobMatcher,
	policy: ConflictPolicy,
}

impl ConflictRule {
	pub fn new(pattern: &str, policy: ConflictPolicy) -> Result<Self, String> {
		let glob = Glob::new(pattern).map_err(|e| format!("invalid glob pattern {pattern:?}: {e}"))?;
		Ok(ConflictRule { pattern: pattern.to_string(), matcher: glob.compile_matcher(), policy })
	}

	pub fn matches(&self, path: &str) -> bool {
		self.matcher.is_match(path)
	}

	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	pub fn policy(&self) -> ConflictPolicy {
		self.policy
	}
}

/// Rules in priority order (first match wins), falling back to a default
/// policy when nothing matches.
#[derive(Debug, Clone)]
pub struct ConflictRuleSet {
	rules: Vec<ConflictRule>,
	default_policy: ConflictPolicy,
}

impl ConflictRuleSet {
	pub fn new(default_policy: ConflictPolicy) -> Self {
		ConflictRuleSet { rules: Vec::new(), default_policy }
	}

	pub fn add_rule(&mut self, rule: ConflictRule) {
		self.rules.push(rule);
	}

	/// Build a rule set from a default policy and a list of (glob, policy)
	/// overrides, in the order they should be tried.
	pub fn from_overrides(
		default_policy: ConflictPolicy,
		overrides: &[(String, ConflictPolicy)],
	) -> Result<Self, String> {
		let mut set = ConflictRuleSet::new(default_policy);
		for (pattern, policy) in overrides {
			set.add_rule(ConflictRule::new(pattern, *policy)?);
		}
		Ok(set)
	}

	/// The policy for `path`: the first matching rule's policy, or the
	/// default if none match.
	pub fn policy_for_path(&self, path: &str) -> ConflictPolicy {
		for rule in &self.rules {
			if rule.matches(path) {
				return rule.policy();
			}
		}
		self.default_policy
	}

	pub fn rule_count(&self) -> usize {
		self.rules.len()
	}

	pub fn default_policy(&self) -> ConflictPolicy {
		self.default_policy
	}
}

impl Default for ConflictRuleSet {
	fn default() -> Self {
		ConflictRuleSet::new(ConflictPolicy::NewerWins)
	}
}


// vim: ts=4
