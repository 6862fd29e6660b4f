//! Network blocking rules
//!
//! Translates the blocked-domain list into one rule group and installs it
//! on the rule platform. The group owns a reserved block of rule ids; an
//! install removes whatever the block currently holds and adds the new
//! rules in a single platform update, so the group is replaced, never
//! merged.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::error::{FocusMindError, Result};

/// Request kinds a rule can be scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// Top-level page navigation
    MainFrame,
    SubFrame,
    Stylesheet,
    Script,
    Image,
    Xmlhttprequest,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleActionType {
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAction {
    #[serde(rename = "type")]
    pub kind: RuleActionType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    /// `||domain^`: the domain and all of its subdomains
    pub url_filter: String,
    pub resource_types: Vec<ResourceType>,
}

/// A single dynamic network rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRule {
    pub id: u32,
    pub priority: u32,
    pub action: RuleAction,
    pub condition: RuleCondition,
}

impl BlockRule {
    /// Block top-level navigations to `domain` and its subdomains
    pub fn for_domain(id: u32, domain: &str) -> Self {
        Self {
            id,
            priority: 1,
            action: RuleAction {
                kind: RuleActionType::Block,
            },
            condition: RuleCondition {
                url_filter: format!("||{}^", domain.trim().to_lowercase()),
                resource_types: vec![ResourceType::MainFrame],
            },
        }
    }

    /// The domain anchored by this rule's filter, if it is a domain filter
    pub fn domain(&self) -> Option<&str> {
        self.condition
            .url_filter
            .strip_prefix("||")
            .and_then(|rest| rest.strip_suffix('^'))
    }

    /// Whether a request for `url` of kind `resource_type` hits this rule
    pub fn matches(&self, url: &str, resource_type: ResourceType) -> bool {
        if !self.condition.resource_types.contains(&resource_type) {
            return false;
        }
        let (Some(domain), Some(host)) = (self.domain(), url_host(url)) else {
            return false;
        };
        host == domain || host.ends_with(&format!(".{}", domain))
    }
}

/// Extract the lowercased host of an absolute URL
pub fn url_host(url: &str) -> Option<String> {
    let (_, rest) = url.trim().split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    let host = host_port.split(':').next().unwrap_or_default();
    let host = host.trim_end_matches('.');
    if host.is_empty() {
        None
    } else {
        Some(host.to_lowercase())
    }
}

/// One atomic change to the platform's dynamic rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleUpdate {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove_rule_ids: Vec<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add_rules: Vec<BlockRule>,
}

/// The network-level rule platform
#[async_trait]
pub trait RulePlatform: Send + Sync {
    /// Remove `remove_rule_ids` and add `add_rules` as one update.
    /// Either the whole update lands or none of it does.
    async fn update_dynamic_rules(&self, update: RuleUpdate) -> Result<()>;

    /// All currently installed dynamic rules
    async fn dynamic_rules(&self) -> Result<Vec<BlockRule>>;

    /// First installed rule matching the request, by priority then id
    async fn matching_rule(&self, url: &str, resource_type: ResourceType) -> Result<Option<BlockRule>> {
        let mut rules = self.dynamic_rules().await?;
        rules.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));
        Ok(rules.into_iter().find(|rule| rule.matches(url, resource_type)))
    }
}

/// The focus blocklist as a replaceable group of rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleGroup {
    rules: Vec<BlockRule>,
}

impl RuleGroup {
    pub const ID: &'static str = "focus-blocklist";
    pub const FIRST_RULE_ID: u32 = 1;
    /// Size of the reserved id block (the platform's dynamic-rule ceiling)
    pub const CAPACITY: u32 = 5000;

    /// Whether `rule_id` belongs to this group's id block
    pub fn owns(rule_id: u32) -> bool {
        (Self::FIRST_RULE_ID..Self::FIRST_RULE_ID + Self::CAPACITY).contains(&rule_id)
    }

    /// One main-frame block rule per distinct domain
    pub fn from_domains(domains: &[String]) -> Result<Self> {
        let mut seen = HashSet::new();
        let distinct: Vec<&String> = domains
            .iter()
            .filter(|d| seen.insert(d.trim().to_lowercase()))
            .collect();

        if distinct.len() > Self::CAPACITY as usize {
            return Err(FocusMindError::RuleApply(format!(
                "{} sites exceed the limit of {} blocking rules",
                distinct.len(),
                Self::CAPACITY
            )));
        }

        let rules = distinct
            .into_iter()
            .zip(Self::FIRST_RULE_ID..)
            .map(|(domain, id)| BlockRule::for_domain(id, domain))
            .collect();

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[BlockRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Applies and clears the focus rule group
#[derive(Clone)]
pub struct RuleEngine {
    platform: Arc<dyn RulePlatform>,
}

impl RuleEngine {
    pub fn new(platform: Arc<dyn RulePlatform>) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> &Arc<dyn RulePlatform> {
        &self.platform
    }

    /// Ids of the group's rules that are installed right now
    async fn installed_ids(&self) -> Result<Vec<u32>> {
        Ok(self
            .platform
            .dynamic_rules()
            .await?
            .into_iter()
            .map(|rule| rule.id)
            .filter(|id| RuleGroup::owns(*id))
            .collect())
    }

    /// Install blocking for exactly `domains`.
    ///
    /// With no domains nothing is installed: a previous group is removed,
    /// and when there is none the platform is not called at all.
    pub async fn apply(&self, domains: &[String]) -> Result<()> {
        let group = RuleGroup::from_domains(domains)?;
        let remove_rule_ids = self.installed_ids().await?;

        if group.is_empty() {
            debug!("No sites to block");
            if remove_rule_ids.is_empty() {
                return Ok(());
            }
        }

        self.platform
            .update_dynamic_rules(RuleUpdate {
                remove_rule_ids,
                add_rules: group.rules,
            })
            .await?;

        info!(group = RuleGroup::ID, sites = domains.len(), "Blocking enabled");
        Ok(())
    }

    /// Remove the group. Nothing installed is not an error.
    pub async fn clear(&self) -> Result<()> {
        let remove_rule_ids = self.installed_ids().await?;
        if remove_rule_ids.is_empty() {
            debug!("Blocking already disabled");
            return Ok(());
        }

        self.platform
            .update_dynamic_rules(RuleUpdate {
                remove_rule_ids,
                add_rules: Vec::new(),
            })
            .await?;

        info!(group = RuleGroup::ID, "Blocking disabled");
        Ok(())
    }

    /// Domains the installed group currently blocks, in rule-id order
    pub async fn installed_domains(&self) -> Result<Vec<String>> {
        let mut rules: Vec<BlockRule> = self
            .platform
            .dynamic_rules()
            .await?
            .into_iter()
            .filter(|rule| RuleGroup::owns(rule.id))
            .collect();
        rules.sort_by_key(|rule| rule.id);
        Ok(rules
            .iter()
            .filter_map(|rule| rule.domain().map(str::to_string))
            .collect())
    }
}

/// Process-local rule platform with all-or-nothing updates
#[derive(Default)]
pub struct InMemoryRulePlatform {
    rules: Mutex<BTreeMap<u32, BlockRule>>,
    updates: AtomicUsize,
}

impl InMemoryRulePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of updates that were accepted
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<u32, BlockRule>>> {
        self.rules
            .lock()
            .map_err(|_| FocusMindError::RuleApply("rule table lock poisoned".to_string()))
    }
}

#[async_trait]
impl RulePlatform for InMemoryRulePlatform {
    async fn update_dynamic_rules(&self, update: RuleUpdate) -> Result<()> {
        let mut rules = self.lock()?;

        let mut next = rules.clone();
        for id in &update.remove_rule_ids {
            next.remove(id);
        }
        for rule in update.add_rules {
            if rule.condition.url_filter.is_empty() || rule.condition.resource_types.is_empty() {
                return Err(FocusMindError::RuleApply(format!("Rule with id {} is incomplete", rule.id)));
            }
            if next.contains_key(&rule.id) {
                return Err(FocusMindError::RuleApply(format!("Rule with id {} already exists", rule.id)));
            }
            next.insert(rule.id, rule);
        }

        *rules = next;
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn dynamic_rules(&self) -> Result<Vec<BlockRule>> {
        Ok(self.lock()?.values().cloned().collect())
    }
}
