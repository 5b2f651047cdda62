//! Workflow models

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name given to workflows created without one
pub const DEFAULT_WORKFLOW_NAME: &str = "Untitled Workflow";

/// Trigger given to workflows created without one
pub const DEFAULT_TRIGGER: &str = "manual";

/// Attribution for records created without an author
pub const DEFAULT_CREATED_BY: &str = "system";

/// An automation rule: trigger, conditions and ordered steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    /// Unique workflow ID, immutable once assigned
    pub id: String,

    /// Workflow name
    pub name: String,

    /// Workflow description
    #[serde(default)]
    pub description: String,

    /// Workflow status
    pub status: WorkflowStatus,

    /// Event tag that starts the workflow (e.g. "appointment_scheduled")
    #[serde(default = "default_trigger")]
    pub trigger: String,

    /// Ordered steps; older records call these "actions"
    #[serde(default, alias = "actions")]
    pub steps: Vec<WorkflowStep>,

    /// Predicates checked against the triggering event
    #[serde(default)]
    pub conditions: Vec<WorkflowCondition>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Updated timestamp, refreshed by every mutation
    pub updated_at: DateTime<Utc>,

    /// Last time the workflow fired
    #[serde(default, alias = "lastRunAt", skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,

    /// Author attribution
    #[serde(default = "default_created_by")]
    pub created_by: String,
}

fn default_trigger() -> String {
    DEFAULT_TRIGGER.to_string()
}

fn default_created_by() -> String {
    DEFAULT_CREATED_BY.to_string()
}

impl Workflow {
    /// Whether a trigger engine should act on this workflow
    pub fn is_runnable(&self) -> bool {
        self.status == WorkflowStatus::Active
    }

    /// True when every condition holds for `context` (vacuously true with no conditions)
    pub fn conditions_met(&self, context: &Value) -> bool {
        self.conditions.iter().all(|c| c.evaluate(context))
    }

    /// Sum of all step delays in days
    pub fn total_delay_days(&self) -> u64 {
        self.steps
            .iter()
            .filter_map(|s| s.delay_days)
            .map(u64::from)
            .sum()
    }

    /// Give every step without an id one derived from the workflow id.
    /// Returns how many steps were assigned.
    pub fn assign_step_ids(&mut self) -> usize {
        let mut taken: HashSet<String> = self
            .steps
            .iter()
            .filter(|s| !s.id.trim().is_empty())
            .map(|s| s.id.clone())
            .collect();

        let mut next = 1;
        let mut assigned = 0;
        for step in self.steps.iter_mut().filter(|s| s.id.trim().is_empty()) {
            loop {
                let candidate = format!("{}-s{}", self.id, next);
                next += 1;
                if taken.insert(candidate.clone()) {
                    step.id = candidate;
                    break;
                }
            }
            assigned += 1;
        }
        assigned
    }
}

/// Workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Draft,
    Active,
    Paused,
    Inactive,
}

impl WorkflowStatus {
    pub const ALL: [WorkflowStatus; 4] = [
        WorkflowStatus::Draft,
        WorkflowStatus::Active,
        WorkflowStatus::Paused,
        WorkflowStatus::Inactive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Draft => "draft",
            WorkflowStatus::Active => "active",
            WorkflowStatus::Paused => "paused",
            WorkflowStatus::Inactive => "inactive",
        }
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// Setting the current status again is always allowed.
    pub fn can_transition_to(&self, next: WorkflowStatus) -> bool {
        use WorkflowStatus::*;

        if *self == next {
            return true;
        }
        matches!(
            (*self, next),
            (Draft, Active)
                | (Active, Paused)
                | (Paused, Active)
                | (Active, Inactive)
                | (Paused, Inactive)
                | (Inactive, Active)
        )
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for WorkflowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(WorkflowStatus::Draft),
            "active" => Ok(WorkflowStatus::Active),
            "paused" => Ok(WorkflowStatus::Paused),
            "inactive" => Ok(WorkflowStatus::Inactive),
            _ => Err(format!("Invalid workflow status: {}", s)),
        }
    }
}

/// One unit of work within a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    /// Step ID, unique within its workflow. Older records omit it.
    #[serde(default)]
    pub id: String,

    /// Step type
    #[serde(rename = "type")]
    pub step_type: StepType,

    /// Type-specific parameters (template, recipient, task title...)
    #[serde(default)]
    pub config: Map<String, Value>,

    /// Days to wait after the previous step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_days: Option<u32>,
}

impl WorkflowStep {
    pub fn new(id: impl Into<String>, step_type: StepType) -> Self {
        Self {
            id: id.into(),
            step_type,
            config: Map::new(),
            delay_days: None,
        }
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    pub fn with_delay_days(mut self, days: u32) -> Self {
        self.delay_days = Some(days);
        self
    }
}

/// Step type. Unrecognized types are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepType {
    Email,
    Sms,
    Wait,
    Task,
    Condition,
    Other(String),
}

impl StepType {
    pub fn as_str(&self) -> &str {
        match self {
            StepType::Email => "email",
            StepType::Sms => "sms",
            StepType::Wait => "wait",
            StepType::Task => "task",
            StepType::Condition => "condition",
            StepType::Other(other) => other,
        }
    }
}

impl From<String> for StepType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "email" => StepType::Email,
            "sms" => StepType::Sms,
            "wait" => StepType::Wait,
            "task" => StepType::Task,
            "condition" => StepType::Condition,
            _ => StepType::Other(s),
        }
    }
}

impl From<StepType> for String {
    fn from(t: StepType) -> Self {
        match t {
            StepType::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

/// A `{field, operator, value}` predicate over the triggering event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowCondition {
    /// Dotted path into the event context (e.g. "patient.age")
    pub field: String,

    pub operator: ConditionOperator,

    #[serde(default)]
    pub value: Value,
}

/// Comparison operator for conditions.
///
/// Operators this crate does not know are kept verbatim and never match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
    Exists,
    Other(String),
}

impl ConditionOperator {
    pub fn as_str(&self) -> &str {
        match self {
            ConditionOperator::Equals => "equals",
            ConditionOperator::NotEquals => "not_equals",
            ConditionOperator::Contains => "contains",
            ConditionOperator::GreaterThan => "greater_than",
            ConditionOperator::LessThan => "less_than",
            ConditionOperator::Exists => "exists",
            ConditionOperator::Other(other) => other,
        }
    }
}

impl From<String> for ConditionOperator {
    fn from(s: String) -> Self {
        match s.as_str() {
            "equals" => ConditionOperator::Equals,
            "not_equals" => ConditionOperator::NotEquals,
            "contains" => ConditionOperator::Contains,
            "greater_than" => ConditionOperator::GreaterThan,
            "less_than" => ConditionOperator::LessThan,
            "exists" => ConditionOperator::Exists,
            _ => ConditionOperator::Other(s),
        }
    }
}

impl From<ConditionOperator> for String {
    fn from(op: ConditionOperator) -> Self {
        match op {
            ConditionOperator::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl WorkflowCondition {
    pub fn new(field: impl Into<String>, operator: ConditionOperator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Evaluate against an event context. Missing fields only satisfy `not_equals`;
    /// unknown operators never hold.
    pub fn evaluate(&self, context: &Value) -> bool {
        let actual = lookup(context, &self.field).filter(|v| !v.is_null());

        match (&self.operator, actual) {
            (ConditionOperator::Other(_), _) => false,
            (ConditionOperator::Exists, actual) => actual.is_some(),
            (ConditionOperator::NotEquals, None) => true,
            (_, None) => false,
            (ConditionOperator::Equals, Some(actual)) => loosely_equal(actual, &self.value),
            (ConditionOperator::NotEquals, Some(actual)) => !loosely_equal(actual, &self.value),
            (ConditionOperator::Contains, Some(actual)) => contains(actual, &self.value),
            (ConditionOperator::GreaterThan, Some(actual)) => {
                compare(actual, &self.value) == Some(std::cmp::Ordering::Greater)
            }
            (ConditionOperator::LessThan, Some(actual)) => {
                compare(actual, &self.value) == Some(std::cmp::Ordering::Less)
            }
        }
    }
}

fn lookup<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(context, |value, segment| match value {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    match (actual, expected) {
        (Value::String(a), Value::String(b)) => a.eq_ignore_ascii_case(b),
        (Value::Number(_), _) | (_, Value::Number(_)) => {
            matches!((as_number(actual), as_number(expected)), (Some(a), Some(b)) if a == b)
        }
        _ => false,
    }
}

fn contains(actual: &Value, needle: &Value) -> bool {
    match (actual, needle) {
        (Value::String(haystack), Value::String(needle)) => haystack
            .to_lowercase()
            .contains(&needle.to_lowercase()),
        (Value::Array(items), needle) => items.iter().any(|item| loosely_equal(item, needle)),
        (Value::Object(map), Value::String(key)) => map.contains_key(key),
        _ => false,
    }
}

fn compare(actual: &Value, expected: &Value) -> Option<std::cmp::Ordering> {
    if let (Some(a), Some(b)) = (as_number(actual), as_number(expected)) {
        return a.partial_cmp(&b);
    }
    // ISO-8601 dates order lexicographically
    match (actual, expected) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Fields accepted when creating a workflow; anything missing is defaulted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewWorkflow {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<WorkflowStatus>,
    pub trigger: Option<String>,
    #[serde(alias = "actions")]
    pub steps: Option<Vec<WorkflowStep>>,
    pub conditions: Option<Vec<WorkflowCondition>>,
    pub created_by: Option<String>,
}

impl NewWorkflow {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Build the record, filling defaults for every missing field
    pub fn into_workflow(self, id: String, now: DateTime<Utc>) -> Workflow {
        let mut workflow = Workflow {
            id,
            name: self
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_WORKFLOW_NAME.to_string()),
            description: self.description.unwrap_or_default(),
            status: self.status.unwrap_or(WorkflowStatus::Draft),
            trigger: self
                .trigger
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(default_trigger),
            steps: self.steps.unwrap_or_default(),
            conditions: self.conditions.unwrap_or_default(),
            created_at: now,
            updated_at: now,
            last_run: None,
            created_by: self.created_by.unwrap_or_else(default_created_by),
        };
        workflow.assign_step_ids();
        workflow
    }
}

/// The mutable subset of a workflow. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkflowPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<WorkflowStatus>,
    pub trigger: Option<String>,
    #[serde(alias = "actions")]
    pub steps: Option<Vec<WorkflowStep>>,
    pub conditions: Option<Vec<WorkflowCondition>>,
    #[serde(alias = "lastRunAt")]
    pub last_run: Option<DateTime<Utc>>,
}

impl WorkflowPatch {
    pub fn status(status: WorkflowStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the patch over `workflow`. Timestamps are the caller's concern.
    pub fn apply_to(&self, workflow: &mut Workflow) {
        if let Some(name) = &self.name {
            workflow.name = name.clone();
        }
        if let Some(description) = &self.description {
            workflow.description = description.clone();
        }
        if let Some(status) = self.status {
            workflow.status = status;
        }
        if let Some(trigger) = &self.trigger {
            workflow.trigger = trigger.clone();
        }
        if let Some(steps) = &self.steps {
            workflow.steps = steps.clone();
            workflow.assign_step_ids();
        }
        if let Some(conditions) = &self.conditions {
            workflow.conditions = conditions.clone();
        }
        if let Some(last_run) = self.last_run {
            workflow.last_run = Some(last_run);
        }
    }
}
