//! Differ - Compare desired state with current state to generate a Plan
//!
//! Compares the "desired state" declared in the manifest with the "current
//! state" fetched from the Provider, and generates a list of required
//! Effects (Plan).

use std::collections::{HashMap, HashSet};

use crate::effect::Effect;
use crate::plan::Plan;
use crate::resource::{Resource, ResourceId, State, Value};
use crate::schema::ResourceSchema;

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
    /// Data source -> needs a read
    Read(Resource),
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        matches!(self, Diff::Create(_) | Diff::Update { .. })
    }
}

/// Compare desired state with current state to compute a Diff
///
/// Attributes named in `computed` (server-assigned) never count as drift.
pub fn diff(desired: &Resource, current: &State, computed: &HashSet<String>) -> Diff {
    if desired.is_data_source() {
        return Diff::Read(desired.clone());
    }

    if !current.exists {
        return Diff::Create(desired.clone());
    }

    let changed = find_changed_attributes(&desired.attributes, &current.attributes, computed);

    if changed.is_empty() {
        Diff::NoChange(desired.id.clone())
    } else {
        Diff::Update {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    }
}

/// Find changed attributes between desired and current state
fn find_changed_attributes(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
    computed: &HashSet<String>,
) -> Vec<String> {
    let mut changed = Vec::new();

    for (key, desired_value) in desired {
        // Skip internal attributes (starting with _) and computed ones
        if key.starts_with('_') || computed.contains(key) {
            continue;
        }

        match current.get(key) {
            Some(current_value) if current_value == desired_value => {}
            _ => changed.push(key.clone()),
        }
    }

    changed.sort();
    changed
}

/// Compute Diff for multiple resources and generate a Plan
pub fn create_plan(
    desired: &[Resource],
    current_states: &HashMap<ResourceId, State>,
    schemas: &HashMap<String, ResourceSchema>,
) -> Plan {
    let mut plan = Plan::new();

    for resource in desired {
        let mut resource = resource.clone();

        let current = current_states
            .get(&resource.id)
            .cloned()
            .unwrap_or_else(|| State::not_found(resource.id.clone()));

        // Declared defaults take part in create requests and drift
        // detection, so merge them in before diffing.
        let computed: HashSet<String> = match schemas.get(&resource.id.resource_type) {
            Some(schema) => {
                schema.apply_defaults(&mut resource.attributes);
                schema.computed_attributes().map(str::to_string).collect()
            }
            None => HashSet::new(),
        };

        match diff(&resource, &current, &computed) {
            Diff::Create(r) => plan.add(Effect::Create(r)),
            Diff::Update { id, from, to, .. } => {
                plan.add(Effect::Update { id, from, to });
            }
            Diff::NoChange(_) => {}
            Diff::Read(r) => plan.add(Effect::Read(r)),
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeSchema, AttributeType};

    fn no_computed() -> HashSet<String> {
        HashSet::new()
    }

    #[test]
    fn diff_create_when_not_exists() {
        let desired = Resource::new("dlc.data_engine", "main");
        let current = State::not_found(ResourceId::new("dlc.data_engine", "main"));

        let result = diff(&desired, &current, &no_computed());
        assert!(matches!(result, Diff::Create(_)));
    }

    #[test]
    fn diff_no_change_when_same() {
        let desired = Resource::new("dlc.data_engine", "main")
            .with_attribute("engine_type", Value::String("spark".to_string()));

        let mut attrs = HashMap::new();
        attrs.insert(
            "engine_type".to_string(),
            Value::String("spark".to_string()),
        );
        let current = State::existing(ResourceId::new("dlc.data_engine", "main"), attrs);

        let result = diff(&desired, &current, &no_computed());
        assert!(matches!(result, Diff::NoChange(_)));
    }

    #[test]
    fn diff_update_when_different() {
        let desired = Resource::new("dlc.data_engine", "main")
            .with_attribute("max_clusters", Value::Int(10));

        let mut attrs = HashMap::new();
        attrs.insert("max_clusters".to_string(), Value::Int(5));
        let current = State::existing(ResourceId::new("dlc.data_engine", "main"), attrs);

        let result = diff(&desired, &current, &no_computed());
        match result {
            Diff::Update {
                changed_attributes, ..
            } => {
                assert!(changed_attributes.contains(&"max_clusters".to_string()));
            }
            _ => panic!("Expected Update"),
        }
    }

    #[test]
    fn diff_ignores_computed_attributes() {
        let desired = Resource::new("dlc.data_engine", "main")
            .with_attribute("data_engine_id", Value::String("stale".to_string()));

        let mut attrs = HashMap::new();
        attrs.insert(
            "data_engine_id".to_string(),
            Value::String("engine-xyz".to_string()),
        );
        let current = State::existing(ResourceId::new("dlc.data_engine", "main"), attrs);

        let computed: HashSet<String> = ["data_engine_id".to_string()].into_iter().collect();
        let result = diff(&desired, &current, &computed);
        assert!(matches!(result, Diff::NoChange(_)));
    }

    #[test]
    fn diff_data_source_is_read() {
        let desired = Resource::new("dlc.data_engines", "all").with_read_only(true);
        let current = State::not_found(ResourceId::new("dlc.data_engines", "all"));

        let result = diff(&desired, &current, &no_computed());
        assert!(matches!(result, Diff::Read(_)));
        assert!(!result.is_change());
    }

    #[test]
    fn create_plan_from_resources() {
        let resources = vec![
            Resource::new("dlc.work_group", "new-group"),
            Resource::new("dlc.work_group", "existing-group")
                .with_attribute("work_group_description", Value::String("v2".to_string())),
        ];

        let mut current_states = HashMap::new();
        let mut attrs = HashMap::new();
        attrs.insert(
            "work_group_description".to_string(),
            Value::String("v1".to_string()),
        );
        current_states.insert(
            ResourceId::new("dlc.work_group", "existing-group"),
            State::existing(ResourceId::new("dlc.work_group", "existing-group"), attrs),
        );

        let plan = create_plan(&resources, &current_states, &HashMap::new());

        assert_eq!(plan.effects().len(), 2);
        assert!(matches!(plan.effects()[0], Effect::Create(_)));
        assert!(matches!(plan.effects()[1], Effect::Update { .. }));
    }

    #[test]
    fn create_plan_diffs_against_declared_defaults() {
        let schema = ResourceSchema::new("dlc.data_engine").attribute(
            AttributeSchema::new(
                "desired_state",
                AttributeType::Enum(vec!["running".to_string(), "suspended".to_string()]),
            )
            .with_default(Value::String("running".to_string())),
        );
        let schemas: HashMap<String, ResourceSchema> = [("dlc.data_engine".to_string(), schema)]
            .into_iter()
            .collect();

        // The manifest leaves desired_state implicit; the live engine was
        // suspended out of band.
        let resources = vec![Resource::new("dlc.data_engine", "main")];
        let mut attrs = HashMap::new();
        attrs.insert(
            "desired_state".to_string(),
            Value::String("suspended".to_string()),
        );
        let mut current_states = HashMap::new();
        current_states.insert(
            ResourceId::new("dlc.data_engine", "main"),
            State::existing(ResourceId::new("dlc.data_engine", "main"), attrs),
        );

        let plan = create_plan(&resources, &current_states, &schemas);
        assert!(!plan.is_empty());
        match &plan.effects()[0] {
            Effect::Update { to, .. } => {
                assert_eq!(
                    to.attributes.get("desired_state"),
                    Some(&Value::String("running".to_string()))
                );
            }
            other => panic!("expected Update, got {:?}", other),
        }
    }

    #[test]
    fn create_plan_carries_defaults_into_creates() {
        let schema = ResourceSchema::new("dlc.data_engine").attribute(
            AttributeSchema::new("desired_state", AttributeType::String)
                .with_default(Value::String("running".to_string())),
        );
        let schemas: HashMap<String, ResourceSchema> = [("dlc.data_engine".to_string(), schema)]
            .into_iter()
            .collect();

        let resources = vec![Resource::new("dlc.data_engine", "main")];
        let plan = create_plan(&resources, &HashMap::new(), &schemas);

        match &plan.effects()[0] {
            Effect::Create(r) => {
                assert_eq!(
                    r.attributes.get("desired_state"),
                    Some(&Value::String("running".to_string()))
                );
            }
            other => panic!("expected Create, got {:?}", other),
        }
    }

    #[test]
    fn create_plan_honors_schema_computed() {
        let schema = ResourceSchema::new("dlc.user")
            .attribute(AttributeSchema::new("create_time", AttributeType::String).computed());
        let schemas: HashMap<String, ResourceSchema> =
            [("dlc.user".to_string(), schema)].into_iter().collect();

        let resources = vec![Resource::new("dlc.user", "alice")];
        let mut current_states = HashMap::new();
        let mut attrs = HashMap::new();
        attrs.insert(
            "create_time".to_string(),
            Value::String("2024-01-01 00:00:00".to_string()),
        );
        current_states.insert(
            ResourceId::new("dlc.user", "alice"),
            State::existing(ResourceId::new("dlc.user", "alice"), attrs),
        );

        let plan = create_plan(&resources, &current_states, &schemas);
        assert!(plan.is_empty());
    }
}
