use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::errors::Error;

use super::resources::{Reference, RemovalPolicy, Resource};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlannedResource {
    pub id: String,
    pub resource: Resource,
    pub depends_on: Vec<String>,
    pub removal_policy: Option<RemovalPolicy>,
}

impl PlannedResource {
    pub fn depends_on(&mut self, id: &str) -> &mut Self {
        if !self.depends_on.iter().any(|d| d == id) {
            self.depends_on.push(id.to_string());
        }
        self
    }

    pub fn removal(&mut self, policy: RemovalPolicy) -> &mut Self {
        self.removal_policy = Some(policy);
        self
    }
}

/// Static resource graph: logical resources in insertion order plus their
/// explicit dependency edges.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResourcePlan {
    resources: Vec<PlannedResource>,
    outputs: BTreeMap<String, Reference>,
}

impl ResourcePlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: &str, resource: Resource) -> Result<&mut PlannedResource, Error> {
        if self.contains(id) {
            return Err(Error::DuplicateResource { id: id.to_string() });
        }

        self.resources.push(PlannedResource {
            id: id.to_string(),
            resource,
            depends_on: Vec::new(),
            removal_policy: None,
        });
        let index = self.resources.len() - 1;
        Ok(&mut self.resources[index])
    }

    pub fn output(&mut self, name: &str, value: Reference) {
        self.outputs.insert(name.to_string(), value);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.resources.iter().any(|r| r.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&PlannedResource> {
        self.resources.iter().find(|r| r.id == id)
    }

    pub fn resources(&self) -> impl Iterator<Item = &PlannedResource> {
        self.resources.iter()
    }

    pub fn outputs(&self) -> &BTreeMap<String, Reference> {
        &self.outputs
    }

    pub fn count_of(&self, type_name: &str) -> usize {
        self.resources
            .iter()
            .filter(|r| r.resource.type_name() == type_name)
            .count()
    }

    /// Every explicit dependency must name a resource of this plan.
    pub fn validate(&self) -> Result<(), Error> {
        for resource in &self.resources {
            for dependency in &resource.depends_on {
                if !self.contains(dependency) {
                    return Err(Error::configuration(format!(
                        "{} depends on unknown resource {}",
                        resource.id, dependency
                    )));
                }
            }
        }
        Ok(())
    }

    /// Append `other`, failing on any logical id or output name collision.
    pub fn merge(&mut self, other: ResourcePlan) -> Result<(), Error> {
        for resource in &other.resources {
            if self.contains(&resource.id) {
                return Err(Error::DuplicateResource {
                    id: resource.id.clone(),
                });
            }
        }
        for name in other.outputs.keys() {
            if self.outputs.contains_key(name) {
                return Err(Error::DuplicateResource { id: name.clone() });
            }
        }

        self.resources.extend(other.resources);
        self.outputs.extend(other.outputs);
        Ok(())
    }

    pub fn to_template(&self) -> Value {
        let mut resources = Map::new();
        for planned in &self.resources {
            let mut entry = json!({
                "Type": planned.resource.type_name(),
                "Properties": planned.resource.properties(),
            });
            if !planned.depends_on.is_empty() {
                entry["DependsOn"] = json!(planned.depends_on);
            }
            if let Some(policy) = planned.removal_policy {
                entry["DeletionPolicy"] = json!(policy.deletion_policy());
                entry["UpdateReplacePolicy"] = json!(policy.deletion_policy());
            }
            resources.insert(planned.id.clone(), entry);
        }

        let outputs: Map<String, Value> = self
            .outputs
            .iter()
            .map(|(name, value)| (name.clone(), json!({ "Value": value })))
            .collect();

        json!({
            "AWSTemplateFormatVersion": "2010-09-09",
            "Resources": resources,
            "Outputs": outputs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicate_ids() {
        let mut plan = ResourcePlan::new();
        plan.add("Bucket", Resource::Bucket).unwrap();

        assert!(matches!(
            plan.add("Bucket", Resource::Bucket),
            Err(Error::DuplicateResource { .. })
        ));
    }

    #[test]
    fn merge_rejects_collisions() {
        let mut first = ResourcePlan::new();
        first.add("Bucket", Resource::Bucket).unwrap();
        let mut second = ResourcePlan::new();
        second.add("Bucket", Resource::Bucket).unwrap();

        assert!(first.merge(second).is_err());
        assert_eq!(first.resources().count(), 1);
    }

    #[test]
    fn template_carries_dependencies_and_policies() {
        let mut plan = ResourcePlan::new();
        plan.add("Bucket", Resource::Bucket)
            .unwrap()
            .removal(RemovalPolicy::Retain);
        plan.add(
            "LogGroup",
            Resource::LogGroup {
                name: "/aws/kinesis-firehose/s1".to_string(),
                retention_days: Some(7),
            },
        )
        .unwrap()
        .depends_on("Bucket")
        .depends_on("Bucket");
        plan.output("BucketArn", Reference::arn_of("Bucket"));

        plan.validate().unwrap();
        let template = plan.to_template();

        assert_eq!(template["Resources"]["Bucket"]["DeletionPolicy"], "Retain");
        assert_eq!(template["Resources"]["LogGroup"]["DependsOn"], json!(["Bucket"]));
        assert_eq!(
            template["Resources"]["LogGroup"]["Properties"]["RetentionInDays"],
            7
        );
        assert_eq!(
            template["Outputs"]["BucketArn"]["Value"],
            json!({ "Fn::GetAtt": ["Bucket", "Arn"] })
        );
    }

    #[test]
    fn validate_rejects_dangling_dependencies() {
        let mut plan = ResourcePlan::new();
        plan.add("Bucket", Resource::Bucket)
            .unwrap()
            .depends_on("Missing");

        assert!(matches!(plan.validate(), Err(Error::Configuration { .. })));
    }
}
