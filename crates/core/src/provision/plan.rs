//! The fixed provisioning sequence.

use urlencoding::encode;

use crate::config::{Config, ConflictPolicy};
use crate::geoserver::payload::{datastore_xml, feature_type_xml, namespace_xml, workspace_xml};
use crate::geoserver::{Body, RestRequest};

use super::step::{Criticality, Mutation, Step, StepAction};

/// Build the ordered step list: workspace, namespace, datastore, feature
/// type, bounding boxes, global settings.
pub fn build_plan(config: &Config, sql: &str) -> Vec<Step> {
    let ws = encode(&config.workspace.name);
    let ds = encode(&config.datastore.name);
    let layer = encode(&config.layer.name);

    let datastores = format!("/workspaces/{}/datastores", ws);
    let featuretypes = format!("{}/{}/featuretypes", datastores, ds);
    let layer_path = format!("{}/{}", featuretypes, layer);

    let on_conflict = config.provision.on_conflict;
    let update = |path: String, body: &Body| match on_conflict {
        ConflictPolicy::Update => Some(RestRequest::put(path, body.clone())),
        ConflictPolicy::Skip => None,
    };

    let workspace_body = Body::Xml(workspace_xml(&config.workspace.name));
    let datastore_body = Body::Xml(datastore_xml(&config.datastore, &config.workspace.name));
    let feature_type_body = Body::Xml(feature_type_xml(&config.layer, sql));

    vec![
        Step {
            name: "workspace",
            description: format!("Create workspace '{}'", config.workspace.name),
            action: StepAction::Create {
                update: update(format!("/workspaces/{}", ws), &workspace_body),
                request: RestRequest::post("/workspaces", workspace_body),
            },
            criticality: Criticality::Required,
        },
        Step {
            name: "namespace",
            description: format!("Set namespace URI to '{}'", config.workspace.namespace_uri),
            action: StepAction::Upsert {
                request: RestRequest::put(
                    format!("/namespaces/{}", ws),
                    Body::Xml(namespace_xml(
                        &config.workspace.name,
                        &config.workspace.namespace_uri,
                    )),
                ),
            },
            criticality: Criticality::Required,
        },
        Step {
            name: "datastore",
            description: format!(
                "Create PostGIS (JNDI) datastore '{}'",
                config.datastore.name
            ),
            action: StepAction::Create {
                update: update(format!("{}/{}", datastores, ds), &datastore_body),
                request: RestRequest::post(datastores.clone(), datastore_body),
            },
            criticality: Criticality::Required,
        },
        Step {
            name: "featuretype",
            description: format!("Create SQL view layer '{}'", config.layer.name),
            action: StepAction::Create {
                update: update(layer_path.clone(), &feature_type_body),
                request: RestRequest::post(featuretypes, feature_type_body),
            },
            criticality: Criticality::Required,
        },
        Step {
            name: "bbox",
            description: "Recalculate bounding boxes".to_string(),
            action: StepAction::ReadModifyWrite {
                path: layer_path,
                put_query: vec![(
                    "recalculate".to_string(),
                    "nativebbox,latlonbbox".to_string(),
                )],
                mutation: Mutation::EnableFeatureType,
            },
            criticality: Criticality::BestEffort,
        },
        Step {
            name: "settings",
            description: format!(
                "Set global numDecimals to {}",
                config.settings.num_decimals
            ),
            action: StepAction::ReadModifyWrite {
                path: "/settings".to_string(),
                put_query: Vec::new(),
                mutation: Mutation::SetNumDecimals(config.settings.num_decimals),
            },
            criticality: Criticality::BestEffort,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geoserver::Method;

    fn names(steps: &[Step]) -> Vec<&'static str> {
        steps.iter().map(|s| s.name).collect()
    }

    #[test]
    fn test_plan_order_and_criticality() {
        let steps = build_plan(&Config::default(), "SELECT 1");
        assert_eq!(
            names(&steps),
            vec!["workspace", "namespace", "datastore", "featuretype", "bbox", "settings"]
        );
        let required: Vec<_> = steps
            .iter()
            .map(|s| s.criticality == Criticality::Required)
            .collect();
        assert_eq!(required, vec![true, true, true, true, false, false]);
    }

    #[test]
    fn test_plan_paths() {
        let steps = build_plan(&Config::default(), "SELECT 1");

        match &steps[0].action {
            StepAction::Create { request, update } => {
                assert_eq!(request.method, Method::Post);
                assert_eq!(request.path, "/workspaces");
                let update = update.as_ref().unwrap();
                assert_eq!(update.method, Method::Put);
                assert_eq!(update.path, "/workspaces/station_pois");
            }
            other => panic!("unexpected action {:?}", other),
        }

        match &steps[1].action {
            StepAction::Upsert { request } => {
                assert_eq!(request.method, Method::Put);
                assert_eq!(request.path, "/namespaces/station_pois");
            }
            other => panic!("unexpected action {:?}", other),
        }

        match &steps[3].action {
            StepAction::Create { request, update } => {
                assert_eq!(
                    request.path,
                    "/workspaces/station_pois/datastores/station_pois/featuretypes"
                );
                assert_eq!(
                    update.as_ref().unwrap().path,
                    "/workspaces/station_pois/datastores/station_pois/featuretypes/station_pois"
                );
            }
            other => panic!("unexpected action {:?}", other),
        }

        match &steps[4].action {
            StepAction::ReadModifyWrite {
                path, put_query, ..
            } => {
                assert_eq!(
                    path,
                    "/workspaces/station_pois/datastores/station_pois/featuretypes/station_pois"
                );
                assert_eq!(put_query[0].1, "nativebbox,latlonbbox");
            }
            other => panic!("unexpected action {:?}", other),
        }

        match &steps[5].action {
            StepAction::ReadModifyWrite { path, mutation, .. } => {
                assert_eq!(path, "/settings");
                assert_eq!(*mutation, Mutation::SetNumDecimals(16));
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_skip_policy_has_no_update_requests() {
        let mut config = Config::default();
        config.provision.on_conflict = ConflictPolicy::Skip;
        let steps = build_plan(&config, "SELECT 1");
        for step in &steps {
            if let StepAction::Create { update, .. } = &step.action {
                assert!(update.is_none(), "{} should not update", step.name);
            }
        }
    }

    #[test]
    fn test_update_reuses_create_payload() {
        let steps = build_plan(&Config::default(), "SELECT 1");
        if let StepAction::Create { request, update } = &steps[2].action {
            assert_eq!(request.body, update.as_ref().unwrap().body);
        } else {
            panic!("datastore step should be a create");
        }
    }
}
