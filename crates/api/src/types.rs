use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Top-level response of `GET {base}/api/json`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobList {
    #[serde(default)]
    pub jobs: Vec<Job>,
}

/// One job as listed on the instance root. The color field doubles as the
/// status indicator (`blue`, `red`, `disabled`, `blue_anime`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// A single build, as returned by the `lastBuild` and `{number}` endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub number: i64,
    #[serde(default)]
    pub queue_id: i64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub full_display_name: Option<String>,
    #[serde(default)]
    pub building: bool,
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub estimated_duration: i64,
    /// Milliseconds since the epoch.
    #[serde(default)]
    pub timestamp: i64,
    /// `SUCCESS`, `FAILURE`, `UNSTABLE`, `ABORTED`, `NOT_BUILT`; absent while
    /// the build is running.
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub culprits: Vec<Culprit>,
}

impl Build {
    /// Flattened view over `actions[].parameters[]`.
    pub fn parameters(&self) -> impl Iterator<Item = &BuildParameter> {
        self.actions.iter().flat_map(|a| a.parameters.iter())
    }

    /// Flattened view over `actions[].causes[]`.
    pub fn causes(&self) -> impl Iterator<Item = &Cause> {
        self.actions.iter().flat_map(|a| a.causes.iter())
    }

    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// Jenkins nests parameters and causes inside a heterogeneous `actions`
/// array; entries carrying neither deserialize to empty lists.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub parameters: Vec<BuildParameter>,
    #[serde(default)]
    pub causes: Vec<Cause>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildParameter {
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cause {
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Culprit {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub absolute_url: Option<String>,
}

/// Response of the `tree=builds[...]` listing on a job.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildListing {
    #[serde(default)]
    pub builds: Vec<BuildRef>,
}

/// One entry of the build listing; the slim shape requested via `tree`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRef {
    #[serde(default)]
    pub id: Option<String>,
    pub number: i64,
    #[serde(default)]
    pub queue_id: i64,
    /// Milliseconds since the epoch.
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub result: Option<String>,
}

impl BuildRef {
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// Outcome of triggering a build. Jenkins answers `201 Created` with the
/// queue item URL in the `Location` header.
#[derive(Debug, Clone)]
pub struct Trigger {
    pub location: Option<String>,
}

impl Trigger {
    /// Queue item id parsed from the `Location` header
    /// (`{base}/queue/item/{id}/`).
    pub fn queue_id(&self) -> Option<i64> {
        let location = self.location.as_deref()?;
        if !location.contains("/queue/item/") {
            return None;
        }
        location.trim_end_matches('/').rsplit('/').next()?.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOB_LIST_FIXTURE: &str = r#"{
        "_class": "hudson.model.Hudson",
        "jobs": [
            {"_class": "hudson.model.FreeStyleProject", "name": "backend-deploy", "url": "https://jenkins.example.com/job/backend-deploy/", "color": "blue"},
            {"_class": "org.jenkinsci.plugins.workflow.job.WorkflowJob", "name": "nightly-tests", "url": "https://jenkins.example.com/job/nightly-tests/", "color": "red"},
            {"_class": "com.cloudbees.hudson.plugins.folder.Folder", "name": "tools", "url": "https://jenkins.example.com/job/tools/"}
        ]
    }"#;

    #[test]
    fn job_list_fixture_deserializes_without_loss() {
        let list: JobList = serde_json::from_str(JOB_LIST_FIXTURE).unwrap();
        assert_eq!(list.jobs.len(), 3);

        assert_eq!(list.jobs[0].name, "backend-deploy");
        assert_eq!(
            list.jobs[0].url,
            "https://jenkins.example.com/job/backend-deploy/"
        );
        assert_eq!(list.jobs[0].color.as_deref(), Some("blue"));

        assert_eq!(list.jobs[1].color.as_deref(), Some("red"));

        // Folders carry no color at all.
        assert_eq!(list.jobs[2].name, "tools");
        assert!(list.jobs[2].color.is_none());
    }

    #[test]
    fn build_deserializes_parameters_and_causes() {
        let raw = r##"{
            "number": 42,
            "queueId": 117,
            "url": "https://jenkins.example.com/job/backend-deploy/42/",
            "displayName": "#42",
            "fullDisplayName": "backend-deploy #42",
            "building": false,
            "duration": 73000,
            "estimatedDuration": 80000,
            "timestamp": 1718000000000,
            "result": "SUCCESS",
            "actions": [
                {"_class": "hudson.model.ParametersAction", "parameters": [
                    {"name": "TARGET_ENV", "value": "staging"},
                    {"name": "DRY_RUN", "value": false}
                ]},
                {"_class": "hudson.model.CauseAction", "causes": [
                    {"shortDescription": "Started by user admin", "userId": "admin", "userName": "admin"}
                ]},
                {}
            ],
            "culprits": [
                {"fullName": "Jane Doe", "absoluteUrl": "https://jenkins.example.com/user/jane"}
            ]
        }"##;

        let build: Build = serde_json::from_str(raw).unwrap();
        assert_eq!(build.number, 42);
        assert_eq!(build.queue_id, 117);
        assert_eq!(build.result.as_deref(), Some("SUCCESS"));
        assert!(!build.building);

        let params: Vec<_> = build.parameters().collect();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "TARGET_ENV");
        assert_eq!(params[0].value, serde_json::json!("staging"));
        assert_eq!(params[1].value, serde_json::json!(false));

        let causes: Vec<_> = build.causes().collect();
        assert_eq!(causes.len(), 1);
        assert_eq!(causes[0].user_id.as_deref(), Some("admin"));

        assert_eq!(build.culprits.len(), 1);
        assert_eq!(build.culprits[0].full_name.as_deref(), Some("Jane Doe"));

        let ts = build.timestamp_utc().unwrap();
        assert_eq!(ts.timestamp_millis(), 1718000000000);
    }

    #[test]
    fn running_build_has_no_result() {
        let raw = r#"{"number": 7, "building": true, "timestamp": 1718000000000}"#;
        let build: Build = serde_json::from_str(raw).unwrap();
        assert!(build.building);
        assert!(build.result.is_none());
        assert_eq!(build.queue_id, 0);
        assert!(build.parameters().next().is_none());
    }

    #[test]
    fn build_listing_deserializes_tree_shape() {
        let raw = r#"{
            "_class": "hudson.model.FreeStyleProject",
            "builds": [
                {"id": "42", "number": 42, "queueId": 117, "timestamp": 1718000000000, "result": "SUCCESS"},
                {"id": "41", "number": 41, "queueId": 109, "timestamp": 1717900000000, "result": "FAILURE"}
            ]
        }"#;

        let listing: BuildListing = serde_json::from_str(raw).unwrap();
        assert_eq!(listing.builds.len(), 2);
        assert_eq!(listing.builds[0].number, 42);
        assert_eq!(listing.builds[0].queue_id, 117);
        assert_eq!(listing.builds[1].result.as_deref(), Some("FAILURE"));
    }

    #[test]
    fn trigger_parses_queue_id_from_location() {
        let trigger = Trigger {
            location: Some("https://jenkins.example.com/queue/item/117/".to_string()),
        };
        assert_eq!(trigger.queue_id(), Some(117));

        let no_slash = Trigger {
            location: Some("https://jenkins.example.com/queue/item/117".to_string()),
        };
        assert_eq!(no_slash.queue_id(), Some(117));
    }

    #[test]
    fn trigger_without_queue_location_yields_none() {
        assert_eq!(Trigger { location: None }.queue_id(), None);

        let unrelated = Trigger {
            location: Some("https://jenkins.example.com/job/backend-deploy/".to_string()),
        };
        assert_eq!(unrelated.queue_id(), None);
    }
}
