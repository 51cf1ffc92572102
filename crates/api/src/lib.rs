pub mod crumb;
pub mod error;
pub mod types;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};
use url::Url;

use jenkinsctl_config::{Config, ServerConfig};

use crumb::{Crumb, CrumbCache};
use error::{JenkinsError, Result};
use types::{Build, BuildListing, BuildRef, Job, JobList, Trigger};

/// Async client for one Jenkins instance. Basic auth on every call; a CSRF
/// crumb is obtained on first use and cached for the client's lifetime.
#[derive(Clone)]
pub struct JenkinsClient {
    client: Client,
    base_url: String,
    user: String,
    password: Option<String>,
    crumbs: CrumbCache,
}

impl JenkinsClient {
    pub fn new(server: &ServerConfig) -> Result<Self> {
        let base_url = server.base_url();
        Url::parse(&base_url)?;

        let client = Client::builder()
            .user_agent(format!("jenkinsctl/{}", env!("CARGO_PKG_VERSION")))
            .timeout(server.request_timeout())
            .cookie_store(true)
            .build()
            .map_err(JenkinsError::RequestFailed)?;

        Ok(Self {
            client,
            base_url,
            user: server.user.clone(),
            password: server.password.clone(),
            crumbs: CrumbCache::new(server.crumb.clone()),
        })
    }

    /// Look up `project` in the configuration and build a client for it.
    pub fn for_project(config: &Config, project: &str) -> Result<Self> {
        let server = config
            .server(project)
            .ok_or_else(|| JenkinsError::MissingConfig {
                project: project.to_string(),
            })?;
        Self::new(server)
    }

    /// List the jobs visible on the instance root.
    pub async fn jobs(&self) -> Result<Vec<Job>> {
        let url = format!("{}/api/json", self.base_url);
        let list: JobList = self.get_json(url).await?;
        Ok(list.jobs)
    }

    /// Trigger a parameterized build. The returned [`Trigger`] carries the
    /// queue item URL Jenkins answers with in the `Location` header.
    pub async fn run_job(&self, job: &str, params: &[(String, String)]) -> Result<Trigger> {
        let url = format!("{}/{}/buildWithParameters", self.base_url, job_path(job));
        debug!(job, params = params.len(), url = %url, "Triggering build");

        let request = self
            .client
            .post(&url)
            .query(&[("delay", "0sec")])
            .form(params);
        let response = self.execute(request).await?;

        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(Trigger { location })
    }

    pub async fn last_build(&self, job: &str) -> Result<Build> {
        let url = format!("{}/{}/lastBuild/api/json", self.base_url, job_path(job));
        self.get_json(url).await
    }

    /// List a job's builds via a `tree` query selecting only the listing
    /// fields.
    pub async fn builds(&self, job: &str) -> Result<Vec<BuildRef>> {
        let url = format!(
            "{}/{}/api/json?tree=builds[id,number,queueId,timestamp,result]",
            self.base_url,
            job_path(job)
        );
        let listing: BuildListing = self.get_json(url).await?;
        Ok(listing.builds)
    }

    pub async fn build_details(&self, job: &str, number: i64) -> Result<Build> {
        let url = format!("{}/{}/{}/api/json", self.base_url, job_path(job), number);
        self.get_json(url).await
    }

    /// Raw console output of one build.
    pub async fn console_text(&self, job: &str, number: i64) -> Result<String> {
        let url = format!("{}/{}/{}/consoleText", self.base_url, job_path(job), number);
        debug!(url = %url, "Fetching console text");

        let response = self.execute(self.client.get(&url)).await?;
        response.text().await.map_err(JenkinsError::RequestFailed)
    }

    /// Resolve the queue item id a trigger produced to the build number it
    /// became, by scanning the job's build listing. `None` when no build
    /// carries the queue id (still queued, or already rotated out).
    pub async fn build_number_for_queue_id(
        &self,
        job: &str,
        queue_id: i64,
    ) -> Result<Option<i64>> {
        let builds = self.builds(job).await?;
        let number = builds
            .iter()
            .find(|b| b.queue_id == queue_id)
            .map(|b| b.number);

        debug!(job, queue_id, ?number, "Resolved queue id");
        Ok(number)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        debug!(url = %url, "Sending request");

        let response = self.execute(self.client.get(&url)).await?;
        response.json::<T>().await.map_err(|e| {
            error!("Failed to parse JSON response: {}", e);
            JenkinsError::InvalidResponse(e.to_string())
        })
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let mut request = self.authed(request);

        if let Some(crumb) = self.ensure_crumb().await? {
            request = request.header(crumb.crumb_request_field.as_str(), crumb.crumb.as_str());
        }

        let response = request.send().await.map_err(JenkinsError::RequestFailed)?;
        self.check_status(response).await
    }

    async fn ensure_crumb(&self) -> Result<Option<Crumb>> {
        self.crumbs.get_or_try_fetch(|| self.fetch_crumb()).await
    }

    /// One round-trip to the crumb issuer. `None` when the instance has CSRF
    /// protection disabled (the issuer endpoint answers 404).
    async fn fetch_crumb(&self) -> Result<Option<Crumb>> {
        let url = format!("{}/crumbIssuer/api/json", self.base_url);
        debug!(url = %url, "Fetching CSRF crumb");

        let request = self.authed(self.client.get(&url));
        let response = request.send().await.map_err(JenkinsError::RequestFailed)?;

        if response.status() == StatusCode::NOT_FOUND {
            warn!("Crumb issuer not available, proceeding without CSRF crumb");
            return Ok(None);
        }

        let response = self.check_status(response).await?;
        let crumb = response
            .json::<Crumb>()
            .await
            .map_err(|e| JenkinsError::InvalidResponse(e.to_string()))?;

        Ok(Some(crumb))
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        if self.user.is_empty() {
            request
        } else {
            request.basic_auth(&self.user, self.password.as_deref())
        }
    }

    async fn check_status(&self, response: Response) -> Result<Response> {
        let status = response.status();

        match status {
            StatusCode::UNAUTHORIZED => Err(JenkinsError::AuthenticationFailed {
                message: "Invalid or expired credentials".to_string(),
            }),
            StatusCode::FORBIDDEN => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Access denied".to_string());
                Err(JenkinsError::AuthenticationFailed { message })
            }
            StatusCode::NOT_FOUND => {
                let resource = response.url().path().to_string();
                Err(JenkinsError::NotFound { resource })
            }
            StatusCode::BAD_REQUEST => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Bad request".to_string());
                Err(JenkinsError::BadRequest { message })
            }
            status if status.is_success() => Ok(response),
            _ => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| format!("Unexpected status: {}", status));
                Err(JenkinsError::ServerError {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

/// Encode a job name as URL path segments. Names may nest under folders
/// (`tools/linters/clippy`), each level addressed as `job/{segment}`.
fn job_path(job: &str) -> String {
    job.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| format!("job/{}", urlencoding::encode(s)))
        .collect::<Vec<_>>()
        .join("/")
}
