// ABOUTME: Reconciliation engine turning one alert group into a tracker action
// ABOUTME: Renders templates, searches for the deduplicated issue, then no-ops, reopens or creates

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::decision::{Decision, ReopenPolicy};
use super::error::{NotifyError, Result};
use crate::alert::AlertGroup;
use crate::config::ReceiverConfig;
use crate::template::{TemplateContext, TemplateEngine};
use crate::tracker::query::{self, Dedup, SearchQuery, HASH_MARKER};
use crate::tracker::{IssueSnapshot, RenderedIssue, TrackerGateway};

/// What a successful run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// An unresolved (or won't-fix) issue already tracks this group
    Unchanged { key: String },
    Reopened { key: String },
    Created { key: String, id: String },
}

/// One receiver bound to a template set and a tracker. Holds no mutable
/// state, so a single instance may serve concurrent runs.
pub struct Notifier<'a> {
    receiver: &'a ReceiverConfig,
    templates: &'a TemplateEngine,
    tracker: &'a dyn TrackerGateway,
}

/// Values rendered before the search, reused when creating
struct Rendered {
    project: String,
    summary: String,
    hash: String,
    labels: Vec<String>,
}

impl<'a> Notifier<'a> {
    pub fn new(
        receiver: &'a ReceiverConfig,
        templates: &'a TemplateEngine,
        tracker: &'a dyn TrackerGateway,
    ) -> Self {
        Self {
            receiver,
            templates,
            tracker,
        }
    }

    pub async fn notify(&self, group: &AlertGroup) -> Result<Outcome> {
        self.notify_at(group, Utc::now()).await
    }

    /// Reconcile `group` as of `now`
    pub async fn notify_at(&self, group: &AlertGroup, now: DateTime<Utc>) -> Result<Outcome> {
        let context = TemplateContext::from_group(group);
        let rendered = self.render_identity(group, &context)?;

        let dedup = if !rendered.hash.is_empty() {
            Dedup::Hash(rendered.hash.clone())
        } else if self.receiver.add_labels {
            Dedup::Labels(rendered.labels.clone())
        } else {
            Dedup::None
        };
        let search = SearchQuery::build(&rendered.project, &dedup);
        let existing = self.search(&search).await?;

        match self.policy().decide(existing.as_ref(), now) {
            Decision::NoOp(key) => {
                match existing.as_ref().and_then(|i| i.resolution.as_deref()) {
                    Some(resolution) => info!(
                        "Issue {} for {:?} is resolved as {:?}, not reopening",
                        key, rendered.labels, resolution
                    ),
                    None => debug!(
                        "Issue {} for {:?} is unresolved, nothing to do",
                        key, rendered.labels
                    ),
                }
                Ok(Outcome::Unchanged { key })
            }
            Decision::Reopen(key) => {
                info!(
                    "Issue {} for {:?} was resolved recently, reopening",
                    key, rendered.labels
                );
                self.reopen(&key).await?;
                Ok(Outcome::Reopened { key })
            }
            Decision::Create => {
                info!(
                    "No open issue matching {:?} found, creating new issue",
                    rendered.labels
                );
                let mut issue = self.render_issue(group, &context, rendered)?;
                let created = self.create(&issue).await?;
                issue.assign(&created);
                info!("Issue created: key={} id={}", created.key, created.id);
                Ok(Outcome::Created {
                    key: created.key,
                    id: created.id,
                })
            }
        }
    }

    fn policy(&self) -> ReopenPolicy {
        ReopenPolicy {
            window: self.receiver.reopen_duration,
            wont_fix_resolution: self.receiver.wont_fix_resolution.clone(),
        }
    }

    fn render(
        &self,
        field: &'static str,
        template: &str,
        context: &TemplateContext,
    ) -> Result<String> {
        self.templates
            .execute(template, context)
            .map_err(NotifyError::render(field))
    }

    /// Everything the search depends on
    fn render_identity(&self, group: &AlertGroup, context: &TemplateContext) -> Result<Rendered> {
        let project = self.render("project", &self.receiver.project, context)?;
        let summary = self.render("summary", &self.receiver.summary, context)?;

        let hash = match &self.receiver.alert_hash {
            Some(template) => query::alert_hash(&self.render("alert_hash", template, context)?),
            None => String::new(),
        };

        let labels = if self.receiver.add_labels {
            query::dedup_labels(group.sorted_label_values())
        } else {
            Vec::new()
        };

        Ok(Rendered {
            project,
            summary,
            hash,
            labels,
        })
    }

    fn render_issue(
        &self,
        group: &AlertGroup,
        context: &TemplateContext,
        rendered: Rendered,
    ) -> Result<RenderedIssue> {
        let description = match &self.receiver.description {
            Some(template) => self.render("description", template, context)?,
            None => String::new(),
        };

        let priority = match &self.receiver.priority {
            Some(template) => Some(self.render("priority", template, context)?),
            None => None,
        };

        let components = self
            .receiver
            .components
            .iter()
            .map(|c| self.render("components", c, context))
            .collect::<Result<Vec<_>>>()?;

        let mut labels = rendered.labels;
        if self.receiver.add_group_labels {
            labels.extend(
                group
                    .group_labels
                    .iter()
                    .map(|(k, v)| query::group_label(k, v)),
            );
        }

        let mut fields = serde_json::Map::new();
        for (name, value) in &self.receiver.fields {
            let value = value
                .render(self.templates, context)
                .map_err(NotifyError::render("fields"))?;
            fields.insert(name.clone(), value);
        }

        Ok(RenderedIssue {
            issue_type: self.render("issue_type", &self.receiver.issue_type, context)?,
            description: format!("{}\n\n{}{}", description, HASH_MARKER, rendered.hash),
            project: rendered.project,
            summary: rendered.summary,
            priority,
            labels,
            components,
            fields,
            key: None,
            id: None,
        })
    }

    /// First match by descending key, if any
    async fn search(&self, search: &SearchQuery) -> Result<Option<IssueSnapshot>> {
        debug!("search: query={:?} max_results={}", search.jql, search.max_results);
        let issues = self
            .tracker
            .search(search)
            .await
            .map_err(|source| NotifyError::Search {
                query: search.jql.clone(),
                source,
            })?;

        if issues.len() > 1 {
            let keys: Vec<&str> = issues.iter().map(|i| i.key.as_str()).collect();
            info!(
                "More than one issue matched {:?}, will only consider {}: {:?}",
                search.jql, keys[0], keys
            );
        }

        match issues.into_iter().next() {
            Some(issue) => {
                debug!("  found: {} ({})", issue.key, issue.status);
                Ok(Some(issue))
            }
            None => {
                debug!("  no results");
                Ok(None)
            }
        }
    }

    async fn reopen(&self, issue_key: &str) -> Result<()> {
        let tracker_error = |source| NotifyError::Transition {
            issue_key: issue_key.to_string(),
            source,
        };

        let transitions = self
            .tracker
            .transitions(issue_key)
            .await
            .map_err(tracker_error)?;

        let transition = transitions
            .iter()
            .find(|t| t.name == self.receiver.reopen_state)
            .ok_or_else(|| NotifyError::MissingTransition {
                state: self.receiver.reopen_state.clone(),
                issue_key: issue_key.to_string(),
            })?;

        debug!(
            "reopen: issue_key={} transition_id={}",
            issue_key, transition.id
        );
        self.tracker
            .transition(issue_key, &transition.id)
            .await
            .map_err(tracker_error)
    }

    async fn create(&self, issue: &RenderedIssue) -> Result<crate::tracker::CreatedIssue> {
        debug!("create: project={} summary={:?}", issue.project, issue.summary);
        self.tracker
            .create(issue)
            .await
            .map_err(|source| NotifyError::Create {
                project: issue.project.clone(),
                source,
            })
    }
}
