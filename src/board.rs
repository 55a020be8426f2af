// src/board.rs
//! Dashboard job board: jobs grouped by source, flattened and filtered

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `GET /api/jobs` payload: source url -> jobs scraped from it
pub type JobSources = BTreeMap<String, Vec<BoardJob>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardJob {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub is_remote: bool,
    #[serde(default)]
    pub scraped_at: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub source: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct JobBoard {
    jobs: Vec<BoardJob>,
}

impl JobBoard {
    /// Flatten all sources, tagging each job with the source it came from
    pub fn from_sources(sources: JobSources) -> Self {
        let jobs = sources
            .into_iter()
            .flat_map(|(source, jobs)| {
                jobs.into_iter().map(move |mut job| {
                    job.source = source.clone();
                    job
                })
            })
            .collect();
        Self { jobs }
    }

    pub fn jobs(&self) -> &[BoardJob] {
        &self.jobs
    }

    pub fn total(&self) -> usize {
        self.jobs.len()
    }

    pub fn remote_count(&self) -> usize {
        self.jobs.iter().filter(|job| job.is_remote).count()
    }

    /// Unique technologies across all jobs, sorted
    pub fn technologies(&self) -> Vec<String> {
        self.jobs
            .iter()
            .flat_map(|job| job.technologies.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Jobs whose title contains `search` and that use any of `technologies`.
    /// Both comparisons are case-insensitive substring matches; empty
    /// filters match everything.
    pub fn filter(&self, search: &str, technologies: &[String]) -> Vec<&BoardJob> {
        let search = search.to_lowercase();
        let wanted: Vec<String> = technologies.iter().map(|t| t.to_lowercase()).collect();

        self.jobs
            .iter()
            .filter(|job| search.is_empty() || job.title.to_lowercase().contains(&search))
            .filter(|job| {
                wanted.is_empty()
                    || wanted.iter().any(|tech| {
                        job.technologies
                            .iter()
                            .any(|job_tech| job_tech.to_lowercase().contains(tech))
                    })
            })
            .collect()
    }
}

/// Host part of a source url without a leading `www.`
pub fn source_name(source: &str) -> String {
    let Some((_, rest)) = source.split_once("://") else {
        return "Unknown Source".to_string();
    };
    let host = rest.split(['/', '?', '#']).next().unwrap_or("");
    if host.is_empty() {
        return "Unknown Source".to_string();
    }
    host.trim_start_matches("www.").to_string()
}
