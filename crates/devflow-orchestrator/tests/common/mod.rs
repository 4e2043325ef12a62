//! Scripted collaborators shared by the orchestrator integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use devflow_adapters::{AgentTool, Capability, CapabilityProvider, ExecError};
use devflow_core::{ContextError, RemoteFetcher, WorkflowConfig};
use devflow_git::InMemoryRepository;
use devflow_models::{Access, AgentRole, ProcessOutput};
use devflow_orchestrator::{
    MergeRequest, MergeRequestClient, MergeRequestError, Platform, WorkflowCoordinator,
};

/// One scripted response from an agent.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Exit 0 with `stdout`, after writing `writes` into the repository.
    Ok { stdout: String, writes: Vec<String> },
    /// Exit with a non-zero code and stderr.
    Exit(i32, String),
    Timeout,
    LaunchFailure,
}

impl Reply {
    pub fn ok(stdout: &str) -> Self {
        Reply::Ok {
            stdout: stdout.to_string(),
            writes: Vec::new(),
        }
    }

    pub fn writing(stdout: &str, files: &[&str]) -> Self {
        Reply::Ok {
            stdout: stdout.to_string(),
            writes: files.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Agent that answers from a queue and remembers every payload.
pub struct ScriptedTool {
    id: String,
    repo: Option<InMemoryRepository>,
    replies: Mutex<VecDeque<Reply>>,
    payloads: Mutex<Vec<(AgentRole, String)>>,
    accesses: Mutex<Vec<Access>>,
}

impl ScriptedTool {
    pub fn new(id: &str, replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            repo: None,
            replies: Mutex::new(replies.into()),
            payloads: Mutex::new(Vec::new()),
            accesses: Mutex::new(Vec::new()),
        })
    }

    /// A tool whose `writes` land in `repo`'s working tree.
    pub fn writing_to(id: &str, repo: &InMemoryRepository, replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            repo: Some(repo.clone()),
            replies: Mutex::new(replies.into()),
            payloads: Mutex::new(Vec::new()),
            accesses: Mutex::new(Vec::new()),
        })
    }

    pub fn payloads(&self) -> Vec<(AgentRole, String)> {
        self.payloads.lock().unwrap().clone()
    }

    /// File access granted to each call, in order.
    pub fn accesses(&self) -> Vec<Access> {
        self.accesses.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }
}

#[async_trait]
impl AgentTool for ScriptedTool {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(
        &self,
        role: AgentRole,
        access: Access,
        payload: &str,
        _workdir: &Path,
        timeout: Duration,
    ) -> Result<ProcessOutput, ExecError> {
        self.accesses.lock().unwrap().push(access);
        self.payloads
            .lock()
            .unwrap()
            .push((role, payload.to_string()));
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Exit(1, "no scripted reply left".into()));

        match reply {
            Reply::Ok { stdout, writes } => {
                if let Some(repo) = &self.repo {
                    for file in &writes {
                        repo.write_file(file);
                    }
                }
                Ok(ProcessOutput {
                    exit_code: Some(0),
                    stdout,
                    stderr: String::new(),
                })
            }
            Reply::Exit(code, stderr) => Ok(ProcessOutput {
                exit_code: Some(code),
                stdout: String::new(),
                stderr,
            }),
            Reply::Timeout => Err(ExecError::TimedOut {
                program: self.id.clone(),
                timeout,
            }),
            Reply::LaunchFailure => Err(ExecError::Launch {
                program: self.id.clone(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "not executable"),
            }),
        }
    }
}

/// Offers the registered tools; everything else is unavailable.
#[derive(Default)]
pub struct ScriptedProvider {
    tools: HashMap<String, Arc<ScriptedTool>>,
    resolved: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, tool: Arc<ScriptedTool>) -> Self {
        self.tools.insert(tool.id.clone(), tool);
        self
    }

    /// Every tool id resolved so far, in order.
    pub fn resolved(&self) -> Vec<String> {
        self.resolved.lock().unwrap().clone()
    }
}

impl CapabilityProvider for ScriptedProvider {
    fn resolve(&self, tool_id: &str) -> Capability {
        self.resolved.lock().unwrap().push(tool_id.to_string());
        match self.tools.get(tool_id) {
            Some(tool) => Capability::Available(tool.clone()),
            None => Capability::Unavailable {
                tool: tool_id.to_string(),
                reason: "not installed".to_string(),
            },
        }
    }
}

/// Fetcher returning fixed content, or failing when there is none.
pub struct StaticFetcher {
    content: Option<String>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn serving(content: &str) -> Arc<Self> {
        Arc::new(Self {
            content: Some(content.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            content: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteFetcher for StaticFetcher {
    async fn fetch(&self, url: &str, limit: usize, _timeout: Duration) -> Result<String, ContextError> {
        self.requests.lock().unwrap().push(url.to_string());
        match &self.content {
            Some(content) => Ok(content.chars().take(limit).collect()),
            None => Err(ContextError::Fetch {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            }),
        }
    }
}

/// Merge request client that records requests and answers from a script.
pub struct RecordingMergeRequests {
    answer: Result<String, MergeRequestError>,
    requests: Mutex<Vec<(Platform, MergeRequest)>>,
}

impl RecordingMergeRequests {
    pub fn succeeding(url: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(url.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(error: MergeRequestError) -> Arc<Self> {
        Arc::new(Self {
            answer: Err(error),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<(Platform, MergeRequest)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl MergeRequestClient for RecordingMergeRequests {
    async fn create(
        &self,
        platform: Platform,
        request: &MergeRequest,
        _workdir: &Path,
        _timeout: Duration,
    ) -> Result<String, MergeRequestError> {
        self.requests
            .lock()
            .unwrap()
            .push((platform, request.clone()));
        self.answer.clone()
    }
}

/// Default configuration with records under `state_dir`.
pub fn config(state_dir: &Path) -> WorkflowConfig {
    WorkflowConfig {
        state_dir: state_dir.to_path_buf(),
        ..WorkflowConfig::default()
    }
}

/// Coordinator over scripted collaborators.
pub fn coordinator(
    config: WorkflowConfig,
    repo: &InMemoryRepository,
    provider: Arc<ScriptedProvider>,
    fetcher: Arc<StaticFetcher>,
    merge_requests: Arc<RecordingMergeRequests>,
) -> WorkflowCoordinator {
    WorkflowCoordinator::new(config, Arc::new(repo.clone()), provider)
        .with_fetcher(fetcher)
        .with_merge_requests(merge_requests)
}
