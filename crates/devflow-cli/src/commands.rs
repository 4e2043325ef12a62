//! Command handlers for CLI subcommands.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use devflow_adapters::{Capability, SystemProvider};
use devflow_core::WorkflowConfig;
use devflow_git::GitCli;
use devflow_models::WorkflowType;
use devflow_orchestrator::{AutoAccept, MessageConfirmer, WorkflowCoordinator};
use tracing::{debug, info};

use crate::cli::{Cli, Commands, RunOptions};
use crate::confirm::InteractiveConfirmer;

/// Result type for command operations.
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Executes a CLI command and returns the process exit code.
pub async fn execute(cli: Cli) -> Result<i32> {
    let Cli {
        repo,
        state_dir,
        command,
        ..
    } = cli;

    match command {
        Commands::Feature { input, options } => {
            run_workflow(WorkflowType::Feature, &input, options, repo, state_dir).await
        }
        Commands::Integrate { input, options } => {
            run_workflow(WorkflowType::Integration, &input, options, repo, state_dir).await
        }
        Commands::Audit { input, options } => {
            run_workflow(WorkflowType::Audit, &input, options, repo, state_dir).await
        }
        Commands::Agents => cmd_agents(),
    }
}

/// Environment first, then command-line flags.
pub fn build_config(options: &RunOptions, state_dir: Option<PathBuf>) -> Result<WorkflowConfig> {
    let mut config = WorkflowConfig::from_env()?;
    if let Some(language) = &options.language {
        config.default_language = language.clone();
    }
    if let Some(trunk) = &options.trunk {
        config.trunk_override = Some(trunk.clone());
    }
    if let Some(focus) = options.review_focus {
        config.review_focus = focus;
    }
    if options.with_tests {
        config.generate_tests = true;
    }
    if let Some(framework) = &options.test_framework {
        config.test_framework = Some(framework.clone());
    }
    if let Some(depth) = options.audit_depth {
        config.audit_depth = depth;
    }
    if let Some(dir) = state_dir {
        config.state_dir = dir;
    }
    Ok(config)
}

fn resolve_repo(repo: Option<PathBuf>) -> Result<PathBuf> {
    let path = match repo {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    Ok(path.canonicalize().unwrap_or(path))
}

async fn run_workflow(
    workflow_type: WorkflowType,
    input: &str,
    options: RunOptions,
    repo: Option<PathBuf>,
    state_dir: Option<PathBuf>,
) -> Result<i32> {
    if !GitCli::is_available() {
        return Err("git not found in PATH".into());
    }
    let config = build_config(&options, state_dir)?;
    let repo = resolve_repo(repo)?;
    info!(
        workflow = %workflow_type,
        repo = %repo.display(),
        state_dir = %config.state_dir.display(),
        "Starting workflow"
    );

    let confirmer = choose_confirmer(options.yes, workflow_type);
    let coordinator = WorkflowCoordinator::new(
        config,
        Arc::new(GitCli::new(&repo)),
        Arc::new(SystemProvider::default()),
    )
    .with_confirmer(confirmer);

    let report = coordinator.run(workflow_type, input).await;
    print!("{}", report.render());
    Ok(report.exit_code())
}

fn choose_confirmer(yes: bool, workflow_type: WorkflowType) -> Arc<dyn MessageConfirmer> {
    let interactive = !yes
        && workflow_type != WorkflowType::Audit
        && std::io::stdin().is_terminal()
        && std::io::stdout().is_terminal();
    debug!(interactive, "commit message confirmation");
    if interactive {
        Arc::new(InteractiveConfirmer)
    } else {
        Arc::new(AutoAccept)
    }
}

fn cmd_agents() -> Result<i32> {
    let provider = SystemProvider::default();
    println!("Agent adapters:\n");
    for (info, capability) in provider.survey() {
        let status = match &capability {
            Capability::Available(_) => "available".to_string(),
            Capability::Unavailable { reason, .. } => format!("unavailable ({})", reason),
        };
        println!("  {:<12} {:<14} {}", info.id, info.name, status);
        println!("  {:<12} {}", "", info.description);
    }

    let defaults = WorkflowConfig::from_env()?;
    println!();
    println!(
        "Coder:    {}",
        describe_pair(&defaults.coder.primary, defaults.coder.fallback.as_deref())
    );
    println!(
        "Reviewer: {}",
        describe_pair(&defaults.reviewer.primary, defaults.reviewer.fallback.as_deref())
    );
    Ok(0)
}

fn describe_pair(primary: &str, fallback: Option<&str>) -> String {
    match fallback {
        Some(fallback) => format!("{} (fallback: {})", primary, fallback),
        None => primary.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devflow_core::{AuditDepth, ReviewFocus};

    #[test]
    fn test_flags_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let options = RunOptions {
            language: Some("go".into()),
            trunk: Some("develop".into()),
            review_focus: Some(ReviewFocus::Style),
            yes: true,
            with_tests: true,
            test_framework: Some("testify".into()),
            audit_depth: Some(AuditDepth::Deep),
        };
        let config = build_config(&options, Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(config.default_language, "go");
        assert_eq!(config.trunk_override.as_deref(), Some("develop"));
        assert_eq!(config.review_focus, ReviewFocus::Style);
        assert!(config.generate_tests);
        assert_eq!(config.test_framework.as_deref(), Some("testify"));
        assert_eq!(config.audit_depth, AuditDepth::Deep);
        assert_eq!(config.state_dir, dir.path());
    }

    #[test]
    fn test_describe_pair() {
        assert_eq!(describe_pair("gemini", Some("claude-code")), "gemini (fallback: claude-code)");
        assert_eq!(describe_pair("gemini", None), "gemini");
    }
}
