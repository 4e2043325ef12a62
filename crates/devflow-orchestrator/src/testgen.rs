//! Test generation for changed source files.
//!
//! The Reviewer is asked for a test file per changed source file. Test files
//! are named after the source by the usual convention of its language and
//! placed under `tests/`.

use std::path::Path;

use devflow_core::is_source_file;

/// Directory generated test files are written to.
pub const TESTS_DIR: &str = "tests";

/// Source files given tests per run.
pub const MAX_TEST_TARGETS: usize = 3;

/// Test framework used for `language` when none is configured.
pub fn default_framework(language: &str) -> &'static str {
    match language {
        "javascript" | "typescript" => "jest",
        "python" => "pytest",
        "java" | "kotlin" => "junit",
        "go" => "the standard testing package",
        "rust" => "the built-in test harness",
        "ruby" => "rspec",
        "php" => "phpunit",
        "csharp" => "xunit",
        _ => "the standard test framework of the language",
    }
}

/// Conventional test file name for `source`, or `None` without an extension.
///
/// `auth.js` gives `auth.test.js`, `auth.py` gives `test_auth.py`,
/// `Auth.java` gives `AuthTest.java` and anything else `auth_test.<ext>`.
pub fn test_file_name(source: &str) -> Option<String> {
    let path = Path::new(source);
    let stem = path.file_stem()?.to_str()?;
    let ext = path.extension()?.to_str()?;
    let name = match ext {
        "js" | "ts" | "jsx" | "tsx" => format!("{}.test.{}", stem, ext),
        "py" => format!("test_{}.py", stem),
        "java" => format!("{}Test.java", stem),
        _ => format!("{}_test.{}", stem, ext),
    };
    Some(name)
}

/// Relative path of the test file for `source`.
pub fn test_file_path(source: &str) -> Option<String> {
    test_file_name(source).map(|name| format!("{}/{}", TESTS_DIR, name))
}

/// Whether `path` already looks like a test file.
fn is_test_file(path: &str) -> bool {
    let path = Path::new(path);
    if path
        .components()
        .any(|c| matches!(c.as_os_str().to_str(), Some("tests" | "test" | "__tests__")))
    {
        return true;
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.starts_with("test_")
        || name.contains(".test.")
        || name.contains(".spec.")
        || name.contains("_test.")
        || name.ends_with("Test.java")
}

/// Changed files worth generating tests for: source code that is not
/// already a test, at most [`MAX_TEST_TARGETS`].
pub fn test_targets(changed: &[String]) -> Vec<String> {
    changed
        .iter()
        .filter(|file| !is_test_file(file) && is_source_file(Path::new(file.as_str())))
        .take(MAX_TEST_TARGETS)
        .cloned()
        .collect()
}

/// The body of the first fenced code block in `reply`, or the whole reply.
pub fn extract_code(reply: &str) -> Option<String> {
    let is_fence = |line: &&str| line.trim_start().starts_with("```");
    let lines: Vec<&str> = reply.lines().collect();
    let code = match lines.iter().position(is_fence) {
        Some(start) => {
            let body = &lines[start + 1..];
            let end = body.iter().position(is_fence).unwrap_or(body.len());
            body[..end].join("\n")
        }
        None => reply.to_string(),
    };
    let code = code.trim_matches('\n');
    (!code.trim().is_empty()).then(|| format!("{}\n", code))
}
