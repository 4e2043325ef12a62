//! Prompt templates sent to agents.

use devflow_core::ReviewFocus;
use devflow_models::{truncate_context, Task};

/// Prompt asking the Coder to implement a feature in the working tree.
pub fn code_generation(task: &Task) -> String {
    let mut parts = vec![
        format!("I need to implement a feature in {}:", task.language_hint()),
        format!("Feature: {}", task.raw_input()),
    ];
    if !task.context().is_empty() {
        parts.push(String::new());
        parts.push("Context:".to_string());
        parts.push(task.context().to_string());
    }
    parts.extend(
        [
            "",
            "Please:",
            "1. Create the necessary files for this feature in the current directory",
            "2. Write clean, well-documented code",
            "3. Follow the conventions of the language",
            "4. Include proper error handling",
            "5. Add comments where the implementation is not obvious",
            "",
            "Generate the complete implementation ready for production use.",
        ]
        .map(str::to_string),
    );
    parts.join("\n")
}

/// Prompt asking the Coder for integration code against a remote resource.
pub fn integration(task: &Task) -> String {
    let language = task.language_hint();
    let content = if task.context().is_empty() {
        "(content could not be fetched; retrieve it yourself if you can)"
    } else {
        task.context()
    };
    format!(
        "Help me implement integration code for this resource.\n\
         \n\
         Source: {source}\n\
         Target language: {language}\n\
         \n\
         Content:\n\
         {content}\n\
         \n\
         Please:\n\
         1. Identify what a {language} client needs from this resource\n\
         2. Write the integration code to files in the current directory\n\
         3. Include error handling and input validation\n\
         4. Consider security implications such as credentials and untrusted data\n\
         \n\
         Generate ready-to-use {language} code.",
        source = task.raw_input(),
    )
}

fn focus_checklist(focus: ReviewFocus) -> (&'static str, &'static [&'static str], &'static str) {
    match focus {
        ReviewFocus::Security => (
            "Perform a security review of this code. Look for:",
            &[
                "Injection vectors (SQL, command, template)",
                "Cross-site scripting",
                "Authentication and authorization flaws",
                "Input validation problems",
                "Data exposure and secret handling",
                "Cryptographic weaknesses",
                "File system and network security issues",
                "Dependency vulnerabilities",
            ],
            "Provide specific security recommendations and fixes.",
        ),
        ReviewFocus::Performance => (
            "Analyze this code for performance issues. Look at:",
            &[
                "Algorithmic complexity",
                "Memory usage and allocations",
                "I/O efficiency",
                "Caching opportunities",
                "Resource management",
                "Scalability concerns",
            ],
            "Provide specific performance improvements.",
        ),
        ReviewFocus::Style => (
            "Review this code for style and readability. Look at:",
            &[
                "Organization and structure",
                "Naming conventions",
                "Documentation and comments",
                "Duplication",
                "Idiomatic use of the language",
                "Maintainability",
            ],
            "Provide specific style recommendations.",
        ),
        ReviewFocus::General => (
            "Perform a code review covering:",
            &[
                "Correctness and code quality",
                "Security vulnerabilities",
                "Performance considerations",
                "Style and maintainability",
                "Testing and documentation",
            ],
            "Provide a thorough analysis with specific recommendations.",
        ),
    }
}

/// Prompt asking the Reviewer to evaluate `code`.
///
/// `subject` names what is being reviewed (a file path, a feature).
pub fn review(focus: ReviewFocus, language: &str, subject: &str, code: &str) -> String {
    let (intro, items, closing) = focus_checklist(focus);
    let checklist: Vec<String> = items.iter().map(|item| format!("- {}", item)).collect();
    format!(
        "{intro}\n{checklist}\n\nSubject: {subject}\nLanguage: {language}\n\nCode:\n```\n{code}\n```\n\n{closing}",
        checklist = checklist.join("\n"),
    )
}

/// Prompt asking for a test file covering `code`.
pub fn test_generation(framework: &str, language: &str, source: &str, code: &str) -> String {
    format!(
        "Generate comprehensive test cases for this code using {framework}.\n\
         \n\
         Requirements:\n\
         - Thorough unit tests for the public behaviour\n\
         - Edge cases and boundary conditions\n\
         - Error scenarios and exception handling\n\
         - Setup and teardown where needed\n\
         - Descriptive test names\n\
         \n\
         Source file: {source}\n\
         Language: {language}\n\
         Testing framework: {framework}\n\
         \n\
         Source code:\n\
         ```\n\
         {code}\n\
         ```\n\
         \n\
         Reply with the complete, runnable test file only, in a single code block."
    )
}

/// Prompt asking for a conventional commit message for a staged diff.
pub fn commit_message(diff: &str, reviews: &[String]) -> String {
    let mut diff = diff.to_string();
    truncate_context(&mut diff);

    let mut prompt = String::from(
        "Write a conventional commit message (for example `feat: add login form`) \
         for the staged changes below. Reply with the commit message only, no \
         explanation and no code fences.\n\nStaged diff:\n",
    );
    prompt.push_str(&diff);

    if !reviews.is_empty() {
        prompt.push_str("\n\nReview notes:\n");
        for review in reviews {
            let first = review.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
            prompt.push_str(&format!("- {}\n", first.trim()));
        }
    }
    prompt
}
