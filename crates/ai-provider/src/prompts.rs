//! Prompt builders and response cleanup.
//!
//! These are pure string functions: callers gather the git context (diff,
//! commit list, file names) and pass it in, so the builders stay testable
//! without a repository or a provider binary.

/// Diffs are truncated before being embedded in a prompt; full diffs blow
/// past provider context limits and the head carries the signal anyway.
pub const DIFF_PROMPT_LIMIT: usize = 3000;

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Conventional-commits message prompt seeded with the (truncated) diff.
/// A configured custom prompt replaces the instruction but keeps the context.
pub fn commit_message(diff: &str, custom: Option<&str>, max_chars: u32) -> String {
    let context = format!("Changes:\n{}", truncate(diff, DIFF_PROMPT_LIMIT));
    match custom {
        Some(c) => format!("{c}\n\n{context}"),
        None => format!(
            "Generate a concise git commit message for these changes. \
             Follow conventional commits format (type(scope): description).\n\
             Keep it under {max_chars} characters. \
             Only return the commit message, nothing else.\n\n{context}"
        ),
    }
}

/// Kebab-case branch name prompt from a task description.
pub fn branch_name(description: &str, custom: Option<&str>) -> String {
    match custom {
        Some(c) => format!("{c}\n\nDescription: {description}"),
        None => format!(
            "Generate a short, kebab-case git branch name for the following task description.\n\
             Rules:\n\
             - Use only lowercase letters, numbers, and hyphens\n\
             - Start with a type prefix if obvious (feature/, fix/, chore/)\n\
             - Keep it under 50 characters\n\
             - Return ONLY the branch name\n\n\
             Description: {description}"
        ),
    }
}

/// Summary prompt over a block of one-line commit entries.
pub fn commit_summary(commits: &str) -> String {
    format!(
        "Summarize these recent git commits in 2-3 sentences. \
         Focus on what was changed and why it matters:\n\n{commits}\n\n\
         Return only the summary, nothing else."
    )
}

/// README scaffold prompt for a new project.
pub fn readme(project_name: &str, context: &str) -> String {
    let context_line = if context.is_empty() {
        String::new()
    } else {
        format!("Context: {context}\n")
    };
    format!(
        "Generate a professional README.md file for a project named \"{project_name}\".\n\
         {context_line}\n\
         Include:\n\
         - Project title and brief description\n\
         - Getting Started section with installation and usage\n\
         - Basic project structure if applicable\n\
         - License (MIT)\n\n\
         Return only the markdown content, no explanations."
    )
}

/// One-sentence project description prompt.
pub fn project_description(project_name: &str, files: &[String]) -> String {
    let file_hint = if files.is_empty() {
        String::new()
    } else {
        format!(" with files: {}", files.join(", "))
    };
    format!(
        "Generate a brief one-sentence description for a project named \
         \"{project_name}\"{file_hint}.\n\
         Keep it under 100 characters. Return only the description, nothing else."
    )
}

// ---------------------------------------------------------------------------
// Response cleanup
// ---------------------------------------------------------------------------

/// Reduce a model response to its first line, with surrounding quotes removed.
/// Providers routinely wrap single-line answers in quotes or add trailing chat.
pub fn clean_single_line(response: &str) -> String {
    let line = response.trim().lines().next().unwrap_or("").trim();
    line.trim_matches(|c| c == '"' || c == '\'').to_string()
}

/// Cleanup for generated branch names: single line, quotes stripped,
/// whitespace runs collapsed to hyphens.
pub fn clean_branch_name(response: &str) -> String {
    clean_single_line(response)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Char-boundary-safe truncation (byte slicing could split a UTF-8 sequence).
fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_prompt_mentions_conventional_commits() {
        let p = commit_message("+fn main() {}", None, 72);
        assert!(p.contains("conventional commits"));
        assert!(p.contains("under 72 characters"));
        assert!(p.contains("+fn main() {}"));
    }

    #[test]
    fn commit_prompt_custom_replaces_instruction() {
        let p = commit_message("+x", Some("Write it in pirate speak."), 72);
        assert!(p.starts_with("Write it in pirate speak."));
        assert!(p.contains("Changes:\n+x"));
        assert!(!p.contains("conventional commits"));
    }

    #[test]
    fn commit_prompt_truncates_long_diffs() {
        let diff = "x".repeat(10_000);
        let p = commit_message(&diff, None, 72);
        let embedded = p.split("Changes:\n").nth(1).unwrap();
        assert_eq!(embedded.chars().count(), DIFF_PROMPT_LIMIT);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let s = "héllo wörld";
        assert_eq!(truncate(s, 4), "héll");
        assert_eq!(truncate(s, 100), s);
    }

    #[test]
    fn clean_single_line_strips_quotes_and_chat() {
        assert_eq!(
            clean_single_line("\"feat: add login\"\n\nHope that helps!"),
            "feat: add login"
        );
        assert_eq!(clean_single_line("  'fix: typo'  "), "fix: typo");
    }

    #[test]
    fn clean_branch_name_kebabs_whitespace() {
        assert_eq!(
            clean_branch_name("feature/new login flow\n"),
            "feature/new-login-flow"
        );
    }

    #[test]
    fn summary_prompt_embeds_commits() {
        let p = commit_summary("abc123 feat: a\ndef456 fix: b");
        assert!(p.contains("abc123 feat: a"));
        assert!(p.contains("2-3 sentences"));
    }

    #[test]
    fn description_prompt_lists_files() {
        let p = project_description("widget", &["src".into(), "Cargo.toml".into()]);
        assert!(p.contains("src, Cargo.toml"));
    }
}
