//! Prompt templates for diff analysis and result merging.

use crate::data::{BatchGenerationResult, Language};
use crate::llm::ai::openai::OUTPUT_TOOL_NAME;

/// Output rules shared by the analysis and merge prompts.
const OUTPUT_FORMAT_RULES: &str = r#"## Output Fields

1. **commit**: a conventional commit message, `<type>(<scope>): <description>`
   - Types: feat, fix, docs, style, refactor, test, chore
   - Imperative mood, lowercase description, no trailing period
   - Keep the whole message under 72 characters
2. **branch**: a branch name in the form `<type>/<kebab-case-words>`
   - ALWAYS in English, whatever the output language
   - Lowercase letters, digits and dashes only; no spaces
   - Example: `feat/add-user-login`
3. **description**: a merge request description in markdown with the three
   sections listed below
4. **title**: a short human-readable summary of the change"#;

/// What a single analysis request covers.
#[derive(Debug, Clone, Copy)]
pub enum PromptScope<'a> {
    /// The whole diff fits in one request.
    FullDiff,
    /// One packed batch out of several.
    Batch {
        /// 1-based batch number.
        index: usize,
        /// Number of batches.
        total: usize,
        /// Files whose changes appear in this batch.
        files: &'a [String],
    },
}

/// Appends the language and section-heading rules.
fn push_language_rules(prompt: &mut String, language: Language) {
    let headings = language.headings();
    prompt.push_str(&format!(
        "\n\n## Language\n\nWrite `commit` description text, `description` and `title` in {}. \
         The `branch` name stays in English.\n\n## Description Sections\n\n\
         Use exactly these level-2 headings, in this order:\n\
         - `## {}`: the concrete changes, as bullet points\n\
         - `## {}`: the motivation behind the changes\n\
         - `## {}`: steps a reviewer can follow to verify the changes",
        language.name(),
        headings.what_changed,
        headings.why,
        headings.how_to_test
    ));
}

/// Appends the response-format instruction.
fn push_response_rules(prompt: &mut String, uses_tools: bool) {
    if uses_tools {
        prompt.push_str(&format!(
            "\n\n## Response Format\n\nCall the `{OUTPUT_TOOL_NAME}` function with all four fields. \
             Do not answer with plain text."
        ));
    } else {
        prompt.push_str(
            "\n\n## Response Format\n\nRespond with ONLY a JSON object with the string fields \
             \"commit\", \"branch\", \"description\" and \"title\". \
             Do not include explanatory text or markdown wrappers.",
        );
    }
}

/// Generates the system prompt for analysing a diff or one batch of it.
pub fn generate_system_prompt(
    language: Language,
    scope: &PromptScope<'_>,
    uses_tools: bool,
) -> String {
    let mut prompt = String::from(
        "You are an expert software engineer who writes commit messages, branch names and \
         merge request descriptions from unified diffs. Base every statement on the actual \
         added (+) and removed (-) lines, not on file names alone.\n\n",
    );
    prompt.push_str(OUTPUT_FORMAT_RULES);

    if let PromptScope::Batch { index, total, files } = scope {
        prompt.push_str(&format!(
            "\n\n## Partial Change\n\nYou are seeing batch {index} of {total} of a larger change. \
             This batch covers {} file(s). Other files are analysed separately and the results \
             will be merged later, so describe only what this batch shows and do not assume \
             it is the complete change.",
            files.len()
        ));
    }

    push_language_rules(&mut prompt, language);
    push_response_rules(&mut prompt, uses_tools);
    prompt
}

/// Generates the user prompt carrying the diff text.
pub fn generate_user_prompt(diff: &str, scope: &PromptScope<'_>) -> String {
    let mut prompt = String::new();
    match scope {
        PromptScope::FullDiff => {
            prompt.push_str("Analyze the following diff and generate the commit message, branch name, merge request description and title.\n\n");
        }
        PromptScope::Batch {
            index,
            total,
            files,
        } => {
            prompt.push_str(&format!(
                "Analyze batch {index}/{total} of the diff. It contains changes to these {} file(s):\n",
                files.len()
            ));
            for file in *files {
                prompt.push_str(&format!("- {file}\n"));
            }
            prompt.push_str("\nGenerate the commit message, branch name, merge request description and title for these changes only.\n\n");
        }
    }

    prompt.push_str("```diff\n");
    prompt.push_str(diff);
    if !diff.ends_with('\n') {
        prompt.push('\n');
    }
    prompt.push_str("```");
    prompt
}

/// Generates the system prompt for merging several batch results.
pub fn generate_merge_system_prompt(language: Language, uses_tools: bool) -> String {
    let mut prompt = String::from(
        "You are an expert software engineer. A large change was analysed in several batches \
         and each batch produced its own commit message, branch name, description and title. \
         Merge them into ONE consistent result for the whole change.\n\n\
         ## Merge Rules\n\n\
         - Pick the most significant change type across batches \
           (feat > fix > refactor > test > docs > style > chore)\n\
         - Write one commit message that summarises the overall change\n\
         - Choose one branch name that fits the overall change\n\
         - Combine all descriptions into one, removing duplicates but keeping every distinct change\n\
         - Combine the titles into one short title\n\n",
    );
    prompt.push_str(OUTPUT_FORMAT_RULES);
    push_language_rules(&mut prompt, language);
    push_response_rules(&mut prompt, uses_tools);
    prompt
}

/// Generates the user prompt listing every batch result verbatim.
pub fn generate_merge_user_prompt(results: &[BatchGenerationResult]) -> String {
    let mut prompt = format!(
        "Merge the following {} batch results into a single result.\n",
        results.len()
    );
    for (i, result) in results.iter().enumerate() {
        prompt.push_str(&format!(
            "\n=== Batch {} ===\ncommit: {}\nbranch: {}\ntitle: {}\ndescription:\n{}\n",
            i + 1,
            result.commit,
            result.branch,
            result.title,
            result.description
        ));
    }
    prompt
}
