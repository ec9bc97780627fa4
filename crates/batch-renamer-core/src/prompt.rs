use crate::model::Batch;
use std::fmt::Write;

pub const SYSTEM_INSTRUCTION: &str = "You are a professional file renaming assistant. \
You write concise, clear and appealing file names.";

/// What gets sent to the generation service for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
}

/// Builds the request for `batch`. A non-blank `keyword` switches to
/// keyword mode. Same inputs always produce the same text.
///
/// Files are listed as `N. name` with their batch-local index, the same
/// format [`crate::parser::parse`] reads the reply back with.
pub fn build(batch: &Batch<'_>, keyword: Option<&str>) -> GenerationRequest {
    let count = batch.len();
    let keyword = keyword.map(str::trim).filter(|k| !k.is_empty());

    let mut prompt = String::new();
    match keyword {
        Some(keyword) => {
            let _ = writeln!(
                prompt,
                "Create new names for the following {count} files built around the keyword \"{keyword}\"."
            );
            let _ = writeln!(
                prompt,
                "Do not rely on the meaning of the original names; only the keyword matters. \
                 Give each file a distinct name."
            );
        }
        None => {
            let _ = writeln!(
                prompt,
                "Improve the following {count} file names so they are shorter, clearer and more appealing."
            );
            let _ = writeln!(prompt, "Keep the original meaning of each name.");
        }
    }
    let _ = writeln!(
        prompt,
        "Keep each file's original extension (.jpg, .mp4, ...). \
         Reply only with the numbered list below, using the same numbering, with no other commentary."
    );

    prompt.push_str("\nOriginal files:\n");
    for (i, entry) in batch.entries.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", i + 1, entry.original_name);
    }

    prompt.push_str("\nNew file names:\n");
    for i in 1..=count {
        let _ = writeln!(prompt, "{i}. [new file name {i}]");
    }

    GenerationRequest {
        system: SYSTEM_INSTRUCTION.to_string(),
        prompt,
    }
}
