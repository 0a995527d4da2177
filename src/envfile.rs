use crate::display::{print_info, print_success};
use crate::error::SupakeyError;
use crate::fs_utils::replace_file_atomic;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;

/// What an update did to the env file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UpdateOutcome {
    Replaced { lines: usize },
    Appended,
}

/// Point `variable` at `key` in the env file, replacing existing assignments
/// or appending one. All other lines are written back untouched.
pub fn update_env_file(
    env_file: &Path,
    variable: &str,
    key: &str,
) -> Result<UpdateOutcome, SupakeyError> {
    let content = fs::read_to_string(env_file).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            SupakeyError::EnvFileNotFound(env_file.to_path_buf())
        } else {
            SupakeyError::Io(e)
        }
    })?;

    let (new_content, outcome) = render_update(&content, variable, key);
    replace_file_atomic(env_file, &new_content)?;

    match outcome {
        UpdateOutcome::Replaced { .. } => print_success(&format!("Updated existing {}", variable)),
        UpdateOutcome::Appended => print_success(&format!("Added new {}", variable)),
    }
    print_info(&format!(
        "📝 {} updated successfully!",
        env_file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(".env.local")
    ));

    Ok(outcome)
}

/// Pure text side of [`update_env_file`].
pub fn render_update(content: &str, variable: &str, key: &str) -> (String, UpdateOutcome) {
    let assignment = format!("{}=\"{}\"", variable, key);
    let mut output = String::with_capacity(content.len() + assignment.len() + 1);
    let mut replaced = 0;

    for segment in content.split_inclusive('\n') {
        let (body, ending) = split_line_ending(segment);
        match assignment_offset(body, variable) {
            Some(offset) => {
                output.push_str(&body[..offset]);
                output.push_str(&assignment);
                output.push_str(ending);
                replaced += 1;
            }
            None => output.push_str(segment),
        }
    }

    if replaced > 0 {
        return (output, UpdateOutcome::Replaced { lines: replaced });
    }

    let trimmed = content.trim_end();
    let appended = if trimmed.is_empty() {
        format!("{}\n", assignment)
    } else {
        format!("{}\n{}\n", trimmed, assignment)
    };
    (appended, UpdateOutcome::Appended)
}

fn split_line_ending(segment: &str) -> (&str, &str) {
    if let Some(body) = segment.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = segment.strip_suffix('\n') {
        (body, "\n")
    } else {
        (segment, "")
    }
}

/// Byte offset where `VARIABLE=` starts if this line assigns `variable`.
/// Leading whitespace and a shell `export ` prefix are kept in place;
/// comments never match.
fn assignment_offset(line: &str, variable: &str) -> Option<usize> {
    let rest = line.trim_start();
    let rest = match rest.strip_prefix("export ") {
        Some(after) => after.trim_start(),
        None => rest,
    };

    rest.strip_prefix(variable)
        .filter(|after| after.starts_with('='))
        .map(|_| line.len() - rest.len())
}
