//! Summary table printed at the end of a run.
//!
//! One row per external, then the top-level record:
//!
//! ```text
//! External   | fetch:remote/tag/branch  | merge stat | merge branch | merge tag | pushed
//!            | (status 0 is success)    |            |
//! ----------------------------------------------------
//! foo        | 0/0/0 | 0 | update/cesm2_3_beta17/foo | v2.0.004 | None
//! ```
//!
//! Missing fields print as `None` so every row has the same columns.

use std::fmt::Display;

use crate::records::{ExternalRecord, UpdateSet};

const ABSENT: &str = "None";

fn field<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| ABSENT.to_string(), |v| v.to_string())
}

fn row(record: &ExternalRecord, top_level: bool) -> String {
    let fetch = record.fetch.as_ref();
    let merge = record.merge.as_ref();

    let remote = field(fetch.and_then(|f| f.remote));
    let tag = if top_level {
        "_".to_string()
    } else {
        field(fetch.and_then(|f| f.tag))
    };
    let branch = field(fetch.and_then(|f| f.branch));

    format!(
        "{:10} | {}/{}/{} | {} | {} | {} | {}",
        record.name,
        remote,
        tag,
        branch,
        field(merge.and_then(|m| m.stat)),
        field(merge.and_then(|m| m.branch.as_deref())),
        field(merge.and_then(|m| m.tag.as_deref())),
        field(merge.and_then(|m| m.push)),
    )
}

/// Render the summary table for `set`.
pub fn render(set: &UpdateSet) -> String {
    let mut out = String::new();
    out.push_str(
        "External   | fetch:remote/tag/branch  | merge stat | merge branch | merge tag | pushed\n",
    );
    out.push_str("           | (status 0 is success)    |            |\n");
    out.push_str(&"-".repeat(52));
    out.push('\n');

    for record in set.externals() {
        out.push_str(&row(record, false));
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&row(&set.model, true));
    out.push('\n');
    out
}

/// Print the summary table to stdout.
pub fn print(set: &UpdateSet) {
    println!("\n\n{}", render(set));
}
