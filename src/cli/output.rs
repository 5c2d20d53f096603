//! Output formatting utilities for CLI operations.

use std::io::{self, Write};

use pullboard::IntakeError;
use pullboard::azure::PullRequestSummary;
use pullboard::azure::navigation::pull_request_url;
use pullboard::pipeline::EnrichmentState;
use pullboard::pipeline::display::{
    badges, comment_cell, merge_status_label, short_branch_name, vote_label,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ID_WIDTH: usize = 7;
const TITLE_WIDTH: usize = 44;
const PERSON_WIDTH: usize = 18;
const REPOSITORY_WIDTH: usize = 16;
const DATE_WIDTH: usize = 10;
const COMMENTS_WIDTH: usize = 8;
const MERGE_WIDTH: usize = 7;

/// Everything needed to render one listing.
pub struct ListingView<'a> {
    /// Heading with the row count.
    pub title: String,
    /// Rows in display order.
    pub rows: &'a [PullRequestSummary],
    /// Comment counts and avatars loaded so far.
    pub enrichment: &'a EnrichmentState,
    /// Signed-in user, for the "Required" badge.
    pub current_user_id: &'a str,
    /// Organisation URL the permalinks are built on.
    pub base_url: &'a str,
}

/// Writes the listing as a fixed-width table followed by one permalink per
/// row.
pub fn write_listing<W: Write>(writer: &mut W, view: &ListingView<'_>) -> Result<(), IntakeError> {
    writeln!(writer, "{}", view.title).map_err(|e| io_error(&e))?;
    writeln!(writer).map_err(|e| io_error(&e))?;

    let header = [
        pad("ID", ID_WIDTH),
        pad("Title", TITLE_WIDTH),
        pad("Created by", PERSON_WIDTH),
        pad("Repository", REPOSITORY_WIDTH),
        pad("Created", DATE_WIDTH),
        pad("Comments", COMMENTS_WIDTH),
        pad("Merge", MERGE_WIDTH),
        "Reviewers".to_owned(),
    ];
    writeln!(writer, "{}", header.join(" ").trim_end()).map_err(|e| io_error(&e))?;

    for pr in view.rows {
        writeln!(writer, "{}", render_row(pr, view).trim_end()).map_err(|e| io_error(&e))?;
    }

    if view.rows.is_empty() {
        writeln!(writer, "No pull requests match the current filters.")
            .map_err(|e| io_error(&e))?;
        return Ok(());
    }

    writeln!(writer).map_err(|e| io_error(&e))?;
    for pr in view.rows {
        let url = pull_request_url(
            view.base_url,
            &pr.repository.project.name,
            &pr.repository.name,
            pr.id,
        );
        writeln!(writer, "#{} {url}", pr.id).map_err(|e| io_error(&e))?;
    }
    Ok(())
}

fn render_row(pr: &PullRequestSummary, view: &ListingView<'_>) -> String {
    let mut title = pr.title.clone();
    for badge in badges(pr, view.current_user_id) {
        title.push_str(&format!(" [{badge}]"));
    }
    let title_cell = format!(
        "{title} ({} → {})",
        short_branch_name(&pr.source_ref_name),
        short_branch_name(&pr.target_ref_name)
    );
    let reviewers: Vec<String> = pr
        .reviewers
        .iter()
        .map(|reviewer| {
            format!(
                "{} ({})",
                reviewer.identity.label(),
                vote_label(reviewer.vote)
            )
        })
        .collect();

    [
        pad(&format!("#{}", pr.id), ID_WIDTH),
        pad(&title_cell, TITLE_WIDTH),
        pad(&with_avatar_marker(pr, view.enrichment), PERSON_WIDTH),
        pad(&pr.repository.name, REPOSITORY_WIDTH),
        pad(&pr.created_at.format("%Y-%m-%d").to_string(), DATE_WIDTH),
        pad(
            &comment_cell(view.enrichment.thread_counts(pr.id)),
            COMMENTS_WIDTH,
        ),
        pad(merge_status_label(pr.merge_status), MERGE_WIDTH),
        reviewers.join(", "),
    ]
    .join(" ")
}

/// Prefixes the creator label with `*` once their avatar has loaded.
fn with_avatar_marker(pr: &PullRequestSummary, enrichment: &EnrichmentState) -> String {
    let loaded = pr
        .created_by
        .avatar_descriptor()
        .and_then(|descriptor| enrichment.avatar(&descriptor).flatten())
        .is_some();
    let marker = if loaded { "*" } else { "" };
    format!("{marker}{}", pr.created_by.label())
}

/// Truncates `text` to `width` terminal columns and pads it to exactly that
/// width.
fn pad(text: &str, width: usize) -> String {
    let mut cell = truncate_to_width(text, width);
    let used = cell.width();
    cell.push_str(&" ".repeat(width.saturating_sub(used)));
    cell
}

fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_owned();
    }
    let target_width = max_width.saturating_sub(1);
    let mut truncated = String::new();
    let mut current_width = 0;
    for ch in text.chars() {
        let char_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if current_width + char_width > target_width {
            break;
        }
        truncated.push(ch);
        current_width += char_width;
    }
    if max_width > 0 {
        truncated.push('…');
    }
    truncated
}

/// Converts an I/O error to an [`IntakeError::Io`].
pub(crate) fn io_error(error: &io::Error) -> IntakeError {
    IntakeError::Io {
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pullboard::azure::ThreadCounts;
    use pullboard::azure::models::test_support::{identity, pull_request, repository, reviewer};
    use pullboard::pipeline::EnrichmentState;
    use rstest::rstest;
    use unicode_width::UnicodeWidthStr;

    use super::{ListingView, pad, write_listing};

    #[rstest]
    #[case::short("abc", 5, "abc  ")]
    #[case::exact("abcde", 5, "abcde")]
    #[case::long("abcdefgh", 5, "abcd…")]
    #[case::wide("日本語テキスト", 6, "日本… ")]
    fn cells_are_padded_to_display_width(
        #[case] text: &str,
        #[case] width: usize,
        #[case] expected: &str,
    ) {
        let cell = pad(text, width);
        assert_eq!(cell, expected);
        assert_eq!(cell.width(), width);
    }

    #[test]
    fn listing_includes_rows_comment_counts_and_permalinks() {
        let mut pr = pull_request(42, &repository("r1", "core"), &identity("a", "Ada"));
        pr.title = "Fix login".to_owned();
        pr.reviewers = vec![reviewer(identity("me", "Grace"), 10, true)];
        let rows = vec![pr];
        let enrichment = EnrichmentState::default().with_thread_counts(
            42,
            ThreadCounts {
                resolved: 1,
                total: 3,
            },
        );
        let view = ListingView {
            title: "Active Pull Requests (1)".to_owned(),
            rows: &rows,
            enrichment: &enrichment,
            current_user_id: "me",
            base_url: "https://dev.azure.com/contoso/",
        };

        let mut buffer = Vec::new();
        write_listing(&mut buffer, &view).expect("should write listing");

        let output = String::from_utf8(buffer).expect("output should be valid UTF-8");
        assert!(output.starts_with("Active Pull Requests (1)"), "{output}");
        assert!(output.contains("Fix login [Required]"), "{output}");
        assert!(output.contains("1/3"), "{output}");
        assert!(output.contains("Grace (Approved)"), "{output}");
        assert!(
            output.contains("#42 https://dev.azure.com/contoso/Platform/_git/core/pullRequest/42"),
            "{output}"
        );
    }

    #[test]
    fn empty_listing_says_so() {
        let enrichment = EnrichmentState::default();
        let view = ListingView {
            title: "Active Pull Requests (0)".to_owned(),
            rows: &[],
            enrichment: &enrichment,
            current_user_id: "me",
            base_url: "https://dev.azure.com/contoso/",
        };

        let mut buffer = Vec::new();
        write_listing(&mut buffer, &view).expect("should write listing");

        let output = String::from_utf8(buffer).expect("output should be valid UTF-8");
        assert!(output.contains("No pull requests match the current filters."));
    }
}
