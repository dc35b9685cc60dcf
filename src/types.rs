/// Core domain types for coderev chunks, verdicts, and statuses.

/// Keywords whose presence in a review marks the file as having issues.
/// Matched case-insensitively as substrings of the aggregated comments.
const ISSUE_KEYWORDS: [&str; 6] = ["problem", "issue", "warning", "missing", "error", "fix"];

/// A bounded slice of a file's content, submitted independently for review.
/// Boundaries are character offsets only, never semantic structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position of this chunk within its parent file.
    pub index: usize,
    /// The chunk's text. Concatenating all chunks of a file in index order
    /// reproduces the file content exactly.
    pub text: String,
    /// Total number of chunks produced for the parent file.
    pub total: usize,
}

/// Aggregated review outcome for one file, ready to be checkpointed.
#[derive(Debug, Clone)]
pub struct FileReviewResult {
    /// Joined chunk verdicts, or the failure message for `Error` outcomes.
    pub comments: String,
    /// Path of the reviewed file, as enumerated by the walker.
    pub path: std::path::PathBuf,
    /// Classification of the aggregated comments.
    pub status: ReviewStatus,
}

/// Classification of a file's aggregated review comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStatus {
    /// No review text could be produced at all.
    Error,
    /// At least one issue keyword appeared in the review.
    IssueFound,
    /// The review produced text containing no issue keyword.
    NoMajorIssues,
}

impl ReviewStatus {
    /// The status string stored in checkpoint rows.
    pub fn as_str(self) -> &'static str {
        return match self {
            ReviewStatus::Error => "Error",
            ReviewStatus::IssueFound => "Issue Found",
            ReviewStatus::NoMajorIssues => "No Major Issues",
        };
    }

    /// Classify aggregated review comments by keyword scan.
    /// Empty comments mean no review was produced, which is an error.
    pub fn classify(comments: &str) -> Self {
        if comments.is_empty() {
            return ReviewStatus::Error;
        }
        let lowered = comments.to_lowercase();
        if ISSUE_KEYWORDS.iter().any(|keyword| return lowered.contains(keyword)) {
            return ReviewStatus::IssueFound;
        }
        return ReviewStatus::NoMajorIssues;
    }
}

impl std::fmt::Display for ReviewStatus {
    /// Delegate to the checkpoint status string.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f.write_str(self.as_str());
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn keyword_anywhere_in_comments_flags_an_issue() {
        let comments = "The import path is wrong; you should FIX line 3.";
        assert_eq!(ReviewStatus::classify(comments), ReviewStatus::IssueFound);
    }

    #[test]
    fn keyword_match_is_case_insensitive_substring() {
        assert_eq!(
            ReviewStatus::classify("One WARNING was emitted."),
            ReviewStatus::IssueFound
        );
        // "prefix" contains "fix" as a substring, which counts.
        assert_eq!(
            ReviewStatus::classify("Renamed the prefix constant."),
            ReviewStatus::IssueFound
        );
    }

    #[test]
    fn clean_comments_classify_as_no_major_issues() {
        assert_eq!(
            ReviewStatus::classify("Well structured. Nothing to flag."),
            ReviewStatus::NoMajorIssues
        );
    }

    #[test]
    fn empty_comments_classify_as_error() {
        assert_eq!(ReviewStatus::classify(""), ReviewStatus::Error);
    }
}
