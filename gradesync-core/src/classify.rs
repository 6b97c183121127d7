//! Assignment classification and intra-category ordering.
//!
//! Titles are matched against an ordered list of keyword rules. Rules are
//! evaluated independently: a title that matches several rules belongs to
//! every matching category when bucketing, and `classify` reports the first
//! match in rule order. The only overlap resolved by a rule itself is
//! Postterm vs Discussion, which the Postterm rule excludes.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::assignment::AssignmentRecord;
use crate::formula::{DISCUSSION_COMPLETION_FORMULA, GRADE_RETRIEVAL_FORMULA};

static FIRST_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").unwrap());

const OPTIONAL_MARKER: &str = "optional";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Labs,
    Discussions,
    Projects,
    LectureQuizzes,
    Midterms,
    Postterms,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Labs,
        Category::Discussions,
        Category::Projects,
        Category::LectureQuizzes,
        Category::Midterms,
        Category::Postterms,
    ];

    /// Title of the category's subsheet in the target spreadsheet.
    pub fn sheet_title(&self) -> &'static str {
        match self {
            Category::Labs => "Labs",
            Category::Discussions => "Discussions",
            Category::Projects => "Projects",
            Category::LectureQuizzes => "Lecture Quizzes",
            Category::Midterms => "Midterms",
            Category::Postterms => "Postterms",
        }
    }

    /// Cell formula repeated down every column of this category's block.
    pub fn formula(&self) -> &'static str {
        match self {
            Category::Discussions => DISCUSSION_COMPLETION_FORMULA,
            _ => GRADE_RETRIEVAL_FORMULA,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sheet_title())
    }
}

/// A classification rule. Titles are lowercased before the predicate runs.
pub struct Rule {
    pub category: Category,
    predicate: fn(&str) -> bool,
}

impl Rule {
    pub fn matches(&self, lowered_title: &str) -> bool {
        (self.predicate)(lowered_title)
    }
}

/// Rules in evaluation order. Order decides what `classify` returns for a
/// title that matches more than one rule.
pub static RULES: [Rule; 6] = [
    Rule {
        category: Category::Labs,
        predicate: |t| t.contains("lab"),
    },
    Rule {
        category: Category::Discussions,
        predicate: |t| t.contains("discussion"),
    },
    Rule {
        category: Category::Projects,
        predicate: |t| t.contains("project"),
    },
    Rule {
        category: Category::LectureQuizzes,
        predicate: |t| t.contains("lecture"),
    },
    Rule {
        category: Category::Midterms,
        predicate: |t| t.contains("midterm"),
    },
    Rule {
        category: Category::Postterms,
        predicate: |t| {
            (t.contains("postterm") || t.contains("posterm")) && !t.contains("discussion")
        },
    },
];

/// Optional assignments are never synchronized.
pub fn is_optional(title: &str) -> bool {
    title.to_lowercase().contains(OPTIONAL_MARKER)
}

/// Every category whose rule matches `title`, in rule order.
///
/// Returns an empty list for optional assignments.
pub fn matching_categories(title: &str) -> Vec<Category> {
    if is_optional(title) {
        return Vec::new();
    }
    let lowered = title.to_lowercase();
    RULES
        .iter()
        .filter(|rule| rule.matches(&lowered))
        .map(|rule| rule.category)
        .collect()
}

/// The first matching category in rule order, or `None` when the title is
/// optional or matches no rule.
pub fn classify(title: &str) -> Option<Category> {
    matching_categories(title).into_iter().next()
}

/// First run of ASCII decimal digits in `title`, or 0 if there is none.
///
/// Other Unicode digits don't count as part of a run. Runs too large for a
/// `u64` saturate to `u64::MAX`.
pub fn extract_ordering_key(title: &str) -> u64 {
    FIRST_NUMBER
        .find(title)
        .map(|m| m.as_str().parse::<u64>().unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Stable sort by ordering key, ties broken by title.
pub fn sort_titles(titles: &mut [String]) {
    titles.sort_by(|a, b| {
        extract_ordering_key(a)
            .cmp(&extract_ordering_key(b))
            .then_with(|| a.cmp(b))
    });
}

/// Group assignments by category.
///
/// Each bucket is sorted with [`sort_titles`] order and holds each title at
/// most once (first occurrence wins). Categories without assignments are
/// absent from the map. Unclassifiable titles are dropped without error.
pub fn bucket(assignments: &[AssignmentRecord]) -> BTreeMap<Category, Vec<AssignmentRecord>> {
    let mut buckets: BTreeMap<Category, Vec<AssignmentRecord>> = BTreeMap::new();
    let mut seen: HashSet<(Category, &str)> = HashSet::new();

    for record in assignments {
        let categories = matching_categories(&record.title);
        match categories.len() {
            0 => {
                log::debug!("Skipping unclassified assignment '{}'", record.title);
                continue;
            }
            1 => {}
            _ => log::debug!(
                "Assignment '{}' matches several categories: {:?}",
                record.title,
                categories
            ),
        }

        for category in categories {
            if seen.insert((category, record.title.as_str())) {
                buckets.entry(category).or_default().push(record.clone());
            }
        }
    }

    for records in buckets.values_mut() {
        records.sort_by(|a, b| {
            extract_ordering_key(&a.title)
                .cmp(&extract_ordering_key(&b.title))
                .then_with(|| a.title.cmp(&b.title))
        });
    }

    buckets
}
