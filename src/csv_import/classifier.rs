//! A static keyword table for categorising bulk-imported transactions.

use crate::category::{Category, CategoryId, CategoryRole};

/// The display name of the catch-all category used when no keyword group
/// matches and no category carries the fallback role.
const FALLBACK_CATEGORY_NAME: &str = "Other";

/// Keyword groups in match order: the first group with a keyword contained in
/// the description wins. Keywords are lower case; matching is by substring.
const KEYWORD_GROUPS: &[(&str, &[&str])] = &[
    (
        "Groceries",
        &[
            "grocery", "groceries", "supermarket", "walmart", "countdown", "pak n save",
            "pak'n save", "new world", "four square", "aldi",
        ],
    ),
    (
        "Dining",
        &[
            "restaurant", "cafe", "coffee", "starbucks", "mcdonald", "takeaway", "pizza",
            "sushi", "bakery", "burger",
        ],
    ),
    (
        "Transport",
        &[
            "fuel", "petrol", "uber", "lyft", "taxi", "parking", "transit", "train", "airline",
            "z energy",
        ],
    ),
    (
        "Entertainment",
        &[
            "cinema", "movie", "netflix", "spotify", "steam", "concert", "theatre", "ticketek",
        ],
    ),
    (
        "Shopping",
        &[
            "amazon", "ebay", "warehouse", "kmart", "clothing", "retail", "store",
        ],
    ),
    (
        "Bills & Utilities",
        &[
            "power", "electricity", "water", "internet", "broadband", "vodafone", "insurance",
            "rates", "utility",
        ],
    ),
    (
        "Healthcare",
        &[
            "pharmacy", "chemist", "doctor", "dental", "medical", "hospital", "physio",
        ],
    ),
    (
        "Income",
        &[
            "salary", "wages", "payroll", "interest", "dividend", "refund", "reimbursement",
        ],
    ),
];

/// Pick a category for a bulk-imported transaction from a fixed keyword
/// table.
///
/// The first keyword group with a keyword contained in the description
/// (case-insensitive) names the target category; the category of that name is
/// looked up in `categories`, the caller's snapshot of the owner's
/// categories. When no group matches — or the named category does not exist —
/// the fallback bucket is used: the category with the
/// [CategoryRole::UncategorisedFallback] role, or failing that the one
/// literally named "Other". Returns `None` when there is no fallback either.
pub fn classify_description(description: &str, categories: &[Category]) -> Option<CategoryId> {
    let description = description.to_lowercase();

    let matched_group = KEYWORD_GROUPS.iter().find(|(_, keywords)| {
        keywords
            .iter()
            .any(|keyword| description.contains(keyword))
    });

    if let Some((name, _)) = matched_group {
        if let Some(category) = find_category_by_name(categories, name) {
            return Some(category.id);
        }
    }

    fallback_category(categories).map(|category| category.id)
}

fn find_category_by_name<'a>(categories: &'a [Category], name: &str) -> Option<&'a Category> {
    categories
        .iter()
        .find(|category| category.name.as_ref().eq_ignore_ascii_case(name))
}

fn fallback_category(categories: &[Category]) -> Option<&Category> {
    categories
        .iter()
        .find(|category| category.role == Some(CategoryRole::UncategorisedFallback))
        .or_else(|| find_category_by_name(categories, FALLBACK_CATEGORY_NAME))
}
