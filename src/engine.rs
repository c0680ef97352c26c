//! Filtering, sorting and paging of the loaded collection.
//!
//! Everything in here is a pure function of the collection and a [`Query`].
//! The model calls [`derive`] whenever one of its inputs changes and hands the
//! result to the ui.

use std::cmp::Ordering;
use std::collections::HashSet;

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::company::{Company, SortOrder};
use crate::domain::{ALL_INDUSTRIES, ALL_LOCATIONS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub search_term: String,
    pub industry: String,
    pub location: String,
    pub sort_order: SortOrder,
    /// 1-based
    pub current_page: usize,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            industry: String::new(),
            location: String::new(),
            sort_order: SortOrder::Ascending,
            current_page: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Facets {
    pub industries: Vec<String>,
    pub locations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Derived {
    pub page: Vec<Company>,
    pub total_matches: usize,
    pub total_pages: usize,
}

/// Distinct industries and locations in first-seen order, each list headed by its sentinel.
pub fn facets(companies: &[Company]) -> Facets {
    let mut industries = vec![ALL_INDUSTRIES.to_string()];
    let mut locations = vec![ALL_LOCATIONS.to_string()];
    let mut seen_industries: HashSet<&str> = HashSet::new();
    let mut seen_locations: HashSet<&str> = HashSet::new();

    for c in companies {
        if seen_industries.insert(c.industry.as_str()) {
            industries.push(c.industry.clone());
        }
        if seen_locations.insert(c.location.as_str()) {
            locations.push(c.location.clone());
        }
    }
    Facets {
        industries,
        locations,
    }
}

fn facet_matches(filter: &str, sentinel: &str, value: &str) -> bool {
    filter.is_empty() || filter == sentinel || filter == value
}

pub fn filter<'a>(companies: &'a [Company], query: &Query) -> Vec<&'a Company> {
    let term = query.search_term.to_lowercase();
    companies
        .iter()
        .filter(|c| term.is_empty() || c.name.to_lowercase().contains(&term))
        .filter(|c| facet_matches(&query.industry, ALL_INDUSTRIES, &c.industry))
        .filter(|c| facet_matches(&query.location, ALL_LOCATIONS, &c.location))
        .collect()
}

// Base letters only: decomposed, combining marks dropped, lower case.
fn base_letters(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

/// Compare two names the way a reader expects them in a directory. Accents
/// and case are ignored first, so "Équipe" files under E. Remaining ties are
/// decided by accents (unaccented first), then case (lower case first), then
/// the raw text.
pub fn collate(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| {
            a.nfd()
                .flat_map(char::to_lowercase)
                .cmp(b.nfd().flat_map(char::to_lowercase))
        })
        .then_with(|| {
            a.nfd()
                .filter(|c| !is_combining_mark(*c))
                .zip(b.nfd().filter(|c| !is_combining_mark(*c)))
                .map(|(x, y)| match (x.is_lowercase(), y.is_lowercase()) {
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    _ => Ordering::Equal,
                })
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.cmp(b))
}

/// Stable sort by name. Companies with equal names keep their relative order.
pub fn sort(companies: &mut [&Company], order: SortOrder) {
    match order {
        SortOrder::Ascending => companies.sort_by(|a, b| collate(&a.name, &b.name)),
        SortOrder::Descending => companies.sort_by(|a, b| collate(&b.name, &a.name)),
    }
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1))
}

/// Slice of one page. A page outside the available range is empty.
pub fn page<'a, 'b>(
    companies: &'b [&'a Company],
    current_page: usize,
    page_size: usize,
) -> &'b [&'a Company] {
    let Some(start) = current_page
        .checked_sub(1)
        .and_then(|p| p.checked_mul(page_size))
    else {
        return &[];
    };
    if start >= companies.len() {
        return &[];
    }
    let end = std::cmp::min(start + page_size, companies.len());
    &companies[start..end]
}

pub fn derive(companies: &[Company], query: &Query, page_size: usize) -> Derived {
    let mut matches = filter(companies, query);
    sort(&mut matches, query.sort_order);
    Derived {
        page: page(&matches, query.current_page, page_size)
            .iter()
            .map(|c| (*c).clone())
            .collect(),
        total_matches: matches.len(),
        total_pages: total_pages(matches.len(), page_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::company;

    fn names(companies: &[Company]) -> Vec<&str> {
        companies.iter().map(|c| c.name.as_str()).collect()
    }

    fn twenty() -> Vec<Company> {
        // Inserted out of order so sorting has something to do.
        (0..20)
            .rev()
            .map(|i| company(&i.to_string(), &format!("Company {i:02}"), "Tech", "Oslo"))
            .collect()
    }

    #[test]
    fn facets_keep_first_seen_order_behind_sentinel() {
        let data = vec![
            company("1", "A", "Finance", "Paris"),
            company("2", "B", "Tech", "Berlin"),
            company("3", "C", "Finance", "Berlin"),
            company("4", "D", "Energy", "Paris"),
        ];
        let f = facets(&data);
        assert_eq!(f.industries, ["All Industries", "Finance", "Tech", "Energy"]);
        assert_eq!(f.locations, ["All Locations", "Paris", "Berlin"]);
    }

    #[test]
    fn facets_of_empty_collection_are_sentinels_only() {
        let f = facets(&[]);
        assert_eq!(f.industries, ["All Industries"]);
        assert_eq!(f.locations, ["All Locations"]);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let data = vec![
            company("1", "TechCorp", "Tech", "Oslo"),
            company("2", "BioTech", "Health", "Rome"),
            company("3", "Finance Inc", "Finance", "Rome"),
        ];
        let query = Query {
            search_term: "tech".into(),
            ..Query::default()
        };
        let found: Vec<&str> = filter(&data, &query).iter().map(|c| c.name.as_str()).collect();
        assert_eq!(found, ["TechCorp", "BioTech"]);
    }

    #[test]
    fn sentinel_and_empty_facet_filter_are_the_same() {
        let data = vec![
            company("1", "A", "Finance", "Paris"),
            company("2", "B", "Tech", "Berlin"),
        ];
        let empty = Query::default();
        let sentinel = Query {
            industry: ALL_INDUSTRIES.into(),
            location: ALL_LOCATIONS.into(),
            ..Query::default()
        };
        assert_eq!(derive(&data, &empty, 9), derive(&data, &sentinel, 9));
        assert_eq!(derive(&data, &empty, 9).total_matches, 2);
    }

    #[test]
    fn facet_filters_are_exact_and_combined() {
        let data = vec![
            company("1", "A", "Finance", "Paris"),
            company("2", "B", "Finance", "Berlin"),
            company("3", "C", "Tech", "Paris"),
        ];
        let query = Query {
            industry: "Finance".into(),
            location: "Paris".into(),
            ..Query::default()
        };
        assert_eq!(names(&derive(&data, &query, 9).page), ["A"]);

        let lower = Query {
            industry: "finance".into(),
            ..Query::default()
        };
        assert_eq!(derive(&data, &lower, 9).total_matches, 0);
    }

    #[test]
    fn pages_of_twenty() {
        let data = twenty();
        let first = derive(&data, &Query::default(), 9);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_matches, 20);
        assert_eq!(first.page.len(), 9);
        assert_eq!(first.page[0].name, "Company 00");
        assert_eq!(first.page[8].name, "Company 08");

        let last = derive(
            &data,
            &Query {
                current_page: 3,
                ..Query::default()
            },
            9,
        );
        assert_eq!(names(&last.page), ["Company 18", "Company 19"]);
    }

    #[test]
    fn out_of_range_page_is_empty() {
        let data = twenty();
        for current_page in [0, 4, usize::MAX] {
            let d = derive(
                &data,
                &Query {
                    current_page,
                    ..Query::default()
                },
                9,
            );
            assert!(d.page.is_empty(), "page {current_page}");
            assert_eq!(d.total_pages, 3);
        }
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 9), 0);
        assert_eq!(total_pages(1, 9), 1);
        assert_eq!(total_pages(9, 9), 1);
        assert_eq!(total_pages(10, 9), 2);
        assert_eq!(total_pages(27, 9), 3);
    }

    #[test]
    fn descending_reverses_names() {
        let data = vec![
            company("1", "beta", "X", "Y"),
            company("2", "Alpha", "X", "Y"),
            company("3", "gamma", "X", "Y"),
        ];
        let query = Query {
            sort_order: SortOrder::Descending,
            ..Query::default()
        };
        assert_eq!(names(&derive(&data, &query, 9).page), ["gamma", "beta", "Alpha"]);
        assert_eq!(
            names(&derive(&data, &Query::default(), 9).page),
            ["Alpha", "beta", "gamma"]
        );
    }

    #[test]
    fn sort_is_stable_for_equal_names() {
        let data = vec![
            company("first", "Same", "X", "Y"),
            company("other", "Another", "X", "Y"),
            company("second", "Same", "X", "Y"),
        ];
        for order in [SortOrder::Ascending, SortOrder::Descending] {
            let query = Query {
                sort_order: order,
                ..Query::default()
            };
            let once = derive(&data, &query, 9);
            let twice = derive(&data, &query, 9);
            assert_eq!(once, twice);
            let ids: Vec<&str> = once
                .page
                .iter()
                .filter(|c| c.name == "Same")
                .map(|c| c.id.as_str())
                .collect();
            assert_eq!(ids, ["first", "second"]);
        }
    }

    #[test]
    fn collate_ignores_case_before_breaking_ties() {
        assert_eq!(collate("apple", "Banana"), Ordering::Less);
        assert_eq!(collate("Zeta", "alpha"), Ordering::Greater);
        assert_eq!(collate("acme", "Acme"), Ordering::Less);
        assert_eq!(collate("Acme", "Acme"), Ordering::Equal);
        assert_eq!(collate("Acme", "Acme Labs"), Ordering::Less);
    }

    #[test]
    fn accented_names_sort_with_their_base_letter() {
        let names_in = [
            "Zeta Corp",
            "Équipe Solutions",
            "Fabrikam",
            "Ärzte Verbund",
            "Beta",
        ];
        let data: Vec<Company> = names_in
            .iter()
            .enumerate()
            .map(|(i, name)| company(&i.to_string(), name, "X", "Y"))
            .collect();
        assert_eq!(
            names(&derive(&data, &Query::default(), 9).page),
            ["Ärzte Verbund", "Beta", "Équipe Solutions", "Fabrikam", "Zeta Corp"]
        );
    }

    #[test]
    fn accents_then_case_break_ties() {
        assert_eq!(collate("Cafe", "Café"), Ordering::Less);
        assert_eq!(collate("café", "Cafe"), Ordering::Greater);
        assert_eq!(collate("éclair", "Éclair"), Ordering::Less);
        // Composed and decomposed spellings are told apart only by the raw text.
        assert_eq!(collate("Caf\u{e9}", "Cafe\u{301}"), Ordering::Greater);
    }
}
