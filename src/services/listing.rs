use crate::domain::models::{Client, User};
use crate::domain::response::SurveyResponse;
use crate::domain::survey::Survey;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 20;

/// Records that can be matched against a free-text query expose the fields
/// the search runs over (name, email, phone, company and the like).
pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;
}

/// Case-insensitive substring filter over the record's searched fields.
/// An empty or whitespace-only query is the identity; order is preserved.
pub fn filter_by_query<T: Searchable>(items: Vec<T>, query: Option<&str>) -> Vec<T> {
    let needle = match query.map(str::trim) {
        Some(q) if !q.is_empty() => q.to_lowercase(),
        _ => return items,
    };

    items
        .into_iter()
        .filter(|item| {
            item.search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Common query parameters shared by every list endpoint. All optional;
/// out-of-range page/limit fall back to page=1, limit=20.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl ListParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::normalize(self.page, self.limit)
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Inclusive date-range check against a record timestamp.
    pub fn date_in_range(&self, at: DateTime<Utc>) -> bool {
        let date = at.date_naive();
        if let Some(from) = self.date_from {
            if date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if date > to {
                return false;
            }
        }
        true
    }
}

impl Searchable for Client {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.company.as_str(), self.email.as_str()];
        if let Some(phone) = &self.phone {
            fields.push(phone);
        }
        fields
    }
}

impl Searchable for User {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.email.as_str()];
        if let Some(phone) = &self.phone {
            fields.push(phone);
        }
        fields
    }
}

impl Searchable for Survey {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.description.as_str()];
        if let Some(client) = &self.client_name {
            fields.push(client);
        }
        fields
    }
}

impl Searchable for SurveyResponse {
    fn search_fields(&self) -> Vec<&str> {
        [
            self.respondent.name.as_deref(),
            self.respondent.email.as_deref(),
            self.respondent.phone.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl PageRequest {
    pub fn normalize(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = match page {
            Some(p) if p >= 1 => p as usize,
            _ => DEFAULT_PAGE,
        };
        let limit = match limit {
            Some(l) if l >= 1 => l as usize,
            _ => DEFAULT_LIMIT,
        };
        PageRequest { page, limit }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct PageMeta {
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct Paged<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// Slice `[(page-1)*limit, page*limit)` out of the filtered collection.
/// A page past the end yields an empty slice, never an error; `total`
/// always equals the filtered set length.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Paged<T> {
    let total = items.len();
    let total_pages = total.div_ceil(request.limit);

    let start = request.page.saturating_sub(1).saturating_mul(request.limit);
    let data: Vec<T> = items
        .into_iter()
        .skip(start)
        .take(request.limit)
        .collect();

    Paged {
        data,
        meta: PageMeta {
            total,
            page: request.page,
            limit: request.limit,
            total_pages,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Contact {
        name: String,
        email: String,
        phone: String,
        company: String,
    }

    impl Searchable for Contact {
        fn search_fields(&self) -> Vec<&str> {
            vec![&self.name, &self.email, &self.phone, &self.company]
        }
    }

    fn contact(name: &str, email: &str, phone: &str, company: &str) -> Contact {
        Contact {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            company: company.to_string(),
        }
    }

    fn sample() -> Vec<Contact> {
        vec![
            contact("Iryna Kovalenko", "iryna@acme.ua", "+380501112233", "Acme"),
            contact("José Silva", "jose@globex.com", "+351912345678", "Globex"),
            contact("سارة الخطيب", "sara@initech.ae", "+971501234567", "Initech"),
        ]
    }

    #[test]
    fn test_empty_query_is_identity() {
        let items = sample();
        assert_eq!(filter_by_query(items.clone(), None), items);
        assert_eq!(filter_by_query(items.clone(), Some("")), items);
        assert_eq!(filter_by_query(items.clone(), Some("   ")), items);
    }

    #[test]
    fn test_case_insensitive_unicode_match() {
        let hits = filter_by_query(sample(), Some("JOSÉ"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "José Silva");

        // right-to-left script matches the same way
        let hits = filter_by_query(sample(), Some("سارة"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].company, "Initech");
    }

    #[test]
    fn test_matches_any_field() {
        let by_phone = filter_by_query(sample(), Some("38050"));
        assert_eq!(by_phone.len(), 1);
        assert_eq!(by_phone[0].name, "Iryna Kovalenko");

        let by_company = filter_by_query(sample(), Some("globex"));
        assert_eq!(by_company.len(), 1);
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        assert!(filter_by_query(sample(), Some("zzz")).is_empty());
    }

    #[test]
    fn test_invalid_page_and_limit_fall_back() {
        assert_eq!(
            PageRequest::normalize(Some(0), Some(-5)),
            PageRequest::default()
        );
        assert_eq!(
            PageRequest::normalize(None, None),
            PageRequest { page: 1, limit: 20 }
        );
        assert_eq!(
            PageRequest::normalize(Some(3), Some(50)),
            PageRequest { page: 3, limit: 50 }
        );
    }

    #[test]
    fn test_55_records_limit_20() {
        let items: Vec<i32> = (1..=55).collect();

        let p1 = paginate(items.clone(), PageRequest { page: 1, limit: 20 });
        assert_eq!(p1.data.len(), 20);
        assert_eq!(p1.meta.total, 55);
        assert_eq!(p1.meta.total_pages, 3);

        let p3 = paginate(items.clone(), PageRequest { page: 3, limit: 20 });
        assert_eq!(p3.data.len(), 15);

        let p4 = paginate(items, PageRequest { page: 4, limit: 20 });
        assert!(p4.data.is_empty());
        assert_eq!(p4.meta.total_pages, 3);
    }

    #[test]
    fn test_pages_reconstruct_collection() {
        let items: Vec<i32> = (1..=55).collect();
        let request = PageRequest { page: 1, limit: 20 };
        let total_pages = paginate(items.clone(), request).meta.total_pages;

        let mut rebuilt = Vec::new();
        for page in 1..=total_pages {
            rebuilt.extend(paginate(items.clone(), PageRequest { page, limit: 20 }).data);
        }
        assert_eq!(rebuilt, items);
    }

    #[test]
    fn test_empty_collection() {
        let paged = paginate(Vec::<i32>::new(), PageRequest::default());
        assert!(paged.data.is_empty());
        assert_eq!(paged.meta.total, 0);
        assert_eq!(paged.meta.total_pages, 0);
    }

    #[test]
    fn test_date_range_filter() {
        let params = ListParams {
            date_from: NaiveDate::from_ymd_opt(2026, 3, 1),
            date_to: NaiveDate::from_ymd_opt(2026, 3, 31),
            ..ListParams::default()
        };

        let inside = "2026-03-15T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let before = "2026-02-28T23:59:59Z".parse::<DateTime<Utc>>().unwrap();
        assert!(params.date_in_range(inside));
        assert!(!params.date_in_range(before));
    }
}
