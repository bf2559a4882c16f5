//! Search filters and their translation into backend query parameters.

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Bond status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BondStatus {
    Active,
    Inactive,
}

impl BondStatus {
    /// Value sent as `vinculo_status`
    pub fn as_param(&self) -> &'static str {
        match self {
            BondStatus::Active => "true",
            BondStatus::Inactive => "false",
        }
    }
}

/// A date range expressed as an offset in days from today
///
/// Forward ("posterior") covers `today..=today + days`; backward ("anterior")
/// covers `today - days..=today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativePeriod {
    pub days: u32,
    pub forward: bool,
}

impl RelativePeriod {
    pub fn forward(days: u32) -> Self {
        Self {
            days,
            forward: true,
        }
    }

    pub fn backward(days: u32) -> Self {
        Self {
            days,
            forward: false,
        }
    }

    /// Resolve to an inclusive `(from, to)` date pair relative to `today`
    pub fn resolve(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let offset = Days::new(u64::from(self.days));
        if self.forward {
            let limit = today.checked_add_days(offset).unwrap_or(NaiveDate::MAX);
            (today, limit)
        } else {
            let limit = today.checked_sub_days(offset).unwrap_or(NaiveDate::MIN);
            (limit, today)
        }
    }
}

/// Filter criteria for the unified search
///
/// All fields are optional; an empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub search_term: Option<String>,
    /// `titular`, `dependente`, `todos` or a backend field name
    pub search_field: Option<String>,
    pub nationality: Option<String>,
    pub consulate: Option<String>,
    pub company: Option<String>,
    pub bond_type: Option<String>,
    pub status: Option<BondStatus>,
    /// Which date the range applies to; dates are ignored without it
    pub event_type: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub period: Option<RelativePeriod>,
}

impl FilterCriteria {
    /// Filter with only a free-text term
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search_term: Some(term.into()),
            ..Self::default()
        }
    }

    /// Build query parameters for `page` using the local calendar date
    pub fn to_params(&self, page: u32, page_size: u32) -> SearchParams {
        self.to_params_at(page, page_size, Local::now().date_naive())
    }

    /// Build query parameters for `page`, resolving relative periods against `today`
    pub fn to_params_at(&self, page: u32, page_size: u32, today: NaiveDate) -> SearchParams {
        let mut params = SearchParams {
            page,
            page_size,
            search: non_empty(&self.search_term),
            nacionalidade: non_empty(&self.nationality),
            consulado: non_empty(&self.consulate),
            empresa: non_empty(&self.company),
            tipo_vinculo: non_empty(&self.bond_type),
            vinculo_status: self.status.map(|s| s.as_param().to_string()),
            ..SearchParams::default()
        };

        match non_empty(&self.search_field).as_deref() {
            Some("titular") => params.tipo = Some("titular".to_string()),
            Some("dependente") => params.tipo = Some("dependente".to_string()),
            Some("todos") | None => {}
            Some(other) => params.search_field = Some(other.to_string()),
        }

        if let Some(event) = non_empty(&self.event_type) {
            params.tipo_evento = Some(event);
            let (from, to) = match self.period {
                Some(period) => {
                    let (from, to) = period.resolve(today);
                    (Some(from), Some(to))
                }
                None => (self.date_from, self.date_to),
            };
            params.data_de = from.map(|d| d.format("%Y-%m-%d").to_string());
            params.data_ate = to.map(|d| d.format("%Y-%m-%d").to_string());
        }

        params
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Query string accepted by the search endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchParams {
    pub page: u32,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nacionalidade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consulado: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empresa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo_vinculo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vinculo_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo_evento: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_de: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_ate: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_filter_sends_only_paging() {
        let params = FilterCriteria::default().to_params_at(3, 100, date(2025, 1, 1));
        assert_eq!(
            params,
            SearchParams {
                page: 3,
                page_size: 100,
                ..SearchParams::default()
            }
        );
    }

    #[test]
    fn test_blank_values_are_dropped() {
        let filters = FilterCriteria {
            search_term: Some("  ".to_string()),
            nationality: Some("Italiana".to_string()),
            ..FilterCriteria::default()
        };
        let params = filters.to_params_at(1, 100, date(2025, 1, 1));
        assert_eq!(params.search, None);
        assert_eq!(params.nacionalidade.as_deref(), Some("Italiana"));
    }

    #[test]
    fn test_search_field_mapping() {
        let mut filters = FilterCriteria::search("joao");
        filters.search_field = Some("dependente".to_string());
        let params = filters.to_params_at(1, 100, date(2025, 1, 1));
        assert_eq!(params.tipo.as_deref(), Some("dependente"));
        assert_eq!(params.search_field, None);

        filters.search_field = Some("rnm".to_string());
        let params = filters.to_params_at(1, 100, date(2025, 1, 1));
        assert_eq!(params.tipo, None);
        assert_eq!(params.search_field.as_deref(), Some("rnm"));

        filters.search_field = Some("todos".to_string());
        let params = filters.to_params_at(1, 100, date(2025, 1, 1));
        assert_eq!(params.tipo, None);
        assert_eq!(params.search_field, None);
    }

    #[test]
    fn test_status_param() {
        let filters = FilterCriteria {
            status: Some(BondStatus::Inactive),
            ..FilterCriteria::default()
        };
        let params = filters.to_params_at(1, 100, date(2025, 1, 1));
        assert_eq!(params.vinculo_status.as_deref(), Some("false"));
    }

    #[test]
    fn test_dates_ignored_without_event_type() {
        let filters = FilterCriteria {
            date_from: Some(date(2025, 1, 1)),
            period: Some(RelativePeriod::forward(30)),
            ..FilterCriteria::default()
        };
        let params = filters.to_params_at(1, 100, date(2025, 6, 1));
        assert_eq!(params.tipo_evento, None);
        assert_eq!(params.data_de, None);
        assert_eq!(params.data_ate, None);
    }

    #[test]
    fn test_relative_period_forward() {
        let filters = FilterCriteria {
            event_type: Some("vencimento".to_string()),
            period: Some(RelativePeriod::forward(30)),
            date_from: Some(date(2000, 1, 1)),
            ..FilterCriteria::default()
        };
        let params = filters.to_params_at(1, 100, date(2025, 12, 15));
        assert_eq!(params.tipo_evento.as_deref(), Some("vencimento"));
        assert_eq!(params.data_de.as_deref(), Some("2025-12-15"));
        assert_eq!(params.data_ate.as_deref(), Some("2026-01-14"));
    }

    #[test]
    fn test_relative_period_backward() {
        let (from, to) = RelativePeriod::backward(10).resolve(date(2025, 3, 5));
        assert_eq!(from, date(2025, 2, 23));
        assert_eq!(to, date(2025, 3, 5));
    }

    #[test]
    fn test_explicit_dates_with_event_type() {
        let filters = FilterCriteria {
            event_type: Some("entrada".to_string()),
            date_to: Some(date(2025, 4, 30)),
            ..FilterCriteria::default()
        };
        let params = filters.to_params_at(1, 100, date(2025, 6, 1));
        assert_eq!(params.data_de, None);
        assert_eq!(params.data_ate.as_deref(), Some("2025-04-30"));
    }

    #[test]
    fn test_criteria_with_dates_survive_json() {
        let filters = FilterCriteria {
            status: Some(BondStatus::Inactive),
            event_type: Some("data_fim_vinculo".to_string()),
            date_from: Some(date(2025, 1, 10)),
            date_to: Some(date(2025, 2, 28)),
            period: Some(RelativePeriod::forward(30)),
            ..FilterCriteria::search("joao")
        };

        let json = serde_json::to_string(&filters).unwrap();
        assert!(json.contains("\"date_from\":\"2025-01-10\""));
        assert!(json.contains("\"status\":\"inactive\""));

        let back: FilterCriteria = serde_json::from_str(&json).unwrap();
        assert_eq!(back, filters);
    }
}
