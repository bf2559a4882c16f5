//! Search result rows and page envelopes as returned by the backend.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of entity a search row describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    #[serde(rename = "titular")]
    Primary,
    #[serde(rename = "dependente")]
    Dependent,
    /// A dependent whose titular was filtered out of the result
    #[serde(rename = "dependente-orphan")]
    DependentOrphan,
}

impl RecordType {
    pub fn is_primary(&self) -> bool {
        matches!(self, RecordType::Primary)
    }
}

/// Identifier of a search row; the backend uses integers or UUID strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{n}"),
            RecordId::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Denormalized search row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub rnm: Option<String>,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub passaporte: Option<String>,
    #[serde(default)]
    pub nacionalidade: Option<String>,
    #[serde(default)]
    pub data_nascimento: Option<String>,
    #[serde(default)]
    pub tipo_vinculo: Option<String>,
    #[serde(default)]
    pub empresa: Option<String>,
    #[serde(default)]
    pub amparo: Option<String>,
    #[serde(default)]
    pub data_fim_vinculo: Option<String>,
    /// `Some(true)` active bond, `Some(false)` inactive, `None` no bond
    #[serde(default)]
    pub status: Option<bool>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telefone: Option<String>,
    #[serde(default)]
    pub tipo_dependente: Option<String>,
    #[serde(default)]
    pub titular_nome: Option<String>,
}

impl Record {
    /// Empty row of the given type
    pub fn new(record_type: RecordType) -> Self {
        Self {
            id: None,
            record_type,
            nome: None,
            rnm: None,
            cpf: None,
            passaporte: None,
            nacionalidade: None,
            data_nascimento: None,
            tipo_vinculo: None,
            empresa: None,
            amparo: None,
            data_fim_vinculo: None,
            status: None,
            email: None,
            telefone: None,
            tipo_dependente: None,
            titular_nome: None,
        }
    }

    /// Primary entity row with a name
    pub fn titular(nome: impl Into<String>) -> Self {
        Self {
            nome: Some(nome.into()),
            ..Self::new(RecordType::Primary)
        }
    }

    /// Dependent row linked to `titular_nome`
    pub fn dependente(nome: impl Into<String>, titular_nome: impl Into<String>) -> Self {
        Self {
            nome: Some(nome.into()),
            titular_nome: Some(titular_nome.into()),
            ..Self::new(RecordType::Dependent)
        }
    }
}

/// Wire envelope of the search endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<Record>,
    #[serde(default)]
    pub count: u64,
    #[serde(default = "default_total_pages")]
    pub total_pages: u32,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_previous: bool,
    /// Titular count when the backend reports it separately from `count`
    #[serde(default)]
    pub total_titulares: Option<u64>,
}

fn default_total_pages() -> u32 {
    1
}

/// One page of search results
#[derive(Debug, Clone, PartialEq)]
pub struct PageResponse {
    pub records: Vec<Record>,
    /// Number of primary entities matching the query, across all pages
    pub total_titular_count: u64,
    pub total_pages: u32,
    pub has_next: bool,
}

impl From<SearchResponse> for PageResponse {
    fn from(resp: SearchResponse) -> Self {
        Self {
            total_titular_count: resp.total_titulares.unwrap_or(resp.count),
            records: resp.results,
            total_pages: resp.total_pages,
            has_next: resp.has_next,
        }
    }
}
