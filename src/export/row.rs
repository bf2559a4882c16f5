//! Projection of search records into the fixed export column set.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::model::{Record, RecordType};

/// Placeholder written for missing values
pub const MISSING: &str = "-";

/// Column headers, in output order
pub const HEADERS: [&str; 13] = [
    "Nome",
    "Tipo",
    "Vínculo/Relação",
    "Amparo",
    "RNM",
    "CPF",
    "Passaporte",
    "Nacionalidade",
    "Data Nascimento",
    "Data Fim Vínculo",
    "Status",
    "Email",
    "Telefone",
];

/// One record projected into export columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub nome: String,
    pub tipo: String,
    pub relacao: String,
    pub amparo: String,
    pub rnm: String,
    pub cpf: String,
    pub passaporte: String,
    pub nacionalidade: String,
    pub data_nascimento: String,
    pub data_fim_vinculo: String,
    pub status: String,
    pub email: String,
    pub telefone: String,
}

impl ExportRow {
    /// Project a record into export columns
    pub fn from_record(record: &Record) -> Self {
        Self {
            nome: or_missing(&record.nome),
            tipo: type_text(record.record_type).to_string(),
            relacao: relation_text(record),
            amparo: or_missing(&record.amparo),
            rnm: or_missing(&record.rnm),
            cpf: or_missing(&record.cpf),
            passaporte: or_missing(&record.passaporte),
            nacionalidade: or_missing(&record.nacionalidade),
            data_nascimento: format_date(record.data_nascimento.as_deref()),
            data_fim_vinculo: format_date(record.data_fim_vinculo.as_deref()),
            status: status_text(record).to_string(),
            email: or_missing(&record.email),
            telefone: or_missing(&record.telefone),
        }
    }

    /// Values in [`HEADERS`] order
    pub fn values(&self) -> [&str; 13] {
        [
            self.nome.as_str(),
            self.tipo.as_str(),
            self.relacao.as_str(),
            self.amparo.as_str(),
            self.rnm.as_str(),
            self.cpf.as_str(),
            self.passaporte.as_str(),
            self.nacionalidade.as_str(),
            self.data_nascimento.as_str(),
            self.data_fim_vinculo.as_str(),
            self.status.as_str(),
            self.email.as_str(),
            self.telefone.as_str(),
        ]
    }
}

/// Project every record
pub fn prepare_rows(records: &[Record]) -> Vec<ExportRow> {
    records.iter().map(ExportRow::from_record).collect()
}

fn or_missing(value: &Option<String>) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => MISSING.to_string(),
    }
}

pub fn type_text(record_type: RecordType) -> &'static str {
    match record_type {
        RecordType::Primary => "Titular",
        RecordType::Dependent | RecordType::DependentOrphan => "Dependente",
    }
}

/// `Ativo` / `Inativo` / `Sem Vínculo` for titulares; dependents are always `Ativo`
pub fn status_text(record: &Record) -> &'static str {
    match (record.record_type, record.status) {
        (RecordType::Primary, Some(true)) => "Ativo",
        (RecordType::Primary, Some(false)) => "Inativo",
        (RecordType::Primary, None) => "Sem Vínculo",
        _ => "Ativo",
    }
}

/// Bond for titulares (`"{tipoVinculo} {empresa}"`), relationship for dependents
pub fn relation_text(record: &Record) -> String {
    if record.record_type.is_primary() {
        bond_text(record)
    } else {
        let kind = record
            .tipo_dependente
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .unwrap_or("Dependente");
        format!("{} de {}", kind, record.titular_nome.as_deref().unwrap_or(""))
            .trim()
            .to_string()
    }
}

/// Shorter relationship text used where space is tight: first name only
pub fn short_relation_text(record: &Record) -> String {
    if record.record_type.is_primary() {
        bond_text(record)
    } else {
        let kind = record
            .tipo_dependente
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .unwrap_or("Dep.");
        let first_name = record
            .titular_nome
            .as_deref()
            .and_then(|n| n.split_whitespace().next())
            .unwrap_or("");
        format!("{kind} de {first_name}").trim().to_string()
    }
}

fn bond_text(record: &Record) -> String {
    let tipo = record.tipo_vinculo.as_deref().unwrap_or("");
    let text = match record.empresa.as_deref().filter(|e| !e.is_empty()) {
        Some(empresa) => format!("{tipo} {empresa}"),
        None => tipo.to_string(),
    };
    let text = text.trim();
    if text.is_empty() {
        MISSING.to_string()
    } else {
        text.to_string()
    }
}

/// Render an ISO date or datetime as `dd/mm/yyyy`
///
/// Missing values become `-`; unparseable values are kept verbatim.
pub fn format_date(value: Option<&str>) -> String {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return MISSING.to_string();
    };

    parse_date(raw)
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titular_projection() {
        let record = Record {
            tipo_vinculo: Some("Trabalho".to_string()),
            empresa: Some("ACME Ltda".to_string()),
            rnm: Some("V123".to_string()),
            data_fim_vinculo: Some("2026-03-01".to_string()),
            status: Some(false),
            ..Record::titular("Maria Silva")
        };
        let row = ExportRow::from_record(&record);

        assert_eq!(row.nome, "Maria Silva");
        assert_eq!(row.tipo, "Titular");
        assert_eq!(row.relacao, "Trabalho ACME Ltda");
        assert_eq!(row.rnm, "V123");
        assert_eq!(row.cpf, "-");
        assert_eq!(row.data_fim_vinculo, "01/03/2026");
        assert_eq!(row.data_nascimento, "-");
        assert_eq!(row.status, "Inativo");
    }

    #[test]
    fn test_titular_without_bond() {
        let row = ExportRow::from_record(&Record::titular("João"));
        assert_eq!(row.relacao, "-");
        assert_eq!(row.status, "Sem Vínculo");
    }

    #[test]
    fn test_dependent_projection() {
        let mut record = Record::dependente("Ana Souza", "Carlos Souza");
        record.tipo_dependente = Some("Filha".to_string());
        let row = ExportRow::from_record(&record);
        assert_eq!(row.tipo, "Dependente");
        assert_eq!(row.relacao, "Filha de Carlos Souza");
        assert_eq!(row.status, "Ativo");
        assert_eq!(short_relation_text(&record), "Filha de Carlos");

        record.tipo_dependente = None;
        assert_eq!(relation_text(&record), "Dependente de Carlos Souza");
        assert_eq!(short_relation_text(&record), "Dep. de Carlos");
    }

    #[test]
    fn test_orphan_is_dependent() {
        let record = Record::new(RecordType::DependentOrphan);
        let row = ExportRow::from_record(&record);
        assert_eq!(row.tipo, "Dependente");
        assert_eq!(row.relacao, "Dependente de");
        assert_eq!(row.nome, "-");
    }

    #[test]
    fn test_format_date_variants() {
        assert_eq!(format_date(None), "-");
        assert_eq!(format_date(Some("")), "-");
        assert_eq!(format_date(Some("1990-07-21")), "21/07/1990");
        assert_eq!(format_date(Some("2025-01-02T10:00:00Z")), "02/01/2025");
        assert_eq!(format_date(Some("2025-01-02T10:00:00.123")), "02/01/2025");
        assert_eq!(format_date(Some("ontem")), "ontem");
    }

    #[test]
    fn test_values_follow_headers() {
        let row = ExportRow::from_record(&Record::titular("X"));
        let values = row.values();
        assert_eq!(values.len(), HEADERS.len());
        assert_eq!(values[0], "X");
        assert_eq!(values[1], "Titular");
    }
}
