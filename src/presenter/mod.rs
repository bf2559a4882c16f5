//! Item presentation for listings
//!
//! Anything shown in a pick list or a search listing implements
//! [`ItemPresenter`]; [`ListingTable`] renders a slice of presenters with
//! `tabled`.

use std::fmt;

use tabled::{
    builder::Builder,
    settings::{Alignment, Color, Modify, Style, object::Columns, object::Rows, width::Width},
};

use crate::export::row::{relation_text, status_text, type_text};
use crate::model::Record;

/// Maximum width for a single column (characters)
const DEFAULT_MAX_COLUMN_WIDTH: usize = 40;

/// How an item is displayed in a listing
pub trait ItemPresenter {
    type Id: fmt::Display;

    /// Main label
    fn display_text(&self) -> String;

    /// Stable identifier, if the item has one
    fn id(&self) -> Option<Self::Id>;

    /// Secondary line shown under the label
    fn sub_text(&self) -> Option<String>;
}

impl ItemPresenter for Record {
    type Id = crate::model::RecordId;

    fn display_text(&self) -> String {
        match self.nome.as_deref().map(str::trim) {
            Some(nome) if !nome.is_empty() => nome.to_string(),
            _ => "(sem nome)".to_string(),
        }
    }

    fn id(&self) -> Option<Self::Id> {
        self.id.clone()
    }

    fn sub_text(&self) -> Option<String> {
        let mut parts = vec![type_text(self.record_type).to_string()];

        let relation = relation_text(self);
        if relation != crate::export::row::MISSING {
            parts.push(relation);
        }
        if self.record_type.is_primary() {
            parts.push(status_text(self).to_string());
        }
        if let Some(nationality) = self.nacionalidade.as_deref().filter(|n| !n.is_empty()) {
            parts.push(nationality.to_string());
        }

        Some(parts.join(" · "))
    }
}

/// Table renderer for presentable items
pub struct ListingTable {
    max_column_width: usize,
    use_colors: bool,
}

impl Default for ListingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingTable {
    pub fn new() -> Self {
        Self {
            max_column_width: DEFAULT_MAX_COLUMN_WIDTH,
            use_colors: false,
        }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn with_max_column_width(mut self, width: usize) -> Self {
        self.max_column_width = width;
        self
    }

    /// Render `items` as a three-column table
    pub fn render<P: ItemPresenter>(&self, items: &[P]) -> String {
        if items.is_empty() {
            return "(nenhum resultado)".to_string();
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Nome", "Detalhes"].map(String::from));
        for item in items {
            builder.push_record([
                item.id().map(|id| id.to_string()).unwrap_or_default(),
                item.display_text(),
                item.sub_text().unwrap_or_default(),
            ]);
        }

        let mut table = builder.build();
        table.with(Style::modern());
        for i in 1..=2 {
            table.with(Modify::new(Columns::new(i..=i)).with(Width::wrap(self.max_column_width)));
        }
        table.with(Modify::new(Rows::first()).with(Alignment::center()));

        if self.use_colors {
            table.modify(Rows::first(), Color::FG_CYAN | Color::BOLD);
        }

        table.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordId;

    #[test]
    fn test_record_presenter_titular() {
        let record = crate::model::Record {
            id: Some(RecordId::Int(7)),
            tipo_vinculo: Some("Trabalho".to_string()),
            empresa: Some("ACME".to_string()),
            status: Some(true),
            nacionalidade: Some("Argentina".to_string()),
            ..Record::titular("Maria Silva")
        };

        assert_eq!(record.display_text(), "Maria Silva");
        assert_eq!(record.id(), Some(RecordId::Int(7)));
        assert_eq!(
            record.sub_text().as_deref(),
            Some("Titular · Trabalho ACME · Ativo · Argentina")
        );
    }

    #[test]
    fn test_record_presenter_dependent() {
        let record = Record::dependente("Ana", "Carlos Souza");
        assert_eq!(record.id(), None);
        assert_eq!(
            record.sub_text().as_deref(),
            Some("Dependente · Dependente de Carlos Souza")
        );
    }

    #[test]
    fn test_missing_name() {
        let record = Record::titular("  ");
        assert_eq!(record.display_text(), "(sem nome)");
    }

    #[test]
    fn test_listing_table() {
        let records = vec![
            Record {
                id: Some(RecordId::Text("a1".to_string())),
                ..Record::titular("Maria")
            },
            Record::dependente("Ana", "Maria"),
        ];
        let table = ListingTable::new().render(&records);
        assert!(table.contains("Nome"));
        assert!(table.contains("Maria"));
        assert!(table.contains("a1"));
        assert!(table.contains("Dependente de Maria"));
    }

    #[test]
    fn test_empty_listing() {
        let records: Vec<Record> = Vec::new();
        assert_eq!(ListingTable::new().render(&records), "(nenhum resultado)");
    }
}
