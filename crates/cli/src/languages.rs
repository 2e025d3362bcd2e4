use structscope_api::LanguageDescriptor;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct LanguageRow {
    #[tabled(rename = "Language")]
    language: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Extensions")]
    extensions: String,
    #[tabled(rename = "Queries")]
    queries: String,
}

pub fn render(languages: &[LanguageDescriptor]) -> String {
    if languages.is_empty() {
        return "No languages registered.".to_string();
    }
    let rows: Vec<_> = languages
        .iter()
        .map(|d| LanguageRow {
            language: d.language.to_string(),
            name: d.display_name.clone(),
            extensions: d
                .extensions
                .iter()
                .map(|e| format!(".{e}"))
                .collect::<Vec<_>>()
                .join(" "),
            queries: d
                .query_kinds
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect();
    Table::new(rows).with(Style::psql()).to_string()
}
