//! Output rendering for resolved substances

use crate::error::LoaderResult;
use chemsafe_common::{StatementType, Substance};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn render(substance: &Substance, format: OutputFormat) -> LoaderResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(substance)?),
        OutputFormat::Text => Ok(render_text(substance)),
    }
}

fn render_text(substance: &Substance) -> String {
    let mut lines = vec![substance.name.clone()];

    let fields: [(&str, Option<String>); 7] = [
        ("Formula", substance.formula.clone()),
        ("CAS number", substance.cas_number.clone()),
        ("PubChem id", substance.pubchem_id.map(|id| id.to_string())),
        ("Signal word", substance.signal_word.clone()),
        ("RID/ADR", substance.ridadr.clone()),
        ("WGK Germany", substance.wgk_germany.map(|wgk| wgk.to_string())),
        ("RTECS", substance.rtecs.clone()),
    ];
    lines.extend(
        fields
            .into_iter()
            .filter_map(|(label, value)| value.map(|value| field_line(label, &value))),
    );

    if !substance.symbols.is_empty() {
        let names: Vec<_> = substance.symbols.iter().map(|s| s.name.as_str()).collect();
        lines.push(field_line("Symbols", &names.join(", ")));
    }

    for (label, statement_type) in [
        ("Hazard", StatementType::Hazard),
        ("Precaution", StatementType::Precautionary),
        ("Other", StatementType::Unknown),
    ] {
        let statements: Vec<_> = substance.statements_of_type(statement_type).collect();
        if statements.is_empty() {
            continue;
        }
        lines.push(format!("  {}:", label));
        lines.extend(statements.into_iter().map(|statement| match &statement.description {
            Some(description) => format!("    {:<8} {}", statement.name, description),
            None => format!("    {}", statement.name),
        }));
    }

    lines.push(field_line("Source", &substance.source));
    lines.join("\n")
}

fn field_line(label: &str, value: &str) -> String {
    format!("  {:<13}{}", format!("{}:", label), value)
}
