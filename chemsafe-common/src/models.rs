//! Domain models: substances and the shared reference entities they point at

use crate::text;
use serde::{Deserialize, Serialize};

/// Maximum stored length of a statement description (characters)
pub const MAX_DESCRIPTION_CHARS: usize = 1024;

/// Statement classification, derived from the first character of the code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementType {
    Unknown,
    Precautionary,
    Hazard,
}

impl StatementType {
    /// 'p' → Precautionary, 'h' → Hazard, anything else → Unknown (case-insensitive)
    pub fn classify(code: &str) -> Self {
        match text::trim(code).chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('p') => StatementType::Precautionary,
            Some('h') => StatementType::Hazard,
            _ => StatementType::Unknown,
        }
    }

    /// Persisted integer code
    pub fn code(self) -> i64 {
        match self {
            StatementType::Unknown => 0,
            StatementType::Precautionary => 1,
            StatementType::Hazard => 2,
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            1 => StatementType::Precautionary,
            2 => StatementType::Hazard,
            _ => StatementType::Unknown,
        }
    }
}

/// Hazard ("H…") or precautionary ("P…") statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// Row id, `None` until committed
    pub id: Option<i64>,
    /// Short code, unique within the registry
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub statement_type: StatementType,
}

impl Statement {
    /// New statement, type classified from the code
    pub fn new(name: &str) -> Self {
        let name = text::trim(name).to_string();
        Self {
            id: None,
            statement_type: StatementType::classify(&name),
            name,
            description: None,
        }
    }

    /// Replace the description, clipped to [`MAX_DESCRIPTION_CHARS`]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = text::non_empty(description).map(|d| clip(&d, MAX_DESCRIPTION_CHARS));
        self
    }
}

fn clip(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}

/// GHS hazard pictogram
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: Option<i64>,
    pub name: String,
}

impl Symbol {
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: text::trim(name).to_string(),
        }
    }
}

/// Fields used to recognise an already stored copy of a scraped substance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeKey {
    pub formula: Option<String>,
    pub rtecs: Option<String>,
    pub pubchem_id: Option<i64>,
    pub signal_word: Option<String>,
}

impl CompositeKey {
    /// No identifying field set; such a key cannot tell substances apart
    pub fn is_empty(&self) -> bool {
        self.formula.is_none() && self.rtecs.is_none() && self.pubchem_id.is_none() && self.signal_word.is_none()
    }
}

/// Canonical record for one chemical
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substance {
    pub id: Option<i64>,
    pub name: String,
    pub formula: Option<String>,
    pub pubchem_id: Option<i64>,
    pub cas_number: Option<String>,
    pub signal_word: Option<String>,
    /// Transport hazard code
    pub ridadr: Option<String>,
    /// German water hazard class
    pub wgk_germany: Option<i64>,
    pub rtecs: Option<String>,
    /// Provenance URL
    pub source: String,
    pub symbols: Vec<Symbol>,
    pub statements: Vec<Statement>,
}

impl Substance {
    pub fn new(name: &str, source: &str) -> Self {
        Self {
            id: None,
            name: text::trim(name).to_string(),
            formula: None,
            pubchem_id: None,
            cas_number: None,
            signal_word: None,
            ridadr: None,
            wgk_germany: None,
            rtecs: None,
            source: text::trim(source).to_string(),
            symbols: Vec::new(),
            statements: Vec::new(),
        }
    }

    /// Attach statements; a code already present is not added twice
    pub fn with_statements(mut self, statements: impl IntoIterator<Item = Statement>) -> Self {
        for statement in statements {
            if !self.statements.iter().any(|s| s.name == statement.name) {
                self.statements.push(statement);
            }
        }
        self
    }

    /// Attach symbols; a name already present is not added twice
    pub fn with_symbols(mut self, symbols: impl IntoIterator<Item = Symbol>) -> Self {
        for symbol in symbols {
            if !self.symbols.iter().any(|s| s.name == symbol.name) {
                self.symbols.push(symbol);
            }
        }
        self
    }

    pub fn composite_key(&self) -> CompositeKey {
        CompositeKey {
            formula: self.formula.clone(),
            rtecs: self.rtecs.clone(),
            pubchem_id: self.pubchem_id,
            signal_word: self.signal_word.clone(),
        }
    }

    pub fn statements_of_type(&self, statement_type: StatementType) -> impl Iterator<Item = &Statement> {
        self.statements
            .iter()
            .filter(move |s| s.statement_type == statement_type)
    }
}
