//! Normalized records: one struct per record kind with canonical typed
//! fields, plus a side map preserving every original column so no data is
//! ever lost to normalization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::parse::{digits_only, normalize_cpf, parse_amount, parse_date};
use crate::schema::{aliases, RecordKind};

/// One CSV line exactly as read: ordered (column, value) pairs with
/// columns lower-cased. Column order follows the source file.
#[derive(Debug, Default, Clone)]
pub struct RawRow {
    fields: Vec<(String, String)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn push(&mut self, column: &str, value: String) {
        self.fields.push((column.to_lowercase(), value));
    }

    /// Value stored under `column`, if any.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    /// First non-empty value among the alias candidates, tried in order.
    /// This is what absorbs schema drift: the "same" field shows up under
    /// two to four different names depending on the vintage.
    pub fn resolve(&self, aliases: &[&str]) -> Option<&str> {
        aliases
            .iter()
            .find_map(|alias| self.get(alias).map(str::trim).filter(|v| !v.is_empty()))
    }

    fn to_columns(&self) -> BTreeMap<String, String> {
        self.fields.iter().cloned().collect()
    }
}

/// A validated, normalized record.
///
/// There is no `Unknown` variant on purpose: a row that fails its kind's
/// validation never becomes a record at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NormalizedRecord {
    Candidate(CandidateRecord),
    Asset(AssetRecord),
    Revenue(RevenueRecord),
    ContractedExpense(ExpenseRecord),
    PaidExpense(ExpenseRecord),
    OriginalDonor(DonorRecord),
}

/// A candidate roster row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Candidate CPF, digits only, always 11 long.
    pub cpf: String,
    pub name: Option<String>,
    pub ballot_number: Option<String>,
    pub party: Option<String>,
    pub office: Option<String>,
    /// Every original column, lower-cased, exactly as read.
    pub columns: BTreeMap<String, String>,
}

/// A declared-asset row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRecord {
    pub cpf: String,
    pub value: f64,
    pub description: Option<String>,
    pub columns: BTreeMap<String, String>,
}

/// A campaign revenue (donation) row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueRecord {
    pub candidate_cpf: String,
    pub amount: f64,
    /// ISO `YYYY-MM-DD`, when the source date was parseable.
    pub date: Option<String>,
    pub donor_name: Option<String>,
    /// Donor CPF/CNPJ, digits only.
    pub donor_document: Option<String>,
    pub columns: BTreeMap<String, String>,
}

/// A campaign expense row, contracted or paid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub candidate_cpf: String,
    pub amount: f64,
    pub date: Option<String>,
    pub supplier_name: Option<String>,
    pub supplier_document: Option<String>,
    pub columns: BTreeMap<String, String>,
}

/// A donor-lineage row. Older donor files carry no candidate CPF, so the
/// donor's own document is the filterable key here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonorRecord {
    pub donor_name: Option<String>,
    pub donor_document: Option<String>,
    pub amount: f64,
    pub columns: BTreeMap<String, String>,
}

impl NormalizedRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Candidate(_) => RecordKind::Candidate,
            Self::Asset(_) => RecordKind::Asset,
            Self::Revenue(_) => RecordKind::Revenue,
            Self::ContractedExpense(_) => RecordKind::ContractedExpense,
            Self::PaidExpense(_) => RecordKind::PaidExpense,
            Self::OriginalDonor(_) => RecordKind::OriginalDonor,
        }
    }

    /// The digits-only key the streaming filter compares against the
    /// target: the candidate CPF for per-candidate kinds, the donor
    /// document for donor lineage.
    pub fn filter_key(&self) -> Option<&str> {
        match self {
            Self::Candidate(r) => Some(&r.cpf),
            Self::Asset(r) => Some(&r.cpf),
            Self::Revenue(r) => Some(&r.candidate_cpf),
            Self::ContractedExpense(r) | Self::PaidExpense(r) => Some(&r.candidate_cpf),
            Self::OriginalDonor(r) => r.donor_document.as_deref(),
        }
    }

    /// Every original column of the source row, lower-cased.
    pub fn columns(&self) -> &BTreeMap<String, String> {
        match self {
            Self::Candidate(r) => &r.columns,
            Self::Asset(r) => &r.columns,
            Self::Revenue(r) => &r.columns,
            Self::ContractedExpense(r) | Self::PaidExpense(r) => &r.columns,
            Self::OriginalDonor(r) => &r.columns,
        }
    }

    /// Normalizes one raw row for the given kind.
    ///
    /// Returns `None` whenever a kind-required field is missing or
    /// malformed; never panics, whatever the row contains. Validation is
    /// the only way a row disappears here.
    pub fn from_row(kind: RecordKind, row: &RawRow) -> Option<NormalizedRecord> {
        match kind {
            RecordKind::Candidate => {
                let cpf = normalize_cpf(row.resolve(aliases::CANDIDATE_CPF)?)?;
                Some(Self::Candidate(CandidateRecord {
                    cpf,
                    name: row.resolve(aliases::CANDIDATE_NAME).map(str::to_string),
                    ballot_number: row.resolve(aliases::BALLOT_NUMBER).map(str::to_string),
                    party: row.resolve(aliases::PARTY).map(str::to_string),
                    office: row.resolve(aliases::OFFICE).map(str::to_string),
                    columns: row.to_columns(),
                }))
            }
            RecordKind::Asset => {
                let cpf = normalize_cpf(row.resolve(aliases::CANDIDATE_CPF)?)?;
                let value = parse_amount(row.resolve(aliases::ASSET_VALUE)?)?;
                Some(Self::Asset(AssetRecord {
                    cpf,
                    value,
                    description: row
                        .resolve(aliases::ASSET_DESCRIPTION)
                        .map(str::to_string),
                    columns: row.to_columns(),
                }))
            }
            RecordKind::Revenue => {
                let candidate_cpf = normalize_cpf(row.resolve(aliases::CANDIDATE_CPF)?)?;
                let amount = parse_amount(row.resolve(aliases::REVENUE_AMOUNT)?)?;
                Some(Self::Revenue(RevenueRecord {
                    candidate_cpf,
                    amount,
                    date: row.resolve(aliases::REVENUE_DATE).and_then(parse_date),
                    donor_name: row.resolve(aliases::DONOR_NAME).map(str::to_string),
                    donor_document: row.resolve(aliases::DONOR_DOCUMENT).map(digits_only),
                    columns: row.to_columns(),
                }))
            }
            RecordKind::ContractedExpense => {
                let record = expense_from_row(row, aliases::CONTRACTED_AMOUNT)?;
                Some(Self::ContractedExpense(record))
            }
            RecordKind::PaidExpense => {
                let record = expense_from_row(row, aliases::PAID_AMOUNT)?;
                Some(Self::PaidExpense(record))
            }
            RecordKind::OriginalDonor => {
                // Donor lineage files reuse the receita amount columns.
                let amount = parse_amount(row.resolve(aliases::REVENUE_AMOUNT)?)?;
                Some(Self::OriginalDonor(DonorRecord {
                    donor_name: row.resolve(aliases::DONOR_NAME).map(str::to_string),
                    donor_document: row.resolve(aliases::DONOR_DOCUMENT).map(digits_only),
                    amount,
                    columns: row.to_columns(),
                }))
            }
            RecordKind::Unknown => None,
        }
    }
}

fn expense_from_row(row: &RawRow, amount_aliases: &[&str]) -> Option<ExpenseRecord> {
    let candidate_cpf = normalize_cpf(row.resolve(aliases::CANDIDATE_CPF)?)?;
    let amount = parse_amount(row.resolve(amount_aliases)?)?;
    Some(ExpenseRecord {
        candidate_cpf,
        amount,
        date: row.resolve(aliases::EXPENSE_DATE).and_then(parse_date),
        supplier_name: row.resolve(aliases::SUPPLIER_NAME).map(str::to_string),
        supplier_document: row.resolve(aliases::SUPPLIER_DOCUMENT).map(digits_only),
        columns: row.to_columns(),
    })
}
