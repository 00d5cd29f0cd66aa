//! Filename-based record kind detection and the column alias tables that
//! absorb multi-year schema drift.
//!
//! Both are plain data: a new vintage renaming a column, or a new file
//! naming convention, is a one-line table change rather than a control
//! flow edit.

use serde::{Deserialize, Serialize};

/// The logical schema a source file belongs to. Decided once per file
/// from its name, never per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Candidate,
    Asset,
    Revenue,
    ContractedExpense,
    PaidExpense,
    OriginalDonor,
    Unknown,
}

/// Filename substring patterns, most specific first. First hit wins, so
/// "receitas_candidatos" must precede the generic "candidato".
const KIND_PATTERNS: &[(&str, RecordKind)] = &[
    ("doador_originario", RecordKind::OriginalDonor),
    ("despesas_contratadas", RecordKind::ContractedExpense),
    ("despesas_pagas", RecordKind::PaidExpense),
    ("receitas_candidatos", RecordKind::Revenue),
    ("receitas", RecordKind::Revenue),
    // Pre-2014 expense files predate the contracted/paid split.
    ("despesas", RecordKind::ContractedExpense),
    ("bem_candidato", RecordKind::Asset),
    ("bens", RecordKind::Asset),
    ("consulta_cand", RecordKind::Candidate),
    ("candidato", RecordKind::Candidate),
];

/// Classifies a source file by name. Total and deterministic: anything
/// unrecognized is `Unknown`, never an error.
pub fn detect_kind(filename: &str) -> RecordKind {
    let lower = filename.to_lowercase();
    KIND_PATTERNS
        .iter()
        .find(|(pattern, _)| lower.contains(pattern))
        .map(|&(_, kind)| kind)
        .unwrap_or(RecordKind::Unknown)
}

/// Historical column names for each canonical field, newest first. The
/// normalizer tries them in order and takes the first non-empty match.
pub mod aliases {
    pub const CANDIDATE_CPF: &[&str] =
        &["nr_cpf_candidato", "cpf_candidato", "cpf_do_candidato"];
    pub const CANDIDATE_NAME: &[&str] = &["nm_candidato", "nome_candidato"];
    pub const BALLOT_NUMBER: &[&str] = &["nr_candidato", "numero_candidato"];
    pub const PARTY: &[&str] = &["sg_partido", "sigla_partido", "sigla_do_partido"];
    pub const OFFICE: &[&str] = &["ds_cargo", "descricao_cargo", "cargo"];
    pub const STATE: &[&str] = &["sg_uf", "uf"];

    pub const REVENUE_AMOUNT: &[&str] = &["vr_receita", "valor_receita"];
    pub const REVENUE_DATE: &[&str] = &["dt_receita", "data_receita", "data_da_receita"];
    pub const DONOR_NAME: &[&str] = &[
        "nm_doador",
        "nm_doador_originario",
        "nome_doador",
        "nome_do_doador",
    ];
    pub const DONOR_DOCUMENT: &[&str] = &[
        "nr_cpf_cnpj_doador",
        "nr_cpf_cnpj_doador_originario",
        "cpf_cnpj_do_doador",
        "cpf_cnpj_doador_originario",
    ];

    pub const CONTRACTED_AMOUNT: &[&str] =
        &["vr_despesa_contratada", "vr_despesa", "valor_despesa"];
    pub const PAID_AMOUNT: &[&str] =
        &["vr_pagto_despesa", "vr_pagamento", "valor_pagamento", "vr_despesa"];
    pub const EXPENSE_DATE: &[&str] =
        &["dt_despesa", "data_despesa", "dt_pagto", "data_pagamento"];
    pub const SUPPLIER_NAME: &[&str] = &["nm_fornecedor", "nome_fornecedor"];
    pub const SUPPLIER_DOCUMENT: &[&str] = &[
        "nr_cpf_cnpj_fornecedor",
        "cpf_cnpj_fornecedor",
        "cpf_cnpj_do_fornecedor",
    ];

    pub const ASSET_VALUE: &[&str] = &["vr_bem_candidato", "valor_bem", "vr_bem"];
    pub const ASSET_DESCRIPTION: &[&str] =
        &["ds_bem_candidato", "descricao_bem", "ds_bem"];
}
