//! Test builders — short constructors for the queries the harnesses reuse.
//!
//! These panic on invalid input rather than returning `Result`.

use pdbsearch::term::{Residue, StructMotifQuery};
use pdbsearch::{Attribute, Executor, Query, Terminal};

use super::stub_transport::StubTransport;

/// `attribute exact_match value` as a query.
pub fn exact(attribute: &str, value: &str) -> Query {
    Attribute::new(attribute).exact_match(value).unwrap().into()
}

pub fn full_text(value: &str) -> Query {
    Terminal::full_text(value).unwrap().into()
}

pub fn xray() -> Query {
    exact("exptl.method", "X-RAY DIFFRACTION")
}

pub fn high_resolution() -> Query {
    Attribute::new("rcsb_entry_info.resolution_combined")
        .less(2.0)
        .unwrap()
        .into()
}

/// `n` residues on chain A, operator 1, at positions 1..=n.
pub fn residues(n: usize) -> Vec<Residue> {
    (1..=n as i64).map(|seq| Residue::at("A", "1", seq).unwrap()).collect()
}

/// Residues on chain A carrying the given number of exchanges each.
pub fn residues_with_exchanges(counts: &[usize]) -> Vec<Residue> {
    const CODES: [&str; 4] = ["ALA", "GLY", "SER", "THR"];
    counts
        .iter()
        .enumerate()
        .map(|(i, &n)| Residue::new("A", "1", i as i64 + 1, &CODES[..n]).unwrap())
        .collect()
}

/// A motif builder over entry 2MNR, without residues yet.
pub fn motif_on_entry() -> pdbsearch::term::StructMotifQueryBuilder {
    StructMotifQuery::builder().entry_id("2MNR")
}

/// Executor over a stub with a small default page size.
pub fn stub_executor(stub: StubTransport, rows: usize) -> Executor<StubTransport> {
    Executor::new(stub).with_rows(rows)
}
