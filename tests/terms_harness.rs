//! Terminal construction and request option harness.
//!
//! # What this covers
//!
//! - **Comparison mapping**: `eq_to` / `ne_to` / `contains` build the same
//!   terminal as the explicit constructor.
//! - **Structure motif bounds**: residue counts 2..=10, at most 4 exchanges
//!   per residue and 16 per query.
//! - **Structure sources**: exactly one of entry id, URL or local path; file
//!   sources need a format.
//! - **Ambiguous attributes**: names valid in both attribute services need an
//!   explicit service, which the request then carries.
//! - **Sequence / chemical terminals**: length and cutoff bounds.
//! - **Facets**: open-ended ranges, defaults, and rejected option mixes.
//!
//! # What this does NOT cover
//!
//! - Boolean composition (see algebra_harness)
//! - Registry loading over HTTP (see http_harness)
//!
//! # Running
//!
//! ```sh
//! cargo test --test terms_harness
//! ```

mod common;
use common::*;

use pdbsearch::facet::{Facet, FilterFacet, GroupFilter, TerminalFilter};
use pdbsearch::query::LogicalOperator;
use pdbsearch::term::{
    AttributeQuery, ChemSimilarityQuery, SeqMotifQuery, SequenceQuery, SequenceType,
    StructSimilarityQuery, StructureSource,
};
use pdbsearch::{
    Attribute, AttributeRegistry, Operator, Query, Range, SearchError, Service, Terminal, Value,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

// ---------------------------------------------------------------------------
// Comparison mapping
// ---------------------------------------------------------------------------

#[test]
fn eq_to_string_is_exact_match() {
    let attr = Attribute::new("exptl.method");
    let explicit = AttributeQuery::new(
        "exptl.method",
        Operator::ExactMatch,
        Some(Value::from("X-RAY DIFFRACTION")),
        Service::Text,
    )
    .unwrap();
    assert_eq!(attr.eq_to("X-RAY DIFFRACTION").unwrap(), Terminal::from(explicit));
}

#[rstest]
#[case::integer(Value::Int(2))]
#[case::float(Value::Float(1.5))]
fn eq_to_number_is_equals(#[case] value: Value) {
    let attr = Attribute::new("rcsb_entry_info.polymer_entity_count");
    let explicit = AttributeQuery::new(attr.name(), Operator::Equals, Some(value.clone()), Service::Text).unwrap();
    assert_eq!(attr.eq_to(value).unwrap(), Terminal::from(explicit));
}

#[test]
fn ne_to_is_negated_eq_to() {
    let attr = Attribute::new("exptl.method");
    let ne = attr.ne_to("SOLUTION NMR").unwrap();
    assert!(ne.is_negated());
    assert_eq!(ne.negate().unwrap(), attr.eq_to("SOLUTION NMR").unwrap());
}

#[test]
fn contains_maps_by_value_kind() {
    let attr = Attribute::new("struct.title");
    let phrase = attr.contains("protein kinase").unwrap();
    assert_eq!(phrase.parameters().unwrap()["operator"], json!("contains_phrase"));

    let words = attr.contains(vec!["protein", "kinase"]).unwrap();
    let params = words.parameters().unwrap();
    assert_eq!(params["operator"], json!("contains_words"));
    assert_eq!(params["value"], json!("protein kinase"));
}

#[rstest]
#[case::exists_with_value(Operator::Exists, Some(Value::from("x")))]
#[case::greater_with_list(Operator::Greater, Some(Value::from(vec![1, 2])))]
#[case::in_with_scalar(Operator::In, Some(Value::from("x")))]
#[case::contains_with_number(Operator::ContainsPhrase, Some(Value::Int(3)))]
#[case::backwards_range(Operator::Range, Some(Value::from(Range::between(5, 1))))]
fn operator_value_mismatches_are_rejected(#[case] operator: Operator, #[case] value: Option<Value>) {
    assert_search_err!(
        AttributeQuery::new("rcsb_entry_info.resolution_combined", operator, value, Service::Text),
        SearchError::InvalidOperatorForAttribute { .. }
    );
}

#[test]
fn comparison_without_value_is_missing_a_field() {
    assert_search_err!(
        AttributeQuery::new("rcsb_entry_info.resolution_combined", Operator::Greater, None, Service::Text),
        SearchError::MissingRequiredField { .. }
    );
}

// ---------------------------------------------------------------------------
// Structure motif bounds
// ---------------------------------------------------------------------------

#[rstest]
#[case(2)]
#[case(10)]
fn motif_residue_count_in_bounds(#[case] n: usize) {
    let q = motif_on_entry().residues(residues(n)).build().unwrap();
    assert_eq!(q.residues().len(), n);
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(11)]
fn motif_residue_count_out_of_bounds(#[case] n: usize) {
    let err = assert_search_err!(
        motif_on_entry().residues(residues(n)).build(),
        SearchError::ResidueCount { .. }
    );
    assert_eq!(err, SearchError::ResidueCount { count: n, min: 2, max: 10 });
}

#[test]
fn residue_exchange_limit() {
    assert!(pdbsearch::term::Residue::new("A", "1", 7, ["ALA", "GLY", "SER", "THR"]).is_ok());
    assert_search_err!(
        pdbsearch::term::Residue::new("A", "1", 7, ["ALA", "GLY", "SER", "THR", "VAL"]),
        SearchError::TooManyExchanges { max: 4, .. }
    );
    assert_search_err!(
        pdbsearch::term::Residue::new("A", "1", 7, ["XYZ"]),
        SearchError::UnknownExchangeCode(_)
    );
}

#[rstest]
#[case::sixteen(&[4, 4, 4, 4], true)]
#[case::seventeen(&[4, 4, 4, 4, 1], false)]
fn motif_total_exchange_limit(#[case] counts: &[usize], #[case] ok: bool) {
    let result = motif_on_entry().residues(residues_with_exchanges(counts)).build();
    if ok {
        assert!(result.is_ok(), "{result:?}");
    } else {
        assert_search_err!(result, SearchError::TooManyExchanges { count: 17, max: 16, .. });
    }
}

#[test]
fn motif_parameters_document() {
    let q = motif_on_entry()
        .residue(pdbsearch::term::Residue::new("A", "1", 162, ["LYS", "HIS"]).unwrap())
        .residue(pdbsearch::term::Residue::at("A", "1", 193).unwrap())
        .limit(100)
        .build()
        .unwrap();
    let params = Terminal::from(q).parameters().unwrap();
    assert_eq!(params["value"]["entry_id"], json!("2MNR"));
    assert_eq!(
        params["value"]["residue_ids"][0],
        json!({"label_asym_id": "A", "struct_oper_id": "1", "label_seq_id": 162})
    );
    assert_eq!(params["exchanges"][0]["allowed"], json!(["LYS", "HIS"]));
    assert_eq!(params["rmsd_cutoff"], json!(2.0));
    assert_eq!(params["atom_pairing_scheme"], json!("SIDE_CHAIN"));
    assert_eq!(params["limit"], json!(100));
}

#[test]
fn motif_tolerance_bounds() {
    assert_search_err!(
        motif_on_entry().residues(residues(2)).angle_tolerance(4).build(),
        SearchError::OutOfRangeParameter { parameter: "angle_tolerance", .. }
    );
    assert_search_err!(
        motif_on_entry().residues(residues(2)).rmsd_cutoff(-1.0).build(),
        SearchError::OutOfRangeParameter { parameter: "rmsd_cutoff", .. }
    );
}

// ---------------------------------------------------------------------------
// Structure sources
// ---------------------------------------------------------------------------

#[test]
fn similarity_with_entry_and_url_conflicts() {
    assert_search_err!(
        StructSimilarityQuery::builder()
            .entry_id("4HHB")
            .file_url("https://files.rcsb.org/view/4HHB.cif")
            .file_format("cif")
            .build(),
        SearchError::ConflictingFields { .. }
    );
}

#[test]
fn similarity_without_source_fails() {
    assert_search_err!(
        StructSimilarityQuery::builder().build(),
        SearchError::MissingRequiredField { .. }
    );
}

#[test]
fn similarity_url_without_format_fails() {
    assert_search_err!(
        StructSimilarityQuery::builder()
            .file_url("https://files.rcsb.org/view/4HHB.cif")
            .build(),
        SearchError::MissingRequiredField { field: "file_format", .. }
    );
}

#[test]
fn similarity_entry_by_chain() {
    let q = StructSimilarityQuery::builder()
        .entry_id("4HHB")
        .chain_id("B")
        .build()
        .unwrap();
    assert_eq!(q.source(), &StructureSource::EntryId("4HHB".to_string()));
    let params = q.parameters().unwrap();
    assert_eq!(params["value"], json!({"entry_id": "4HHB", "asym_id": "B"}));
    assert_eq!(params["operator"], json!("strict_shape_match"));
}

#[test]
fn similarity_defaults_to_first_assembly() {
    let params = StructSimilarityQuery::entry("4HHB").unwrap().parameters().unwrap();
    assert_eq!(params["value"], json!({"entry_id": "4HHB", "assembly_id": "1"}));
    assert_eq!(params["target_search_space"], json!("assembly"));
}

// ---------------------------------------------------------------------------
// Ambiguous attributes
// ---------------------------------------------------------------------------

#[test]
fn ambiguous_name_needs_a_service() {
    let registry = AttributeRegistry::bundled().unwrap();
    assert_search_err!(
        AttributeQuery::resolve(&registry, "rcsb_id", Operator::ExactMatch, Some("ATP".into()), None),
        SearchError::AmbiguousAttribute { .. }
    );

    let term = AttributeQuery::resolve(
        &registry,
        "rcsb_id",
        Operator::ExactMatch,
        Some("ATP".into()),
        Some(Service::TextChem),
    )
    .unwrap();
    let query: Query = Terminal::from(term).into();
    assert_all_services!(query.to_json().unwrap(), "text_chem");
}

#[test]
fn registry_resolves_single_service_names() {
    let registry = AttributeRegistry::bundled().unwrap();
    assert_eq!(registry.service_of("exptl.method"), Ok(Service::Text));
    assert_eq!(registry.service_of("chem_comp.formula"), Ok(Service::TextChem));
    assert_search_err!(registry.service_of("no.such.field"), SearchError::AttributeNotFound(_));
}

// ---------------------------------------------------------------------------
// Sequence and chemical terminals
// ---------------------------------------------------------------------------

#[test]
fn sequence_bounds() {
    assert!(SequenceQuery::new(HBA_SEQUENCE).is_ok());
    assert_search_err!(SequenceQuery::new("MVLSPADKTN"), SearchError::OutOfRangeParameter { .. });
    assert_search_err!(
        SequenceQuery::with_options(HBA_SEQUENCE, SequenceType::Protein, 0.1, 1.5),
        SearchError::OutOfRangeParameter { parameter: "identity_cutoff", .. }
    );
}

#[test]
fn sequence_parameters_document() {
    let params = Terminal::from(SequenceQuery::new(HBA_SEQUENCE).unwrap())
        .parameters()
        .unwrap();
    assert_eq!(params["sequence_type"], json!("protein"));
    assert_eq!(params["evalue_cutoff"], json!(0.1));
    assert_eq!(params["value"], json!(HBA_SEQUENCE));
}

#[test]
fn seqmotif_needs_two_characters() {
    assert_search_err!(
        SeqMotifQuery::new("C", Default::default(), Default::default()),
        SearchError::OutOfRangeParameter { .. }
    );
    assert!(SeqMotifQuery::new("C-x(2,4)-C", Default::default(), Default::default()).is_ok());
}

#[test]
fn chemical_terminals() {
    let formula = Terminal::from(ChemSimilarityQuery::formula("C12 H22 O11", true).unwrap());
    assert_eq!(formula.service(), Service::Chemical);
    let params = formula.parameters().unwrap();
    assert_eq!(params["type"], json!("formula"));
    assert_eq!(params["match_subset"], json!(true));
    assert_search_err!(ChemSimilarityQuery::formula("  ", false), SearchError::MissingRequiredField { .. });
    assert_search_err!(formula.negate(), SearchError::UnsupportedNegation(_));
}

// ---------------------------------------------------------------------------
// Facets
// ---------------------------------------------------------------------------

#[test]
fn open_ended_facet_ranges_are_accepted() {
    let facet = Facet::range(
        "Resolution",
        "rcsb_entry_info.resolution_combined",
        [Range::ending_at(2), Range::starting_at(2)],
    )
    .unwrap();
    assert_eq!(
        serde_json::to_value(&facet).unwrap()["ranges"],
        json!([{"to": 2.0}, {"from": 2.0}])
    );
}

#[rstest]
#[case::equal_ends(Range::between(2, 2))]
#[case::reversed(Range::between(3, 2))]
fn empty_facet_ranges_are_rejected(#[case] range: Range) {
    assert_search_err!(
        Facet::range("Resolution", "rcsb_entry_info.resolution_combined", [range]),
        SearchError::InvalidOption(_)
    );
}

#[test]
fn facet_defaults_and_bounds() {
    let terms = serde_json::to_value(Facet::terms("Methods", "exptl.method").unwrap()).unwrap();
    assert_eq!(terms["min_interval_population"], json!(1));
    assert_eq!(terms["max_num_intervals"], json!(65536));

    assert_search_err!(
        Facet::range("R", "rcsb_entry_info.resolution_combined", Vec::<Range>::new()),
        SearchError::MissingRequiredField { field: "ranges", .. }
    );
    assert_search_err!(
        Facet::builder("C", pdbsearch::AggregationType::Cardinality, "rcsb_id")
            .precision_threshold(40_001)
            .build(),
        SearchError::OutOfRangeParameter { parameter: "precision_threshold", .. }
    );
}

#[test]
fn filter_facet_document() {
    let xray = TerminalFilter::new("exptl.method", Operator::ExactMatch, Some("X-RAY DIFFRACTION".into())).unwrap();
    let recent = TerminalFilter::new(
        "rcsb_accession_info.initial_release_date",
        Operator::Greater,
        Some("2019-01-01".into()),
    )
    .unwrap();
    let filter = GroupFilter::new(
        LogicalOperator::And,
        [pdbsearch::Filter::from(xray), pdbsearch::Filter::from(recent)],
    )
    .unwrap();
    let facet = FilterFacet::new(
        filter,
        [pdbsearch::FacetItem::from(Facet::terms("Methods", "exptl.method").unwrap())],
    )
    .unwrap();

    let doc = serde_json::to_value(&facet).unwrap();
    assert_eq!(doc["filter"]["type"], json!("group"));
    assert_eq!(doc["filter"]["logical_operator"], json!("and"));
    assert_eq!(doc["filter"]["nodes"][0]["type"], json!("terminal"));
    assert_eq!(doc["filter"]["nodes"][0]["service"], json!("text"));
    assert_eq!(doc["facets"][0]["name"], json!("Methods"));
}
