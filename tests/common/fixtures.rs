//! Static fixture data: sequences, schema documents, response documents.

use serde_json::{json, Value};

/// Human hemoglobin alpha chain, first 40 residues.
pub const HBA_SEQUENCE: &str = "MVLSPADKTNVKAAWGKVGAHAGEYGAEALERMFLSFPTT";

/// A two-field structure schema in the service's JSON-schema dialect.
pub fn tiny_structure_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "rcsb_id": {"type": "string", "description": "Entry identifier."},
            "exptl": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "method": {"type": "string", "description": "Experimental method."}
                    }
                }
            }
        }
    })
}

pub fn tiny_chemical_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "rcsb_id": {"type": "string"},
            "chem_comp": {
                "type": "object",
                "properties": {"formula": {"type": "string"}}
            }
        }
    })
}

/// A facet response with one nested terms aggregation.
pub fn facet_response() -> Value {
    json!({
        "query_id": "f",
        "result_type": "entry",
        "total_count": 120,
        "facets": [{
            "name": "Methods",
            "buckets": [
                {"label": "X-RAY DIFFRACTION", "population": 100},
                {"label": "SOLUTION NMR", "population": 20}
            ]
        }]
    })
}

/// A grouped response: two deposit groups.
pub fn grouped_response() -> Value {
    json!({
        "query_id": "g",
        "result_type": "entry",
        "total_count": 5,
        "group_by_count": 2,
        "group_set": [
            {"identifier": "G_1002001", "score": 1.0, "result_set": [
                {"identifier": "5R7Y", "score": 1.0},
                {"identifier": "5R7Z", "score": 1.0}
            ]},
            {"identifier": "G_1002002", "score": 0.8, "result_set": [
                {"identifier": "5R80", "score": 0.8}
            ]}
        ]
    })
}
