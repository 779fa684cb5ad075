//! Index creation bodies
//!
//! Amounts are stored as `scaled_float` with the ledger's seven decimal
//! places; ids, hashes and accounts are keywords.

use serde_json::{json, Map, Value};

use crate::core::types::IndexName;

fn keyword() -> Value {
    json!({ "type": "keyword" })
}

fn amount() -> Value {
    json!({ "type": "scaled_float", "scaling_factor": 10_000_000 })
}

fn long() -> Value {
    json!({ "type": "long" })
}

fn date() -> Value {
    json!({ "type": "date" })
}

fn asset() -> Value {
    json!({
        "properties": {
            "type": keyword(),
            "code": keyword(),
            "issuer": keyword(),
            "key": keyword(),
        }
    })
}

fn properties(fields: &[(&str, Value)]) -> Value {
    let mut props = Map::new();
    props.insert("paging_token".to_string(), long());
    for (name, value) in fields {
        props.insert((*name).to_string(), value.clone());
    }
    Value::Object(props)
}

/// Settings and mapping for one index
pub fn mapping_for(index: IndexName) -> Value {
    let props = match index {
        IndexName::Ledger => properties(&[
            ("hash", keyword()),
            ("prev_hash", keyword()),
            ("bucket_list_hash", keyword()),
            ("seq", long()),
            ("close_time", date()),
            ("version", long()),
            ("total_coins", amount()),
            ("fee_pool", amount()),
            ("base_fee", long()),
            ("base_reserve", long()),
            ("max_tx_set_size", long()),
            ("successful_transaction_count", long()),
            ("failed_transaction_count", long()),
            ("operation_count", long()),
        ]),
        IndexName::Transaction => properties(&[
            ("id", keyword()),
            ("seq", long()),
            ("index", long()),
            ("close_time", date()),
            ("account", keyword()),
            ("account_sequence", long()),
            ("fee_account", keyword()),
            ("fee_bump", json!({ "type": "boolean" })),
            ("max_fee", long()),
            ("fee_charged", long()),
            ("operation_count", long()),
            ("successful", json!({ "type": "boolean" })),
            ("result_code", long()),
            ("memo", json!({ "properties": { "type": keyword(), "value": keyword() } })),
        ]),
        IndexName::Operation => properties(&[
            ("tx_id", keyword()),
            ("tx_index", long()),
            ("seq", long()),
            ("close_time", date()),
            ("tx_source_account", keyword()),
            ("index", long()),
            ("type", keyword()),
            ("source_account", keyword()),
            ("destination_account_id", keyword()),
            ("amount", amount()),
            ("asset", asset()),
            ("source_asset", asset()),
            ("selling_asset", asset()),
            ("buying_asset", asset()),
            ("path", asset()),
            ("price", json!({ "type": "double" })),
            ("succeeded", json!({ "type": "boolean" })),
            ("result_code", long()),
            ("inner_result_code", long()),
        ]),
        IndexName::Balance => properties(&[
            ("account_id", keyword()),
            ("balance", amount()),
            ("diff", amount()),
            ("asset", asset()),
            ("source", keyword()),
            ("created_at", date()),
        ]),
        IndexName::Trade => properties(&[
            ("offer_id", long()),
            ("seller_id", keyword()),
            ("buyer_id", keyword()),
            ("sold_amount", amount()),
            ("sold_asset", asset()),
            ("bought_amount", amount()),
            ("bought_asset", asset()),
            ("price", json!({ "type": "double" })),
            ("created_at", date()),
        ]),
        IndexName::Offer => properties(&[
            ("seq", long()),
            ("type", keyword()),
            ("action", keyword()),
            ("seller_id", keyword()),
            ("offer_id", long()),
            ("selling", asset()),
            ("buying", asset()),
            ("amount", amount()),
            ("price", json!({ "type": "double" })),
            ("created_at", date()),
        ]),
        IndexName::SignerHistory => properties(&[
            ("account_id", keyword()),
            ("signer", keyword()),
            ("type", keyword()),
            ("weight", long()),
            ("seq", long()),
            ("tx_index", long()),
            ("op_index", long()),
            ("created_at", date()),
        ]),
    };

    json!({
        "settings": { "number_of_shards": 1 },
        "mappings": {
            "dynamic": true,
            "properties": props,
        }
    })
}
