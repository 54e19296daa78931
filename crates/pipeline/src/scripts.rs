//! Painless script templates for the scripted-upsert protocols in
//! spec.md §4.9. These are wire-level contracts with the search engine
//! (spec.md §9): treated as opaque byte templates, with only the
//! numeric parameter index substituted at the literal `%1%` token the
//! original plugin's `boost::format` strings use.

use serde_json::{Map, Value};

/// `block_states`/`blocks` accept-path script: set each field only if
/// absent (first-writer-wins against a possibly-earlier irreversible
/// write), always bump `createAt` (spec.md §4.9.1).
pub const BLOCK_STATE_ACCEPT_SCRIPT: &str = concat!(
    "if (ctx._source.block_num == null) ctx._source.block_num = params.block_num;\n",
    "if (ctx._source.block_id == null) ctx._source.block_id = params.block_id;\n",
    "if (ctx._source.validated == null) ctx._source.validated = params.validated;\n",
    "if (ctx._source.block_header_state == null) ctx._source.block_header_state = params.block_header_state;\n",
    "ctx._source.createAt = params.createAt;",
);

pub const BLOCK_ACCEPT_SCRIPT: &str = concat!(
    "if (ctx._source.block_num == null) ctx._source.block_num = params.block_num;\n",
    "if (ctx._source.block_id == null) ctx._source.block_id = params.block_id;\n",
    "if (ctx._source.block == null) ctx._source.block = params.block;\n",
    "ctx._source.createAt = params.createAt;",
);

/// Shared by both `blocks` and `block_states`: finality always
/// overwrites `validated`/`irreversible`/`updateAt`, last-writer-wins
/// (spec.md §4.9.2, §5).
pub const IRREVERSIBLE_SCRIPT: &str = concat!(
    "ctx._source.validated = params.validated;\n",
    "ctx._source.irreversible = true;\n",
    "ctx._source.updateAt = params.updateAt;",
);

/// `newaccount`: assigns a fresh account's fields wholesale from its
/// own namespaced parameter block (spec.md §4.9.5).
pub const NEWACCOUNT_SCRIPT: &str = concat!(
    "ctx._source.name = params[\"%1%\"].name;\n",
    "ctx._source.creator = params[\"%1%\"].creator;\n",
    "ctx._source.account_create_time = params[\"%1%\"].account_create_time;\n",
    "ctx._source.pub_keys = params[\"%1%\"].pub_keys;\n",
    "ctx._source.account_controls = params[\"%1%\"].account_controls;\n",
    "ctx._source.createAt = params[\"%1%\"].createAt;",
);

/// `updateauth`: atomic replace-by-permission on both arrays (spec.md
/// §4.9.5, testable property 6).
pub const UPDATEAUTH_SCRIPT: &str = concat!(
    "ctx._source.pub_keys.removeIf(item -> item.permission == params[\"%1%\"].permission);\n",
    "ctx._source.account_controls.removeIf(item -> item.permission == params[\"%1%\"].permission);\n",
    "ctx._source.pub_keys.addAll(params[\"%1%\"].pub_keys);\n",
    "ctx._source.account_controls.addAll(params[\"%1%\"].account_controls);\n",
    "ctx._source.updateAt = params[\"%1%\"].updateAt;",
);

pub const DELETEAUTH_SCRIPT: &str = concat!(
    "ctx._source.pub_keys.removeIf(item -> item.permission == params[\"%1%\"].permission);\n",
    "ctx._source.account_controls.removeIf(item -> item.permission == params[\"%1%\"].permission);\n",
    "ctx._source.updateAt = params[\"%1%\"].updateAt;",
);

pub const SETABI_SCRIPT: &str = concat!(
    "ctx._source.name = params[\"%1%\"].name;\n",
    "ctx._source.abi = params[\"%1%\"].abi;\n",
    "ctx._source.updateAt = params[\"%1%\"].updateAt;",
);

/// Accumulates one account's per-transaction script across however
/// many of its four system actions touched it, namespacing each
/// fragment's parameters under its own monotonically increasing
/// string index (spec.md §4.9.5).
#[derive(Default)]
pub struct AccountScript {
    lines: Vec<String>,
    params: Map<String, Value>,
}

impl AccountScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one action's script fragment (substituting `%1%` with
    /// this fragment's namespace index) and its parameter block.
    pub fn push(&mut self, template: &str, params: Value) {
        let idx = self.params.len().to_string();
        self.lines.push(template.replace("%1%", &idx));
        self.params.insert(idx, params);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Final `(source, params)` pair, ready for a scripted `_update`
    /// body with `scripted_upsert: true`, `upsert: {}`.
    pub fn build(self) -> (String, Value) {
        (self.lines.join("\n"), Value::Object(self.params))
    }
}

/// Body of a scripted-update `_bulk` source line:
/// `{"script":{"lang":"painless","source":...,"params":...}, ...}`.
pub fn scripted_update_body(source: &str, params: Value, upsert: Value, scripted_upsert: bool) -> Value {
    let mut body = serde_json::json!({
        "script": {
            "lang": "painless",
            "source": source,
            "params": params,
        },
        "upsert": upsert,
    });
    if scripted_upsert {
        body["scripted_upsert"] = Value::Bool(true);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_script_namespaces_each_fragment() {
        let mut script = AccountScript::new();
        script.push(NEWACCOUNT_SCRIPT, serde_json::json!({ "name": "bob" }));
        script.push(SETABI_SCRIPT, serde_json::json!({ "name": "bob" }));
        let (source, params) = script.build();
        assert!(source.contains("params[\"0\"].name"));
        assert!(source.contains("params[\"1\"].name"));
        assert_eq!(params["0"]["name"], "bob");
        assert_eq!(params["1"]["name"], "bob");
    }
}
