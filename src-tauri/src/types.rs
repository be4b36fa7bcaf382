use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub pointer: String,          // JSON Pointer to this node
    pub key: Option<String>,      // key if object, index if array (as string)
    pub value_type: String,       // "object" | "array" | "string" | "number" | ...
    pub has_children: bool,
    pub child_count: usize,
    pub expanded: bool,
    pub preview: String,          // short preview for leafs / strings / numbers
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub index: usize,             // position in the match list
    pub offset: usize,            // character offset into the source text
    pub pointer: Option<String>,  // node containing the hit
    pub context: String,
    pub current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
    pub total_count: usize,
    pub has_more: bool,
    pub current: Option<usize>,
    pub display: String,          // "3 / 7" or "0 / 0"
}
