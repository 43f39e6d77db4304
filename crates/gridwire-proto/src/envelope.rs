//! Response envelopes understood by the client grids.

use serde::{Deserialize, Serialize};

/// One projected row: column key to JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Row key carrying the synthetic row identifier.
pub const ROW_ID_KEY: &str = "DT_RowId";

/// Row key carrying the CSS row class.
pub const ROW_CLASS_KEY: &str = "DT_RowClass";

/// DataTables server-side processing response.
///
/// A failed request carries `bSuccess=false` and `sError`; totals and
/// `aaData` are left out entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTableEnvelope {
    /// Echo token, when it could be decoded.
    #[serde(rename = "sEcho", default, skip_serializing_if = "Option::is_none")]
    pub echo: Option<String>,
    /// Total record count.
    #[serde(rename = "iTotalRecords", default, skip_serializing_if = "Option::is_none")]
    pub total_records: Option<u64>,
    /// Record count after filtering.
    #[serde(
        rename = "iTotalDisplayRecords",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub total_display_records: Option<u64>,
    /// Projected rows.
    #[serde(rename = "aaData", default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Row>>,
    /// Success flag.
    #[serde(rename = "bSuccess")]
    pub success: bool,
    /// Error message, empty on success.
    #[serde(rename = "sError")]
    pub error: String,
    /// Error trace, debug mode only.
    #[serde(rename = "sTraceback", default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

impl DataTableEnvelope {
    /// Create a success envelope.
    pub fn success(
        echo: impl Into<String>,
        total_records: u64,
        total_display_records: u64,
        data: Vec<Row>,
    ) -> Self {
        Self {
            echo: Some(echo.into()),
            total_records: Some(total_records),
            total_display_records: Some(total_display_records),
            data: Some(data),
            success: true,
            error: String::new(),
            traceback: None,
        }
    }

    /// Create a failure envelope.
    pub fn failure(
        echo: Option<String>,
        error: impl Into<String>,
        traceback: Option<String>,
    ) -> Self {
        Self {
            echo,
            total_records: None,
            total_display_records: None,
            data: None,
            success: false,
            error: error.into(),
            traceback,
        }
    }

    /// Number of rows carried.
    pub fn row_count(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }
}

/// ExtJS grid store response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtGridEnvelope {
    /// Success flag.
    pub success: bool,
    /// Rows, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Row>>,
    /// Status message on success; error trace on failure in debug mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Record count after filtering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Error message, on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtGridEnvelope {
    /// Create a success envelope.
    pub fn success(data: Vec<Row>, total: u64, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
            total: Some(total),
            error: None,
        }
    }

    /// Create a failure envelope.
    pub fn failure(error: impl Into<String>, trace: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: trace,
            total: None,
            error: Some(error.into()),
        }
    }

    /// Serialize, wrapping the JSON in `callback(...)` when a valid JSONP
    /// callback name is given. Invalid names are ignored.
    pub fn render(&self, callback: Option<&str>) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string_pretty(self)?;
        Ok(match callback.filter(|cb| is_valid_callback(cb)) {
            Some(cb) => format!("{cb}({json})"),
            None => json,
        })
    }
}

/// Check a JSONP callback name: dotted JavaScript identifiers only.
pub fn is_valid_callback(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_datatable_success_shape() {
        let mut row = Row::new();
        row.insert("0".into(), json!("Ana"));
        row.insert(ROW_ID_KEY.into(), json!("PK_1"));

        let envelope = DataTableEnvelope::success("7", 3, 3, vec![row]);
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(
            value,
            json!({
                "sEcho": "7",
                "iTotalRecords": 3,
                "iTotalDisplayRecords": 3,
                "aaData": [{"0": "Ana", "DT_RowId": "PK_1"}],
                "bSuccess": true,
                "sError": ""
            })
        );
    }

    #[test]
    fn test_datatable_failure_omits_data() {
        let envelope = DataTableEnvelope::failure(None, "sEcho not in request", None);
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["bSuccess"], json!(false));
        assert_eq!(value["sError"], json!("sEcho not in request"));
        assert!(value.get("aaData").is_none());
        assert!(value.get("iTotalRecords").is_none());
        assert!(value.get("sTraceback").is_none());
        assert_eq!(envelope.row_count(), 0);
    }

    #[test]
    fn test_ext_envelope_jsonp() {
        let envelope = ExtGridEnvelope::success(vec![], 0, "OK");
        let body = envelope.render(Some("Ext.data.callback1")).unwrap();
        assert!(body.starts_with("Ext.data.callback1("));
        assert!(body.ends_with(')'));

        let body = envelope.render(Some("alert(1);x")).unwrap();
        assert!(body.starts_with('{'));
    }

    #[test]
    fn test_ext_failure_shape() {
        let envelope = ExtGridEnvelope::failure("boom", Some("trace".into()));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({"success": false, "error": "boom", "message": "trace"})
        );
    }

    #[test]
    fn test_callback_validation() {
        assert!(is_valid_callback("cb"));
        assert!(is_valid_callback("$jsonp_1.done"));
        assert!(!is_valid_callback(""));
        assert!(!is_valid_callback("1abc"));
        assert!(!is_valid_callback("a..b"));
        assert!(!is_valid_callback("x<script>"));
    }
}
