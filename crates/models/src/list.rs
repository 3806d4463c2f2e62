use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// One list response: server-reported total plus rows in server order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RowList<T> {
    pub total: u64,
    pub rows: Vec<T>,
}

impl<T> Default for RowList<T> {
    fn default() -> Self { Self { total: 0, rows: Vec::new() } }
}

impl RowList<Value> {
    /// Decode raw rows into a typed list.
    pub fn decode<T: DeserializeOwned>(self) -> Result<RowList<T>, serde_json::Error> {
        let rows = self
            .rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()?;
        Ok(RowList { total: self.total, rows })
    }
}
