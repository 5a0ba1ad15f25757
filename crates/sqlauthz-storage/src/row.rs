use sqlauthz_ast::SqlValue;

/// A single row of data
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub values: Vec<SqlValue>,
}

impl Row {
    pub fn new(values: Vec<SqlValue>) -> Self {
        Row { values }
    }

    /// Get value at column index
    pub fn get(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    pub fn set(&mut self, index: usize, value: SqlValue) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value;
        }
    }

    /// Values at `positions`, in order; missing positions read as NULL.
    pub fn project(&self, positions: &[usize]) -> Vec<SqlValue> {
        positions.iter().map(|p| self.get(*p).cloned().unwrap_or(SqlValue::Null)).collect()
    }
}
